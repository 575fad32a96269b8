// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

//! The bootstrap snapshot scanner.
//!
//! First call pins the read time to the latest applied hybrid time and
//! registers the consumer with the tablet so log and intent retention hold
//! it. Subsequent calls page through the table with a read-time-pinned
//! iterator, advertising the next key in the cursor until exhausted.

use std::time::Duration;

use tessera_core::{
	HybridTime, SchemaVersion, StreamId, TableSchema, TabletId,
	interface::{CatalogClient, ConsensusLog, TabletRuntime},
};
use tessera_type::{Result, diagnostic::cdc, return_error};
use tracing::{debug, info};

use crate::{
	SNAPSHOT_WRITE_ID,
	checkpoint::Checkpoint,
	datum::{EnumOidLabelMap, column_datum},
	flags,
	record::{ColumnInfo, DatumMessage, DdlInfo, LogicalRecord, RecordOpId, RowChange, RowMessage},
	schema::SchemaCache,
};

/// Emit one DDL record per co-located table, describing the active schema.
pub(crate) fn fill_ddl_records(
	tablet: &dyn TabletRuntime,
	schema: &TableSchema,
	schema_version: SchemaVersion,
	records: &mut Vec<LogicalRecord>,
) {
	for (_, table_name) in tablet.colocated_tables() {
		records.push(LogicalRecord {
			op_id: RecordOpId::default(),
			table: table_name,
			pg_schema_name: schema.pg_schema_name.clone(),
			commit_time: None,
			row: RowMessage::Ddl(DdlInfo {
				column_info: schema.columns.iter().map(ColumnInfo::from).collect(),
				schema_version,
				table_properties: schema.properties.clone(),
				new_table_name: None,
			}),
		});
	}
}

/// A READ record for one materialised row: every schema column gets a
/// slot, empty for nulls and types without a PostgreSQL mapping.
fn snapshot_read_record(
	row: &tessera_core::interface::SnapshotRow,
	schema: &TableSchema,
	tablet: &dyn TabletRuntime,
	read_time: HybridTime,
	enum_oid_label_map: &EnumOidLabelMap,
) -> LogicalRecord {
	let mut change = RowChange::default();
	for column in &schema.columns {
		let value = row.get(column.id).cloned().unwrap_or(tessera_core::Value::Undefined);
		change.new_tuple.push(column_datum(column, &value, enum_oid_label_map));
		change.old_tuple.push(DatumMessage::default());
	}

	LogicalRecord {
		op_id: RecordOpId::default(),
		table: tablet.table_name().to_string(),
		pg_schema_name: schema.pg_schema_name.clone(),
		commit_time: Some(read_time),
		row: RowMessage::Read(change),
	}
}

/// Run the snapshot state machine for one call.
#[allow(clippy::too_many_arguments)]
pub(crate) fn stream_snapshot(
	stream_id: &StreamId,
	tablet_id: &TabletId,
	from_cursor: &Checkpoint,
	tablet: &dyn TabletRuntime,
	consensus: &dyn ConsensusLog,
	catalog: &dyn CatalogClient,
	enum_oid_label_map: &EnumOidLabelMap,
	schema_cache: &mut SchemaCache,
	records: &mut Vec<LogicalRecord>,
	checkpoint: &mut Checkpoint,
	checkpoint_updated: &mut bool,
) -> Result<()> {
	if from_cursor.key.is_empty() && from_cursor.snapshot_time == 0 {
		// First call: pin the read time and hold retention.
		if !tablet.has_transaction_participant() {
			return_error!(cdc::corruption("cannot read data as the transaction participant context is null"));
		}

		let (op_id, _) = tablet.last_replicated_data()?;
		consensus.update_consumer_op_id(op_id);

		info!(
			stream = %stream_id,
			tablet = %tablet_id,
			%op_id,
			"snapshot initialization started, setting the consumer checkpoint"
		);
		tablet.set_intent_retention(op_id, Duration::from_millis(flags::intent_retention_ms().max(0) as u64));

		let (_, log_time) = tablet.last_replicated_data()?;
		*checkpoint = Checkpoint::new(op_id.term, op_id.index, SNAPSHOT_WRITE_ID, Vec::new(), log_time.to_u64());
		*checkpoint_updated = true;
	} else {
		if flags::test_snapshot_failure() {
			return_error!(cdc::snapshot_unavailable(tablet_id));
		}

		let read_time = HybridTime::from_u64(from_cursor.snapshot_time);
		let schema = schema_cache.maybe_load(catalog, tablet, HybridTime::MAX);
		fill_ddl_records(tablet, &schema, schema_cache.version(), records);

		let limit = flags::snapshot_batch_size().max(0) as usize;
		let mut iter = tablet.create_snapshot_iterator(read_time, &from_cursor.key)?;
		let mut fetched = 0;
		while fetched < limit {
			let Some(row) = iter.next_row()? else {
				break;
			};
			records.push(snapshot_read_record(&row, &schema, tablet, read_time, enum_oid_label_map));
			fetched += 1;
		}

		let next_key = iter.next_read_key()?;
		if next_key.is_empty() {
			info!(stream = %stream_id, tablet = %tablet_id, "done with snapshot operation");
			*checkpoint = Checkpoint::new(from_cursor.term, from_cursor.index, 0, Vec::new(), 0);
		} else {
			debug!(stream = %stream_id, tablet = %tablet_id, fetched, "snapshot batch complete, more rows remain");
			*checkpoint = Checkpoint::new(
				from_cursor.term,
				from_cursor.index,
				SNAPSHOT_WRITE_ID,
				next_key,
				read_time.to_u64(),
			);
		}
		*checkpoint_updated = true;
	}

	Ok(())
}
