// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

//! Assembles decoded per-column writes into row-granular change records.
//!
//! Both record paths go through here: provisional writes of an applying
//! transaction ([`populate_intent_records`]) and the write pairs of a
//! non-transactional batch ([`populate_write_records`]). Write pairs of
//! one row are grouped by their shared primary-key prefix; the first entry
//! of a group decides the operation.

use tessera_core::{
	HybridTime, IntraTxnWriteId, OpId, TableSchema, TransactionId,
	doc::{DocKey, KeyEntry, SubDocKey, ValueEntry},
	interface::{IntentKeyValue, ReplicatedMessage, TabletRuntime, WriteBatch},
};
use tessera_type::Result;
use tracing::error;

use crate::{
	datum::{EnumOidLabelMap, column_datum},
	flags,
	mem::ScopedTrackedConsumption,
	record::{DatumMessage, LogicalRecord, RecordOpId, RowChange, RowMessage},
};

/// The `(write_id, reverse_index_key)` cursor threaded through intent
/// replay; every flushed record advances it.
#[derive(Debug, Clone, Default)]
pub(crate) struct AssembledCursor {
	pub write_id: IntraTxnWriteId,
	pub reverse_index_key: Vec<u8>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum OpKind {
	Insert,
	Update,
	Delete,
}

/// A record being accumulated for one row group.
#[derive(Debug, Clone)]
struct PendingRecord {
	op: OpKind,
	table: String,
	pg_schema_name: String,
	transaction_id: Option<TransactionId>,
	commit_time: Option<HybridTime>,
	new_tuple: Vec<DatumMessage>,
	old_tuple: Vec<DatumMessage>,
}

impl PendingRecord {
	fn new(op: OpKind, table: String, pg_schema_name: String, transaction_id: Option<TransactionId>) -> Self {
		Self {
			op,
			table,
			pg_schema_name,
			transaction_id,
			commit_time: None,
			new_tuple: Vec::new(),
			old_tuple: Vec::new(),
		}
	}

	/// Append one populated slot, padding the opposite side: DELETE fills
	/// `old_tuple`, everything else fills `new_tuple`.
	fn add_tuple(&mut self, datum: DatumMessage) {
		if self.op == OpKind::Delete {
			self.old_tuple.push(datum);
			self.new_tuple.push(DatumMessage::default());
		} else {
			self.new_tuple.push(datum);
			self.old_tuple.push(DatumMessage::default());
		}
	}

	fn into_record(self, op_id: RecordOpId) -> LogicalRecord {
		let change = RowChange {
			transaction_id: self.transaction_id,
			new_tuple: self.new_tuple,
			old_tuple: self.old_tuple,
		};
		let row = match self.op {
			OpKind::Insert => RowMessage::Insert(change),
			OpKind::Update => RowMessage::Update(change),
			OpKind::Delete => RowMessage::Delete(change),
		};
		LogicalRecord {
			op_id,
			table: self.table,
			pg_schema_name: self.pg_schema_name,
			commit_time: self.commit_time,
			row,
		}
	}
}

/// Project the decoded primary key into tuple slots, hashed components
/// first, then range components.
fn add_primary_key(
	record: &mut PendingRecord,
	decoded_key: &SubDocKey,
	schema: &TableSchema,
	enum_oid_label_map: &EnumOidLabelMap,
) -> Result<()> {
	let mut index = 0;
	for entry in decoded_key.doc_key.hashed_group.iter().chain(decoded_key.doc_key.range_group.iter()) {
		let column = schema.column(index)?;
		record.add_tuple(column_datum(column, &entry.to_value(), enum_oid_label_map));
		index += 1;
	}
	Ok(())
}

/// Append the datum of a regular column write; system-column writes carry
/// no data, and anything else in selector position is an inconsistency
/// that is reported and skipped.
fn add_column_write(
	record: &mut PendingRecord,
	selector: &Option<KeyEntry>,
	decoded_value: &ValueEntry,
	schema: &TableSchema,
	enum_oid_label_map: &EnumOidLabelMap,
) -> Result<()> {
	match selector {
		Some(KeyEntry::ColumnId(column_id)) => {
			let column = schema.column_by_id(*column_id)?;
			record.new_tuple.push(column_datum(column, &decoded_value.primitive_value(), enum_oid_label_map));
			record.old_tuple.push(DatumMessage::default());
		}
		Some(KeyEntry::SystemColumnId(_)) => {}
		other => {
			error!(selector = ?other, "unexpected value type in key");
		}
	}
	Ok(())
}

fn classify(whole_row_tombstone: bool, selector: &Option<KeyEntry>, decoded_value: &ValueEntry) -> OpKind {
	if whole_row_tombstone {
		OpKind::Delete
	} else if matches!(selector, Some(KeyEntry::SystemColumnId(_))) && decoded_value.is_null_low() {
		OpKind::Insert
	} else {
		OpKind::Update
	}
}

fn flush_record(
	records: &mut Vec<LogicalRecord>,
	record: PendingRecord,
	op_id: OpId,
	intent: &IntentKeyValue,
	cursor: &mut AssembledCursor,
) {
	let record_op_id = RecordOpId::with_write_id(op_id, intent.write_id, intent.reverse_index_key.clone());
	records.push(record.into_record(record_op_id));
	cursor.write_id = intent.write_id;
	cursor.reverse_index_key = intent.reverse_index_key.clone();
}

/// Replay one batch of a transaction's provisional writes into records.
///
/// Ordering of the input is ascending `(reverse_index_key, write_id)`; the
/// emitted records carry the apply record's `op_id` plus each flushed
/// intent's intra-transaction position.
#[allow(clippy::too_many_arguments)]
pub(crate) fn populate_intent_records(
	op_id: OpId,
	transaction_id: &TransactionId,
	intents: &[IntentKeyValue],
	tablet: &dyn TabletRuntime,
	enum_oid_label_map: &EnumOidLabelMap,
	schema: &TableSchema,
	consumption: &mut ScopedTrackedConsumption,
	records: &mut Vec<LogicalRecord>,
	cursor: &mut AssembledCursor,
) -> Result<()> {
	let table_name = tablet.table_name().to_string();
	let num_columns = schema.num_columns();

	let mut prev_key: Vec<u8> = Vec::new();
	let mut prev_intent: Option<&IntentKeyValue> = None;
	let mut prev_intent_physical_time: u64 = 0;
	let mut pending: Option<PendingRecord> = None;
	let mut col_count: usize = 0;

	for intent in intents {
		let key = intent.key.as_slice();
		let key_size = DocKey::encoded_size(key)?;
		let selector = KeyEntry::decode_key(&key[key_size..])?;
		let decoded_key = SubDocKey::decode_from(key)?;
		let decoded_value = ValueEntry::decode(&intent.value)?;

		// Key-column writes never emit data; they only advance the
		// intra-transaction cursor.
		if let Some(KeyEntry::ColumnId(column_id)) = &selector {
			if schema.is_key_column(*column_id) {
				cursor.write_id = intent.write_id;
				cursor.reverse_index_key = intent.reverse_index_key.clone();
				continue;
			}
		}

		if consumption.is_active() {
			consumption.add(key.len());
		}

		let primary_key = &key[..key_size];
		let whole_row_tombstone = decoded_value.is_tombstone() && decoded_key.num_sub_keys() == 0;
		let single_record_update = flags::enable_single_record_update();

		let new_record_needed = if single_record_update {
			prev_key != primary_key
				|| col_count >= num_columns
				|| whole_row_tombstone
				|| prev_intent_physical_time != intent.intent_time.physical_micros()
		} else {
			prev_key != primary_key || col_count >= num_columns
		};

		if new_record_needed {
			if single_record_update {
				if col_count > 0 {
					col_count = 0;
				}
				// A held multi-column UPDATE flushes at its group
				// boundary, stamped with its last intent.
				if pending.as_ref().is_some_and(|record| record.op == OpKind::Update) {
					if let (Some(record), Some(prev)) = (pending.take(), prev_intent) {
						flush_record(records, record, op_id, prev, cursor);
					}
				}
			}
			pending = None;

			let op = classify(whole_row_tombstone, &selector, &decoded_value);
			match op {
				OpKind::Delete | OpKind::Update => {
					cursor.write_id = intent.write_id;
					if !single_record_update {
						col_count = num_columns;
					}
				}
				OpKind::Insert => {
					col_count = schema.num_key_columns().saturating_sub(1);
				}
			}

			let mut record =
				PendingRecord::new(op, table_name.clone(), schema.pg_schema_name.clone(), Some(*transaction_id));
			add_primary_key(&mut record, &decoded_key, schema, enum_oid_label_map)?;
			pending = Some(record);
		}

		prev_key = primary_key.to_vec();
		prev_intent_physical_time = intent.intent_time.physical_micros();

		if let Some(record) = pending.as_mut() {
			if record.op == OpKind::Insert || record.op == OpKind::Update {
				if flags::enable_single_record_update() {
					col_count += 1;
				} else if record.op == OpKind::Insert {
					col_count += 1;
				}
				add_column_write(record, &selector, &decoded_value, schema, enum_oid_label_map)?;
			}
		}

		let op = pending.as_ref().map(|record| record.op);
		if flags::enable_single_record_update() {
			match op {
				Some(OpKind::Insert) if col_count == num_columns => {
					if let Some(record) = pending.take() {
						flush_record(records, record, op_id, intent, cursor);
					}
					col_count = num_columns;
				}
				Some(OpKind::Delete) => {
					if let Some(record) = pending.take() {
						flush_record(records, record, op_id, intent, cursor);
					}
					col_count = num_columns;
				}
				Some(OpKind::Update) => prev_intent = Some(intent),
				_ => {}
			}
		} else {
			match op {
				Some(OpKind::Insert) if col_count == num_columns => {
					if let Some(record) = pending.take() {
						flush_record(records, record, op_id, intent, cursor);
					}
				}
				Some(OpKind::Update) | Some(OpKind::Delete) => {
					if let Some(record) = pending.take() {
						flush_record(records, record, op_id, intent, cursor);
					}
				}
				_ => {}
			}
		}
	}

	// End of batch: a pending single-record UPDATE flushes with the last
	// intent of its group.
	if flags::enable_single_record_update() {
		if pending.as_ref().is_some_and(|record| record.op == OpKind::Update) {
			if let (Some(record), Some(prev)) = (pending.take(), prev_intent) {
				flush_record(records, record, op_id, prev, cursor);
			}
		}
	}

	Ok(())
}

/// Assemble the records of a non-transactional write batch.
///
/// Groups purely by primary key: all column writes of one row land in one
/// record, stamped with the message's position and hybrid time.
pub(crate) fn populate_write_records(
	msg: &ReplicatedMessage,
	batch: &WriteBatch,
	tablet: &dyn TabletRuntime,
	enum_oid_label_map: &EnumOidLabelMap,
	schema: &TableSchema,
	records: &mut Vec<LogicalRecord>,
) -> Result<()> {
	let table_name = tablet.table_name().to_string();

	let mut prev_key: Vec<u8> = Vec::new();
	let mut pending: Option<PendingRecord> = None;

	for pair in &batch.write_pairs {
		let key = pair.key.as_slice();
		let key_size = DocKey::encoded_size(key)?;
		let decoded_value = ValueEntry::decode(&pair.value)?;
		let primary_key = &key[..key_size];

		if prev_key != primary_key {
			if let Some(record) = pending.take() {
				records.push(record.into_record(RecordOpId::from_op_id(msg.op_id)));
			}

			let decoded_key = SubDocKey::decode_from(key)?;
			let whole_row_tombstone = decoded_value.is_tombstone() && decoded_key.num_sub_keys() == 0;
			let selector = KeyEntry::decode_key(&key[key_size..])?;
			let op = classify(whole_row_tombstone, &selector, &decoded_value);

			let mut record = PendingRecord::new(op, table_name.clone(), schema.pg_schema_name.clone(), None);
			add_primary_key(&mut record, &decoded_key, schema, enum_oid_label_map)?;
			record.commit_time = Some(msg.hybrid_time);
			pending = Some(record);
		}
		prev_key = primary_key.to_vec();

		if let Some(record) = pending.as_mut() {
			if record.op == OpKind::Insert || record.op == OpKind::Update {
				let selector = KeyEntry::decode_key(&key[key_size..])?;
				add_column_write(record, &selector, &decoded_value, schema, enum_oid_label_map)?;
			}
		}
	}

	if let Some(record) = pending.take() {
		records.push(record.into_record(RecordOpId::from_op_id(msg.op_id)));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use tessera_core::{ColumnId, ColumnSchema, OpId, SchemaVersion, TableId, TabletId, Type, Value, doc};
	use tessera_type::{Result as TypeResult, diagnostic::internal, err};

	use super::*;
	use crate::flags;

	struct TestTablet {
		tablet_id: TabletId,
		table_id: TableId,
		name: String,
	}

	impl TestTablet {
		fn new() -> Self {
			Self {
				tablet_id: TabletId::new("tablet-1"),
				table_id: TableId::new("table-1"),
				name: "orders".to_string(),
			}
		}
	}

	impl TabletRuntime for TestTablet {
		fn tablet_id(&self) -> &TabletId {
			&self.tablet_id
		}

		fn table_id(&self) -> &TableId {
			&self.table_id
		}

		fn table_name(&self) -> &str {
			&self.name
		}

		fn colocated_tables(&self) -> Vec<(TableId, String)> {
			vec![(self.table_id.clone(), self.name.clone())]
		}

		fn current_schema(&self) -> (TableSchema, SchemaVersion) {
			(sample_schema(), SchemaVersion(1))
		}

		fn has_transaction_participant(&self) -> bool {
			true
		}

		fn last_replicated_data(&self) -> TypeResult<(OpId, HybridTime)> {
			Ok((OpId::min(), HybridTime::MIN))
		}

		fn set_intent_retention(&self, _: OpId, _: std::time::Duration) {}

		fn latest_retention_checkpoint(&self) -> OpId {
			OpId::invalid()
		}

		fn next_intent_batch(
			&self,
			_: TransactionId,
			_: &tessera_core::interface::IntentStreamState,
		) -> TypeResult<tessera_core::interface::IntentBatch> {
			Ok(tessera_core::interface::IntentBatch::default())
		}

		fn create_snapshot_iterator(
			&self,
			_: HybridTime,
			_: &[u8],
		) -> TypeResult<Box<dyn tessera_core::interface::SnapshotIterator + '_>> {
			err!(internal("not used"))
		}
	}

	fn sample_schema() -> TableSchema {
		TableSchema::new(
			TableId::new("table-1"),
			"orders",
			"public",
			vec![
				ColumnSchema::key(1, "id", Type::Int4, 23),
				ColumnSchema::regular(2, "item", Type::Utf8, 25),
				ColumnSchema::regular(3, "quantity", Type::Int4, 23),
			],
		)
	}

	fn row_key(id: i32) -> doc::DocKey {
		doc::DocKey::range(vec![doc::KeyEntry::Int4(id)])
	}

	fn composite_key(doc_key: &doc::DocKey, column: doc::KeyEntry) -> Vec<u8> {
		let mut key = doc_key.encode();
		column.encode_into(&mut key);
		key
	}

	fn intent(key: Vec<u8>, value: ValueEntry, write_id: IntraTxnWriteId, micros: u64) -> IntentKeyValue {
		IntentKeyValue {
			key,
			value: value.encode(),
			write_id,
			reverse_index_key: vec![0x54, write_id as u8],
			intent_time: HybridTime::from_micros(micros),
		}
	}

	fn liveness_intent(id: i32, write_id: IntraTxnWriteId, micros: u64) -> IntentKeyValue {
		intent(
			composite_key(&row_key(id), doc::KeyEntry::SystemColumnId(doc::LIVENESS_COLUMN_ID)),
			ValueEntry::null_low(),
			write_id,
			micros,
		)
	}

	fn column_intent(id: i32, column: u32, value: Value, write_id: IntraTxnWriteId, micros: u64) -> IntentKeyValue {
		intent(
			composite_key(&row_key(id), doc::KeyEntry::ColumnId(ColumnId(column))),
			ValueEntry::primitive(value),
			write_id,
			micros,
		)
	}

	fn tombstone_intent(id: i32, write_id: IntraTxnWriteId, micros: u64) -> IntentKeyValue {
		intent(row_key(id).encode(), ValueEntry::tombstone(), write_id, micros)
	}

	fn run_intents(intents: &[IntentKeyValue]) -> (Vec<LogicalRecord>, AssembledCursor) {
		let tablet = TestTablet::new();
		let schema = sample_schema();
		let mut records = Vec::new();
		let mut cursor = AssembledCursor::default();
		let mut consumption = ScopedTrackedConsumption::none();
		populate_intent_records(
			OpId::new(3, 100),
			&TransactionId::from_u128(7),
			intents,
			&tablet,
			&EnumOidLabelMap::new(),
			&schema,
			&mut consumption,
			&mut records,
			&mut cursor,
		)
		.unwrap();
		(records, cursor)
	}

	#[test]
	fn test_insert_flushes_when_all_columns_seen() {
		let _guard = flags::test_guard();
		flags::set_enable_single_record_update(true);

		let intents = [
			liveness_intent(1, 1, 1000),
			column_intent(1, 2, Value::Utf8("widget".to_string()), 2, 1000),
			column_intent(1, 3, Value::Int4(4), 3, 1000),
		];
		let (records, cursor) = run_intents(&intents);

		assert_eq!(records.len(), 1);
		let record = &records[0];
		assert_eq!(record.row.op_name(), "INSERT");
		assert_eq!(record.op_id.write_id, 3);
		assert_eq!(cursor.write_id, 3);

		let change = record.row.row_change().unwrap();
		assert_eq!(change.new_tuple.len(), 3);
		assert_eq!(change.old_tuple.len(), 3);
		assert_eq!(change.new_tuple[0].value, Some(Value::Int4(1)));
		assert_eq!(change.new_tuple[1].value, Some(Value::Utf8("widget".to_string())));
		assert_eq!(change.transaction_id, Some(TransactionId::from_u128(7)));
	}

	#[test]
	fn test_single_record_update_merges_columns() {
		let _guard = flags::test_guard();
		flags::set_enable_single_record_update(true);

		let intents = [
			column_intent(1, 2, Value::Utf8("x".to_string()), 5, 1000),
			column_intent(1, 3, Value::Int4(9), 6, 1000),
		];
		let (records, cursor) = run_intents(&intents);

		assert_eq!(records.len(), 1);
		assert_eq!(records[0].row.op_name(), "UPDATE");
		let change = records[0].row.row_change().unwrap();
		// primary key + both updated columns
		assert_eq!(change.new_tuple.len(), 3);
		assert_eq!(records[0].op_id.write_id, 6);
		assert_eq!(cursor.write_id, 6);
	}

	#[test]
	fn test_multi_record_update_emits_one_record_per_column() {
		let _guard = flags::test_guard();
		flags::set_enable_single_record_update(false);

		let intents = [
			column_intent(1, 2, Value::Utf8("x".to_string()), 5, 1000),
			column_intent(1, 3, Value::Int4(9), 6, 1000),
		];
		let (records, _) = run_intents(&intents);

		flags::set_enable_single_record_update(true);

		assert_eq!(records.len(), 2);
		assert_eq!(records[0].row.op_name(), "UPDATE");
		assert_eq!(records[1].row.op_name(), "UPDATE");
		assert_eq!(records[0].op_id.write_id, 5);
		assert_eq!(records[1].op_id.write_id, 6);
		// each record still projects the primary key
		for record in &records {
			let change = record.row.row_change().unwrap();
			assert_eq!(change.new_tuple[0].value, Some(Value::Int4(1)));
		}
	}

	#[test]
	fn test_delete_flushes_immediately() {
		let _guard = flags::test_guard();
		flags::set_enable_single_record_update(true);

		let (records, cursor) = run_intents(&[tombstone_intent(1, 4, 1000)]);

		assert_eq!(records.len(), 1);
		assert_eq!(records[0].row.op_name(), "DELETE");
		let change = records[0].row.row_change().unwrap();
		assert_eq!(change.old_tuple[0].value, Some(Value::Int4(1)));
		assert_eq!(change.new_tuple[0].value, None);
		assert_eq!(cursor.write_id, 4);
	}

	#[test]
	fn test_key_column_write_advances_cursor_without_emitting() {
		let _guard = flags::test_guard();
		flags::set_enable_single_record_update(true);

		let key_write = column_intent(1, 1, Value::Int4(1), 9, 1000);
		let (records, cursor) = run_intents(&[key_write]);

		assert!(records.is_empty());
		assert_eq!(cursor.write_id, 9);
	}

	#[test]
	fn test_two_rows_become_two_records() {
		let _guard = flags::test_guard();
		flags::set_enable_single_record_update(true);

		let intents = [
			column_intent(1, 2, Value::Utf8("a".to_string()), 1, 1000),
			column_intent(2, 2, Value::Utf8("b".to_string()), 2, 1000),
		];
		let (records, _) = run_intents(&intents);

		assert_eq!(records.len(), 2);
		assert_eq!(records[0].op_id.write_id, 1);
		assert_eq!(records[1].op_id.write_id, 2);
	}

	#[test]
	fn splits_records_on_physical_time_change() {
		// Column updates of the same primary key at different physical
		// times belong to different logical records.
		let _guard = flags::test_guard();
		flags::set_enable_single_record_update(true);

		let intents = [
			column_intent(1, 2, Value::Utf8("a".to_string()), 1, 1000),
			column_intent(1, 3, Value::Int4(2), 2, 2000),
		];
		let (records, _) = run_intents(&intents);

		assert_eq!(records.len(), 2);
		assert_eq!(records[0].row.op_name(), "UPDATE");
		assert_eq!(records[1].row.op_name(), "UPDATE");
	}

	#[test]
	fn test_update_then_delete_same_key() {
		let _guard = flags::test_guard();
		flags::set_enable_single_record_update(true);

		let intents = [column_intent(1, 2, Value::Utf8("a".to_string()), 1, 1000), tombstone_intent(1, 2, 1000)];
		let (records, cursor) = run_intents(&intents);

		assert_eq!(records.len(), 2);
		assert_eq!(records[0].row.op_name(), "UPDATE");
		assert_eq!(records[1].row.op_name(), "DELETE");
		assert_eq!(cursor.write_id, 2);
	}

	#[test]
	fn test_primary_key_never_lands_in_column_tuples() {
		let _guard = flags::test_guard();
		flags::set_enable_single_record_update(true);

		let intents = [
			liveness_intent(1, 1, 1000),
			column_intent(1, 2, Value::Utf8("v".to_string()), 2, 1000),
			column_intent(1, 3, Value::Int4(1), 3, 1000),
		];
		let (records, _) = run_intents(&intents);

		let change = records[0].row.row_change().unwrap();
		// slot 0 is the key projection; the remaining slots must be
		// non-key columns only
		for datum in change.new_tuple.iter().skip(1) {
			assert_ne!(datum.column_name, "id");
		}
	}

	fn write_batch_message(pairs: Vec<tessera_core::interface::WritePair>) -> (ReplicatedMessage, WriteBatch) {
		let batch = WriteBatch {
			write_pairs: pairs,
			transaction: None,
		};
		let msg = ReplicatedMessage {
			op_id: OpId::new(1, 4),
			hybrid_time: HybridTime::from_micros(5000),
			op: tessera_core::interface::WalOp::Write(Some(batch.clone())),
		};
		(msg, batch)
	}

	fn write_pair(key: Vec<u8>, value: ValueEntry) -> tessera_core::interface::WritePair {
		tessera_core::interface::WritePair {
			key,
			value: value.encode(),
		}
	}

	#[test]
	fn test_write_batch_single_insert() {
		let (msg, batch) = write_batch_message(vec![
			write_pair(
				composite_key(&row_key(1), doc::KeyEntry::SystemColumnId(doc::LIVENESS_COLUMN_ID)),
				ValueEntry::null_low(),
			),
			write_pair(
				composite_key(&row_key(1), doc::KeyEntry::ColumnId(ColumnId(2))),
				ValueEntry::primitive(Value::Utf8("a".to_string())),
			),
			write_pair(
				composite_key(&row_key(1), doc::KeyEntry::ColumnId(ColumnId(3))),
				ValueEntry::primitive(Value::Int4(2)),
			),
		]);

		let tablet = TestTablet::new();
		let mut records = Vec::new();
		populate_write_records(&msg, &batch, &tablet, &EnumOidLabelMap::new(), &sample_schema(), &mut records)
			.unwrap();

		assert_eq!(records.len(), 1);
		let record = &records[0];
		assert_eq!(record.row.op_name(), "INSERT");
		assert_eq!(record.op_id.term, 1);
		assert_eq!(record.op_id.index, 4);
		assert_eq!(record.commit_time, Some(HybridTime::from_micros(5000)));

		let change = record.row.row_change().unwrap();
		assert_eq!(change.transaction_id, None);
		assert_eq!(change.new_tuple.len(), 3);
	}

	#[test]
	fn test_write_batch_delete() {
		let (msg, batch) = write_batch_message(vec![write_pair(row_key(7).encode(), ValueEntry::tombstone())]);

		let tablet = TestTablet::new();
		let mut records = Vec::new();
		populate_write_records(&msg, &batch, &tablet, &EnumOidLabelMap::new(), &sample_schema(), &mut records)
			.unwrap();

		assert_eq!(records.len(), 1);
		assert_eq!(records[0].row.op_name(), "DELETE");
	}

	#[test]
	fn test_write_batch_two_rows() {
		let (msg, batch) = write_batch_message(vec![
			write_pair(
				composite_key(&row_key(1), doc::KeyEntry::ColumnId(ColumnId(2))),
				ValueEntry::primitive(Value::Utf8("a".to_string())),
			),
			write_pair(
				composite_key(&row_key(2), doc::KeyEntry::ColumnId(ColumnId(2))),
				ValueEntry::primitive(Value::Utf8("b".to_string())),
			),
		]);

		let tablet = TestTablet::new();
		let mut records = Vec::new();
		populate_write_records(&msg, &batch, &tablet, &EnumOidLabelMap::new(), &sample_schema(), &mut records)
			.unwrap();

		assert_eq!(records.len(), 2);
		assert_eq!(records[0].row.op_name(), "UPDATE");
		assert_eq!(records[1].row.op_name(), "UPDATE");
	}

	#[test]
	fn test_write_batch_missing_selector_is_reported_and_skipped() {
		// a non-tombstone write pair without a column selector
		let (msg, batch) =
			write_batch_message(vec![write_pair(row_key(1).encode(), ValueEntry::primitive(Value::Int4(1)))]);

		let tablet = TestTablet::new();
		let mut records = Vec::new();
		let result =
			populate_write_records(&msg, &batch, &tablet, &EnumOidLabelMap::new(), &sample_schema(), &mut records);

		// classification falls through to UPDATE with no selector; the
		// column write is reported and skipped, producing an empty-column
		// record rather than an error
		assert!(result.is_ok());
		assert_eq!(records.len(), 1);
	}
}
