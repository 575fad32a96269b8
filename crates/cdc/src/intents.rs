// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

//! Replay of a transaction's provisional writes.
//!
//! Entered when an apply record is seen in the log, or when resuming a
//! drain that a previous call suspended mid-transaction. BEGIN is emitted
//! only on a fresh entry, COMMIT only when the drain completes; in
//! between, the checkpoint carries the intent-store continuation.

use tessera_core::{
	OpId, TransactionId,
	interface::{CatalogClient, IntentStreamState, TabletRuntime},
};
use tessera_type::{Result, diagnostic::cdc, return_error};
use tracing::{debug, error};

use crate::{
	assembler::{AssembledCursor, populate_intent_records},
	checkpoint::Checkpoint,
	datum::EnumOidLabelMap,
	mem::ScopedTrackedConsumption,
	record::LogicalRecord,
	schema::SchemaCache,
};

/// Drain one bounded batch of the transaction's provisional writes,
/// emitting BEGIN / row records / COMMIT as the gates allow. Returns the
/// runtime's continuation state; the checkpoint is stamped with it unless
/// the drain completed.
#[allow(clippy::too_many_arguments)]
pub(crate) fn process_intents(
	op_id: OpId,
	transaction_id: TransactionId,
	stream_state: &IntentStreamState,
	tablet: &dyn TabletRuntime,
	catalog: &dyn CatalogClient,
	enum_oid_label_map: &EnumOidLabelMap,
	schema_cache: &mut SchemaCache,
	consumption: &mut ScopedTrackedConsumption,
	records: &mut Vec<LogicalRecord>,
	checkpoint: &mut Checkpoint,
) -> Result<IntentStreamState> {
	let table_name = tablet.table_name().to_string();

	if stream_state.is_complete() {
		records.push(LogicalRecord::begin(transaction_id, table_name.clone()));
	}

	let batch = tablet.next_intent_batch(transaction_id, stream_state)?;

	let retention_checkpoint = tablet.latest_retention_checkpoint();
	if batch.intents.is_empty() && op_id <= retention_checkpoint {
		error!(
			transaction = %transaction_id,
			tablet = %tablet.tablet_id(),
			%op_id,
			%retention_checkpoint,
			"apply record is behind the retention checkpoint, the intents were already removed from the intent store"
		);
		return_error!(cdc::intents_already_gced(&transaction_id.to_string(), tablet.tablet_id()));
	}

	if let Some(first) = batch.intents.first() {
		let schema = schema_cache.maybe_load(catalog, tablet, first.intent_time);
		let mut cursor = AssembledCursor::default();
		populate_intent_records(
			op_id,
			&transaction_id,
			&batch.intents,
			tablet,
			enum_oid_label_map,
			&schema,
			consumption,
			records,
			&mut cursor,
		)?;
	}

	checkpoint.set_term_index(op_id.term, op_id.index);

	if batch.continuation.is_complete() {
		records.push(LogicalRecord::commit(transaction_id, table_name, op_id));
		checkpoint.set_key_write_id(Vec::new(), 0);
	} else {
		debug!(
			transaction = %transaction_id,
			write_id = batch.continuation.write_id,
			"suspending intent replay mid-transaction"
		);
		checkpoint.set_key_write_id(batch.continuation.key.clone(), batch.continuation.write_id);
	}

	Ok(batch.continuation)
}
