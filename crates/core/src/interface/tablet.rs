// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

use std::{sync::Arc, time::Duration, time::Instant};

use tessera_type::{Result, Value};

use super::ReplicatedMessage;
use crate::{ColumnId, HybridTime, IntraTxnWriteId, OpId, SchemaVersion, TableId, TableSchema, TabletId, TransactionId};

/// A batch of replicated messages read for CDC, plus how many bytes had to
/// be fetched from disk (memory-tracking input).
#[derive(Debug, Default)]
pub struct ReadMessagesBatch {
	pub messages: Vec<Arc<ReplicatedMessage>>,
	pub read_from_disk_size: usize,
}

/// One provisional write of a transaction, in intent-store order.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentKeyValue {
	/// Composite storage key (doc key + column suffix).
	pub key: Vec<u8>,
	pub value: Vec<u8>,
	pub write_id: IntraTxnWriteId,
	pub reverse_index_key: Vec<u8>,
	/// Hybrid time the intent was written at.
	pub intent_time: HybridTime,
}

/// Resumable position inside one transaction's provisional writes.
///
/// `(key, write_id) == ("", 0)` means the drain has not started or has
/// finished; anything else is a mid-transaction continuation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentStreamState {
	pub key: Vec<u8>,
	pub write_id: IntraTxnWriteId,
}

impl IntentStreamState {
	pub fn new(key: Vec<u8>, write_id: IntraTxnWriteId) -> Self {
		Self {
			key,
			write_id,
		}
	}

	pub fn is_complete(&self) -> bool {
		self.key.is_empty() && self.write_id == 0
	}
}

/// A bounded slice of a transaction's provisional writes plus the position
/// to resume from.
#[derive(Debug, Default)]
pub struct IntentBatch {
	pub intents: Vec<IntentKeyValue>,
	pub continuation: IntentStreamState,
}

/// A row materialised by the snapshot iterator.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRow {
	columns: Vec<(ColumnId, Value)>,
}

impl SnapshotRow {
	pub fn new(columns: Vec<(ColumnId, Value)>) -> Self {
		Self {
			columns,
		}
	}

	pub fn get(&self, id: ColumnId) -> Option<&Value> {
		self.columns.iter().find(|(column_id, _)| *column_id == id).map(|(_, value)| value)
	}
}

/// Read-time-pinned iterator over a table's rows in key order.
pub trait SnapshotIterator {
	fn next_row(&mut self) -> Result<Option<SnapshotRow>>;

	/// Encoded key of the next row to read; empty once exhausted. Valid
	/// after iteration stopped, used as the snapshot continuation key.
	fn next_read_key(&mut self) -> Result<Vec<u8>>;
}

/// The consensus log of one tablet replica.
pub trait ConsensusLog: Send + Sync {
	/// Read replicated messages after `from`, bounded by
	/// `last_readable_opid_index` and `deadline`.
	fn read_replicated_messages_for_cdc(
		&self,
		from: OpId,
		last_readable_opid_index: Option<i64>,
		deadline: Instant,
	) -> Result<ReadMessagesBatch>;

	/// Record the position up to which a CDC consumer has read, so log
	/// retention will not overtake it.
	fn update_consumer_op_id(&self, op_id: OpId);
}

/// The tablet replica a `get_changes` call reads from. Borrowed for the
/// duration of a single call; the producer never owns the tablet.
pub trait TabletRuntime: Send + Sync {
	fn tablet_id(&self) -> &TabletId;

	fn table_id(&self) -> &TableId;

	fn table_name(&self) -> &str;

	/// All logical tables sharing this tablet, `(id, name)` pairs. For a
	/// non-colocated tablet this is just the tablet's own table.
	fn colocated_tables(&self) -> Vec<(TableId, String)>;

	/// The currently mounted schema, the fallback when catalog lookups
	/// fail.
	fn current_schema(&self) -> (TableSchema, SchemaVersion);

	/// Whether distributed transactions can be applied on this tablet.
	fn has_transaction_participant(&self) -> bool;

	/// The last fully applied position and its hybrid time.
	fn last_replicated_data(&self) -> Result<(OpId, HybridTime)>;

	/// Extend the provisional-write retention lease for a consumer
	/// checkpointed at `op_id`.
	fn set_intent_retention(&self, op_id: OpId, retention: Duration);

	/// The position up to which provisional writes may already have been
	/// garbage collected.
	fn latest_retention_checkpoint(&self) -> OpId;

	/// Next bounded batch of the transaction's provisional writes in
	/// ascending `(reverse_index_key, write_id)` order, starting at
	/// `state`.
	fn next_intent_batch(&self, transaction_id: TransactionId, state: &IntentStreamState) -> Result<IntentBatch>;

	/// A read-time-pinned iterator over the table, starting at
	/// `start_key` (empty = table start).
	fn create_snapshot_iterator(
		&self,
		read_time: HybridTime,
		start_key: &[u8],
	) -> Result<Box<dyn SnapshotIterator + '_>>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_intent_stream_state_complete() {
		assert!(IntentStreamState::default().is_complete());
		assert!(!IntentStreamState::new(vec![1], 0).is_complete());
		assert!(!IntentStreamState::new(vec![], 3).is_complete());
	}

	#[test]
	fn test_snapshot_row_lookup() {
		let row = SnapshotRow::new(vec![(ColumnId(1), Value::Int4(5))]);
		assert_eq!(row.get(ColumnId(1)), Some(&Value::Int4(5)));
		assert_eq!(row.get(ColumnId(2)), None);
	}
}
