// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

use serde::{Deserialize, Serialize};
use tessera_core::{IntraTxnWriteId, OpId};

/// `write_id` sentinel that puts the cursor into snapshot mode.
pub const SNAPSHOT_WRITE_ID: IntraTxnWriteId = -1;

/// The opaque resumable cursor surfaced to callers.
///
/// Valid states:
/// * snapshot bootstrap: `write_id == -1`, empty `key`, `snapshot_time == 0`
/// * snapshot mid-flight: `write_id == -1`, non-empty `key`, pinned
///   `snapshot_time`
/// * log mode: `write_id == 0`, empty `key`, `snapshot_time == 0`
/// * intent mid-flight: `write_id > 0`, `key` holds the reverse-index
///   continuation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
	pub term: i64,
	pub index: i64,
	pub write_id: IntraTxnWriteId,
	pub key: Vec<u8>,
	pub snapshot_time: u64,
}

impl Checkpoint {
	pub fn new(term: i64, index: i64, write_id: IntraTxnWriteId, key: Vec<u8>, snapshot_time: u64) -> Self {
		Self {
			term,
			index,
			write_id,
			key,
			snapshot_time,
		}
	}

	/// Log-mode cursor at `op_id`.
	pub fn from_op_id(op_id: OpId) -> Self {
		Self::new(op_id.term, op_id.index, 0, Vec::new(), 0)
	}

	/// The caller-supplied cursor requesting a bootstrap snapshot.
	pub fn snapshot_start() -> Self {
		Self::new(0, 0, SNAPSHOT_WRITE_ID, Vec::new(), 0)
	}

	pub fn op_id(&self) -> OpId {
		OpId::new(self.term, self.index)
	}

	pub fn is_snapshot_mode(&self) -> bool {
		self.write_id == SNAPSHOT_WRITE_ID
	}

	/// First snapshot call: the read time has not been pinned yet.
	pub fn is_snapshot_bootstrap(&self) -> bool {
		self.is_snapshot_mode() && self.key.is_empty() && self.snapshot_time == 0
	}

	/// Mid-transaction intent replay continuation.
	pub fn is_intent_resume(&self) -> bool {
		!self.is_snapshot_mode() && self.write_id != 0 && !self.key.is_empty()
	}

	pub fn set_term_index(&mut self, term: i64, index: i64) {
		self.term = term;
		self.index = index;
	}

	pub fn set_key_write_id(&mut self, key: Vec<u8>, write_id: IntraTxnWriteId) {
		self.key = key;
		self.write_id = write_id;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_snapshot_states() {
		let bootstrap = Checkpoint::snapshot_start();
		assert!(bootstrap.is_snapshot_mode());
		assert!(bootstrap.is_snapshot_bootstrap());

		let mid_flight = Checkpoint::new(3, 10, SNAPSHOT_WRITE_ID, vec![1, 2], 77);
		assert!(mid_flight.is_snapshot_mode());
		assert!(!mid_flight.is_snapshot_bootstrap());
	}

	#[test]
	fn test_log_mode() {
		let checkpoint = Checkpoint::from_op_id(OpId::new(2, 9));
		assert!(!checkpoint.is_snapshot_mode());
		assert!(!checkpoint.is_intent_resume());
		assert_eq!(checkpoint.op_id(), OpId::new(2, 9));
	}

	#[test]
	fn test_intent_resume() {
		let checkpoint = Checkpoint::new(3, 100, 6, vec![0x54, 1], 0);
		assert!(checkpoint.is_intent_resume());

		// snapshot mode never counts as an intent continuation
		let snapshot = Checkpoint::new(3, 100, SNAPSHOT_WRITE_ID, vec![1], 9);
		assert!(!snapshot.is_intent_resume());
	}
}
