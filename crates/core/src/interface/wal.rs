// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

//! The replicated-log message model the producer consumes.
//!
//! Payloads mirror the wire messages and are therefore optional where the
//! wire makes them optional; the producer validates presence where an
//! operation type requires its payload.

use crate::{HybridTime, OpId, SchemaVersion, TableId, TableSchema, TabletId, TransactionId};

/// One entry of a tablet's replicated log, as handed out by
/// [`super::ConsensusLog::read_replicated_messages_for_cdc`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicatedMessage {
	pub op_id: OpId,
	pub hybrid_time: HybridTime,
	pub op: WalOp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WalOp {
	Write(Option<WriteBatch>),
	UpdateTransaction(Option<TransactionState>),
	ChangeMetadata(Option<ChangeMetadataRequest>),
	Truncate(Option<TruncateRequest>),
	Split(Option<SplitRequest>),
	/// Any operation the producer does not act on (leader no-ops, history
	/// cutoff updates, ...).
	NoOp,
}

/// One per-column key/value write inside a write batch.
#[derive(Debug, Clone, PartialEq)]
pub struct WritePair {
	pub key: Vec<u8>,
	pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteBatch {
	pub write_pairs: Vec<WritePair>,
	/// Present iff the write runs inside a distributed transaction, in
	/// which case its effects surface later through intent replay.
	pub transaction: Option<TransactionMetadata>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionMetadata {
	pub transaction_id: TransactionId,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
	Created,
	Pending,
	Committed,
	Aborted,
	Applying,
	Applied,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionState {
	pub transaction_id: TransactionId,
	pub status: TransactionStatus,
	pub commit_hybrid_time: HybridTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeMetadataRequest {
	pub schema: TableSchema,
	pub schema_version: SchemaVersion,
	pub new_table_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TruncateRequest {
	pub table_id: TableId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitRequest {
	pub tablet_id: TabletId,
}
