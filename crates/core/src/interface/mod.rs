// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

mod catalog;
mod tablet;
mod wal;

pub use catalog::{
	CatalogClient, CdcCheckpointType, CdcRecordFormat, CdcRecordType, CdcSourceType, StreamInfo, StreamState,
	TabletLocation,
};
pub use tablet::{
	ConsensusLog, IntentBatch, IntentKeyValue, IntentStreamState, ReadMessagesBatch, SnapshotIterator, SnapshotRow,
	TabletRuntime,
};
pub use wal::{
	ChangeMetadataRequest, ReplicatedMessage, SplitRequest, TransactionMetadata, TransactionState, TransactionStatus,
	TruncateRequest, WalOp, WriteBatch, WritePair,
};
