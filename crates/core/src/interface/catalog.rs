// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

use serde::{Deserialize, Serialize};
use tessera_type::Result;

use crate::{HybridTime, NamespaceId, SchemaVersion, StreamId, TableId, TableSchema, TabletId};

/// What a stream's records carry for updated rows.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CdcRecordType {
	Change,
	After,
	All,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CdcRecordFormat {
	Json,
	Proto,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CdcSourceType {
	XCluster,
	CdcSdk,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CdcCheckpointType {
	Implicit,
	Explicit,
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamState {
	Initiated = 0,
	Active = 1,
	Deleting = 2,
	Deleted = 3,
}

impl StreamState {
	pub fn from_u8(value: u8) -> StreamState {
		match value {
			0 => StreamState::Initiated,
			1 => StreamState::Active,
			2 => StreamState::Deleting,
			_ => StreamState::Deleted,
		}
	}
}

/// Stream definition as stored by the catalog manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
	pub namespace_id: NamespaceId,
	pub table_ids: Vec<TableId>,
	pub record_type: CdcRecordType,
	pub record_format: CdcRecordFormat,
	pub source_type: CdcSourceType,
	pub checkpoint_type: CdcCheckpointType,
	pub transactional: bool,
	pub state: StreamState,
}

/// Location of one tablet of a table, as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabletLocation {
	pub tablet_id: TabletId,
	pub split_parent_tablet_id: Option<TabletId>,
}

/// Client to the catalog manager.
pub trait CatalogClient: Send + Sync {
	/// The schema of `table_id` in effect at `read_time`.
	fn schema_at(&self, table_id: &TableId, read_time: HybridTime) -> Result<(TableSchema, SchemaVersion)>;

	/// All tablets of `table_id`, including inactive (split parent)
	/// tablets.
	fn tablet_locations(&self, table_id: &TableId) -> Result<Vec<TabletLocation>>;

	/// Stream definition lookup for the metadata cache loader.
	fn stream_info(&self, stream_id: &StreamId) -> Result<StreamInfo>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_stream_state_round_trip() {
		for state in [StreamState::Initiated, StreamState::Active, StreamState::Deleting, StreamState::Deleted] {
			assert_eq!(StreamState::from_u8(state as u8), state);
		}
	}
}
