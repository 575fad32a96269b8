// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

//! The CDC producer core.
//!
//! [`get_changes`] streams an ordered sequence of logical row-change
//! records for one tablet replica, resuming from a caller-supplied
//! [`Checkpoint`]. Three record sources sit behind the one cursor: a
//! bootstrap snapshot scan, replay of the replicated log, and replay of
//! provisional writes when a transaction applies.

mod assembler;
mod checkpoint;
mod datum;
pub mod flags;
mod intents;
mod mem;
mod metadata;
mod producer;
mod record;
mod schema;
mod snapshot;

pub use checkpoint::{Checkpoint, SNAPSHOT_WRITE_ID};
pub use datum::EnumOidLabelMap;
pub use mem::{MemTracker, ScopedTrackedConsumption};
pub use metadata::{RefreshStreamMapOption, StreamMetadata, StreamTabletMetadata, TabletApplySafeTime};
pub use producer::{GetChangesParams, GetChangesResponse, MessagesHolder, get_changes};
pub use record::{ColumnInfo, DatumMessage, DdlInfo, LogicalRecord, RecordOpId, RowChange, RowMessage};
pub use schema::SchemaCache;
