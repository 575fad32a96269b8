// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

mod common;
pub mod doc;
pub mod encoding;
pub mod interface;

mod catalog;

pub use catalog::{ColumnSchema, TableProperties, TableSchema};
pub use common::{
	ColumnId, EncodedKey, HybridTime, IntraTxnWriteId, NamespaceId, OpId, SchemaVersion, StreamId, TableId, TabletId,
	TransactionId,
};
pub use tessera_type::{CowVec, Error, Result, Type, Value, diagnostic};
