// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

//! Decoding of the tablet storage format.
//!
//! A row is stored as per-column key/value pairs. The key is a composite:
//! the encoded [`DocKey`] (hashed then range primary-key components), then
//! an optional column selector, then further sub-document components. The
//! value is a tagged primitive with optional control-field prefix.
//!
//! Everything here is a pure function over byte slices. Failures always
//! carry the corruption code: these bytes came from storage and must
//! decode.

mod key;
mod value;

pub use key::{DocKey, KeyEntry, SubDocKey, decode_transaction_id, encode_transaction_prefix};
pub use value::{ValueControlFields, ValueEntry, ValueKind};

/// Column id of the liveness system column: a null write to it proves a
/// row's existence when no regular column carries data.
pub const LIVENESS_COLUMN_ID: u32 = 0;

/// Tag bytes of the storage encoding. Key tags and value tags are separate
/// namespaces; a handful of primitives share their tag across both.
pub(crate) mod tag {
	pub const NULL_LOW: u8 = 0x00;
	pub const HASH: u8 = 0x10;
	pub const GROUP_END: u8 = 0x21;
	pub const INT2: u8 = 0x22;
	pub const INT4: u8 = 0x24;
	pub const INT8: u8 = 0x28;
	pub const UTF8: u8 = 0x32;
	pub const BYTES: u8 = 0x34;
	pub const BOOL_FALSE: u8 = 0x41;
	pub const BOOL_TRUE: u8 = 0x42;
	pub const FLOAT8: u8 = 0x44;
	pub const COLUMN_ID: u8 = 0x4b;
	pub const PACKED_ROW: u8 = 0x50;
	pub const SYSTEM_COLUMN_ID: u8 = 0x53;
	pub const TRANSACTION_ID: u8 = 0x54;
	pub const TOMBSTONE: u8 = 0x58;
	pub const TTL: u8 = 0x74;
}
