// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

use serde::{Deserialize, Serialize};
use tessera_core::{
	ColumnSchema, HybridTime, IntraTxnWriteId, OpId, SchemaVersion, TableProperties, TransactionId, Type, Value,
};

/// Position stamped on every emitted record: log position plus, for records
/// produced from provisional writes, the intra-transaction cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOpId {
	pub term: i64,
	pub index: i64,
	pub write_id: IntraTxnWriteId,
	pub write_id_key: Vec<u8>,
}

impl RecordOpId {
	pub fn from_op_id(op_id: OpId) -> Self {
		Self {
			term: op_id.term,
			index: op_id.index,
			write_id: 0,
			write_id_key: Vec::new(),
		}
	}

	pub fn with_write_id(op_id: OpId, write_id: IntraTxnWriteId, write_id_key: Vec<u8>) -> Self {
		Self {
			term: op_id.term,
			index: op_id.index,
			write_id,
			write_id_key,
		}
	}
}

/// One column slot of a row record.
///
/// A populated slot carries the datum; an empty slot (nulls, types without
/// a PostgreSQL mapping, positional padding) carries at most the type oid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatumMessage {
	pub column_name: String,
	pub column_type: Option<u32>,
	pub value: Option<Value>,
}

/// Row payload of INSERT / UPDATE / DELETE / READ records.
///
/// `new_tuple` and `old_tuple` always have the same length: every push to
/// one side pushes an empty slot to the other to preserve positional
/// parity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowChange {
	/// Empty for non-transactional single-shard writes.
	pub transaction_id: Option<TransactionId>,
	pub new_tuple: Vec<DatumMessage>,
	pub old_tuple: Vec<DatumMessage>,
}

/// Column description carried by DDL records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
	pub name: String,
	pub ty: Type,
	pub is_key: bool,
	pub is_hash_key: bool,
	pub is_nullable: bool,
	pub oid: u32,
}

impl From<&ColumnSchema> for ColumnInfo {
	fn from(column: &ColumnSchema) -> Self {
		Self {
			name: column.name.clone(),
			ty: column.ty,
			is_key: column.is_key,
			is_hash_key: column.is_hash_key,
			is_nullable: column.is_nullable,
			oid: column.pg_type_oid,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdlInfo {
	pub column_info: Vec<ColumnInfo>,
	pub schema_version: SchemaVersion,
	pub table_properties: TableProperties,
	pub new_table_name: Option<String>,
}

/// The operation a record describes, with per-variant payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowMessage {
	Begin {
		transaction_id: TransactionId,
	},
	Commit {
		transaction_id: TransactionId,
	},
	Insert(RowChange),
	Update(RowChange),
	Delete(RowChange),
	Read(RowChange),
	Ddl(DdlInfo),
	Truncate,
}

impl RowMessage {
	pub fn op_name(&self) -> &'static str {
		match self {
			RowMessage::Begin { .. } => "BEGIN",
			RowMessage::Commit { .. } => "COMMIT",
			RowMessage::Insert(_) => "INSERT",
			RowMessage::Update(_) => "UPDATE",
			RowMessage::Delete(_) => "DELETE",
			RowMessage::Read(_) => "READ",
			RowMessage::Ddl(_) => "DDL",
			RowMessage::Truncate => "TRUNCATE",
		}
	}

	pub fn row_change(&self) -> Option<&RowChange> {
		match self {
			RowMessage::Insert(change) | RowMessage::Update(change) | RowMessage::Delete(change)
			| RowMessage::Read(change) => Some(change),
			_ => None,
		}
	}
}

/// A logical change record: shared envelope plus the operation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalRecord {
	pub op_id: RecordOpId,
	pub table: String,
	pub pg_schema_name: String,
	pub commit_time: Option<HybridTime>,
	pub row: RowMessage,
}

impl LogicalRecord {
	pub fn begin(transaction_id: TransactionId, table: String) -> Self {
		Self {
			op_id: RecordOpId::default(),
			table,
			pg_schema_name: String::new(),
			commit_time: None,
			row: RowMessage::Begin {
				transaction_id,
			},
		}
	}

	pub fn commit(transaction_id: TransactionId, table: String, op_id: OpId) -> Self {
		Self {
			op_id: RecordOpId::from_op_id(op_id),
			table,
			pg_schema_name: String::new(),
			commit_time: None,
			row: RowMessage::Commit {
				transaction_id,
			},
		}
	}

	pub fn schema_version(&self) -> Option<SchemaVersion> {
		match &self.row {
			RowMessage::Ddl(info) => Some(info.schema_version),
			_ => None,
		}
	}

	/// Rough heap footprint, for memory tracking of the response.
	pub fn approximate_size(&self) -> usize {
		let tuples = self.row.row_change().map_or(0, |change| {
			change.new_tuple.iter().chain(change.old_tuple.iter()).map(datum_size).sum()
		});
		std::mem::size_of::<LogicalRecord>() + self.table.len() + self.pg_schema_name.len() + tuples
	}
}

fn datum_size(datum: &DatumMessage) -> usize {
	let value_size = match &datum.value {
		Some(Value::Utf8(text)) => text.len(),
		Some(Value::Bytes(bytes)) => bytes.len(),
		_ => std::mem::size_of::<Value>(),
	};
	datum.column_name.len() + value_size
}
