// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

use serde::{Deserialize, Serialize};
use tessera_type::{Result, Type, internal_error};

use crate::{ColumnId, TableId};

/// One column of a table schema.
///
/// Key columns (hashed, then range) come first in declaration order;
/// `pg_type_oid == 0` marks a type with no PostgreSQL mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
	pub id: ColumnId,
	pub name: String,
	pub ty: Type,
	pub pg_type_oid: u32,
	pub is_key: bool,
	pub is_hash_key: bool,
	pub is_nullable: bool,
}

impl ColumnSchema {
	pub fn key(id: u32, name: impl Into<String>, ty: Type, pg_type_oid: u32) -> Self {
		Self {
			id: ColumnId(id),
			name: name.into(),
			ty,
			pg_type_oid,
			is_key: true,
			is_hash_key: false,
			is_nullable: false,
		}
	}

	pub fn hash_key(id: u32, name: impl Into<String>, ty: Type, pg_type_oid: u32) -> Self {
		Self {
			is_hash_key: true,
			..Self::key(id, name, ty, pg_type_oid)
		}
	}

	pub fn regular(id: u32, name: impl Into<String>, ty: Type, pg_type_oid: u32) -> Self {
		Self {
			id: ColumnId(id),
			name: name.into(),
			ty,
			pg_type_oid,
			is_key: false,
			is_hash_key: false,
			is_nullable: true,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableProperties {
	pub default_time_to_live_ms: i64,
	pub num_tablets: u32,
	pub is_ysql_catalog_table: bool,
}

/// A table schema at one point in its version history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
	pub table_id: TableId,
	pub name: String,
	pub pg_schema_name: String,
	pub columns: Vec<ColumnSchema>,
	pub properties: TableProperties,
}

impl TableSchema {
	pub fn new(
		table_id: TableId,
		name: impl Into<String>,
		pg_schema_name: impl Into<String>,
		columns: Vec<ColumnSchema>,
	) -> Self {
		Self {
			table_id,
			name: name.into(),
			pg_schema_name: pg_schema_name.into(),
			columns,
			properties: TableProperties::default(),
		}
	}

	pub fn num_columns(&self) -> usize {
		self.columns.len()
	}

	pub fn num_key_columns(&self) -> usize {
		self.columns.iter().filter(|column| column.is_key).count()
	}

	pub fn column(&self, index: usize) -> Result<&ColumnSchema> {
		self.columns.get(index).ok_or_else(|| {
			tessera_type::error!(internal_error!("column index {} out of range for table {}", index, self.name))
		})
	}

	pub fn column_by_id(&self, id: ColumnId) -> Result<&ColumnSchema> {
		self.columns.iter().find(|column| column.id == id).ok_or_else(|| {
			tessera_type::error!(internal_error!("no column with id {} in table {}", id, self.name))
		})
	}

	pub fn is_key_column(&self, id: ColumnId) -> bool {
		self.columns.iter().any(|column| column.id == id && column.is_key)
	}
}
