// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

use std::collections::HashMap;

use tessera_core::{ColumnSchema, Value};

use crate::record::DatumMessage;

/// Maps an enum value oid to its label, so enum-typed columns stream their
/// textual value instead of the raw oid.
pub type EnumOidLabelMap = HashMap<u32, String>;

/// Convert a typed storage value into the caller-visible datum for
/// PostgreSQL-compatible types.
///
/// Enum columns store the value's oid; it is replaced by its label where
/// the map knows it, and rendered as text otherwise.
pub fn set_value_from_ql_binary(value: &Value, pg_type_oid: u32, enum_oid_label_map: &EnumOidLabelMap) -> Value {
	let stored_oid = match value {
		Value::Int4(oid) if *oid >= 0 => Some(*oid as u32),
		Value::Int8(oid) if *oid >= 0 => Some(*oid as u32),
		_ => None,
	};

	if enum_oid_label_map.contains_key(&pg_type_oid) {
		return match stored_oid.and_then(|oid| enum_oid_label_map.get(&oid)) {
			Some(label) => Value::Utf8(label.clone()),
			None => Value::Utf8(value.to_string()),
		};
	}

	value.clone()
}

/// Build the datum for one column slot.
///
/// When the value is absent or the column's type has no PostgreSQL oid,
/// only the column name and type are reported.
pub fn column_datum(column: &ColumnSchema, value: &Value, enum_oid_label_map: &EnumOidLabelMap) -> DatumMessage {
	if !value.is_undefined() && column.pg_type_oid != 0 {
		DatumMessage {
			column_name: column.name.clone(),
			column_type: Some(column.pg_type_oid),
			value: Some(set_value_from_ql_binary(value, column.pg_type_oid, enum_oid_label_map)),
		}
	} else {
		DatumMessage {
			column_name: column.name.clone(),
			column_type: Some(column.pg_type_oid),
			value: None,
		}
	}
}

#[cfg(test)]
mod tests {
	use tessera_core::Type;

	use super::*;

	#[test]
	fn test_plain_value_passes_through() {
		let converted = set_value_from_ql_binary(&Value::Int4(7), 23, &EnumOidLabelMap::new());
		assert_eq!(converted, Value::Int4(7));
	}

	#[test]
	fn test_enum_oid_maps_to_label() {
		let mut map = EnumOidLabelMap::new();
		map.insert(16384, "enum_type".to_string());
		map.insert(16385, "red".to_string());

		let converted = set_value_from_ql_binary(&Value::Int4(16385), 16384, &map);
		assert_eq!(converted, Value::Utf8("red".to_string()));
	}

	#[test]
	fn test_unmapped_enum_value_renders_as_text() {
		let mut map = EnumOidLabelMap::new();
		map.insert(16384, "enum_type".to_string());

		let converted = set_value_from_ql_binary(&Value::Int4(99), 16384, &map);
		assert_eq!(converted, Value::Utf8("99".to_string()));
	}

	#[test]
	fn test_column_datum_with_value() {
		let column = ColumnSchema::regular(2, "item", Type::Utf8, 25);
		let datum = column_datum(&column, &Value::Utf8("a".to_string()), &EnumOidLabelMap::new());

		assert_eq!(datum.column_name, "item");
		assert_eq!(datum.value, Some(Value::Utf8("a".to_string())));
	}

	#[test]
	fn test_column_datum_without_pg_oid_reports_type_only() {
		let column = ColumnSchema::regular(2, "internal", Type::Bytes, 0);
		let datum = column_datum(&column, &Value::Bytes(vec![1]), &EnumOidLabelMap::new());

		assert_eq!(datum.column_type, Some(0));
		assert_eq!(datum.value, None);
	}

	#[test]
	fn test_column_datum_null_reports_type_only() {
		let column = ColumnSchema::regular(3, "quantity", Type::Int4, 23);
		let datum = column_datum(&column, &Value::Undefined, &EnumOidLabelMap::new());
		assert_eq!(datum.value, None);
	}
}
