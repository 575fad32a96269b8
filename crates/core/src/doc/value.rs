// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

use tessera_type::{Result, Value, diagnostic::codec, err};

use super::tag;
use crate::encoding::keycode::{decode_i64, encode_i64};

/// Optional metadata preceding a stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueControlFields {
	pub ttl_ms: Option<i64>,
}

impl ValueControlFields {
	/// Decode control fields, returning them and the bytes consumed.
	pub fn decode(input: &[u8]) -> Result<(ValueControlFields, usize)> {
		let mut fields = ValueControlFields::default();
		let mut offset = 0;

		while input.get(offset) == Some(&tag::TTL) {
			let (ttl_ms, consumed) = decode_i64(&input[offset + 1..])?;
			fields.ttl_ms = Some(ttl_ms);
			offset += 1 + consumed;
		}

		Ok((fields, offset))
	}

	pub fn encode_into(&self, output: &mut Vec<u8>) {
		if let Some(ttl_ms) = self.ttl_ms {
			output.push(tag::TTL);
			output.extend_from_slice(&encode_i64(ttl_ms));
		}
	}
}

/// The payload of a stored value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
	/// Deletion of the row or sub-document the key addresses.
	Tombstone,
	/// An explicitly stored null, also the liveness-marker payload.
	NullLow,
	/// A whole row packed into a single value.
	PackedRow(Vec<u8>),
	Primitive(Value),
}

/// A decoded storage value: control fields plus payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueEntry {
	pub control: ValueControlFields,
	pub kind: ValueKind,
}

impl ValueEntry {
	pub fn decode(input: &[u8]) -> Result<ValueEntry> {
		use crate::encoding::keycode::{decode_bytes, decode_i32, decode_u16, decode_u64};

		let (control, offset) = ValueControlFields::decode(input)?;
		let input = &input[offset..];

		let Some(&value_tag) = input.first() else {
			return err!(codec::truncated("value tag", 1, 0));
		};
		let payload = &input[1..];

		let (kind, consumed) = match value_tag {
			tag::TOMBSTONE => (ValueKind::Tombstone, 0),
			tag::NULL_LOW => (ValueKind::NullLow, 0),
			tag::PACKED_ROW => (ValueKind::PackedRow(payload.to_vec()), payload.len()),
			tag::BOOL_FALSE => (ValueKind::Primitive(Value::Bool(false)), 0),
			tag::BOOL_TRUE => (ValueKind::Primitive(Value::Bool(true)), 0),
			tag::INT2 => {
				let (raw, consumed) = decode_u16(payload)?;
				(ValueKind::Primitive(Value::Int2((raw ^ (1 << 15)) as i16)), consumed)
			}
			tag::INT4 => {
				let (value, consumed) = decode_i32(payload)?;
				(ValueKind::Primitive(Value::Int4(value)), consumed)
			}
			tag::INT8 => {
				let (value, consumed) = decode_i64(payload)?;
				(ValueKind::Primitive(Value::Int8(value)), consumed)
			}
			tag::FLOAT8 => {
				let (raw, consumed) = decode_u64(payload)?;
				(ValueKind::Primitive(Value::Float8(f64::from_bits(raw))), consumed)
			}
			tag::UTF8 => {
				let (bytes, consumed) = decode_bytes(payload)?;
				let text = String::from_utf8(bytes).map_err(|_| {
					tessera_type::error!(codec::invalid_utf8("value entry"))
				})?;
				(ValueKind::Primitive(Value::Utf8(text)), consumed)
			}
			tag::BYTES => {
				let (bytes, consumed) = decode_bytes(payload)?;
				(ValueKind::Primitive(Value::Bytes(bytes)), consumed)
			}
			unknown => return err!(codec::unknown_tag("value entry", unknown)),
		};

		if 1 + consumed != input.len() {
			return err!(codec::truncated("value entry", input.len(), 1 + consumed));
		}

		Ok(ValueEntry {
			control,
			kind,
		})
	}

	pub fn encode(&self) -> Vec<u8> {
		use crate::encoding::keycode::{encode_bytes, encode_i32, encode_u16, encode_u64};

		let mut output = Vec::new();
		self.control.encode_into(&mut output);

		match &self.kind {
			ValueKind::Tombstone => output.push(tag::TOMBSTONE),
			ValueKind::NullLow => output.push(tag::NULL_LOW),
			ValueKind::PackedRow(bytes) => {
				output.push(tag::PACKED_ROW);
				output.extend_from_slice(bytes);
			}
			ValueKind::Primitive(Value::Bool(false)) => output.push(tag::BOOL_FALSE),
			ValueKind::Primitive(Value::Bool(true)) => output.push(tag::BOOL_TRUE),
			ValueKind::Primitive(Value::Int2(value)) => {
				output.push(tag::INT2);
				output.extend_from_slice(&encode_u16((*value as u16) ^ (1 << 15)));
			}
			ValueKind::Primitive(Value::Int4(value)) => {
				output.push(tag::INT4);
				output.extend_from_slice(&encode_i32(*value));
			}
			ValueKind::Primitive(Value::Int8(value)) => {
				output.push(tag::INT8);
				output.extend_from_slice(&encode_i64(*value));
			}
			ValueKind::Primitive(Value::Float8(value)) => {
				output.push(tag::FLOAT8);
				output.extend_from_slice(&encode_u64(value.to_bits()));
			}
			ValueKind::Primitive(Value::Utf8(text)) => {
				output.push(tag::UTF8);
				encode_bytes(text.as_bytes(), &mut output);
			}
			ValueKind::Primitive(Value::Bytes(bytes)) => {
				output.push(tag::BYTES);
				encode_bytes(bytes, &mut output);
			}
			ValueKind::Primitive(Value::Undefined) => output.push(tag::NULL_LOW),
		}

		output
	}

	pub fn tombstone() -> Self {
		Self {
			control: ValueControlFields::default(),
			kind: ValueKind::Tombstone,
		}
	}

	pub fn null_low() -> Self {
		Self {
			control: ValueControlFields::default(),
			kind: ValueKind::NullLow,
		}
	}

	pub fn primitive(value: Value) -> Self {
		Self {
			control: ValueControlFields::default(),
			kind: ValueKind::Primitive(value),
		}
	}

	pub fn is_tombstone(&self) -> bool {
		matches!(self.kind, ValueKind::Tombstone)
	}

	pub fn is_null_low(&self) -> bool {
		matches!(self.kind, ValueKind::NullLow)
	}

	/// The column datum this value carries, if any.
	pub fn primitive_value(&self) -> Value {
		match &self.kind {
			ValueKind::Primitive(value) => value.clone(),
			_ => Value::Undefined,
		}
	}
}
