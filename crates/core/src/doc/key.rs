// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

use tessera_type::{Result, Value, diagnostic::codec, err};

use super::tag;
use crate::{
	ColumnId, TransactionId,
	encoding::keycode::{decode_bytes, decode_i32, decode_i64, decode_u16, decode_u32, encoded_bytes_len},
};

/// One typed component of a storage key: a primary-key value, a column
/// selector, or a sub-document member.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyEntry {
	NullLow,
	Int4(i32),
	Int8(i64),
	Utf8(String),
	Bytes(Vec<u8>),
	ColumnId(ColumnId),
	SystemColumnId(u32),
}

impl KeyEntry {
	/// Decode one entry, returning it and the bytes consumed. The caller
	/// has already established that the slice does not start a group end.
	pub fn decode(input: &[u8]) -> Result<(KeyEntry, usize)> {
		let Some(&entry_tag) = input.first() else {
			return err!(codec::truncated("key entry tag", 1, 0));
		};
		let payload = &input[1..];

		match entry_tag {
			tag::NULL_LOW => Ok((KeyEntry::NullLow, 1)),
			tag::INT4 => {
				let (value, consumed) = decode_i32(payload)?;
				Ok((KeyEntry::Int4(value), 1 + consumed))
			}
			tag::INT8 => {
				let (value, consumed) = decode_i64(payload)?;
				Ok((KeyEntry::Int8(value), 1 + consumed))
			}
			tag::UTF8 => {
				let (bytes, consumed) = decode_bytes(payload)?;
				let text = String::from_utf8(bytes).map_err(|_| {
					tessera_type::error!(codec::invalid_utf8("key entry"))
				})?;
				Ok((KeyEntry::Utf8(text), 1 + consumed))
			}
			tag::BYTES => {
				let (bytes, consumed) = decode_bytes(payload)?;
				Ok((KeyEntry::Bytes(bytes), 1 + consumed))
			}
			tag::COLUMN_ID => {
				let (id, consumed) = decode_u32(payload)?;
				Ok((KeyEntry::ColumnId(ColumnId(id)), 1 + consumed))
			}
			tag::SYSTEM_COLUMN_ID => {
				let (id, consumed) = decode_u32(payload)?;
				Ok((KeyEntry::SystemColumnId(id), 1 + consumed))
			}
			unknown => err!(codec::unknown_tag("key entry", unknown)),
		}
	}

	/// Bytes one entry occupies, without materialising it.
	fn encoded_len(input: &[u8]) -> Result<usize> {
		let Some(&entry_tag) = input.first() else {
			return err!(codec::truncated("key entry tag", 1, 0));
		};
		let payload = &input[1..];

		let payload_len = match entry_tag {
			tag::NULL_LOW => 0,
			tag::INT4 | tag::COLUMN_ID | tag::SYSTEM_COLUMN_ID => 4,
			tag::INT8 => 8,
			tag::UTF8 | tag::BYTES => encoded_bytes_len(payload)?,
			unknown => return err!(codec::unknown_tag("key entry", unknown)),
		};
		if payload.len() < payload_len {
			return err!(codec::truncated("key entry payload", payload_len, payload.len()));
		}
		Ok(1 + payload_len)
	}

	/// Decode the column selector that follows the primary-key prefix.
	/// Returns `None` when the suffix is empty (a whole-row key).
	pub fn decode_key(suffix: &[u8]) -> Result<Option<KeyEntry>> {
		if suffix.is_empty() {
			return Ok(None);
		}
		let (entry, _) = KeyEntry::decode(suffix)?;
		Ok(Some(entry))
	}

	pub fn encode_into(&self, output: &mut Vec<u8>) {
		use crate::encoding::keycode::{encode_bytes, encode_i32, encode_i64, encode_u32};

		match self {
			KeyEntry::NullLow => output.push(tag::NULL_LOW),
			KeyEntry::Int4(value) => {
				output.push(tag::INT4);
				output.extend_from_slice(&encode_i32(*value));
			}
			KeyEntry::Int8(value) => {
				output.push(tag::INT8);
				output.extend_from_slice(&encode_i64(*value));
			}
			KeyEntry::Utf8(text) => {
				output.push(tag::UTF8);
				encode_bytes(text.as_bytes(), output);
			}
			KeyEntry::Bytes(bytes) => {
				output.push(tag::BYTES);
				encode_bytes(bytes, output);
			}
			KeyEntry::ColumnId(id) => {
				output.push(tag::COLUMN_ID);
				output.extend_from_slice(&encode_u32(id.0));
			}
			KeyEntry::SystemColumnId(id) => {
				output.push(tag::SYSTEM_COLUMN_ID);
				output.extend_from_slice(&encode_u32(*id));
			}
		}
	}

	/// The primary-key projection of this entry.
	pub fn to_value(&self) -> Value {
		match self {
			KeyEntry::NullLow => Value::Undefined,
			KeyEntry::Int4(value) => Value::Int4(*value),
			KeyEntry::Int8(value) => Value::Int8(*value),
			KeyEntry::Utf8(text) => Value::Utf8(text.clone()),
			KeyEntry::Bytes(bytes) => Value::Bytes(bytes.clone()),
			KeyEntry::ColumnId(id) => Value::Int8(id.0 as i64),
			KeyEntry::SystemColumnId(id) => Value::Int8(*id as i64),
		}
	}
}

/// The primary key of a row: hashed components, then range components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocKey {
	pub hash: u16,
	pub hashed_group: Vec<KeyEntry>,
	pub range_group: Vec<KeyEntry>,
}

impl DocKey {
	pub fn range(range_group: Vec<KeyEntry>) -> Self {
		Self {
			hash: 0,
			hashed_group: Vec::new(),
			range_group,
		}
	}

	pub fn hashed(hash: u16, hashed_group: Vec<KeyEntry>, range_group: Vec<KeyEntry>) -> Self {
		Self {
			hash,
			hashed_group,
			range_group,
		}
	}

	/// Length of the encoded primary-key prefix inside a composite storage
	/// key. The remaining bytes form the column / sub-document suffix.
	pub fn encoded_size(key: &[u8]) -> Result<usize> {
		let mut offset = 0;

		if key.first() == Some(&tag::HASH) {
			let (_, consumed) = decode_u16(&key[1..])?;
			offset += 1 + consumed;
			offset += Self::skip_group(&key[offset..])?;
		}
		offset += Self::skip_group(&key[offset..])?;
		Ok(offset)
	}

	// Consumes entries up to and including the group terminator.
	fn skip_group(input: &[u8]) -> Result<usize> {
		let mut offset = 0;
		loop {
			match input.get(offset) {
				None => return err!(codec::truncated("key group terminator", offset + 1, input.len())),
				Some(&tag::GROUP_END) => return Ok(offset + 1),
				Some(_) => offset += KeyEntry::encoded_len(&input[offset..])?,
			}
		}
	}

	fn decode_group(input: &[u8]) -> Result<(Vec<KeyEntry>, usize)> {
		let mut entries = Vec::new();
		let mut offset = 0;
		loop {
			match input.get(offset) {
				None => return err!(codec::truncated("key group terminator", offset + 1, input.len())),
				Some(&tag::GROUP_END) => return Ok((entries, offset + 1)),
				Some(_) => {
					let (entry, consumed) = KeyEntry::decode(&input[offset..])?;
					entries.push(entry);
					offset += consumed;
				}
			}
		}
	}

	/// Decode the primary-key prefix, returning it and the bytes consumed.
	pub fn decode_prefix(key: &[u8]) -> Result<(DocKey, usize)> {
		let mut doc_key = DocKey::default();
		let mut offset = 0;

		if key.first() == Some(&tag::HASH) {
			let (hash, consumed) = decode_u16(&key[1..])?;
			doc_key.hash = hash;
			offset += 1 + consumed;

			let (hashed, consumed) = Self::decode_group(&key[offset..])?;
			doc_key.hashed_group = hashed;
			offset += consumed;
		}

		let (range, consumed) = Self::decode_group(&key[offset..])?;
		doc_key.range_group = range;
		offset += consumed;

		Ok((doc_key, offset))
	}

	pub fn encode_into(&self, output: &mut Vec<u8>) {
		use crate::encoding::keycode::encode_u16;

		if !self.hashed_group.is_empty() {
			output.push(tag::HASH);
			output.extend_from_slice(&encode_u16(self.hash));
			for entry in &self.hashed_group {
				entry.encode_into(output);
			}
			output.push(tag::GROUP_END);
		}
		for entry in &self.range_group {
			entry.encode_into(output);
		}
		output.push(tag::GROUP_END);
	}

	pub fn encode(&self) -> Vec<u8> {
		let mut output = Vec::new();
		self.encode_into(&mut output);
		output
	}
}

/// A full composite storage key: the row's [`DocKey`] plus any column or
/// sub-document components that follow it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubDocKey {
	pub doc_key: DocKey,
	pub sub_keys: Vec<KeyEntry>,
}

impl SubDocKey {
	pub fn decode_from(key: &[u8]) -> Result<SubDocKey> {
		let (doc_key, mut offset) = DocKey::decode_prefix(key)?;

		let mut sub_keys = Vec::new();
		while offset < key.len() {
			let (entry, consumed) = KeyEntry::decode(&key[offset..])?;
			sub_keys.push(entry);
			offset += consumed;
		}

		Ok(SubDocKey {
			doc_key,
			sub_keys,
		})
	}

	pub fn num_sub_keys(&self) -> usize {
		self.sub_keys.len()
	}

	pub fn encode(&self) -> Vec<u8> {
		let mut output = self.doc_key.encode();
		for entry in &self.sub_keys {
			entry.encode_into(&mut output);
		}
		output
	}
}

/// Recover the transaction id from a provisional-write reverse-index key.
pub fn decode_transaction_id(reverse_index_key: &[u8]) -> Result<TransactionId> {
	let Some(&first) = reverse_index_key.first() else {
		return err!(codec::invalid_transaction_id("key is empty"));
	};
	if first != tag::TRANSACTION_ID {
		return err!(codec::invalid_transaction_id(format!("unexpected prefix tag {:#04x}", first)));
	}
	let payload = &reverse_index_key[1..];
	if payload.len() < 16 {
		return err!(codec::invalid_transaction_id(format!("need 16 id bytes, have {}", payload.len())));
	}
	let mut bytes = [0u8; 16];
	bytes.copy_from_slice(&payload[..16]);
	Ok(TransactionId::from_bytes(bytes))
}

/// Prefix of every reverse-index key belonging to `transaction_id`.
pub fn encode_transaction_prefix(transaction_id: &TransactionId) -> Vec<u8> {
	let mut output = Vec::with_capacity(17);
	output.push(tag::TRANSACTION_ID);
	output.extend_from_slice(transaction_id.as_bytes());
	output
}
