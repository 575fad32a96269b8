// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

use std::{
	fmt::{self, Display, Formatter},
	ops::Deref,
};

use serde::{Deserialize, Serialize};
use tessera_type::CowVec;

/// An encoded storage key.
pub type EncodedKey = CowVec<u8>;

/// Cursor position inside a single transaction's provisional writes.
pub type IntraTxnWriteId = i32;

/// Globally unique transaction identifier.
pub type TransactionId = uuid::Uuid;

/// The consistency clock: physical microseconds since epoch in the upper
/// bits, a logical counter in the lower [`HybridTime::LOGICAL_BITS`] bits.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HybridTime(pub u64);

impl HybridTime {
	pub const LOGICAL_BITS: u32 = 12;

	pub const MIN: HybridTime = HybridTime(0);
	/// Upper bound, also used as the "latest possible" read time.
	pub const MAX: HybridTime = HybridTime(u64::MAX);

	pub fn from_micros(micros: u64) -> Self {
		Self(micros << Self::LOGICAL_BITS)
	}

	pub fn physical_micros(&self) -> u64 {
		self.0 >> Self::LOGICAL_BITS
	}

	pub fn to_u64(&self) -> u64 {
		self.0
	}

	pub fn from_u64(value: u64) -> Self {
		Self(value)
	}
}

impl Display for HybridTime {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{{ physical: {} logical: {} }}", self.physical_micros(), self.0 & ((1 << Self::LOGICAL_BITS) - 1))
	}
}

/// Identifies one entry in a tablet's replicated log.
///
/// Totally ordered by `(term, index)`; [`OpId::invalid`] sorts below every
/// valid id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OpId {
	pub term: i64,
	pub index: i64,
}

impl OpId {
	pub fn new(term: i64, index: i64) -> Self {
		Self {
			term,
			index,
		}
	}

	/// Sentinel below all valid ids.
	pub fn invalid() -> Self {
		Self {
			term: -1,
			index: -1,
		}
	}

	pub fn min() -> Self {
		Self {
			term: 0,
			index: 0,
		}
	}

	pub fn is_valid(&self) -> bool {
		self.term >= 0 && self.index >= 0
	}
}

impl Default for OpId {
	fn default() -> Self {
		Self::min()
	}
}

impl Display for OpId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}", self.term, self.index)
	}
}

/// Version of a table schema as tracked by the catalog.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Default, PartialOrd, PartialEq, Ord, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaVersion(pub u32);

impl Deref for SchemaVersion {
	type Target = u32;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl Display for SchemaVersion {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		Display::fmt(&self.0, f)
	}
}

/// Identifies a column within a table schema.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq, Ord, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnId(pub u32);

impl Deref for ColumnId {
	type Target = u32;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl Display for ColumnId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		Display::fmt(&self.0, f)
	}
}

macro_rules! entity_id {
	($(#[$doc:meta])* $name:ident) => {
		$(#[$doc])*
		#[derive(Debug, Clone, Default, PartialOrd, PartialEq, Ord, Eq, Hash, Serialize, Deserialize)]
		pub struct $name(pub String);

		impl $name {
			pub fn new(id: impl Into<String>) -> Self {
				Self(id.into())
			}

			pub fn as_str(&self) -> &str {
				&self.0
			}
		}

		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}

		impl Display for $name {
			fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
				Display::fmt(&self.0, f)
			}
		}

		impl From<&str> for $name {
			fn from(id: &str) -> Self {
				Self(id.to_string())
			}
		}
	};
}

entity_id! {
	/// Identifies one shard of a table.
	TabletId
}

entity_id! {
	/// Identifies a logical table across all of its tablets.
	TableId
}

entity_id! {
	/// Identifies a database namespace.
	NamespaceId
}

entity_id! {
	/// Identifies a CDC stream.
	StreamId
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_hybrid_time_round_trip() {
		let ht = HybridTime::from_micros(1_700_000_000_000_000);
		assert_eq!(ht.physical_micros(), 1_700_000_000_000_000);
	}

	#[test]
	fn test_hybrid_time_logical_bits_do_not_leak() {
		let ht = HybridTime(HybridTime::from_micros(42).0 | 0xfff);
		assert_eq!(ht.physical_micros(), 42);
	}

	#[test]
	fn test_op_id_ordering() {
		assert!(OpId::new(1, 5) < OpId::new(2, 0));
		assert!(OpId::new(2, 3) < OpId::new(2, 4));
		assert!(OpId::invalid() < OpId::min());
	}

	#[test]
	fn test_op_id_invalid() {
		assert!(!OpId::invalid().is_valid());
		assert!(OpId::min().is_valid());
	}

	#[test]
	fn test_entity_id_display() {
		let tablet = TabletId::new("tablet-1");
		assert_eq!(tablet.to_string(), "tablet-1");
		assert_eq!(tablet.as_str(), "tablet-1");
	}
}
