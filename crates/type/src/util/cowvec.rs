// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

use std::{
	fmt::{self, Debug, Formatter},
	hash::{Hash, Hasher},
	ops::Deref,
	sync::Arc,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A cheaply clonable copy-on-write vector.
///
/// Clones share the backing allocation; the first mutation through
/// [`CowVec::make_mut`] after a clone copies it.
pub struct CowVec<T>(Arc<Vec<T>>);

impl<T> CowVec<T> {
	pub fn new(vec: Vec<T>) -> Self {
		Self(Arc::new(vec))
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn as_slice(&self) -> &[T] {
		self.0.as_slice()
	}
}

impl<T: Clone> CowVec<T> {
	/// Mutable access, copying the backing vector iff it is shared.
	pub fn make_mut(&mut self) -> &mut Vec<T> {
		Arc::make_mut(&mut self.0)
	}

	pub fn to_vec(&self) -> Vec<T> {
		self.0.as_ref().clone()
	}
}

impl<T> Deref for CowVec<T> {
	type Target = [T];

	fn deref(&self) -> &Self::Target {
		self.0.as_slice()
	}
}

impl<T> AsRef<[T]> for CowVec<T> {
	fn as_ref(&self) -> &[T] {
		self.0.as_slice()
	}
}

impl<T> Clone for CowVec<T> {
	fn clone(&self) -> Self {
		Self(Arc::clone(&self.0))
	}
}

impl<T> From<Vec<T>> for CowVec<T> {
	fn from(vec: Vec<T>) -> Self {
		Self::new(vec)
	}
}

impl<T: Debug> Debug for CowVec<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl<T: PartialEq> PartialEq for CowVec<T> {
	fn eq(&self, other: &Self) -> bool {
		self.as_slice() == other.as_slice()
	}
}

impl<T: Eq> Eq for CowVec<T> {}

impl<T: PartialOrd> PartialOrd for CowVec<T> {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		self.as_slice().partial_cmp(other.as_slice())
	}
}

impl<T: Ord> Ord for CowVec<T> {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.as_slice().cmp(other.as_slice())
	}
}

impl<T: Hash> Hash for CowVec<T> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.as_slice().hash(state)
	}
}

impl<T: Default> Default for CowVec<T> {
	fn default() -> Self {
		Self::new(Vec::new())
	}
}

impl<T: Serialize> Serialize for CowVec<T> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		self.0.serialize(serializer)
	}
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for CowVec<T> {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		Ok(Self::new(Vec::deserialize(deserializer)?))
	}
}
