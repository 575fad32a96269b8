// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

use std::sync::{
	Arc,
	atomic::{AtomicI64, Ordering},
};

/// Tracks memory attributed to CDC calls on this server.
#[derive(Debug, Default)]
pub struct MemTracker {
	consumed: AtomicI64,
}

impl MemTracker {
	pub fn new() -> Arc<MemTracker> {
		Arc::new(MemTracker::default())
	}

	pub fn consumed(&self) -> i64 {
		self.consumed.load(Ordering::Acquire)
	}

	fn add(&self, bytes: i64) {
		self.consumed.fetch_add(bytes, Ordering::AcqRel);
	}

	fn release(&self, bytes: i64) {
		self.consumed.fetch_sub(bytes, Ordering::AcqRel);
	}
}

/// Consumption scoped to one call: debits the tracker on construction and
/// credits it on drop, so memory is released on every exit path.
#[derive(Debug, Default)]
pub struct ScopedTrackedConsumption {
	tracker: Option<Arc<MemTracker>>,
	bytes: i64,
}

impl ScopedTrackedConsumption {
	pub fn new(tracker: Arc<MemTracker>, initial_bytes: usize) -> Self {
		tracker.add(initial_bytes as i64);
		Self {
			tracker: Some(tracker),
			bytes: initial_bytes as i64,
		}
	}

	/// An inactive consumption that tracks nothing.
	pub fn none() -> Self {
		Self::default()
	}

	pub fn is_active(&self) -> bool {
		self.tracker.is_some()
	}

	pub fn add(&mut self, bytes: usize) {
		if let Some(tracker) = &self.tracker {
			tracker.add(bytes as i64);
			self.bytes += bytes as i64;
		}
	}
}

impl Drop for ScopedTrackedConsumption {
	fn drop(&mut self) {
		if let Some(tracker) = self.tracker.take() {
			tracker.release(self.bytes);
		}
	}
}
