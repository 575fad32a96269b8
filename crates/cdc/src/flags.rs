// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

//! Runtime-mutable tunables.
//!
//! Every flag is read through its accessor at the point of use, never
//! cached at call start, so operators can flip them while calls are in
//! flight.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicI64, Ordering};

/// Max READ records per snapshot call.
static SNAPSHOT_BATCH_SIZE: AtomicI32 = AtomicI32::new(250);

/// Whether TRUNCATE log entries are emitted to the stream.
static STREAM_TRUNCATE_RECORD: AtomicBool = AtomicBool::new(false);

/// Pack all column updates of a row into a single UPDATE record.
static ENABLE_SINGLE_RECORD_UPDATE: AtomicBool = AtomicBool::new(true);

/// Provisional-write retention lease requested at snapshot start.
static INTENT_RETENTION_MS: AtomicI64 = AtomicI64::new(4 * 60 * 60 * 1000);

/// Test only: force snapshot calls to fail with a retryable error.
static TEST_SNAPSHOT_FAILURE: AtomicBool = AtomicBool::new(false);

pub fn snapshot_batch_size() -> i32 {
	SNAPSHOT_BATCH_SIZE.load(Ordering::Acquire)
}

pub fn set_snapshot_batch_size(value: i32) {
	SNAPSHOT_BATCH_SIZE.store(value, Ordering::Release);
}

pub fn stream_truncate_record() -> bool {
	STREAM_TRUNCATE_RECORD.load(Ordering::Acquire)
}

pub fn set_stream_truncate_record(value: bool) {
	STREAM_TRUNCATE_RECORD.store(value, Ordering::Release);
}

pub fn enable_single_record_update() -> bool {
	ENABLE_SINGLE_RECORD_UPDATE.load(Ordering::Acquire)
}

pub fn set_enable_single_record_update(value: bool) {
	ENABLE_SINGLE_RECORD_UPDATE.store(value, Ordering::Release);
}

pub fn intent_retention_ms() -> i64 {
	INTENT_RETENTION_MS.load(Ordering::Acquire)
}

pub fn set_intent_retention_ms(value: i64) {
	INTENT_RETENTION_MS.store(value, Ordering::Release);
}

pub fn test_snapshot_failure() -> bool {
	TEST_SNAPSHOT_FAILURE.load(Ordering::Acquire)
}

pub fn set_test_snapshot_failure(value: bool) {
	TEST_SNAPSHOT_FAILURE.store(value, Ordering::Release);
}

// Flags are process globals; tests that flip them serialise on this lock
// and restore the previous value before releasing it.
#[cfg(test)]
pub(crate) fn test_guard() -> std::sync::MutexGuard<'static, ()> {
	static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
	LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let _guard = test_guard();
		assert_eq!(snapshot_batch_size(), 250);
		assert!(!stream_truncate_record());
		assert!(enable_single_record_update());
		assert_eq!(intent_retention_ms(), 14_400_000);
		assert!(!test_snapshot_failure());
	}
}
