// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

//! Per-stream metadata cache.
//!
//! Caches the stream definition held by the catalog manager. Most fields
//! are immutable after load; `table_ids` and `state` can change on the
//! catalog and support partial refresh. Loading is single-flight under
//! `load_mutex`; accessors assert the cache is loaded.

use std::{
	collections::HashMap,
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicU8, Ordering},
	},
	time::Instant,
};

use parking_lot::{Mutex, RwLock};
use tessera_core::{
	HybridTime, NamespaceId, StreamId, TableId, TabletId,
	interface::{CatalogClient, CdcCheckpointType, CdcRecordFormat, CdcRecordType, CdcSourceType, StreamState},
};
use tessera_type::Result;
use tracing::debug;

/// Which parts of the cache a reload may refresh.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RefreshStreamMapOption {
	/// Load only if never loaded.
	None,
	/// Additionally reload when the stream is still being initiated.
	CheckInitiatedState,
	Always,
}

/// Apply-safe-time bookkeeping for one tablet of the stream, reported at
/// the metrics boundary.
#[derive(Debug, Clone, Default)]
pub struct TabletApplySafeTime {
	pub apply_safe_time_checkpoint_op_id: i64,
	pub last_apply_safe_time: HybridTime,
	pub last_apply_safe_time_update_time: Option<Instant>,
}

#[derive(Debug, Default)]
pub struct StreamTabletMetadata {
	inner: Mutex<TabletApplySafeTime>,
}

impl StreamTabletMetadata {
	pub fn update_apply_safe_time(&self, checkpoint_op_id: i64, apply_safe_time: HybridTime) {
		let mut inner = self.inner.lock();
		inner.apply_safe_time_checkpoint_op_id = checkpoint_op_id;
		inner.last_apply_safe_time = apply_safe_time;
		inner.last_apply_safe_time_update_time = Some(Instant::now());
	}

	pub fn snapshot(&self) -> TabletApplySafeTime {
		self.inner.lock().clone()
	}
}

/// The immutable-after-load part of the cache.
#[derive(Debug, Clone)]
struct StreamCore {
	namespace_id: NamespaceId,
	record_type: CdcRecordType,
	record_format: CdcRecordFormat,
	source_type: CdcSourceType,
	checkpoint_type: CdcCheckpointType,
}

#[derive(Debug)]
pub struct StreamMetadata {
	loaded: AtomicBool,
	load_mutex: Mutex<()>,
	core: RwLock<Option<StreamCore>>,
	state: AtomicU8,
	transactional: AtomicBool,
	table_ids: RwLock<Vec<TableId>>,
	tablet_metadata: RwLock<HashMap<TabletId, Arc<StreamTabletMetadata>>>,
}

impl Default for StreamMetadata {
	fn default() -> Self {
		Self::new()
	}
}

impl StreamMetadata {
	/// An empty cache; [`StreamMetadata::init_or_reload_if_needed`] must
	/// run before any accessor.
	pub fn new() -> Self {
		Self {
			loaded: AtomicBool::new(false),
			load_mutex: Mutex::new(()),
			core: RwLock::new(None),
			state: AtomicU8::new(StreamState::Initiated as u8),
			transactional: AtomicBool::new(false),
			table_ids: RwLock::new(Vec::new()),
			tablet_metadata: RwLock::new(HashMap::new()),
		}
	}

	/// A pre-loaded cache.
	#[allow(clippy::too_many_arguments)]
	pub fn loaded(
		namespace_id: NamespaceId,
		table_ids: Vec<TableId>,
		record_type: CdcRecordType,
		record_format: CdcRecordFormat,
		source_type: CdcSourceType,
		checkpoint_type: CdcCheckpointType,
		transactional: bool,
	) -> Self {
		let metadata = Self::new();
		metadata.install(
			StreamCore {
				namespace_id,
				record_type,
				record_format,
				source_type,
				checkpoint_type,
			},
			table_ids,
			StreamState::Active,
			transactional,
		);
		metadata
	}

	fn install(&self, core: StreamCore, table_ids: Vec<TableId>, state: StreamState, transactional: bool) {
		*self.core.write() = Some(core);
		*self.table_ids.write() = table_ids;
		self.state.store(state as u8, Ordering::Release);
		self.transactional.store(transactional, Ordering::Release);
		self.loaded.store(true, Ordering::Release);
	}

	pub fn is_loaded(&self) -> bool {
		self.loaded.load(Ordering::Acquire)
	}

	fn core(&self) -> StreamCore {
		assert!(self.is_loaded(), "stream metadata accessed before load");
		self.core.read().clone().expect("loaded stream metadata must have a core")
	}

	pub fn namespace_id(&self) -> NamespaceId {
		self.core().namespace_id
	}

	pub fn record_type(&self) -> CdcRecordType {
		self.core().record_type
	}

	pub fn record_format(&self) -> CdcRecordFormat {
		self.core().record_format
	}

	pub fn source_type(&self) -> CdcSourceType {
		self.core().source_type
	}

	pub fn checkpoint_type(&self) -> CdcCheckpointType {
		self.core().checkpoint_type
	}

	pub fn state(&self) -> StreamState {
		assert!(self.is_loaded(), "stream metadata accessed before load");
		StreamState::from_u8(self.state.load(Ordering::Acquire))
	}

	pub fn set_state(&self, state: StreamState) {
		self.state.store(state as u8, Ordering::Release);
	}

	pub fn is_transactional(&self) -> bool {
		assert!(self.is_loaded(), "stream metadata accessed before load");
		self.transactional.load(Ordering::Acquire)
	}

	pub fn table_ids(&self) -> Vec<TableId> {
		assert!(self.is_loaded(), "stream metadata accessed before load");
		self.table_ids.read().clone()
	}

	/// Per-tablet bookkeeping, created on first use.
	pub fn tablet_metadata(&self, tablet_id: &TabletId) -> Arc<StreamTabletMetadata> {
		if let Some(existing) = self.tablet_metadata.read().get(tablet_id) {
			return existing.clone();
		}
		self.tablet_metadata.write().entry(tablet_id.clone()).or_default().clone()
	}

	/// Load the cache from the catalog if it was never loaded, or refresh
	/// the mutable fields when `option` requires. Single-flight: only one
	/// thread loads at a time.
	pub fn init_or_reload_if_needed(
		&self,
		stream_id: &StreamId,
		option: RefreshStreamMapOption,
		catalog: &dyn CatalogClient,
	) -> Result<()> {
		let _load_guard = self.load_mutex.lock();

		let reload = match option {
			RefreshStreamMapOption::Always => true,
			RefreshStreamMapOption::CheckInitiatedState => {
				self.is_loaded() && self.state() == StreamState::Initiated
			}
			RefreshStreamMapOption::None => false,
		};
		if self.is_loaded() && !reload {
			return Ok(());
		}

		let info = catalog.stream_info(stream_id)?;
		if self.is_loaded() {
			// Partial refresh: only the mutable fields may change.
			*self.table_ids.write() = info.table_ids;
			self.set_state(info.state);
			debug!(stream = %stream_id, "refreshed mutable stream metadata");
		} else {
			self.install(
				StreamCore {
					namespace_id: info.namespace_id,
					record_type: info.record_type,
					record_format: info.record_format,
					source_type: info.source_type,
					checkpoint_type: info.checkpoint_type,
				},
				info.table_ids,
				info.state,
				info.transactional,
			);
			debug!(stream = %stream_id, "loaded stream metadata");
		}

		Ok(())
	}
}
