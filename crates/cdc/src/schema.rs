// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

use std::sync::Arc;

use tessera_core::{
	HybridTime, SchemaVersion, TableSchema,
	interface::{CatalogClient, ChangeMetadataRequest, TabletRuntime},
};
use tracing::{debug, warn};

/// Caller-owned cache slot for the resolved `(schema, version)` pair.
///
/// The slot holds a plain copy, deliberately not a reference back into the
/// tablet, so the producer never couples its lifetime to the tablet's.
#[derive(Debug, Clone, Default)]
pub struct SchemaCache {
	schema: Option<Arc<TableSchema>>,
	version: SchemaVersion,
}

impl SchemaCache {
	pub fn is_initialized(&self) -> bool {
		self.schema.is_some()
	}

	pub fn version(&self) -> SchemaVersion {
		self.version
	}

	pub fn install(&mut self, schema: TableSchema, version: SchemaVersion) -> Arc<TableSchema> {
		let schema = Arc::new(schema);
		self.schema = Some(schema.clone());
		self.version = version;
		schema
	}

	/// Resolve the schema in effect at `read_time` and publish it into the
	/// slot. Lookup failures are never propagated: the tablet's currently
	/// mounted schema is the fallback, with a warning.
	pub fn load(
		&mut self,
		catalog: &dyn CatalogClient,
		tablet: &dyn TabletRuntime,
		read_time: HybridTime,
	) -> Arc<TableSchema> {
		match catalog.schema_at(tablet.table_id(), read_time) {
			Ok((schema, version)) => {
				debug!(
					table = tablet.table_name(),
					%version,
					%read_time,
					"resolved schema from catalog"
				);
				self.install(schema, version)
			}
			Err(error) => {
				let (schema, version) = tablet.current_schema();
				warn!(
					table = tablet.table_name(),
					%read_time,
					%error,
					"failed to get schema from catalog, falling back to the mounted schema"
				);
				self.install(schema, version)
			}
		}
	}

	/// Load iff the slot is uninitialised. Idempotent within a call chain.
	pub fn maybe_load(
		&mut self,
		catalog: &dyn CatalogClient,
		tablet: &dyn TabletRuntime,
		read_time: HybridTime,
	) -> Arc<TableSchema> {
		if let Some(schema) = &self.schema {
			return schema.clone();
		}
		self.load(catalog, tablet, read_time)
	}

	/// Install the schema carried by a schema-change log entry, then
	/// cross-check it against the catalog at the entry's hybrid time.
	///
	/// The log can contain entries of historical failed DDLs; when catalog
	/// and log entry disagree, the catalog's answer wins.
	pub fn install_from_change_metadata(
		&mut self,
		request: &ChangeMetadataRequest,
		catalog: &dyn CatalogClient,
		tablet: &dyn TabletRuntime,
		message_time: HybridTime,
	) -> Arc<TableSchema> {
		let mut installed = self.install(request.schema.clone(), request.schema_version);

		match catalog.schema_at(tablet.table_id(), message_time) {
			Err(error) => {
				warn!(
					table = tablet.table_name(),
					%error,
					"failed to get schema from catalog, proceeding with the schema change entry's schema"
				);
			}
			Ok((schema, version)) => {
				if version != self.version {
					installed = self.install(schema, version);
				}
			}
		}

		installed
	}
}
