// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

//! The `get_changes` dispatcher.
//!
//! Routes one call to the snapshot scanner, the intent replayer or the
//! replicated-log loop based on the incoming cursor, and owns checkpoint
//! advancement, split detection and memory accounting.

use std::{sync::Arc, time::Instant};

use serde::{Deserialize, Serialize};
use tessera_core::{
	HybridTime, OpId, StreamId, TableId, TabletId,
	doc::decode_transaction_id,
	interface::{
		CatalogClient, ConsensusLog, IntentStreamState, ReplicatedMessage, TabletRuntime, TransactionStatus, WalOp,
	},
};
use tessera_type::{Result, diagnostic::cdc, error, return_error};
use tracing::{debug, info, instrument, trace};

use crate::{
	assembler::populate_write_records,
	checkpoint::Checkpoint,
	datum::EnumOidLabelMap,
	flags,
	intents::process_intents,
	mem::{MemTracker, ScopedTrackedConsumption},
	metadata::StreamMetadata,
	record::{ColumnInfo, DdlInfo, LogicalRecord, RecordOpId, RowMessage},
	schema::SchemaCache,
	snapshot::{fill_ddl_records, stream_snapshot},
};

/// Everything one `get_changes` call needs. The tablet and consensus
/// handles are borrowed for the call; the producer never owns the tablet.
pub struct GetChangesParams<'a> {
	pub stream_id: &'a StreamId,
	pub tablet_id: &'a TabletId,
	pub from_cursor: &'a Checkpoint,
	pub stream_metadata: &'a StreamMetadata,
	pub tablet: &'a dyn TabletRuntime,
	pub consensus: &'a dyn ConsensusLog,
	pub catalog: &'a dyn CatalogClient,
	pub mem_tracker: Option<Arc<MemTracker>>,
	pub enum_oid_label_map: &'a EnumOidLabelMap,
	pub schema_cache: &'a mut SchemaCache,
	pub last_streamed_op_id: &'a mut OpId,
	pub last_readable_opid_index: Option<i64>,
	pub deadline: Instant,
}

/// Retains the consensus messages (and their tracked memory) backing a
/// response for the response's lifetime.
#[derive(Debug, Default)]
pub struct MessagesHolder {
	messages: Vec<Arc<ReplicatedMessage>>,
	consumption: ScopedTrackedConsumption,
}

impl MessagesHolder {
	pub fn reset(&mut self, messages: Vec<Arc<ReplicatedMessage>>, consumption: ScopedTrackedConsumption) {
		self.messages = messages;
		self.consumption = consumption;
	}

	pub fn messages(&self) -> &[Arc<ReplicatedMessage>] {
		&self.messages
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetChangesResponse {
	pub records: Vec<LogicalRecord>,
	/// The resumable cursor for the next call.
	pub cdc_checkpoint: Checkpoint,
	/// Last fully streamed log position, when one exists.
	pub safe_checkpoint: Option<OpId>,
	/// Commit hybrid time of the latest observed applying transaction.
	pub commit_timestamp: Option<HybridTime>,
}

impl GetChangesResponse {
	fn approximate_size(&self) -> usize {
		self.records.iter().map(LogicalRecord::approximate_size).sum()
	}
}

fn set_checkpoint(
	checkpoint: &mut Checkpoint,
	term: i64,
	index: i64,
	write_id: i32,
	key: Vec<u8>,
	snapshot_time: u64,
	last_streamed_op_id: &mut OpId,
) {
	*checkpoint = Checkpoint::new(term, index, write_id, key, snapshot_time);
	last_streamed_op_id.term = term;
	last_streamed_op_id.index = index;
}

/// A split is confirmed on the parent iff the catalog knows exactly two
/// children split from it. Catalog failures count as unverified.
fn verify_tablet_split_on_parent(table_id: &TableId, tablet_id: &TabletId, catalog: &dyn CatalogClient) -> bool {
	let Ok(tablets) = catalog.tablet_locations(table_id) else {
		return false;
	};

	let children = tablets
		.iter()
		.filter(|location| location.split_parent_tablet_id.as_ref() == Some(tablet_id))
		.count();
	children == 2
}

fn ddl_record(
	msg: &ReplicatedMessage,
	request: &tessera_core::interface::ChangeMetadataRequest,
	pg_schema_name: &str,
	table_name: &str,
) -> LogicalRecord {
	LogicalRecord {
		op_id: RecordOpId::from_op_id(msg.op_id),
		table: table_name.to_string(),
		pg_schema_name: pg_schema_name.to_string(),
		commit_time: None,
		row: RowMessage::Ddl(DdlInfo {
			column_info: request.schema.columns.iter().map(ColumnInfo::from).collect(),
			schema_version: request.schema_version,
			table_properties: request.schema.properties.clone(),
			new_table_name: request.new_table_name.clone(),
		}),
	}
}

fn truncate_record(msg: &ReplicatedMessage, pg_schema_name: &str, table_name: &str) -> LogicalRecord {
	LogicalRecord {
		op_id: RecordOpId::from_op_id(msg.op_id),
		table: table_name.to_string(),
		pg_schema_name: pg_schema_name.to_string(),
		commit_time: None,
		row: RowMessage::Truncate,
	}
}

/// Stream the next window of changes for one tablet replica.
///
/// The response is an out parameter so that accumulated records and the
/// advanced checkpoint survive even the `TabletSplit` error, which is
/// raised only after the response is fully flushed.
#[instrument(level = "debug", skip_all, fields(stream = %params.stream_id, tablet = %params.tablet_id))]
pub fn get_changes(
	params: GetChangesParams<'_>,
	msgs_holder: &mut MessagesHolder,
	resp: &mut GetChangesResponse,
) -> Result<()> {
	let GetChangesParams {
		stream_id,
		tablet_id,
		from_cursor,
		stream_metadata,
		tablet,
		consensus,
		catalog,
		mem_tracker,
		enum_oid_label_map,
		schema_cache,
		last_streamed_op_id,
		last_readable_opid_index,
		deadline,
	} = params;

	let op_id = from_cursor.op_id();
	debug!(from = %op_id, record_type = ?stream_metadata.record_type(), "serving get_changes");

	let mut consumption = ScopedTrackedConsumption::none();
	let mut checkpoint = Checkpoint::default();
	let mut checkpoint_updated = false;
	let mut report_tablet_split = false;
	let mut split_op_id = OpId::invalid();
	let snapshot_operation = from_cursor.is_snapshot_mode();

	if snapshot_operation {
		stream_snapshot(
			stream_id,
			tablet_id,
			from_cursor,
			tablet,
			consensus,
			catalog,
			enum_oid_label_map,
			schema_cache,
			&mut resp.records,
			&mut checkpoint,
			&mut checkpoint_updated,
		)?;
	} else if from_cursor.is_intent_resume() {
		let transaction_id = decode_transaction_id(&from_cursor.key)?;
		let stream_state = IntentStreamState::new(from_cursor.key.clone(), from_cursor.write_id);

		process_intents(
			op_id,
			transaction_id,
			&stream_state,
			tablet,
			catalog,
			enum_oid_label_map,
			schema_cache,
			&mut consumption,
			&mut resp.records,
			&mut checkpoint,
		)?;

		if checkpoint.write_id == 0 && checkpoint.key.is_empty() {
			last_streamed_op_id.term = checkpoint.term;
			last_streamed_op_id.index = checkpoint.index;
		}
		checkpoint_updated = true;
	} else {
		let mut last_seen_op_id = op_id;
		let mut last_seen_default_message_op_id = OpId::invalid();

		// A batch may contain no actionable message at all; keep fetching
		// until something is actionable or the readable window ends.
		loop {
			let batch = consensus.read_replicated_messages_for_cdc(last_seen_op_id, last_readable_opid_index, deadline)?;

			if batch.read_from_disk_size > 0 {
				if let Some(tracker) = &mem_tracker {
					consumption = ScopedTrackedConsumption::new(tracker.clone(), batch.read_from_disk_size);
				}
			}

			if batch.messages.is_empty() {
				debug!(last_seen = %last_seen_op_id, "no messages in the current batch");
				break;
			}

			let mut pending_intents = false;
			let mut schema_streamed = false;

			for msg in &batch.messages {
				last_seen_op_id = msg.op_id;

				// First schema resolution of the stream also announces the
				// schema to the consumer as DDL records.
				if !schema_streamed && !schema_cache.is_initialized() {
					let schema = schema_cache.load(catalog, tablet, msg.hybrid_time);
					schema_streamed = true;
					fill_ddl_records(tablet, &schema, schema_cache.version(), &mut resp.records);
				}

				match &msg.op {
					WalOp::UpdateTransaction(state) => {
						// Intents surface only once the transaction applies.
						let applying = state
							.as_ref()
							.is_some_and(|state| state.status == TransactionStatus::Applying);
						if applying {
							if let Some(state) = state {
								resp.commit_timestamp = Some(state.commit_hybrid_time);

								let continuation = process_intents(
									msg.op_id,
									state.transaction_id,
									&IntentStreamState::default(),
									tablet,
									catalog,
									enum_oid_label_map,
									schema_cache,
									&mut consumption,
									&mut resp.records,
									&mut checkpoint,
								)?;

								if !continuation.is_complete() {
									pending_intents = true;
									debug!(
										transaction = %state.transaction_id,
										apply = %msg.op_id,
										"pending intents remain for the applying transaction"
									);
								} else {
									last_streamed_op_id.term = msg.op_id.term;
									last_streamed_op_id.index = msg.op_id.index;
								}
								checkpoint_updated = true;
							}
						}
					}

					WalOp::Write(write) => {
						let Some(write) = write else {
							return_error!(cdc::invalid_argument(format!(
								"write message requires a write batch: {}",
								msg.op_id
							)));
						};
						if write.transaction.is_none() {
							let schema = schema_cache.maybe_load(catalog, tablet, msg.hybrid_time);
							populate_write_records(
								msg,
								write,
								tablet,
								enum_oid_label_map,
								&schema,
								&mut resp.records,
							)?;
							set_checkpoint(
								&mut checkpoint,
								msg.op_id.term,
								msg.op_id.index,
								0,
								Vec::new(),
								0,
								last_streamed_op_id,
							);
							checkpoint_updated = true;
						}
					}

					WalOp::ChangeMetadata(request) => {
						let Some(request) = request else {
							return_error!(cdc::invalid_argument(format!(
								"schema change message requires metadata information: {}",
								msg.op_id
							)));
						};
						let schema =
							schema_cache.install_from_change_metadata(request, catalog, tablet, msg.hybrid_time);

						// A schema-change entry may repeat the version we
						// just announced; emit only when it differs.
						let duplicate_ddl = resp
							.records
							.last()
							.and_then(LogicalRecord::schema_version)
							.is_some_and(|version| version == schema_cache.version());
						if !duplicate_ddl {
							resp.records.push(ddl_record(msg, request, &schema.pg_schema_name, tablet.table_name()));
						}
						set_checkpoint(
							&mut checkpoint,
							msg.op_id.term,
							msg.op_id.index,
							0,
							Vec::new(),
							0,
							last_streamed_op_id,
						);
						checkpoint_updated = true;
					}

					WalOp::Truncate(request) => {
						if flags::stream_truncate_record() {
							if request.is_none() {
								return_error!(cdc::invalid_argument(format!(
									"truncate message requires truncate request information: {}",
									msg.op_id
								)));
							}
							let schema = schema_cache.maybe_load(catalog, tablet, msg.hybrid_time);
							resp.records.push(truncate_record(msg, &schema.pg_schema_name, tablet.table_name()));
							set_checkpoint(
								&mut checkpoint,
								msg.op_id.term,
								msg.op_id.index,
								0,
								Vec::new(),
								0,
								last_streamed_op_id,
							);
							checkpoint_updated = true;
						}
					}

					WalOp::Split(_) => {
						// A split entry can also come from a failed split
						// attempt; only a verified split is acted on.
						if !verify_tablet_split_on_parent(tablet.table_id(), tablet_id, catalog) {
							info!(
								split = %msg.op_id,
								tablet = %tablet_id,
								"found a split record but no running children, not acting on it"
							);
						} else if checkpoint_updated {
							// Records discovered in this call are streamed
							// first; the next call re-enters at the split.
							info!(
								split = %msg.op_id,
								tablet = %tablet_id,
								"found a split record, streaming all records seen until now"
							);
						} else {
							info!(
								split = %msg.op_id,
								tablet = %tablet_id,
								"found a split record with no preceding data, reporting the split"
							);
							set_checkpoint(
								&mut checkpoint,
								msg.op_id.term,
								msg.op_id.index,
								0,
								Vec::new(),
								0,
								last_streamed_op_id,
							);
							checkpoint_updated = true;
							split_op_id = msg.op_id;
						}
					}

					WalOp::NoOp => {
						last_seen_default_message_op_id = msg.op_id;
						trace!(op = %msg.op_id, "non-actionable message");
					}
				}

				if pending_intents {
					break;
				}
			}

			if !batch.messages.is_empty() {
				msgs_holder.reset(batch.messages, std::mem::take(&mut consumption));
			}

			let more_readable =
				last_readable_opid_index.is_some_and(|last_readable| last_seen_op_id.index < last_readable);
			if checkpoint_updated || !more_readable || Instant::now() >= deadline {
				break;
			}
			debug!(last_seen = %last_seen_op_id, "batch had no actionable message, fetching the next one");
		}

		// Idle-batch progress: without this the cursor would stall on a
		// window of purely internal log entries.
		if !checkpoint_updated && last_seen_default_message_op_id.is_valid() {
			set_checkpoint(
				&mut checkpoint,
				last_seen_default_message_op_id.term,
				last_seen_default_message_op_id.index,
				0,
				Vec::new(),
				0,
				last_streamed_op_id,
			);
			checkpoint_updated = true;
			debug!(
				advanced_to = %last_seen_default_message_op_id,
				"no actionable messages, advancing the checkpoint to the last non-actionable one"
			);
		}
	}

	// The split is definitive only if it is the last actionable position:
	// the checkpoint resting exactly on the split means nothing follows.
	if !snapshot_operation
		&& split_op_id.is_valid()
		&& split_op_id.term == checkpoint.term
		&& split_op_id.index == checkpoint.index
	{
		report_tablet_split = true;
	}

	if consumption.is_active() {
		let response_size = resp.approximate_size();
		consumption.add(response_size);
	}

	resp.cdc_checkpoint = if checkpoint_updated {
		checkpoint
	} else {
		from_cursor.clone()
	};

	if last_streamed_op_id.index > 0 {
		resp.safe_checkpoint = Some(*last_streamed_op_id);
	}
	debug!(updated = checkpoint_updated, checkpoint = ?resp.cdc_checkpoint, "cursor for the next call");

	if report_tablet_split {
		return Err(error!(cdc::tablet_split(tablet_id)));
	}

	Ok(())
}
