// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

use crate::error::diagnostic::Diagnostic;

/// The tablet runtime is in a state the producer cannot read from.
/// Fatal to the call and not retryable.
pub fn corruption(reason: impl Into<String>) -> Diagnostic {
	Diagnostic {
		code: "CDC_CORRUPTION".to_string(),
		message: reason.into(),
		label: Some("inconsistent tablet state".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// A replicated message is missing a payload its operation type requires.
pub fn invalid_argument(reason: impl Into<String>) -> Diagnostic {
	Diagnostic {
		code: "CDC_INVALID_ARGUMENT".to_string(),
		message: reason.into(),
		label: Some("malformed replicated message".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// Provisional writes for the transaction were already garbage collected.
/// The `(stream, transaction)` pair is permanently lost.
pub fn intents_already_gced(transaction_id: &str, tablet_id: &str) -> Diagnostic {
	Diagnostic {
		code: "CDC_INTENTS_GCED".to_string(),
		message: format!(
			"trying to fetch already GCed intents for transaction {} on tablet {}",
			transaction_id, tablet_id
		),
		label: Some("provisional writes removed by retention".to_string()),
		help: Some("the stream cannot recover this transaction; resume past its apply record".to_string()),
		notes: vec![],
		cause: None,
	}
}

/// Test-forced snapshot failure. May be retried.
pub fn snapshot_unavailable(tablet_id: &str) -> Diagnostic {
	Diagnostic {
		code: "CDC_SNAPSHOT_UNAVAILABLE".to_string(),
		message: format!("snapshot failed for tablet {}", tablet_id),
		label: None,
		help: Some("retry the snapshot call".to_string()),
		notes: vec![],
		cause: None,
	}
}

/// The parent tablet finished splitting and has no further records.
/// The caller must switch to the child tablets.
pub fn tablet_split(tablet_id: &str) -> Diagnostic {
	Diagnostic {
		code: "CDC_TABLET_SPLIT".to_string(),
		message: format!("tablet split on tablet {}, no more records to stream", tablet_id),
		label: Some("parent tablet closed".to_string()),
		help: Some("resolve the child tablets and continue streaming from them".to_string()),
		notes: vec![],
		cause: None,
	}
}
