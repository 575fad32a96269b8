// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

use crate::error::diagnostic::Diagnostic;

// All codec failures share the corruption code: a key or value that does
// not decode means the storage layer handed us bytes it should not have.

pub fn truncated(what: &str, need: usize, have: usize) -> Diagnostic {
	Diagnostic {
		code: "CDC_CORRUPTION".to_string(),
		message: format!("truncated {}: need {} bytes, have {}", what, need, have),
		label: Some("storage decode failed".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn unknown_tag(what: &str, tag: u8) -> Diagnostic {
	Diagnostic {
		code: "CDC_CORRUPTION".to_string(),
		message: format!("unknown {} tag {:#04x}", what, tag),
		label: Some("storage decode failed".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn unterminated_bytes() -> Diagnostic {
	Diagnostic {
		code: "CDC_CORRUPTION".to_string(),
		message: "byte string is missing its terminator".to_string(),
		label: Some("storage decode failed".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn invalid_utf8(context: &str) -> Diagnostic {
	Diagnostic {
		code: "CDC_CORRUPTION".to_string(),
		message: format!("{} is not valid utf-8", context),
		label: Some("storage decode failed".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn invalid_transaction_id(reason: impl Into<String>) -> Diagnostic {
	Diagnostic {
		code: "CDC_CORRUPTION".to_string(),
		message: format!("cannot decode transaction id: {}", reason.into()),
		label: Some("storage decode failed".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}
