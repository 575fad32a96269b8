// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

use crate::error::diagnostic::Diagnostic;

/// Internal error diagnostic with source location context.
pub fn internal_with_location(reason: impl Into<String>, file: &str, line: u32) -> Diagnostic {
	let reason = reason.into();
	Diagnostic {
		code: "INTERNAL_ERROR".to_string(),
		message: format!("internal error: {}", reason),
		label: Some(format!("invariant violated at {}:{}", file, line)),
		help: Some("this should never occur in normal operation; please file a bug report".to_string()),
		notes: vec![],
		cause: None,
	}
}

/// Internal error without location context.
pub fn internal(reason: impl Into<String>) -> Diagnostic {
	internal_with_location(reason, "unknown", 0)
}

/// Macro to create an internal error diagnostic with automatic source
/// location capture.
#[macro_export]
macro_rules! internal_error {
	($reason:expr) => {
		$crate::error::diagnostic::internal::internal_with_location($reason, file!(), line!())
	};
	($fmt:expr, $($arg:tt)*) => {
		$crate::error::diagnostic::internal::internal_with_location(format!($fmt, $($arg)*), file!(), line!())
	};
}

/// Macro to return an internal error with automatic source location capture.
#[macro_export]
macro_rules! return_internal_error {
	($reason:expr) => {
		return Err($crate::Error($crate::internal_error!($reason)))
	};
	($fmt:expr, $($arg:tt)*) => {
		return Err($crate::Error($crate::internal_error!($fmt, $($arg)*)))
	};
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_internal_error_captures_location() {
		let diagnostic = internal_error!("broken invariant");

		assert_eq!(diagnostic.code, "INTERNAL_ERROR");
		assert!(diagnostic.message.contains("broken invariant"));
		assert!(diagnostic.label.as_ref().unwrap().contains("internal.rs"));
	}

	#[test]
	fn test_internal_error_with_format() {
		let diagnostic = internal_error!("value out of range: {}", 42);
		assert!(diagnostic.message.contains("value out of range: 42"));
	}

	#[test]
	fn test_return_internal_error_in_function() {
		fn fails() -> crate::Result<()> {
			return_internal_error!("function error");
		}

		let error = fails().unwrap_err();
		assert_eq!(error.code(), "INTERNAL_ERROR");
		assert!(error.message.contains("function error"));
	}

	#[test]
	fn test_internal_without_location() {
		let diagnostic = internal("basic");
		assert!(diagnostic.label.as_ref().unwrap().contains("unknown:0"));
	}
}
