// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

/// Macro to create an `Error` from a diagnostic function call.
///
/// Usage: `error!(diagnostic_function(args))`
#[macro_export]
macro_rules! error {
	($diagnostic:expr) => {
		$crate::Error($diagnostic)
	};
}

/// Macro to return an error from a diagnostic function call.
///
/// Usage: `return_error!(diagnostic_function(args))`
#[macro_export]
macro_rules! return_error {
	($diagnostic:expr) => {
		return Err($crate::Error($diagnostic))
	};
}

/// Macro to create an `Err(Error(..))` from a diagnostic function call.
///
/// Usage: `err!(diagnostic_function(args))`
#[macro_export]
macro_rules! err {
	($diagnostic:expr) => {
		Err($crate::Error($diagnostic))
	};
}

#[cfg(test)]
mod tests {
	use crate::diagnostic::cdc::tablet_split;

	#[test]
	fn test_error_macro() {
		let error = error!(tablet_split("tablet-1"));
		assert_eq!(error.code(), "CDC_TABLET_SPLIT");
	}

	#[test]
	fn test_return_error_macro() {
		fn fails() -> crate::Result<()> {
			return_error!(tablet_split("tablet-1"));
		}

		assert!(fails().is_err());
	}

	#[test]
	fn test_err_macro() {
		let result: crate::Result<()> = err!(tablet_split("tablet-1"));
		assert!(result.is_err());
	}
}
