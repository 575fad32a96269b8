// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

use serde::{Deserialize, Serialize};

pub mod cdc;
pub mod codec;
pub mod internal;

pub use internal::internal;

/// A structured error report with a stable machine-readable `code`.
///
/// The `code` is the contract: callers dispatch on it, everything else is
/// for humans and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
	pub code: String,
	pub message: String,
	pub label: Option<String>,
	pub help: Option<String>,
	pub notes: Vec<String>,
	pub cause: Option<Box<Diagnostic>>,
}

impl Diagnostic {
	pub fn with_cause(mut self, cause: Diagnostic) -> Self {
		self.cause = Some(Box::new(cause));
		self
	}
}
