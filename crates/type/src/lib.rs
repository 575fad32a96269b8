// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

pub mod error;
mod r#macro;
pub mod util;
mod value;

pub use error::{Error, diagnostic};
pub use util::CowVec;
pub use value::{Type, Value};

pub type Result<T> = std::result::Result<T, Error>;
