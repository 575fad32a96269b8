// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 TesseraDB

mod cowvec;

pub use cowvec::CowVec;
