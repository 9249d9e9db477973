// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 gha-wizard contributors

//! Utility modules
//!
//! Terminal helpers for the gha-wizard CLI.

pub mod colors;
pub mod spinner;

pub use colors::*;
pub use spinner::*;
