// Cantata
// Copyright (c) 2026 The Project Cantata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Shared structs, traits, and helpers for Project Cantata.
//!
//! This crate is common to all Cantata crates and provides the error type, the
//! byte-level I/O surface, and the tag data model. End users should prefer the
//! `cantata` crate instead of depending on `cantata-core` directly.

pub mod errors;
pub mod io;
pub mod meta;
pub mod util;
