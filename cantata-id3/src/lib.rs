// Cantata
// Copyright (c) 2026 The Project Cantata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! ID3v2.3/2.4 and ID3v1 tag codecs for Project Cantata.
//!
//! The `id3v2` module parses and serializes ID3v2 tags at the byte level; the `id3v1` module
//! decodes the legacy 128-byte trailer. Neither module touches the filesystem — carriers are
//! probed and tag bytes placed by the `cantata` crate.

pub mod id3v1;
pub mod id3v2;
