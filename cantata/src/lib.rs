// Cantata
// Copyright (c) 2026 The Project Cantata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # Project Cantata
//!
//! Cantata is a 100% pure Rust library for reading and writing embedded audio metadata tags.
//!
//! # Support
//!
//! Tags are presented through one uniform model regardless of the carrier holding them. The
//! following carriers are supported.
//!
//! | Carrier            | Tag location          | Write |
//! |--------------------|-----------------------|-------|
//! | Raw MP3 stream     | prepended ID3v2       | Yes   |
//! | Raw AAC ADTS stream| prepended ID3v2       | Yes   |
//! | IFF/AIFF           | `"ID3 "` chunk        | Yes   |
//! | RIFF/WAVE          | `"id3 "` chunk        | Yes   |
//! | RIFF/AVI           | `"id3 "` chunk        | Yes   |
//!
//! ID3v2.3 and ID3v2.4 tags are read; tags are always written as ID3v2.4 with UTF-8 text. A
//! legacy ID3v1 trailer is used as a read-only fallback when no ID3v2 tag is present.
//!
//! # Usage
//!
//! Open a [`TagFile`] with [`TagFile::open`] (read-only) or [`TagFile::open_rw`] (read-write),
//! then read with [`TagFile::tags`] or [`TagFile::tag_value`], and write with
//! [`TagFile::set_tag`], [`TagFile::remove_tag`], or [`TagFile::write_tags`].
//!
//! ```no_run
//! use cantata::TagFile;
//!
//! fn main() -> cantata::Result<()> {
//!     let mut file = TagFile::open_rw("song.mp3")?;
//!
//!     file.set_tag("TITLE", "An Example")?;
//!     file.set_tag("ARTIST", "Cantata")?;
//!
//!     println!("title: {}", file.tag_value("title")?);
//!     Ok(())
//! }
//! ```
//!
//! Writes first attempt an in-place overwrite within the existing tag's allocated region, and
//! otherwise rewrite the whole file through a sibling temp file followed by an atomic rename.

pub mod container;
mod file;
mod save;

pub use cantata_core::errors;
pub use cantata_core::errors::{Error, Result};
pub use cantata_core::meta;
pub use cantata_core::meta::{SimpleTag, Tag, TagCollection, TargetType, Value};

pub use container::{Carrier, CarrierKind, Id3Chunk};
pub use file::TagFile;

/// Gets the version of the library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
