// Cantata
// Copyright (c) 2026 The Project Cantata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! An ID3v2.3/2.4 tag codec.

use cantata_core::errors::{malformed_tag_error, no_id3_error, unsupported_error, Result};
use cantata_core::io::ReadBytes;

use bitflags::bitflags;

pub mod frames;
pub mod sync;
pub mod text;
pub mod writer;

pub use frames::{frames_to_collection, read_frames, Frame, FrameFlags, FrameId};
pub use writer::{build_tag_header, serialize_frames};

/// Length of the on-disk ID3v2 tag header.
pub const TAG_HEADER_LEN: usize = 10;

/// Length of the optional on-disk ID3v2.4 tag footer.
pub const TAG_FOOTER_LEN: usize = 10;

/// Length of an on-disk ID3v2.3/2.4 frame header.
pub const FRAME_HEADER_LEN: usize = 10;

/// Default amount of zero padding appended after the frames when a tag is rewritten.
pub const DEFAULT_PADDING: usize = 4096;

bitflags! {
    /// ID3v2 tag header flags (byte 5 of the tag header).
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct TagFlags: u8 {
        const UNSYNCHRONISATION = 0x80;
        const EXTENDED_HEADER   = 0x40;
        const EXPERIMENTAL      = 0x20;
        const FOOTER            = 0x10;
    }
}

/// A parsed ID3v2 tag header.
#[derive(Copy, Clone, Debug)]
pub struct TagHeader {
    /// The major version, 3 or 4.
    pub major: u8,
    /// The revision number.
    pub revision: u8,
    /// The tag header flags.
    pub flags: TagFlags,
    /// Total length of frames plus padding, excluding the 10-byte header and the optional
    /// 10-byte footer.
    pub tag_size: u32,
}

impl TagHeader {
    /// Returns `true` if the tag is followed by a footer. Only ID3v2.4 tags may declare one.
    pub fn has_footer(&self) -> bool {
        self.major == 4 && self.flags.contains(TagFlags::FOOTER)
    }

    /// The total on-disk length of the tag: header, body, and footer if present.
    pub fn total_len(&self) -> u64 {
        let mut len = TAG_HEADER_LEN as u64 + u64::from(self.tag_size);
        if self.has_footer() {
            len += TAG_FOOTER_LEN as u64;
        }
        len
    }
}

/// Read and validate a 10-byte ID3v2 tag header.
pub fn read_tag_header<B: ReadBytes>(reader: &mut B) -> Result<TagHeader> {
    let marker = reader.read_triple_bytes()?;

    if marker != *b"ID3" {
        return no_id3_error("id3v2: missing ID3 marker");
    }

    let major = reader.read_byte()?;
    let revision = reader.read_byte()?;
    let flags = reader.read_byte()?;
    let size = reader.read_quad_bytes()?;

    if major < 3 || major > 4 {
        return unsupported_error("id3v2: unsupported major version");
    }

    // Each syncsafe size byte must have its high bit clear.
    if size.iter().any(|b| b & 0x80 != 0) {
        return malformed_tag_error("id3v2: size byte has its high bit set");
    }

    Ok(TagHeader {
        major,
        revision,
        flags: TagFlags::from_bits_retain(flags),
        tag_size: sync::decode_syncsafe_u32(&size),
    })
}
