// Cantata
// Copyright (c) 2026 The Project Cantata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ID3v2 tag serialization.
//!
//! The writer always emits ID3v2.4 frames with UTF-8 text, regardless of the versions and
//! encodings the tags were read with.

use cantata_core::meta::{TagCollection, Value};

use log::debug;

use crate::id3v2::frames::{name_to_frame_id, FrameId};
use crate::id3v2::sync::encode_syncsafe_u32;
use crate::id3v2::TAG_HEADER_LEN;

/// Text encoding indicator for UTF-8.
const ENCODING_UTF8: u8 = 3;

/// Serialize a tag collection into a contiguous buffer of ID3v2.4 frames.
///
/// Simple tags are emitted in iteration order over all tags of the collection. Binary simple
/// tags whose name is not a valid 4-character frame id have no representation and are dropped.
pub fn serialize_frames(coll: &TagCollection) -> Vec<u8> {
    let mut buf = Vec::new();

    for tag in coll.tags() {
        for simple in tag.simple_tags() {
            match simple.value() {
                Value::Binary(data) => {
                    if let Some(id) = FrameId::parse_name(simple.name()) {
                        write_binary_frame(&mut buf, id, data);
                    }
                    else {
                        // There is no standard frame for arbitrary binary data, and TXXX is
                        // text-only.
                        debug!("id3v2: dropping binary tag '{}', not a frame id", simple.name());
                    }
                }
                Value::String(text) => {
                    if simple.name().eq_ignore_ascii_case("COMMENT") {
                        write_comm_frame(&mut buf, text, simple.language());
                    }
                    else if let Some(id) = name_to_frame_id(simple.name()) {
                        write_text_frame(&mut buf, id, text);
                    }
                    else if let Some(id) = FrameId::parse_name(simple.name()) {
                        write_text_frame(&mut buf, id, text);
                    }
                    else {
                        write_txxx_frame(&mut buf, simple.name(), text);
                    }
                }
            }
        }
    }

    buf
}

/// Build the 10-byte outer tag header for the given body size (frames plus padding).
pub fn build_tag_header(body_size: u32) -> [u8; TAG_HEADER_LEN] {
    let size = encode_syncsafe_u32(body_size);
    [b'I', b'D', b'3', 4, 0, 0, size[0], size[1], size[2], size[3]]
}

/// Write a 10-byte frame header: id, syncsafe size, zeroed flags.
fn write_frame_header(buf: &mut Vec<u8>, id: FrameId, body_size: u32) {
    buf.extend_from_slice(id.as_bytes());
    buf.extend_from_slice(&encode_syncsafe_u32(body_size));
    buf.extend_from_slice(&[0, 0]);
}

/// Write a text frame: `[encoding][text]`.
fn write_text_frame(buf: &mut Vec<u8>, id: FrameId, text: &str) {
    write_frame_header(buf, id, 1 + text.len() as u32);
    buf.push(ENCODING_UTF8);
    buf.extend_from_slice(text.as_bytes());
}

/// Write a `TXXX` frame: `[encoding][description][0x00][value]`.
fn write_txxx_frame(buf: &mut Vec<u8>, desc: &str, text: &str) {
    // TXXX is always a valid frame id.
    let id = FrameId::parse(b"TXXX").unwrap();

    write_frame_header(buf, id, 1 + desc.len() as u32 + 1 + text.len() as u32);
    buf.push(ENCODING_UTF8);
    buf.extend_from_slice(desc.as_bytes());
    buf.push(0);
    buf.extend_from_slice(text.as_bytes());
}

/// Write a `COMM` frame: `[encoding][language][0x00 short description][text]`.
fn write_comm_frame(buf: &mut Vec<u8>, text: &str, language: Option<&str>) {
    // COMM is always a valid frame id.
    let id = FrameId::parse(b"COMM").unwrap();

    // Default to "und" (undetermined) when no language is attached; pad short codes with spaces.
    let lang = language.filter(|lang| !lang.is_empty()).unwrap_or("und").as_bytes();
    let lang = [lang[0], *lang.get(1).unwrap_or(&b' '), *lang.get(2).unwrap_or(&b' ')];

    write_frame_header(buf, id, 1 + 3 + 1 + text.len() as u32);
    buf.push(ENCODING_UTF8);
    buf.extend_from_slice(&lang);
    buf.push(0);
    buf.extend_from_slice(text.as_bytes());
}

/// Write a binary frame carrying the raw data as-is.
fn write_binary_frame(buf: &mut Vec<u8>, id: FrameId, data: &[u8]) {
    write_frame_header(buf, id, data.len() as u32);
    buf.extend_from_slice(data);
}
