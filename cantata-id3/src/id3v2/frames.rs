// Cantata
// Copyright (c) 2026 The Project Cantata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ID3v2 frame reading and conversion to the tag model.

use std::collections::HashMap;
use std::fmt;
use std::str;

use cantata_core::errors::{truncated_error, Result};
use cantata_core::io::BufReader;
use cantata_core::meta::{Tag, TagCollection, TargetType};
use cantata_core::util::text as core_text;

use bitflags::bitflags;
use lazy_static::lazy_static;
use log::warn;

use crate::id3v2::sync::decode_syncsafe_u32;
use crate::id3v2::text::{decode_text_buf, read_string, Encoding};
use crate::id3v2::{TagHeader, TagFlags, FRAME_HEADER_LEN};

// Frames that map to a human-readable tag name. When a v2.3-only frame id carries the same
// meaning as a v2.4 id, both ids resolve to the name, but names always serialize to the v2.4 id.
//
// ----------------   ----   ----
// Name               v2.4   v2.3
// ----------------   ----   ----
// TITLE              TIT2
// SUBTITLE           TIT3
// ARTIST             TPE1
// ALBUM_ARTIST       TPE2
// ALBUM              TALB
// DATE_RELEASED      TDRC   TYER
// TRACK_NUMBER       TRCK
// DISC_NUMBER        TPOS
// GENRE              TCON
// COMPOSER           TCOM
// LYRICIST           TEXT
// CONDUCTOR          TPE3
// COMMENT            COMM
// ENCODER            TSSE
// ENCODED_BY         TENC
// COPYRIGHT          TCOP
// BPM                TBPM
// PUBLISHER          TPUB
// ISRC               TSRC
// GROUPING           TIT1
// SORT_TITLE         TSOT
// SORT_ARTIST        TSOP
// SORT_ALBUM         TSOA
// SORT_ALBUM_ARTIST  TSO2
// ORIGINAL_DATE      TDOR   TORY
const NAME_MAP: &[(&str, &[u8; 4], Option<&[u8; 4]>)] = &[
    ("TITLE", b"TIT2", None),
    ("SUBTITLE", b"TIT3", None),
    ("ARTIST", b"TPE1", None),
    ("ALBUM_ARTIST", b"TPE2", None),
    ("ALBUM", b"TALB", None),
    ("DATE_RELEASED", b"TDRC", Some(b"TYER")),
    ("TRACK_NUMBER", b"TRCK", None),
    ("DISC_NUMBER", b"TPOS", None),
    ("GENRE", b"TCON", None),
    ("COMPOSER", b"TCOM", None),
    ("LYRICIST", b"TEXT", None),
    ("CONDUCTOR", b"TPE3", None),
    ("COMMENT", b"COMM", None),
    ("ENCODER", b"TSSE", None),
    ("ENCODED_BY", b"TENC", None),
    ("COPYRIGHT", b"TCOP", None),
    ("BPM", b"TBPM", None),
    ("PUBLISHER", b"TPUB", None),
    ("ISRC", b"TSRC", None),
    ("GROUPING", b"TIT1", None),
    ("SORT_TITLE", b"TSOT", None),
    ("SORT_ARTIST", b"TSOP", None),
    ("SORT_ALBUM", b"TSOA", None),
    ("SORT_ALBUM_ARTIST", b"TSO2", None),
    ("ORIGINAL_DATE", b"TDOR", Some(b"TORY")),
];

lazy_static! {
    static ref FRAME_ID_NAMES: HashMap<&'static [u8; 4], &'static str> = {
        let mut m = HashMap::new();
        for (name, id, v23_id) in NAME_MAP {
            m.insert(*id, *name);
            if let Some(v23_id) = v23_id {
                m.insert(*v23_id, *name);
            }
        }
        m
    };
}

lazy_static! {
    static ref NAME_FRAME_IDS: HashMap<&'static str, &'static [u8; 4]> = {
        let mut m = HashMap::new();
        for (name, id, _) in NAME_MAP {
            m.insert(*name, *id);
        }
        m
    };
}

/// Look up the human-readable name for a frame id.
pub fn frame_id_to_name(id: FrameId) -> Option<&'static str> {
    FRAME_ID_NAMES.get(id.as_bytes()).copied()
}

/// Look up the ID3v2.4 frame id for a human-readable tag name (ASCII case-insensitive).
pub fn name_to_frame_id(name: &str) -> Option<FrameId> {
    NAME_FRAME_IDS.get(name.to_ascii_uppercase().as_str()).map(|id| FrameId(**id))
}

bitflags! {
    /// ID3v2 frame header flags (bytes 8-9 of the frame header), in the ID3v2.4 bit layout.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct FrameFlags: u16 {
        const TAG_ALTER  = 0x4000;
        const FILE_ALTER = 0x2000;
        const READ_ONLY  = 0x1000;
        const GROUPING   = 0x0040;
        const COMPRESSED = 0x0008;
        const ENCRYPTED  = 0x0004;
        const UNSYNC     = 0x0002;
        const DATA_LEN   = 0x0001;
    }
}

/// A 4-byte ID3v2.3/2.4 frame identifier composed of the characters A-Z and 0-9.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct FrameId([u8; 4]);

impl FrameId {
    /// Parse a frame id from exactly 4 bytes. Returns `None` if any byte is outside A-Z / 0-9.
    pub fn parse(bytes: &[u8]) -> Option<FrameId> {
        match bytes {
            [a, b, c, d] => {
                let id = [*a, *b, *c, *d];
                if id.iter().all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit()) {
                    Some(FrameId(id))
                }
                else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Parse a frame id from a tag name. Returns `None` unless the name is exactly 4 valid id
    /// characters.
    pub fn parse_name(name: &str) -> Option<FrameId> {
        FrameId::parse(name.as_bytes())
    }

    /// The frame id bytes.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// The frame id as a string slice.
    pub fn as_str(&self) -> &str {
        // Validated as ASCII on construction.
        str::from_utf8(&self.0).expect("ascii only")
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameId({})", self.as_str())
    }
}

/// A raw ID3v2 frame: identifier, header flags, and an owned copy of the frame body.
#[derive(Clone, Debug)]
pub struct Frame {
    pub id: FrameId,
    pub flags: FrameFlags,
    pub data: Box<[u8]>,
}

/// Walk the frames of an ID3v2 tag body.
///
/// `body` holds the bytes following the 10-byte tag header, and may be shorter than the declared
/// tag size if the file was truncated. The walk stops without error at padding, at the first
/// invalid frame id, or at a frame that exceeds the declared tag bound; frames decoded up to that
/// point are returned. A frame whose body extends past the end of the file is an error.
pub fn read_frames(body: &[u8], header: &TagHeader) -> Result<Vec<Frame>> {
    let mut frames = Vec::new();

    let avail = body.len() as u64;
    let tag_end = u64::from(header.tag_size);
    let frame_header_len = FRAME_HEADER_LEN as u64;

    let mut pos = skip_extended_header(body, header)?;

    while pos + frame_header_len <= tag_end {
        // The frame header crosses the end of the file. Stop and keep what was decoded.
        if pos + frame_header_len > avail {
            break;
        }

        let hdr = &body[pos as usize..(pos + frame_header_len) as usize];

        // A zero first byte marks the start of the padding.
        if hdr[0] == 0 {
            break;
        }

        let id = match FrameId::parse(&hdr[0..4]) {
            Some(id) => id,
            None => {
                // As per the specification, padding should be all 0s, but there are some tags
                // which don't obey the specification.
                warn!("id3v2: invalid frame id, stopping the frame walk");
                break;
            }
        };

        // Frame sizes are syncsafe in v2.4 and plain big-endian in v2.3.
        let size = if header.major == 4 {
            u64::from(decode_syncsafe_u32(&[hdr[4], hdr[5], hdr[6], hdr[7]]))
        }
        else {
            u64::from(u32::from_be_bytes([hdr[4], hdr[5], hdr[6], hdr[7]]))
        };

        // A frame that extends past the declared tag bound is rejected and stops the walk.
        if pos + frame_header_len + size > tag_end {
            warn!("id3v2: '{}' exceeds the tag bound, stopping the frame walk", id);
            break;
        }

        // The frame fits the declared bound but the file ends before its body does.
        if pos + frame_header_len + size > avail {
            return truncated_error("id3v2: frame body extends past the end of the file");
        }

        let flags = FrameFlags::from_bits_retain(u16::from_be_bytes([hdr[8], hdr[9]]));

        let start = (pos + frame_header_len) as usize;
        let data = Box::from(&body[start..start + size as usize]);

        frames.push(Frame { id, flags, data });

        pos += frame_header_len + size;
    }

    Ok(frames)
}

/// Advance past the extended header, if the tag declares one, and return the offset of the first
/// frame within the tag body.
fn skip_extended_header(body: &[u8], header: &TagHeader) -> Result<u64> {
    if !header.flags.contains(TagFlags::EXTENDED_HEADER) {
        return Ok(0);
    }

    if body.len() < 4 {
        return truncated_error("id3v2: extended header size");
    }

    let size_bytes = [body[0], body[1], body[2], body[3]];

    // In v2.4 the extended header size is syncsafe and includes its own 4 size bytes. In v2.3 it
    // is plain big-endian and excludes them.
    let offset = if header.major == 4 {
        u64::from(decode_syncsafe_u32(&size_bytes))
    }
    else {
        4 + u64::from(u32::from_be_bytes(size_bytes))
    };

    Ok(offset)
}

/// Convert a sequence of raw frames into a tag collection with a single album-level tag.
///
/// Compressed and encrypted frames are skipped. Text frames (and TXXX/COMM) become text simple
/// tags; all other frames are carried as binary simple tags.
pub fn frames_to_collection(frames: &[Frame]) -> TagCollection {
    let mut coll = TagCollection::new();
    let tag = coll.add_tag(TargetType::Album);

    for frame in frames {
        if frame.flags.intersects(FrameFlags::COMPRESSED | FrameFlags::ENCRYPTED) {
            warn!("id3v2: '{}' skipped, compressed or encrypted frames not supported", frame.id);
            continue;
        }

        match frame.id.as_bytes() {
            b"TXXX" => read_txxx_frame(frame, tag),
            b"COMM" => read_comm_frame(frame, tag),
            [b'T', ..] => read_text_frame(frame, tag),
            _ => read_binary_frame(frame, tag),
        }
    }

    coll
}

/// Reads a standard text frame: encoding byte followed by encoded text.
fn read_text_frame(frame: &Frame, tag: &mut Tag) {
    if frame.data.is_empty() {
        warn!("id3v2: '{}' skipped because it has a size of 0", frame.id);
        return;
    }

    let encoding = Encoding::parse(frame.data[0]).unwrap_or(Encoding::Iso8859_1);
    let value = decode_text_buf(&frame.data[1..], encoding);

    let name = frame_id_to_name(frame.id).unwrap_or(frame.id.as_str());
    tag.add_simple(name, value);
}

/// Reads a `TXXX` (user-defined text) frame: encoding byte, terminated description, value.
fn read_txxx_frame(frame: &Frame, tag: &mut Tag) {
    if frame.data.len() < 2 {
        warn!("id3v2: 'TXXX' skipped because it is too short");
        return;
    }

    let encoding = Encoding::parse(frame.data[0]).unwrap_or(Encoding::Iso8859_1);

    let mut reader = BufReader::new(&frame.data[1..]);

    let desc = match read_string(&mut reader, encoding) {
        Ok(desc) => desc,
        Err(_) => return,
    };
    let value = decode_text_buf(reader.read_buf_bytes_available_ref(), encoding);

    // The description is the tag name.
    tag.add_simple(desc, value);
}

/// Reads a `COMM` (comment) frame: encoding byte, 3-byte language, terminated short description,
/// comment text.
fn read_comm_frame(frame: &Frame, tag: &mut Tag) {
    if frame.data.len() < 5 {
        warn!("id3v2: 'COMM' skipped because it is too short");
        return;
    }

    let encoding = Encoding::parse(frame.data[0]).unwrap_or(Encoding::Iso8859_1);
    let lang = &frame.data[1..4];

    let mut reader = BufReader::new(&frame.data[4..]);

    // The short description is skipped; only the comment text is kept.
    if read_string(&mut reader, encoding).is_err() {
        return;
    }
    let value = decode_text_buf(reader.read_buf_bytes_available_ref(), encoding);

    let simple = tag.add_simple("COMMENT", value);

    if lang[0] != 0 {
        let lang: String = core_text::decode_iso8859_1(lang).collect();
        simple.set_language(Some(lang));
    }
}

/// Reads any other frame as a binary simple tag carrying the raw frame body.
fn read_binary_frame(frame: &Frame, tag: &mut Tag) {
    let name = frame_id_to_name(frame.id).unwrap_or(frame.id.as_str());
    tag.add_binary(name, &frame.data);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id3v2::writer::build_tag_header;
    use crate::id3v2::read_tag_header;
    use cantata_core::io::BufReader;

    fn make_header(major: u8, tag_size: u32) -> TagHeader {
        TagHeader { major, revision: 0, flags: TagFlags::empty(), tag_size }
    }

    fn frame_bytes(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(id);
        buf.extend_from_slice(&crate::id3v2::sync::encode_syncsafe_u32(body.len() as u32));
        buf.extend_from_slice(&[0, 0]);
        buf.extend_from_slice(body);
        buf
    }

    #[test]
    fn verify_name_mapping() {
        assert_eq!(name_to_frame_id("TITLE").unwrap().as_bytes(), b"TIT2");
        assert_eq!(name_to_frame_id("title").unwrap().as_bytes(), b"TIT2");
        assert_eq!(name_to_frame_id("Sort_Album_Artist").unwrap().as_bytes(), b"TSO2");
        assert!(name_to_frame_id("NOT_A_TAG").is_none());

        assert_eq!(frame_id_to_name(FrameId(*b"TIT2")), Some("TITLE"));
        // Both the v2.4 id and the v2.3 alias resolve to the same name.
        assert_eq!(frame_id_to_name(FrameId(*b"TDRC")), Some("DATE_RELEASED"));
        assert_eq!(frame_id_to_name(FrameId(*b"TYER")), Some("DATE_RELEASED"));
        assert_eq!(frame_id_to_name(FrameId(*b"TORY")), Some("ORIGINAL_DATE"));
        assert_eq!(frame_id_to_name(FrameId(*b"XXXX")), None);
    }

    #[test]
    fn verify_frame_id_validation() {
        assert!(FrameId::parse(b"TIT2").is_some());
        assert!(FrameId::parse(b"TSO2").is_some());
        assert!(FrameId::parse(b"tit2").is_none());
        assert!(FrameId::parse(b"TI 2").is_none());
        assert!(FrameId::parse(b"TIT").is_none());
        assert!(FrameId::parse_name("TIT22").is_none());
    }

    #[test]
    fn verify_frame_walk() {
        let mut body = frame_bytes(b"TIT2", b"\x03Test Title");
        body.extend_from_slice(&frame_bytes(b"TPE1", b"\x03Test Artist"));
        body.extend_from_slice(&[0u8; 64]);

        let header = make_header(4, body.len() as u32);
        let frames = read_frames(&body, &header).unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].id.as_bytes(), b"TIT2");
        assert_eq!(frames[1].id.as_bytes(), b"TPE1");

        // The frame-walk bound invariant.
        let walked: u64 = frames.iter().map(|f| 10 + f.data.len() as u64).sum();
        assert!(walked <= u64::from(header.tag_size));
    }

    #[test]
    fn verify_frame_walk_stops_at_invalid_id() {
        let mut body = frame_bytes(b"TIT2", b"\x03Test Title");
        body.extend_from_slice(&frame_bytes(b"TPE1", b"\x03Test Artist"));
        // Corrupt the second frame id.
        body[21] = b'?';

        let header = make_header(4, body.len() as u32);
        let frames = read_frames(&body, &header).unwrap();

        // The walk keeps the first frame and stops at the bad one.
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].id.as_bytes(), b"TIT2");
    }

    #[test]
    fn verify_frame_walk_rejects_oversized_frame() {
        let mut body = frame_bytes(b"TIT2", b"\x03Test Title");
        // A frame that declares more bytes than the tag bound holds.
        body.extend_from_slice(b"TPE1");
        body.extend_from_slice(&crate::id3v2::sync::encode_syncsafe_u32(1 << 20));
        body.extend_from_slice(&[0, 0]);

        let header = make_header(4, body.len() as u32);
        let frames = read_frames(&body, &header).unwrap();

        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn verify_frame_walk_truncated_body_is_an_error() {
        let body = frame_bytes(b"TIT2", b"\x03Test Title");
        // Declare a larger tag than there are bytes: the frame that straddles the end of the
        // buffer is a truncation error.
        let mut header = make_header(4, body.len() as u32 + 64);
        header.tag_size = body.len() as u32 + 64;

        let mut short = body.clone();
        short.truncate(body.len() - 4);

        assert!(read_frames(&short, &header).is_err());
    }

    #[test]
    fn verify_v23_frame_sizes_are_big_endian() {
        // 0x0180 encodes as syncsafe [0, 0, 3, 0] but as big-endian [0, 0, 1, 0x80].
        let text = vec![0x03u8; 0x180];
        let mut body = Vec::new();
        body.extend_from_slice(b"TIT2");
        body.extend_from_slice(&[0x00, 0x00, 0x01, 0x80]);
        body.extend_from_slice(&[0, 0]);
        body.extend_from_slice(&text);

        let header = make_header(3, body.len() as u32);
        let frames = read_frames(&body, &header).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data.len(), 0x180);
    }

    #[test]
    fn verify_extended_header_skip() {
        // v2.4: the syncsafe size includes its own four bytes.
        let mut body = vec![0x00, 0x00, 0x00, 0x0a, 0x01, 0x00, 0, 0, 0, 0];
        body.extend_from_slice(&frame_bytes(b"TIT2", b"\x03Test"));

        let mut header = make_header(4, body.len() as u32);
        header.flags = TagFlags::EXTENDED_HEADER;

        let frames = read_frames(&body, &header).unwrap();
        assert_eq!(frames.len(), 1);

        // v2.3: the big-endian size excludes its own four bytes.
        let mut body = vec![0x00, 0x00, 0x00, 0x06, 0, 0, 0, 0, 0, 0];
        body.extend_from_slice(&frame_bytes(b"TIT2", b"\x03Test"));

        let mut header = make_header(3, body.len() as u32);
        header.flags = TagFlags::EXTENDED_HEADER;

        let frames = read_frames(&body, &header).unwrap();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn verify_text_frame_conversion() {
        let frames = [Frame {
            id: FrameId(*b"TIT2"),
            flags: FrameFlags::empty(),
            data: Box::from(&b"\x03Test Title"[..]),
        }];

        let coll = frames_to_collection(&frames);
        assert_eq!(coll.find("TITLE").and_then(|s| s.text()), Some("Test Title"));
    }

    #[test]
    fn verify_unmapped_text_frame_uses_frame_id() {
        let frames = [Frame {
            id: FrameId(*b"TLAN"),
            flags: FrameFlags::empty(),
            data: Box::from(&b"\x03eng"[..]),
        }];

        let coll = frames_to_collection(&frames);
        assert_eq!(coll.find("TLAN").and_then(|s| s.text()), Some("eng"));
    }

    #[test]
    fn verify_txxx_frame_conversion() {
        let frames = [Frame {
            id: FrameId(*b"TXXX"),
            flags: FrameFlags::empty(),
            data: Box::from(&b"\x03MOOD\x00Calm"[..]),
        }];

        let coll = frames_to_collection(&frames);
        assert_eq!(coll.find("MOOD").and_then(|s| s.text()), Some("Calm"));
    }

    #[test]
    fn verify_comm_frame_conversion() {
        let frames = [Frame {
            id: FrameId(*b"COMM"),
            flags: FrameFlags::empty(),
            data: Box::from(&b"\x03engdesc\x00A comment"[..]),
        }];

        let coll = frames_to_collection(&frames);
        let comment = coll.find("COMMENT").unwrap();

        assert_eq!(comment.text(), Some("A comment"));
        assert_eq!(comment.language(), Some("eng"));
    }

    #[test]
    fn verify_binary_frame_conversion() {
        let frames = [Frame {
            id: FrameId(*b"PRIV"),
            flags: FrameFlags::empty(),
            data: Box::from(&[0xde, 0xad, 0xbe, 0xef][..]),
        }];

        let coll = frames_to_collection(&frames);
        let private = coll.find("PRIV").unwrap();

        assert_eq!(private.binary(), Some(&[0xde, 0xad, 0xbe, 0xef][..]));
    }

    #[test]
    fn verify_compressed_and_encrypted_frames_are_skipped() {
        let frames = [
            Frame {
                id: FrameId(*b"TIT2"),
                flags: FrameFlags::COMPRESSED,
                data: Box::from(&b"\x03Test"[..]),
            },
            Frame {
                id: FrameId(*b"TPE1"),
                flags: FrameFlags::ENCRYPTED,
                data: Box::from(&b"\x03Test"[..]),
            },
        ];

        let coll = frames_to_collection(&frames);
        assert!(coll.find("TITLE").is_none());
        assert!(coll.find("ARTIST").is_none());
    }

    #[test]
    fn verify_header_idempotence() {
        // Parsing a built header and rebuilding it preserves the declared body size.
        for size in [0u32, 1, 4117, (1 << 28) - 1] {
            let built = build_tag_header(size);
            let header = read_tag_header(&mut BufReader::new(&built)).unwrap();

            assert_eq!(header.tag_size, size);
            assert_eq!(build_tag_header(header.tag_size), built);
        }
    }
}
