// Cantata
// Copyright (c) 2026 The Project Cantata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! An ID3v1 metadata reader.
//!
//! ID3v1 is a fixed 128-byte trailer at the very end of the file. It is read-only: the writer
//! never produces one, and a rewrite carries an existing trailer along with the audio.

use cantata_core::errors::{Error, Result};
use cantata_core::meta::{Tag, TagCollection, TargetType};
use cantata_core::util::text;

/// Total length of an ID3v1 tag.
pub const TAG_LEN: usize = 128;

/// Returns `true` if the buffer starts with the `TAG` marker of an ID3v1 trailer.
pub fn is_tag(buf: &[u8]) -> bool {
    buf.len() >= 3 && buf[0..3] == *b"TAG"
}

/// Decode a fixed-width ID3v1 text field: ISO-8859-1 up to the first null, trailing spaces
/// trimmed.
fn read_field(buf: &[u8]) -> String {
    let field: String = text::decode_iso8859_1(buf).take_while(text::filter::not_null).collect();
    field.trim_end_matches(' ').to_string()
}

fn add_simple(tag: &mut Tag, name: &str, value: String) {
    if !value.is_empty() {
        tag.add_simple(name, value);
    }
}

/// Parse the final 128 bytes of a file as an ID3v1 tag.
///
/// Layout:
///   0-2:    "TAG"
///   3-32:   Title  (30 bytes)
///   33-62:  Artist (30 bytes)
///   63-92:  Album  (30 bytes)
///   93-96:  Year   (4 bytes, ASCII)
///   97-126: Comment (30 bytes; if byte 125 is 0 and byte 126 is not, this is ID3v1.1 with the
///           track number in byte 126)
///   127:    Genre  (index, 0xFF means none)
pub fn read_id3v1(buf: &[u8; TAG_LEN]) -> Result<TagCollection> {
    if !is_tag(buf) {
        return Err(Error::NoTags);
    }

    let mut coll = TagCollection::new();
    let tag = coll.add_tag(TargetType::Album);

    add_simple(tag, "TITLE", read_field(&buf[3..33]));
    add_simple(tag, "ARTIST", read_field(&buf[33..63]));
    add_simple(tag, "ALBUM", read_field(&buf[63..93]));
    add_simple(tag, "DATE_RELEASED", read_field(&buf[93..97]));

    // ID3v1.1: byte 125 zero and byte 126 non-zero shortens the comment to 28 bytes and stores
    // the track number in byte 126.
    if buf[125] == 0 && buf[126] != 0 {
        add_simple(tag, "COMMENT", read_field(&buf[97..125]));
        add_simple(tag, "TRACK_NUMBER", buf[126].to_string());
    }
    else {
        add_simple(tag, "COMMENT", read_field(&buf[97..127]));
    }

    // The genre is surfaced as its numeric index.
    if buf[127] != 0xff {
        add_simple(tag, "GENRE", buf[127].to_string());
    }

    Ok(coll)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_tag(title: &str, artist: &str, album: &str, year: &str) -> [u8; TAG_LEN] {
        let mut buf = [0u8; TAG_LEN];
        buf[0..3].copy_from_slice(b"TAG");
        buf[3..3 + title.len()].copy_from_slice(title.as_bytes());
        buf[33..33 + artist.len()].copy_from_slice(artist.as_bytes());
        buf[63..63 + album.len()].copy_from_slice(album.as_bytes());
        buf[93..93 + year.len()].copy_from_slice(year.as_bytes());
        buf[127] = 0xff;
        buf
    }

    #[test]
    fn verify_read_id3v1() {
        let mut buf = make_tag("Old", "Artist", "Album", "1999");
        buf[97..104].copy_from_slice(b"Comment");

        let coll = read_id3v1(&buf).unwrap();

        assert_eq!(coll.find("TITLE").and_then(|s| s.text()), Some("Old"));
        assert_eq!(coll.find("ARTIST").and_then(|s| s.text()), Some("Artist"));
        assert_eq!(coll.find("ALBUM").and_then(|s| s.text()), Some("Album"));
        assert_eq!(coll.find("DATE_RELEASED").and_then(|s| s.text()), Some("1999"));
        assert_eq!(coll.find("COMMENT").and_then(|s| s.text()), Some("Comment"));
        assert!(coll.find("GENRE").is_none());
        assert!(coll.find("TRACK_NUMBER").is_none());
    }

    #[test]
    fn verify_read_id3v1_1_track_number() {
        let mut buf = make_tag("Title", "Artist", "Album", "1999");
        buf[125] = 0;
        buf[126] = 7;

        let coll = read_id3v1(&buf).unwrap();
        assert_eq!(coll.find("TRACK_NUMBER").and_then(|s| s.text()), Some("7"));
    }

    #[test]
    fn verify_genre_index() {
        let mut buf = make_tag("Title", "Artist", "Album", "1999");
        buf[127] = 17;

        let coll = read_id3v1(&buf).unwrap();
        assert_eq!(coll.find("GENRE").and_then(|s| s.text()), Some("17"));
    }

    #[test]
    fn verify_fields_are_space_trimmed() {
        let mut buf = make_tag("", "", "", "");
        buf[3..33].copy_from_slice(b"Padded                        ");

        let coll = read_id3v1(&buf).unwrap();
        assert_eq!(coll.find("TITLE").and_then(|s| s.text()), Some("Padded"));
    }

    #[test]
    fn verify_missing_marker() {
        let buf = [0u8; TAG_LEN];
        assert!(read_id3v1(&buf).is_err());
    }
}
