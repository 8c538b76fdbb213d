// Cantata
// Copyright (c) 2026 The Project Cantata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Text field decoding for ID3v2 frames.

use std::io;

use cantata_core::io::{BufReader, FiniteStream};
use cantata_core::util::text;

/// Enumeration of valid encodings for text fields in ID3v2 tags.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// ISO-8859-1 (aka Latin-1).
    Iso8859_1,
    /// UTF-16 with a byte-order-mark (BOM). Little-endian is assumed if the BOM is not
    /// big-endian.
    Utf16Bom,
    /// UTF-16 big-endian without a byte-order-mark (BOM).
    Utf16Be,
    /// UTF-8.
    Utf8,
}

impl Encoding {
    /// Parse an encoding indicator byte.
    pub fn parse(encoding: u8) -> Option<Encoding> {
        match encoding {
            // ISO-8859-1 terminated with 0x00.
            0 => Some(Encoding::Iso8859_1),
            // UTF-16 with byte order marker (BOM), terminated with 0x00 0x00.
            1 => Some(Encoding::Utf16Bom),
            // UTF-16BE without byte order marker (BOM), terminated with 0x00 0x00.
            2 => Some(Encoding::Utf16Be),
            // UTF-8 terminated with 0x00.
            3 => Some(Encoding::Utf8),
            // Invalid encoding.
            _ => None,
        }
    }

    /// The length in bytes of this encoding's null terminator.
    pub fn terminator_len(&self) -> usize {
        match self {
            Encoding::Utf16Bom | Encoding::Utf16Be => 2,
            _ => 1,
        }
    }
}

/// Decodes a slice of bytes containing encoded text into a UTF-8 `String`.
///
/// Decoding stops at the encoding's null terminator if one is present; otherwise the whole slice
/// is decoded. Lone UTF-16 surrogates are replaced with U+FFFD.
pub fn decode_text_buf(buf: &[u8], encoding: Encoding) -> String {
    match encoding {
        Encoding::Iso8859_1 => {
            text::decode_iso8859_1(buf).take_while(text::filter::not_null).collect()
        }
        Encoding::Utf8 => {
            let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
            String::from_utf8_lossy(&buf[..end]).into_owned()
        }
        Encoding::Utf16Bom => decode_utf16_buf(buf, true, false),
        Encoding::Utf16Be => decode_utf16_buf(buf, false, true),
    }
}

fn decode_utf16_buf(buf: &[u8], has_bom: bool, default_be: bool) -> String {
    let mut data = buf;
    let mut big_endian = default_be;

    // The first two bytes are the byte-order-mark. Anything other than a big-endian mark decodes
    // as little-endian.
    if has_bom {
        if data.len() < 2 {
            return String::new();
        }
        big_endian = data[0] == 0xfe && data[1] == 0xff;
        data = &data[2..];
    }

    let units = data
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            }
            else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .take_while(|&unit| unit != 0);

    char::decode_utf16(units).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER)).collect()
}

/// Read a null-terminated string of the specified encoding from the stream. If the stream ends
/// before the null-terminator is reached, all the bytes up-to that point are interpreted as the
/// string.
pub fn read_string(reader: &mut BufReader<'_>, encoding: Encoding) -> io::Result<String> {
    let max_len = reader.bytes_available() as usize;

    let buf = match encoding.terminator_len() {
        // Byte aligned encodings. The null-terminator is 1 byte.
        1 => {
            let buf = reader.scan_bytes_aligned_ref(&[0x00], 1, max_len)?;
            // Trim the trailing null-terminator, if present.
            match buf.last() {
                Some(b'\0') => &buf[..buf.len() - 1],
                _ => buf,
            }
        }
        // Two-byte aligned encodings. The null-terminator is 2 bytes.
        _ => {
            let buf = reader.scan_bytes_aligned_ref(&[0x00, 0x00], 2, max_len)?;
            // Trim the trailing null-terminator, if present.
            match buf {
                [.., 0, 0] => &buf[..buf.len() - 2],
                _ => buf,
            }
        }
    };

    Ok(decode_text_buf(buf, encoding))
}
