// Cantata
// Copyright (c) 2026 The Project Cantata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Carrier detection and the IFF/RIFF chunk locator.
//!
//! A carrier is identified from the first 12 bytes of the file. For IFF/AIFF and RIFF/WAVE/AVI
//! containers, the flat chunk list is walked to find the chunk carrying the ID3 tag: `"ID3 "`
//! with big-endian sizes for AIFF, `"id3 "` with little-endian sizes for WAVE and AVI. Chunk
//! payloads of odd length are followed by a single pad byte.

use std::path::Path;

use cantata_core::errors::{Error, Result};
use cantata_core::io::FileStream;

use log::debug;

use crate::save;

/// Length of an IFF/RIFF chunk header: 4-byte id plus 4-byte size.
const CHUNK_HEADER_LEN: u64 = 8;

/// The shape of the carrier holding the tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CarrierKind {
    /// A raw elementary stream (MP3 or AAC ADTS) with the tag prepended.
    RawStream,
    /// An IFF/AIFF (or AIFC) container.
    Aiff,
    /// A RIFF/WAVE container.
    Wav,
    /// A RIFF/AVI container.
    Avi,
}

impl CarrierKind {
    /// Returns `true` for carriers that wrap the tag in a chunk.
    pub fn is_container(&self) -> bool {
        !matches!(self, CarrierKind::RawStream)
    }

    /// The id of the chunk carrying the ID3 tag.
    fn id3_chunk_id(&self) -> &'static [u8; 4] {
        match self {
            CarrierKind::Aiff => b"ID3 ",
            _ => b"id3 ",
        }
    }

    /// Decode a chunk or form size field with the carrier's endianness.
    fn read_size(&self, bytes: [u8; 4]) -> u32 {
        match self {
            CarrierKind::Aiff => u32::from_be_bytes(bytes),
            _ => u32::from_le_bytes(bytes),
        }
    }

    /// Encode a chunk or form size field with the carrier's endianness.
    fn size_bytes(&self, value: u32) -> [u8; 4] {
        match self {
            CarrierKind::Aiff => value.to_be_bytes(),
            _ => value.to_le_bytes(),
        }
    }
}

/// Location of the ID3 chunk within a container.
#[derive(Copy, Clone, Debug)]
pub struct Id3Chunk {
    /// File offset of the 8-byte chunk header.
    pub offset: u64,
    /// Length of the chunk payload.
    pub data_size: u32,
    /// File offset of the first payload byte. Always `offset + 8`.
    pub data_offset: u64,
}

/// The probed carrier geometry of an open file.
#[derive(Copy, Clone, Debug)]
pub struct Carrier {
    /// The carrier shape.
    pub kind: CarrierKind,
    /// The 32-bit size field at file offset 4, excluding the first 8 bytes of the file. Zero for
    /// raw streams.
    pub form_total_size: u32,
    /// The located ID3 chunk, if the carrier is a container and one exists.
    pub id3_chunk: Option<Id3Chunk>,
}

impl Carrier {
    fn raw_stream() -> Carrier {
        Carrier { kind: CarrierKind::RawStream, form_total_size: 0, id3_chunk: None }
    }
}

/// Detect the carrier shape from the first 12 bytes of the file and locate the ID3 chunk for
/// containers. Anything that is not a recognized container is a raw stream.
pub(crate) fn detect(stream: &mut FileStream) -> Result<Carrier> {
    if stream.byte_len()? < 12 {
        return Ok(Carrier::raw_stream());
    }

    stream.seek(0).map_err(Error::SeekFailed)?;

    let mut magic = [0u8; 12];
    if stream.read_exact(&mut magic).is_err() {
        return Ok(Carrier::raw_stream());
    }

    let kind = if magic[0..4] == *b"FORM"
        && (magic[8..12] == *b"AIFF" || magic[8..12] == *b"AIFC")
    {
        CarrierKind::Aiff
    }
    else if magic[0..4] == *b"RIFF" && magic[8..12] == *b"WAVE" {
        CarrierKind::Wav
    }
    else if magic[0..4] == *b"RIFF" && magic[8..12] == *b"AVI " {
        CarrierKind::Avi
    }
    else {
        return Ok(Carrier::raw_stream());
    };

    let form_total_size = kind.read_size([magic[4], magic[5], magic[6], magic[7]]);
    let id3_chunk = scan_chunks(stream, kind, form_total_size)?;

    debug!("detected {:?} carrier, id3 chunk: {:?}", kind, id3_chunk);

    Ok(Carrier { kind, form_total_size, id3_chunk })
}

/// Walk the chunk list looking for the ID3 chunk. The walk is bounded by the declared form size
/// or the end of the file, whichever comes first.
fn scan_chunks(
    stream: &mut FileStream,
    kind: CarrierKind,
    form_total_size: u32,
) -> Result<Option<Id3Chunk>> {
    let target = kind.id3_chunk_id();

    let file_len = stream.byte_len()?;
    let end = (CHUNK_HEADER_LEN + u64::from(form_total_size)).min(file_len);

    let mut pos = 12u64;

    while pos + CHUNK_HEADER_LEN <= end {
        if stream.seek(pos).is_err() {
            break;
        }

        let mut header = [0u8; 8];
        if stream.read_exact(&mut header).is_err() {
            break;
        }

        let size = kind.read_size([header[4], header[5], header[6], header[7]]);

        if header[0..4] == *target {
            return Ok(Some(Id3Chunk {
                offset: pos,
                data_size: size,
                data_offset: pos + CHUNK_HEADER_LEN,
            }));
        }

        pos += CHUNK_HEADER_LEN + u64::from(size);
        // Chunk payloads of odd length are followed by a pad byte.
        if size & 1 == 1 {
            pos += 1;
        }
    }

    Ok(None)
}

/// Append a new ID3 chunk at the end of the container and patch the form total size.
pub(crate) fn append_id3(
    stream: &mut FileStream,
    carrier: &mut Carrier,
    tag: &[u8],
) -> Result<()> {
    let tag_size = tag.len() as u32;
    let file_len = stream.byte_len()?;

    let mut header = [0u8; 8];
    header[0..4].copy_from_slice(carrier.kind.id3_chunk_id());
    header[4..8].copy_from_slice(&carrier.kind.size_bytes(tag_size));

    stream.seek(file_len).map_err(Error::SeekFailed)?;
    stream.write_all(&header).map_err(Error::WriteFailed)?;
    stream.write_all(tag).map_err(Error::WriteFailed)?;

    if tag_size & 1 == 1 {
        stream.write_all(&[0]).map_err(Error::WriteFailed)?;
    }

    let added = CHUNK_HEADER_LEN as u32 + tag_size + (tag_size & 1);
    let new_total = carrier.form_total_size + added;

    stream.seek(4).map_err(Error::SeekFailed)?;
    stream.write_all(&carrier.kind.size_bytes(new_total)).map_err(Error::WriteFailed)?;
    stream.sync().map_err(Error::Io)?;

    carrier.form_total_size = new_total;
    carrier.id3_chunk = Some(Id3Chunk {
        offset: file_len,
        data_size: tag_size,
        data_offset: file_len + CHUNK_HEADER_LEN,
    });

    Ok(())
}

/// Rewrite the container through a sibling temp file, replacing the old ID3 chunk with a new one
/// emitted after all other chunks, then atomically rename the temp file over the original.
///
/// On success the session's stream points at the reopened file. On a rename failure the original
/// is reopened so the session stays usable.
pub(crate) fn rewrite_id3(
    slot: &mut Option<FileStream>,
    path: &Path,
    writable: bool,
    carrier: &mut Carrier,
    tag: &[u8],
) -> Result<()> {
    let tmp_path = save::temp_path(path);
    let mut tmp = FileStream::create(&tmp_path).map_err(Error::Io)?;

    let (new_total, new_chunk_offset) = match fill_temp(slot, &mut tmp, carrier, tag) {
        Ok(patch) => patch,
        Err(err) => {
            drop(tmp);
            let _ = std::fs::remove_file(&tmp_path);
            return Err(err);
        }
    };

    save::commit_rename(slot, path, writable, tmp, &tmp_path)?;

    carrier.form_total_size = new_total;
    carrier.id3_chunk = Some(Id3Chunk {
        offset: new_chunk_offset,
        data_size: tag.len() as u32,
        data_offset: new_chunk_offset + CHUNK_HEADER_LEN,
    });

    Ok(())
}

/// Stream the container into the temp file with the old ID3 chunk dropped and the new tag
/// appended as the final chunk. Returns the patched form total size and the offset of the new
/// chunk header.
fn fill_temp(
    slot: &mut Option<FileStream>,
    tmp: &mut FileStream,
    carrier: &Carrier,
    tag: &[u8],
) -> Result<(u32, u64)> {
    let stream = slot.as_mut().ok_or(Error::NotOpen)?;

    let kind = carrier.kind;
    let skip_id = kind.id3_chunk_id();
    let file_len = stream.byte_len()?;

    // Copy the 12-byte form header verbatim; the total size field is patched at the end.
    let mut form_header = [0u8; 12];
    stream.seek(0).map_err(Error::SeekFailed)?;
    stream.read_exact(&mut form_header)?;
    tmp.write_all(&form_header).map_err(Error::WriteFailed)?;

    // Stream every chunk except the old ID3 chunk.
    let end = (CHUNK_HEADER_LEN + u64::from(carrier.form_total_size)).min(file_len);
    let mut pos = 12u64;

    while pos + CHUNK_HEADER_LEN <= end {
        if stream.seek(pos).is_err() {
            break;
        }

        let mut header = [0u8; 8];
        if stream.read_exact(&mut header).is_err() {
            break;
        }

        let size = kind.read_size([header[4], header[5], header[6], header[7]]);
        let total = CHUNK_HEADER_LEN + u64::from(size) + u64::from(size & 1);

        if header[0..4] != *skip_id {
            stream.seek(pos).map_err(Error::SeekFailed)?;
            save::copy_bytes(stream, tmp, total)?;
        }

        pos += total;
    }

    // Emit the new ID3 chunk after all others.
    let tag_size = tag.len() as u32;
    let new_chunk_offset = tmp.pos().map_err(Error::Io)?;

    let mut header = [0u8; 8];
    header[0..4].copy_from_slice(kind.id3_chunk_id());
    header[4..8].copy_from_slice(&kind.size_bytes(tag_size));

    tmp.write_all(&header).map_err(Error::WriteFailed)?;
    tmp.write_all(tag).map_err(Error::WriteFailed)?;

    if tag_size & 1 == 1 {
        tmp.write_all(&[0]).map_err(Error::WriteFailed)?;
    }

    // The form total size is everything after the first 8 bytes of the file.
    let new_len = tmp.pos().map_err(Error::Io)?;
    let new_total = (new_len - CHUNK_HEADER_LEN) as u32;

    tmp.seek(4).map_err(Error::SeekFailed)?;
    tmp.write_all(&kind.size_bytes(new_total)).map_err(Error::WriteFailed)?;
    tmp.sync().map_err(Error::Io)?;

    Ok((new_total, new_chunk_offset))
}
