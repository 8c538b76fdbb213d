// Cantata
// Copyright (c) 2026 The Project Cantata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The tag placement engine.
//!
//! Given a freshly serialized buffer of frames, placement first attempts an in-place overwrite
//! within the region the current tag already occupies, zero-padding the remainder. When the
//! frames do not fit, the whole file is rewritten through a sibling `<path>.tmp` file that is
//! atomically renamed over the original once flushed.

use std::fs;
use std::path::{Path, PathBuf};

use cantata_core::errors::{Error, Result};
use cantata_core::io::FileStream;
use cantata_id3::id3v2::{build_tag_header, DEFAULT_PADDING, TAG_HEADER_LEN};

use log::debug;

use crate::container;
use crate::file::TagFile;

/// Write the serialized frames into the file, in-place when possible, else by rewriting.
pub(crate) fn place(file: &mut TagFile, frames: &[u8]) -> Result<()> {
    if file.carrier.kind.is_container() {
        place_in_container(file, frames)
    }
    else {
        place_in_raw_stream(file, frames)
    }
}

/// Raw stream placement. The current tag occupies the first `10 + tag_size` bytes of the file
/// with the audio following it.
fn place_in_raw_stream(file: &mut TagFile, frames: &[u8]) -> Result<()> {
    if let Some(v2) = file.v2 {
        let available = v2.header.tag_size as usize;

        if frames.len() <= available {
            let stream = file.stream.as_mut().ok_or(Error::NotOpen)?;

            // Rewrite the header with the unchanged size, the new frames, and zero padding up to
            // the allocated region.
            let header = build_tag_header(available as u32);

            stream.seek(v2.offset).map_err(Error::SeekFailed)?;
            stream.write_all(&header).map_err(Error::WriteFailed)?;
            stream.write_all(frames).map_err(Error::WriteFailed)?;
            write_zeros(stream, (available - frames.len()) as u64)?;
            stream.sync().map_err(Error::Io)?;

            return Ok(());
        }

        debug!("tag does not fit in place, rewriting the file");
    }

    rewrite_raw_stream(file, frames)
}

/// Rewrite a raw stream: a fresh tag with default padding followed by the audio copied verbatim.
fn rewrite_raw_stream(file: &mut TagFile, frames: &[u8]) -> Result<()> {
    let tmp_path = temp_path(&file.path);
    let mut tmp = FileStream::create(&tmp_path).map_err(Error::Io)?;

    if let Err(err) = fill_raw_temp(file, &mut tmp, frames) {
        drop(tmp);
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    commit_rename(&mut file.stream, &file.path, file.writable, tmp, &tmp_path)
}

fn fill_raw_temp(file: &mut TagFile, tmp: &mut FileStream, frames: &[u8]) -> Result<()> {
    let header = build_tag_header((frames.len() + DEFAULT_PADDING) as u32);

    tmp.write_all(&header).map_err(Error::WriteFailed)?;
    tmp.write_all(frames).map_err(Error::WriteFailed)?;
    write_zeros(tmp, DEFAULT_PADDING as u64)?;

    // Stream the audio (and a trailing ID3v1 tag, if any) verbatim.
    let stream = file.stream.as_mut().ok_or(Error::NotOpen)?;

    let src_end = stream.byte_len()?;
    let src_offset = file.audio_offset.min(src_end);

    stream.seek(src_offset).map_err(Error::SeekFailed)?;
    copy_bytes(stream, tmp, src_end - src_offset)?;

    tmp.sync().map_err(Error::Io)
}

/// Container placement. The tag lives inside the ID3 chunk; in-place requires the tag header and
/// frames to fit the chunk payload. Otherwise a complete tag is synthesized and the chunk is
/// appended or the container rewritten.
fn place_in_container(file: &mut TagFile, frames: &[u8]) -> Result<()> {
    if let Some(chunk) = file.carrier.id3_chunk {
        let data_size = chunk.data_size as usize;

        if TAG_HEADER_LEN + frames.len() <= data_size {
            let stream = file.stream.as_mut().ok_or(Error::NotOpen)?;

            // The tag fills the whole chunk: its declared size is the payload minus the header.
            let header = build_tag_header((data_size - TAG_HEADER_LEN) as u32);

            stream.seek(chunk.data_offset).map_err(Error::SeekFailed)?;
            stream.write_all(&header).map_err(Error::WriteFailed)?;
            stream.write_all(frames).map_err(Error::WriteFailed)?;
            write_zeros(stream, (data_size - TAG_HEADER_LEN - frames.len()) as u64)?;
            stream.sync().map_err(Error::Io)?;

            return Ok(());
        }

        debug!("tag does not fit in the id3 chunk, rewriting the container");
    }

    // Synthesize a complete tag with default padding and hand it to the chunk locator.
    let total = TAG_HEADER_LEN + frames.len() + DEFAULT_PADDING;

    let mut tag = Vec::with_capacity(total);
    tag.extend_from_slice(&build_tag_header((frames.len() + DEFAULT_PADDING) as u32));
    tag.extend_from_slice(frames);
    tag.resize(total, 0);

    if file.carrier.id3_chunk.is_none() {
        let stream = file.stream.as_mut().ok_or(Error::NotOpen)?;
        container::append_id3(stream, &mut file.carrier, &tag)
    }
    else {
        container::rewrite_id3(&mut file.stream, &file.path, file.writable, &mut file.carrier, &tag)
    }
}

/// Build the sibling temp path `<path>.tmp`.
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

/// Close both files, rename the flushed temp file over the original, and reopen the original
/// path with the session's access mode.
///
/// On a rename failure the temp file is unlinked and the original reopened so the session stays
/// usable while the error surfaces.
pub(crate) fn commit_rename(
    slot: &mut Option<FileStream>,
    path: &Path,
    writable: bool,
    tmp: FileStream,
    tmp_path: &Path,
) -> Result<()> {
    // Both handles must be closed before the rename.
    drop(tmp);
    *slot = None;

    if let Err(err) = fs::rename(tmp_path, path) {
        let _ = fs::remove_file(tmp_path);
        *slot = FileStream::reopen(path, writable).ok();
        return Err(Error::RenameFailed(err));
    }

    *slot = Some(FileStream::reopen(path, writable).map_err(Error::Io)?);

    Ok(())
}

/// Write `count` zero bytes at the stream position.
pub(crate) fn write_zeros(stream: &mut FileStream, mut count: u64) -> Result<()> {
    let zeros = [0u8; 4096];

    while count > 0 {
        let n = count.min(zeros.len() as u64) as usize;
        stream.write_all(&zeros[..n]).map_err(Error::WriteFailed)?;
        count -= n as u64;
    }

    Ok(())
}

/// Copy up-to `count` bytes from the source stream position to the destination stream position.
/// A source that ends early terminates the copy without error.
pub(crate) fn copy_bytes(src: &mut FileStream, dst: &mut FileStream, mut count: u64) -> Result<()> {
    let mut buf = vec![0u8; 65536];

    while count > 0 {
        let want = count.min(buf.len() as u64) as usize;

        let n = src.read(&mut buf[..want]).map_err(Error::Io)?;
        if n == 0 {
            break;
        }

        dst.write_all(&buf[..n]).map_err(Error::WriteFailed)?;
        count -= n as u64;
    }

    Ok(())
}
