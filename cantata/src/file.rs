// Cantata
// Copyright (c) 2026 The Project Cantata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The per-open tag session.

use std::path::{Path, PathBuf};

use cantata_core::errors::{invalid_arg_error, Error, Result};
use cantata_core::io::{BufReader, FileStream};
use cantata_core::meta::{SimpleTag, TagCollection, TargetType, Value};
use cantata_id3::id3v1;
use cantata_id3::id3v2;
use cantata_id3::id3v2::{TagHeader, TAG_HEADER_LEN};

use log::debug;

use crate::container;
use crate::container::{Carrier, CarrierKind};
use crate::save;

/// Location of the probed ID3v2 tag within the file.
#[derive(Copy, Clone, Debug)]
pub(crate) struct V2Location {
    /// The parsed tag header.
    pub header: TagHeader,
    /// File offset at which the 10-byte tag header begins.
    pub offset: u64,
}

/// A `TagFile` is an open session on one audio file.
///
/// The session probes the carrier shape on open and caches the parsed tag collection on first
/// read. Every mutating operation invalidates the cache, writes, and re-probes, so a borrowed
/// [`TagCollection`] is only valid until the next mutating call. Dropping the session closes the
/// underlying file.
pub struct TagFile {
    /// The file handle. Only vacant if a rewrite renamed the original away and the reopen
    /// failed.
    pub(crate) stream: Option<FileStream>,
    pub(crate) path: PathBuf,
    pub(crate) writable: bool,
    pub(crate) carrier: Carrier,
    pub(crate) v2: Option<V2Location>,
    /// First byte past the ID3v2 tag for raw streams; zero otherwise.
    pub(crate) audio_offset: u64,
    pub(crate) has_v1: bool,
    pub(crate) cache: Option<TagCollection>,
}

impl TagFile {
    /// Open a file for reading tags.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<TagFile> {
        TagFile::open_with(path.as_ref(), false)
    }

    /// Open a file for reading and writing tags.
    pub fn open_rw<P: AsRef<Path>>(path: P) -> Result<TagFile> {
        TagFile::open_with(path.as_ref(), true)
    }

    fn open_with(path: &Path, writable: bool) -> Result<TagFile> {
        let stream = FileStream::reopen(path, writable).map_err(Error::Io)?;

        let mut file = TagFile {
            stream: Some(stream),
            path: path.to_path_buf(),
            writable,
            carrier: Carrier { kind: CarrierKind::RawStream, form_total_size: 0, id3_chunk: None },
            v2: None,
            audio_offset: 0,
            has_v1: false,
            cache: None,
        };

        file.probe()?;

        Ok(file)
    }

    /// The path the session was opened with.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the session allows writes.
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// The probed carrier shape.
    pub fn carrier_kind(&self) -> CarrierKind {
        self.carrier.kind
    }

    /// Returns `true` if the file carries an ID3v2 tag.
    pub fn has_id3v2(&self) -> bool {
        self.v2.is_some()
    }

    /// Returns `true` if the file ends with an ID3v1 trailer.
    pub fn has_id3v1(&self) -> bool {
        self.has_v1
    }

    /// Probe the carrier shape and tag geometry of the file.
    pub(crate) fn probe(&mut self) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotOpen)?;

        let carrier = container::detect(stream)?;

        // Where an ID3v2 tag would live: at offset zero for raw streams, or at the chunk payload
        // for containers that carry an ID3 chunk.
        let v2_offset = if carrier.kind.is_container() {
            carrier.id3_chunk.map(|chunk| chunk.data_offset)
        }
        else {
            Some(0)
        };

        self.v2 = None;

        if let Some(offset) = v2_offset {
            let mut header = [0u8; TAG_HEADER_LEN];

            // A file without a readable tag header simply has no ID3v2 tag.
            if stream.seek(offset).is_ok() && stream.read_exact(&mut header).is_ok() {
                match id3v2::read_tag_header(&mut BufReader::new(&header)) {
                    Ok(header) => self.v2 = Some(V2Location { header, offset }),
                    Err(err) => debug!("no usable id3v2 tag: {}", err),
                }
            }
        }

        // For raw streams the audio follows the tag.
        self.audio_offset = match (&self.v2, carrier.kind.is_container()) {
            (Some(v2), false) => v2.header.total_len(),
            _ => 0,
        };

        // Check for an ID3v1 trailer at the end of the file.
        self.has_v1 = false;

        let file_len = stream.byte_len()?;
        if file_len >= id3v1::TAG_LEN as u64 {
            let mut marker = [0u8; 3];

            stream.seek(file_len - id3v1::TAG_LEN as u64).map_err(Error::SeekFailed)?;
            if stream.read_exact(&mut marker).is_ok() {
                self.has_v1 = id3v1::is_tag(&marker);
            }
        }

        self.carrier = carrier;

        Ok(())
    }

    /// Read all tags of the file.
    ///
    /// The returned collection is owned by the session and remains valid until the next mutating
    /// call. ID3v2 is preferred; a file with only an ID3v1 trailer falls back to it.
    pub fn tags(&mut self) -> Result<&TagCollection> {
        if self.cache.is_none() {
            let coll = self.read_tags_uncached()?;
            self.cache = Some(coll);
        }

        // Filled directly above.
        Ok(self.cache.as_ref().unwrap())
    }

    fn read_tags_uncached(&mut self) -> Result<TagCollection> {
        if let Some(v2) = self.v2 {
            let stream = self.stream.as_mut().ok_or(Error::NotOpen)?;

            // Read the tag body. The file may hold fewer bytes than the tag declares; the frame
            // walk deals with the shortfall.
            let body_start = v2.offset + TAG_HEADER_LEN as u64;
            let file_len = stream.byte_len()?;
            let avail = file_len.saturating_sub(body_start).min(u64::from(v2.header.tag_size));

            let mut body = vec![0u8; avail as usize];
            stream.seek(body_start).map_err(Error::SeekFailed)?;
            stream.read_exact(&mut body)?;

            let frames = id3v2::read_frames(&body, &v2.header)?;

            return Ok(id3v2::frames_to_collection(&frames));
        }

        if self.has_v1 {
            let stream = self.stream.as_mut().ok_or(Error::NotOpen)?;

            let file_len = stream.byte_len()?;
            let mut buf = [0u8; id3v1::TAG_LEN];

            stream.seek(file_len - id3v1::TAG_LEN as u64).map_err(Error::SeekFailed)?;
            stream.read_exact(&mut buf)?;

            return id3v1::read_id3v1(&buf);
        }

        Err(Error::NoTags)
    }

    /// Read a single tag value by name (ASCII case-insensitive). The first matching text simple
    /// tag across all tags is returned.
    pub fn tag_value(&mut self, name: &str) -> Result<&str> {
        if name.is_empty() {
            return invalid_arg_error("tag name is empty");
        }

        let tags = self.tags()?;

        tags.tags()
            .iter()
            .flat_map(|tag| tag.simple_tags().iter())
            .filter(|simple| simple.name().eq_ignore_ascii_case(name))
            .find_map(|simple| simple.text())
            .ok_or(Error::TagNotFound)
    }

    /// Read a single tag value by name into a caller-provided buffer, returning the number of
    /// bytes copied. Fails with [`Error::TagTooLarge`] if the value does not fit.
    pub fn read_tag_into(&mut self, name: &str, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return invalid_arg_error("buffer is empty");
        }

        let value = self.tag_value(name)?;

        if value.len() > buf.len() {
            return Err(Error::TagTooLarge);
        }

        buf[..value.len()].copy_from_slice(value.as_bytes());

        Ok(value.len())
    }

    /// Replace all tags in the file with the given collection.
    ///
    /// The write happens in place when the serialized frames fit the region the current tag
    /// occupies; otherwise the file is rewritten through a temp file and atomically renamed.
    pub fn write_tags(&mut self, tags: &TagCollection) -> Result<()> {
        if self.stream.is_none() {
            return Err(Error::NotOpen);
        }
        if !self.writable {
            return Err(Error::ReadOnly);
        }

        let frames = id3v2::serialize_frames(tags);

        // The cache describes the previous file content from here on.
        self.cache = None;

        save::place(self, &frames)?;

        // Refresh the probed geometry to match the new file content.
        self.probe()
    }

    /// Set or replace a single tag, keeping all others.
    pub fn set_tag(&mut self, name: &str, value: &str) -> Result<()> {
        self.update_tag(name, Some(value))
    }

    /// Remove a single tag, keeping all others.
    pub fn remove_tag(&mut self, name: &str) -> Result<()> {
        self.update_tag(name, None)
    }

    fn update_tag(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        if name.is_empty() {
            return invalid_arg_error("tag name is empty");
        }
        if self.stream.is_none() {
            return Err(Error::NotOpen);
        }
        if !self.writable {
            return Err(Error::ReadOnly);
        }

        let mut work = TagCollection::new();
        let tag = work.add_tag(TargetType::Album);

        // Carry over the current tags minus the one being replaced. A file without any tags is
        // fine.
        if let Ok(existing) = self.tags() {
            for current in existing.tags() {
                for simple in current.simple_tags() {
                    if simple.name().eq_ignore_ascii_case(name) {
                        continue;
                    }

                    let mut copy = match simple.value() {
                        Value::String(text) => SimpleTag::new_text(simple.name(), text.clone()),
                        Value::Binary(data) => SimpleTag::new_binary(simple.name(), data),
                    };
                    copy.set_language(simple.language());

                    tag.push_simple(copy);
                }
            }
        }

        if let Some(value) = value {
            tag.add_simple(name, value);
        }

        self.write_tags(&work)
    }
}
