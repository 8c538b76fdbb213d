// Cantata
// Copyright (c) 2026 The Project Cantata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fs::{File, OpenOptions};
use std::io;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// A `FileStream` provides positioned byte I/O over a file.
///
/// All reads and writes happen at the stream position set by [`FileStream::seek`]. The stream
/// never buffers, so a write is visible to a subsequent read-back immediately, and
/// [`FileStream::sync`] only has to flush the operating system's caches.
pub struct FileStream {
    file: File,
}

impl FileStream {
    /// Open a file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<FileStream> {
        Ok(FileStream { file: File::open(path)? })
    }

    /// Open a file for reading and writing. The file must exist.
    pub fn open_rw<P: AsRef<Path>>(path: P) -> io::Result<FileStream> {
        Ok(FileStream { file: OpenOptions::new().read(true).write(true).open(path)? })
    }

    /// Create a file (truncating any existing content) and open it for reading and writing.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<FileStream> {
        Ok(FileStream {
            file: OpenOptions::new().read(true).write(true).create(true).truncate(true).open(path)?,
        })
    }

    /// Reopen a file with the same access mode it was originally opened with.
    pub fn reopen<P: AsRef<Path>>(path: P, writable: bool) -> io::Result<FileStream> {
        if writable {
            FileStream::open_rw(path)
        }
        else {
            FileStream::open(path)
        }
    }

    /// Returns the length of the file in bytes.
    pub fn byte_len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Move the stream to an absolute byte position.
    pub fn seek(&mut self, pos: u64) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Gets the current stream position.
    pub fn pos(&mut self) -> io::Result<u64> {
        self.file.stream_position()
    }

    /// Reads exactly `buf.len()` bytes at the stream position.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.file.read_exact(buf)
    }

    /// Reads up-to `buf.len()` bytes at the stream position, returning the number of bytes read.
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    /// Writes the whole buffer at the stream position.
    pub fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.file.write_all(buf)
    }

    /// Flush file content to disk.
    pub fn sync(&mut self) -> io::Result<()> {
        self.file.sync_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_positioned_read_write() {
        let dir = std::env::temp_dir().join("cantata-core-file-stream-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scratch.bin");

        let mut stream = FileStream::create(&path).unwrap();
        stream.write_all(b"hello world").unwrap();
        stream.seek(6).unwrap();
        stream.write_all(b"crate").unwrap();

        let mut buf = [0u8; 11];
        stream.seek(0).unwrap();
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello crate");
        assert_eq!(stream.byte_len().unwrap(), 11);

        std::fs::remove_file(&path).unwrap();
    }
}
