// Cantata
// Copyright (c) 2026 The Project Cantata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error;
use std::fmt;
use std::io;
use std::result;

/// `Error` provides an enumeration of all possible errors reported by Cantata.
#[derive(Debug)]
pub enum Error {
    /// A parameter passed by the caller was invalid.
    InvalidArg(&'static str),
    /// An IO error occurred while reading, writing, or probing the file.
    Io(io::Error),
    /// The session lost its file handle (a failed rewrite could not reopen the original file).
    NotOpen,
    /// A write operation was attempted on a session opened read-only.
    ReadOnly,
    /// The stream does not carry an `ID3` tag where one was expected.
    NoId3(&'static str),
    /// The ID3v2 header is malformed (a syncsafe size byte has its high bit set).
    MalformedTag(&'static str),
    /// The tag contained malformed data and could not be decoded.
    DecodeError(&'static str),
    /// The file ended before a declared structure could be read in full.
    Truncated(&'static str),
    /// An unsupported tag version or feature was encountered.
    Unsupported(&'static str),
    /// The file carries no tags at all.
    NoTags,
    /// No tag with the requested name exists.
    TagNotFound,
    /// The tag value does not fit in the caller-provided buffer.
    TagTooLarge,
    /// A write syscall failed.
    WriteFailed(io::Error),
    /// A seek syscall failed.
    SeekFailed(io::Error),
    /// Renaming the rewritten file over the original failed.
    RenameFailed(io::Error),
}

impl Error {
    /// Gets the numeric code of the error. Zero is success, negative is an error.
    pub fn code(&self) -> i32 {
        match self {
            Error::InvalidArg(_) => -1,
            Error::Io(_) => -3,
            Error::NotOpen => -4,
            Error::ReadOnly => -6,
            Error::NoId3(_) => -10,
            Error::MalformedTag(_) => -11,
            Error::DecodeError(_) => -12,
            Error::Truncated(_) => -13,
            Error::Unsupported(_) => -14,
            Error::NoTags => -20,
            Error::TagNotFound => -21,
            Error::TagTooLarge => -22,
            Error::WriteFailed(_) => -31,
            Error::SeekFailed(_) => -32,
            Error::RenameFailed(_) => -33,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArg(msg) => write!(f, "invalid argument: {}", msg),
            Error::Io(err) => write!(f, "io error: {}", err),
            Error::NotOpen => write!(f, "file not open"),
            Error::ReadOnly => write!(f, "file opened read-only"),
            Error::NoId3(msg) => write!(f, "not an MP3 file or no ID3 tag: {}", msg),
            Error::MalformedTag(msg) => write!(f, "invalid ID3v2 header: {}", msg),
            Error::DecodeError(msg) => write!(f, "malformed tag: {}", msg),
            Error::Truncated(msg) => write!(f, "unexpected end of file: {}", msg),
            Error::Unsupported(feature) => write!(f, "unsupported feature: {}", feature),
            Error::NoTags => write!(f, "no tags found"),
            Error::TagNotFound => write!(f, "tag not found"),
            Error::TagTooLarge => write!(f, "tag data too large for buffer"),
            Error::WriteFailed(err) => write!(f, "write operation failed: {}", err),
            Error::SeekFailed(err) => write!(f, "seek operation failed: {}", err),
            Error::RenameFailed(err) => write!(f, "file rename failed: {}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(err)
            | Error::WriteFailed(err)
            | Error::SeekFailed(err)
            | Error::RenameFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::Truncated("unexpected end of file"),
            _ => Error::Io(err),
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create an invalid argument error.
pub fn invalid_arg_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::InvalidArg(msg))
}

/// Convenience function to create a missing-magic error.
pub fn no_id3_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::NoId3(msg))
}

/// Convenience function to create a malformed header error.
pub fn malformed_tag_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::MalformedTag(msg))
}

/// Convenience function to create a decode error.
pub fn decode_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::DecodeError(msg))
}

/// Convenience function to create a truncation error.
pub fn truncated_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::Truncated(msg))
}

/// Convenience function to create an unsupported feature error.
pub fn unsupported_error<T>(feature: &'static str) -> Result<T> {
    Err(Error::Unsupported(feature))
}

/// Gets the human-readable description for a numeric error code.
///
/// The table covers the full classic taxonomy, including codes that the safe Rust API cannot
/// produce (`NO_MEMORY`, `ALREADY_OPEN`, `NO_SPACE`).
pub fn code_description(code: i32) -> &'static str {
    match code {
        0 => "success",
        -1 => "invalid argument",
        -2 => "out of memory",
        -3 => "io error",
        -4 => "file not open",
        -5 => "file already open",
        -6 => "file opened read-only",
        -10 => "not an MP3 file or no ID3 tag",
        -11 => "invalid ID3v2 header",
        -12 => "file is corrupted",
        -13 => "unexpected end of file",
        -14 => "unsupported ID3v2 version",
        -20 => "no tags found",
        -21 => "tag not found",
        -22 => "tag data too large for buffer",
        -30 => "not enough space for in-place write",
        -31 => "write operation failed",
        -32 => "seek operation failed",
        -33 => "file rename failed",
        _ => "unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_error_codes() {
        assert_eq!(Error::InvalidArg("x").code(), -1);
        assert_eq!(Error::ReadOnly.code(), -6);
        assert_eq!(Error::NoId3("x").code(), -10);
        assert_eq!(Error::MalformedTag("x").code(), -11);
        assert_eq!(Error::Truncated("x").code(), -13);
        assert_eq!(Error::Unsupported("x").code(), -14);
        assert_eq!(Error::NoTags.code(), -20);
        assert_eq!(Error::TagNotFound.code(), -21);
        assert_eq!(Error::TagTooLarge.code(), -22);
    }

    #[test]
    fn verify_every_code_has_a_description() {
        let codes = [0, -1, -2, -3, -4, -5, -6, -10, -11, -12, -13, -14, -20, -21, -22, -30, -31,
            -32, -33];

        for code in codes {
            assert_ne!(code_description(code), "unknown error");
        }

        assert_eq!(code_description(-99), "unknown error");
    }

    #[test]
    fn verify_eof_maps_to_truncated() {
        let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        assert!(matches!(Error::from(eof), Error::Truncated(_)));
    }
}
