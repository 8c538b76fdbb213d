// Cantata
// Copyright (c) 2026 The Project Cantata Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `util` module provides shared helper functionality.

pub mod text {
    //! Common text decoding helpers.

    /// Decodes a slice of bytes as ISO/IEC 8859-1 characters.
    ///
    /// Every byte value is a valid ISO/IEC 8859-1 character, so this function is lossless.
    pub fn decode_iso8859_1(buf: &[u8]) -> impl Iterator<Item = char> + '_ {
        buf.iter().map(|&c| char::from(c))
    }

    pub mod filter {
        //! Iterator filters for use with the text decoders.

        /// Returns `true` if the character is not the null character.
        pub fn not_null(c: &char) -> bool {
            *c != '\0'
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn verify_decode_iso8859_1() {
            let text: String = decode_iso8859_1(&[0x41, 0xe9, 0x20, 0xff]).collect();
            assert_eq!(text, "Aé ÿ");
        }

        #[test]
        fn verify_not_null_filter() {
            let text: String =
                decode_iso8859_1(b"abc\0def").take_while(filter::not_null).collect();
            assert_eq!(text, "abc");
        }
    }
}
