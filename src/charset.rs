//! Charset-to-UTF-8 conversion
//!
//! The teacher backs this with `utf8dec-rs`, a thin wrapper around the
//! system `iconv`. That crate is a local path dependency and cannot be
//! vendored into a standalone crate, so conversion here is done with
//! `encoding_rs` instead; the API shape (`for_label`, streaming `decode`,
//! `decode_to_string`, `has_repl`) is kept close to the original so callers
//! read the same way.
use encoding_rs::{CoderResult, Encoding};

/// A streaming decoder from some 8-bit or multi-byte charset to UTF-8
pub(crate) struct CharsetDecoder {
    decoder: encoding_rs::Decoder,
    /// Set once any replacement character has been emitted
    has_repl: bool,
}

impl CharsetDecoder {
    /// Looks up a decoder by a MIME charset label (`"iso-8859-1"`,
    /// `"Shift_JIS"`, ...). Unknown labels fall back to `windows-1252`,
    /// which is a superset of ASCII and never fails to decode.
    pub fn for_label(label: &str) -> Self {
        let encoding = Encoding::for_label(label.as_bytes()).unwrap_or(encoding_rs::WINDOWS_1252);
        Self {
            decoder: encoding.new_decoder(),
            has_repl: false,
        }
    }

    /// Decodes one chunk of input, appending the result to `out`. `last`
    /// marks the final chunk, flushing any residual multi-byte state.
    pub fn decode(&mut self, input: &[u8], out: &mut String, last: bool) {
        let mut src = input;
        out.reserve(src.len());
        loop {
            let (result, consumed, had_errors) = self.decoder.decode_to_string(src, out, last);
            self.has_repl |= had_errors;
            src = &src[consumed..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => out.reserve(src.len().max(64)),
            }
        }
    }

    /// Decodes a whole, complete buffer in one shot
    pub fn decode_to_string(label: &str, input: &[u8]) -> (String, bool) {
        let mut dec = Self::for_label(label);
        let mut out = String::with_capacity(input.len());
        dec.decode(input, &mut out, true);
        (out, dec.has_repl)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        let (s, repl) = CharsetDecoder::decode_to_string("us-ascii", b"hello");
        assert_eq!(s, "hello");
        assert!(!repl);
    }

    #[test]
    fn test_latin1() {
        let (s, repl) = CharsetDecoder::decode_to_string("iso-8859-1", b"caf\xe9");
        assert_eq!(s, "caf\u{e9}");
        assert!(!repl);
    }

    #[test]
    fn test_unknown_label_falls_back() {
        let (s, repl) = CharsetDecoder::decode_to_string("bogus-charset-xyz", b"hi");
        assert_eq!(s, "hi");
        assert!(!repl);
    }

    #[test]
    fn test_streaming_decode_across_chunks() {
        let mut dec = CharsetDecoder::for_label("utf-8");
        let mut out = String::new();
        dec.decode("he".as_bytes(), &mut out, false);
        dec.decode("llo".as_bytes(), &mut out, true);
        assert_eq!(out, "hello");
    }
}
