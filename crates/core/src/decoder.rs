//! Incremental UTF-8 decoding of terminal output.
//!
//! PTY reads can end in the middle of a multi-byte character. The decoder
//! keeps the incomplete tail between calls and only gives it up when the
//! stream ends.

use std::char::REPLACEMENT_CHARACTER;

/// Streaming UTF-8 decoder with carry-over state.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the next chunk, holding back an incomplete trailing sequence.
    ///
    /// Invalid bytes are replaced with U+FFFD.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        let mut output = String::with_capacity(input.len());
        let mut rest = input.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    output.push_str(valid);
                    break;
                }
                Err(error) => {
                    let (valid, after) = rest.split_at(error.valid_up_to());
                    output.push_str(&String::from_utf8_lossy(valid));

                    match error.error_len() {
                        Some(invalid_len) => {
                            output.push(REPLACEMENT_CHARACTER);
                            rest = &after[invalid_len..];
                        }
                        None => {
                            // Incomplete sequence at the end of the chunk
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        output
    }

    /// Flushes whatever is still buffered at end of stream.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }

        self.pending.clear();
        REPLACEMENT_CHARACTER.to_string()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"hello\r\n"), "hello\r\n");
        assert!(!decoder.has_pending());
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_split_multibyte_character() {
        let euro = "€".as_bytes();
        let mut decoder = Utf8StreamDecoder::new();

        assert_eq!(decoder.decode(&euro[..1]), "");
        assert!(decoder.has_pending());
        assert_eq!(decoder.decode(&euro[1..2]), "");
        assert_eq!(decoder.decode(&euro[2..]), "€");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn test_split_at_every_position_matches_unsplit() {
        let text = "a€b😀c ñ";
        let bytes = text.as_bytes();

        for split in 0..=bytes.len() {
            let mut decoder = Utf8StreamDecoder::new();
            let mut decoded = decoder.decode(&bytes[..split]);
            decoded.push_str(&decoder.decode(&bytes[split..]));
            decoded.push_str(&decoder.finish());
            assert_eq!(decoded, text, "split at byte {split}");
        }
    }

    #[test]
    fn test_invalid_byte_is_replaced_not_dropped() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_truncated_tail_flushes_as_replacement() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"ok\xe2\x82"), "ok");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert!(!decoder.has_pending());
        assert_eq!(decoder.finish(), "");
    }
}
