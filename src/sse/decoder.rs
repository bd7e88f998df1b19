//! Incremental frame decoder.
//!
//! Splits an unbounded byte stream into frame blocks separated by a blank
//! line (`\n\n`). Bytes are buffered as-is and only decoded to text once a
//! whole block is cut out, so the output does not depend on where the
//! transport happened to split the stream, even inside a multi-byte
//! character.

use bytes::{Buf, BytesMut};

/// Separator between two frames.
pub const FRAME_DELIMITER: &[u8] = b"\n\n";

/// Accumulates raw bytes and cuts them into frame blocks.
///
/// The residual buffer has no size limit; callers that need one can check
/// [`pending_len`](FrameDecoder::pending_len) after each [`feed`](FrameDecoder::feed).
#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending: BytesMut,
    /// Prefix of `pending` already known to hold no delimiter start.
    scanned: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every frame block it completes, in order.
    ///
    /// Blocks exclude the delimiter. Invalid UTF-8 inside a block is replaced
    /// with `U+FFFD`; it never fails.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut blocks = Vec::new();
        while let Some(end) = self.find_delimiter() {
            let block = self.pending.split_to(end);
            self.pending.advance(FRAME_DELIMITER.len());
            self.scanned = 0;
            blocks.push(String::from_utf8_lossy(&block).into_owned());
        }
        blocks
    }

    /// Number of buffered bytes not yet part of a complete frame.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop the incomplete residue.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.scanned = 0;
    }

    fn find_delimiter(&mut self) -> Option<usize> {
        let found = self.pending[self.scanned..]
            .windows(FRAME_DELIMITER.len())
            .position(|window| window == FRAME_DELIMITER);

        match found {
            Some(offset) => Some(self.scanned + offset),
            None => {
                // a trailing '\n' may still pair with the next chunk
                self.scanned = self.pending.len().saturating_sub(FRAME_DELIMITER.len() - 1);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &[u8] = b"id: 1\nevent: token\ndata: hello\n\nid: 2\ndata: line one\ndata: line two\n\n: comment\n\ndata: tail";

    fn feed_all(decoder: &mut FrameDecoder, chunks: &[&[u8]]) -> Vec<String> {
        chunks.iter().flat_map(|chunk| decoder.feed(chunk)).collect()
    }

    #[test]
    fn test_single_frame() {
        let mut decoder = FrameDecoder::new();
        let blocks = decoder.feed(b"data: hello\n\n");
        assert_eq!(blocks, vec!["data: hello"]);
        assert!(decoder.is_empty());
    }

    #[test]
    fn test_multiple_frames_in_one_chunk() {
        let mut decoder = FrameDecoder::new();
        let blocks = decoder.feed(b"data: a\n\ndata: b\n\ndata: c");
        assert_eq!(blocks, vec!["data: a", "data: b"]);
        assert_eq!(decoder.pending_len(), "data: c".len());
    }

    #[test]
    fn test_incomplete_frame_stays_pending() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(b"data: hel").is_empty());
        assert!(decoder.feed(b"lo\n").is_empty());
        assert_eq!(decoder.feed(b"\n"), vec!["data: hello"]);
        assert!(decoder.is_empty());
    }

    #[test]
    fn test_delimiter_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(b"data: x\n").is_empty());
        assert_eq!(decoder.feed(b"\ndata: y\n\n"), vec!["data: x", "data: y"]);
    }

    #[test]
    fn test_empty_block_between_delimiters() {
        let mut decoder = FrameDecoder::new();
        let blocks = decoder.feed(b"data: a\n\n\n\n");
        assert_eq!(blocks, vec!["data: a", ""]);
    }

    #[test]
    fn test_three_newlines_leave_one_pending() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.feed(b"data: a\n\n\n"), vec!["data: a"]);
        assert_eq!(decoder.pending_len(), 1);
        assert_eq!(decoder.feed(b"\n"), vec![""]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut decoder = FrameDecoder::new();
        let blocks = decoder.feed(b"data: \xff\xfe ok\n\n");
        assert_eq!(blocks, vec!["data: \u{FFFD}\u{FFFD} ok"]);
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let text = "data: caf\u{e9} \u{1F600}\n\n".as_bytes();
        for split in 0..=text.len() {
            let mut decoder = FrameDecoder::new();
            let blocks = feed_all(&mut decoder, &[&text[..split], &text[split..]]);
            assert_eq!(blocks, vec!["data: caf\u{e9} \u{1F600}"], "split at {}", split);
        }
    }

    #[test]
    fn test_every_single_split_matches_one_shot() {
        let expected = FrameDecoder::new().feed(STREAM);
        assert_eq!(expected.len(), 3);

        for split in 0..=STREAM.len() {
            let mut decoder = FrameDecoder::new();
            let blocks = feed_all(&mut decoder, &[&STREAM[..split], &STREAM[split..]]);
            assert_eq!(blocks, expected, "split at {}", split);
            assert_eq!(decoder.pending_len(), "data: tail".len());
        }
    }

    #[test]
    fn test_bytewise_feed_matches_one_shot() {
        let expected = FrameDecoder::new().feed(STREAM);
        let mut decoder = FrameDecoder::new();
        let blocks: Vec<String> = STREAM
            .iter()
            .flat_map(|byte| decoder.feed(std::slice::from_ref(byte)))
            .collect();
        assert_eq!(blocks, expected);
    }

    #[test]
    fn test_clear_discards_residue() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"data: partial\n");
        decoder.clear();
        assert!(decoder.is_empty());
        assert_eq!(decoder.feed(b"\ndata: next\n\n"), vec!["\ndata: next"]);
    }

    #[test]
    fn test_empty_chunk_is_noop() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(b"").is_empty());
        decoder.feed(b"data: a\n");
        assert!(decoder.feed(b"").is_empty());
        assert_eq!(decoder.feed(b"\n"), vec!["data: a"]);
    }
}
