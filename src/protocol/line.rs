//! # Line Splitter
//!
//! Reassembles newline-delimited text lines from arbitrarily chunked serial reads.

use bytes::BytesMut;
use tracing::warn;

/// Longest line kept, counted in bytes before the `\n`
pub const MAX_LINE_LENGTH: usize = 4096;

/// Accumulates serial bytes and yields complete lines
///
/// Lines are split on `\n`; a trailing `\r` is removed and invalid UTF-8 is
/// replaced rather than rejected.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buffer: BytesMut,
    /// Set while skipping the remainder of an overlong line
    discarding: bool,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning every line it completes
    ///
    /// # Examples
    ///
    /// ```
    /// use gps_range_logger::protocol::LineSplitter;
    ///
    /// let mut splitter = LineSplitter::new();
    /// assert!(splitter.push(b"REMOTE:1.0,").is_empty());
    /// assert_eq!(splitter.push(b"2.0\r\nLOC"), vec!["REMOTE:1.0,2.0"]);
    /// ```
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        self.buffer.extend_from_slice(chunk);

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw = self.buffer.split_to(pos + 1);
            if self.discarding {
                self.discarding = false;
                continue;
            }
            if pos > MAX_LINE_LENGTH {
                warn!("Discarding line longer than {} bytes", MAX_LINE_LENGTH);
                continue;
            }
            lines.push(decode(&raw[..pos]));
        }

        if self.buffer.len() > MAX_LINE_LENGTH {
            warn!(
                "Discarding unterminated line longer than {} bytes",
                MAX_LINE_LENGTH
            );
            self.buffer.clear();
            self.discarding = true;
        }

        lines
    }

    /// Flush a final unterminated line when the stream ends
    pub fn finish(&mut self) -> Option<String> {
        let discarding = std::mem::take(&mut self.discarding);
        if self.buffer.is_empty() || discarding {
            self.buffer.clear();
            return None;
        }
        let raw = self.buffer.split();
        Some(decode(&raw))
    }
}

fn decode(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_multiple_lines_in_one_chunk() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push(b"REMOTE:1.0,2.0\nLOCAL:3.0,4.0\nhello\n");
        assert_eq!(lines, vec!["REMOTE:1.0,2.0", "LOCAL:3.0,4.0", "hello"]);
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_reassembles_line_across_chunks() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.push(b"LOC").is_empty());
        assert!(splitter.push(b"AL:3.0").is_empty());
        assert_eq!(splitter.push(b",4.0\n"), vec!["LOCAL:3.0,4.0"]);
    }

    #[test]
    fn test_strips_carriage_return() {
        let mut splitter = LineSplitter::new();
        assert_eq!(splitter.push(b"hello\r\n\r\n"), vec!["hello", ""]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push(b"bad \xFF byte\n");
        assert_eq!(lines, vec!["bad \u{FFFD} byte"]);
    }

    #[test]
    fn test_finish_flushes_partial_line() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.push(b"status ok").is_empty());
        assert_eq!(splitter.finish(), Some("status ok".to_string()));
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_overlong_line_is_discarded() {
        let mut splitter = LineSplitter::new();
        let junk = vec![b'x'; MAX_LINE_LENGTH + 1];
        assert!(splitter.push(&junk).is_empty());
        // Tail of the overlong line is dropped, next line survives
        assert_eq!(splitter.push(b"tail\nhello\n"), vec!["hello"]);
    }

    #[test]
    fn test_overlong_line_dropped_regardless_of_chunking() {
        let mut stream = vec![b'x'; 5000];
        stream.extend_from_slice(b"\nok\n");

        let whole = LineSplitter::new().push(&stream);

        let mut splitter = LineSplitter::new();
        let chunked: Vec<String> = stream
            .chunks(300)
            .flat_map(|chunk| splitter.push(chunk))
            .collect();

        assert_eq!(whole, vec!["ok"]);
        assert_eq!(chunked, whole);
    }

    #[test]
    fn test_line_at_limit_is_kept() {
        let mut stream = vec![b'x'; MAX_LINE_LENGTH];
        stream.push(b'\n');
        let lines = LineSplitter::new().push(&stream);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), MAX_LINE_LENGTH);
    }

    #[test]
    fn test_finish_after_overlong_line_yields_nothing() {
        let mut splitter = LineSplitter::new();
        splitter.push(&vec![b'x'; MAX_LINE_LENGTH + 10]);
        splitter.push(b"more");
        assert_eq!(splitter.finish(), None);
    }
}
