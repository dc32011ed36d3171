use thiserror::Error;

/// A line produced by [`LineSplitter`] was not valid UTF-8.
#[derive(Debug, Error)]
#[error("line was not valid utf-8: {0}")]
pub struct LineSplitterError(#[from] std::string::FromUtf8Error);

/// Turns a sequence of byte chunks into complete, newline-delimited UTF-8
/// lines, carrying a trailing partial line across [`push`](Self::push) calls
/// (spec §4.1).
///
/// Splitting operates on raw bytes rather than `&str` chunks: the separator
/// byte (`'\n'` by default) never occurs as a continuation byte of a
/// multi-byte UTF-8 sequence, so byte-level splitting is safe even when a
/// chunk boundary falls inside a multi-byte character.
#[derive(Debug, Clone)]
pub struct LineSplitter {
    separator: u8,
    carry: Vec<u8>,
}

impl Default for LineSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSplitter {
    /// A splitter using `'\n'` as the line separator.
    pub fn new() -> Self {
        Self::with_separator(b'\n')
    }

    /// A splitter using an arbitrary single-byte separator.
    pub const fn with_separator(separator: u8) -> Self {
        Self { separator, carry: Vec::new() }
    }

    /// Feed a chunk of bytes, returning the complete lines it produced (the
    /// separator itself is not included).
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, LineSplitterError> {
        let mut lines = Vec::new();
        let mut start = 0;
        for (i, &byte) in chunk.iter().enumerate() {
            if byte == self.separator {
                let mut line = std::mem::take(&mut self.carry);
                line.extend_from_slice(&chunk[start..i]);
                start = i + 1;
                lines.push(String::from_utf8(line)?);
            }
        }
        self.carry.extend_from_slice(&chunk[start..]);
        Ok(lines)
    }

    /// Flush a trailing partial line at end of stream, if any.
    pub fn finish(&mut self) -> Result<Option<String>, LineSplitterError> {
        if self.carry.is_empty() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8(std::mem::take(&mut self.carry))?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_across_chunk_boundaries() {
        let mut splitter = LineSplitter::new();
        let mut lines = splitter.push(b"hello wor").unwrap();
        assert!(lines.is_empty());
        lines.extend(splitter.push(b"ld\nsecond li").unwrap());
        assert_eq!(lines, vec!["hello world".to_string()]);
        lines.extend(splitter.push(b"ne\n").unwrap());
        assert_eq!(lines, vec!["hello world".to_string(), "second line".to_string()]);
        assert_eq!(splitter.finish().unwrap(), None);
    }

    #[test]
    fn trailing_fragment_flushed_on_finish() {
        let mut splitter = LineSplitter::new();
        splitter.push(b"no newline yet").unwrap();
        assert_eq!(splitter.finish().unwrap(), Some("no newline yet".to_string()));
        assert_eq!(splitter.finish().unwrap(), None);
    }

    #[test]
    fn empty_lines_are_preserved() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push(b"a\n\nb\n").unwrap();
        assert_eq!(lines, vec!["a".to_string(), "".to_string(), "b".to_string()]);
    }

    #[test]
    fn concatenation_round_trips_through_any_chunk_partition() {
        let text = "alpha\nbeta\ngamma\n";
        for split_at in 0..text.len() {
            let (a, b) = text.as_bytes().split_at(split_at);
            let mut splitter = LineSplitter::new();
            let mut lines = splitter.push(a).unwrap();
            lines.extend(splitter.push(b).unwrap());
            if let Some(tail) = splitter.finish().unwrap() {
                lines.push(tail);
            }
            assert_eq!(lines, vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()]);
        }
    }
}
