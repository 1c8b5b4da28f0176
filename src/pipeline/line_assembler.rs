//! Line assembly: turns arbitrarily split byte chunks into logical records.
//!
//! Chunks are buffered until the buffer ends exactly on a line terminator.
//! Only then is the buffer split into records, so a record is never parsed
//! from a partial line. Blank lines are dropped and the record prefix is
//! stripped from the start of each line.

use crate::defaults;
use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::types::LogicalRecord;

/// Buffers raw bytes until a complete set of lines is available.
#[derive(Debug, Clone)]
pub struct LineAssembler {
    pending: Vec<u8>,
    prefix: String,
    terminator: u8,
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl LineAssembler {
    /// Creates an assembler stripping the default `data: ` prefix.
    pub fn new() -> Self {
        Self::with_prefix(defaults::RECORD_PREFIX)
    }

    /// Creates an assembler stripping a custom record prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            pending: Vec::new(),
            prefix: prefix.into(),
            terminator: defaults::LINE_TERMINATOR,
        }
    }

    /// Appends a chunk and returns the records it completed.
    ///
    /// Returns an empty vector while the buffer does not end on a terminator.
    pub fn push(&mut self, chunk: Vec<u8>) -> Vec<LogicalRecord> {
        if self.pending.is_empty() {
            self.pending = chunk;
        } else {
            self.pending.extend_from_slice(&chunk);
        }

        if self.pending.last() != Some(&self.terminator) {
            return Vec::new();
        }

        let buffer = std::mem::take(&mut self.pending);
        self.split_records(&buffer)
    }

    /// Drains an unterminated tail as records (end of stream).
    pub fn finish(&mut self) -> Vec<LogicalRecord> {
        let buffer = std::mem::take(&mut self.pending);
        self.split_records(&buffer)
    }

    /// Number of bytes waiting for a terminator.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    fn split_records(&self, buffer: &[u8]) -> Vec<LogicalRecord> {
        buffer
            .split(|&b| b == self.terminator)
            .filter_map(|line| self.to_record(line))
            .collect()
    }

    fn to_record(&self, line: &[u8]) -> Option<LogicalRecord> {
        let decoded = String::from_utf8_lossy(line);
        let line: &str = &decoded;
        // CRLF terminated streams leave a trailing '\r' on every line.
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            return None;
        }
        let text = line.strip_prefix(self.prefix.as_str()).unwrap_or(line);
        if text.trim().is_empty() {
            return None;
        }
        Some(LogicalRecord::new(text))
    }
}

impl Station for LineAssembler {
    type Input = Vec<u8>;
    type Output = Vec<LogicalRecord>;

    fn process(&mut self, chunk: Vec<u8>) -> Result<Option<Vec<LogicalRecord>>, StationError> {
        let records = self.push(chunk);
        if records.is_empty() {
            Ok(None)
        } else {
            Ok(Some(records))
        }
    }

    fn name(&self) -> &'static str {
        "line-assembler"
    }

    fn flush(&mut self) -> Option<Vec<LogicalRecord>> {
        let records = self.finish();
        if records.is_empty() {
            None
        } else {
            Some(records)
        }
    }

    fn reset(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(records: &[LogicalRecord]) -> Vec<&str> {
        records.iter().map(LogicalRecord::as_str).collect()
    }

    #[test]
    fn test_single_terminated_line() {
        let mut assembler = LineAssembler::new();
        let records = assembler.push(b"data: {\"event\":\"ping\"}\n".to_vec());

        assert_eq!(texts(&records), vec!["{\"event\":\"ping\"}"]);
        assert_eq!(assembler.pending_len(), 0);
    }

    #[test]
    fn test_unterminated_chunk_is_buffered() {
        let mut assembler = LineAssembler::new();

        assert!(assembler.push(b"data: {\"ev".to_vec()).is_empty());
        assert_eq!(assembler.pending_len(), 10);

        let records = assembler.push(b"ent\":\"ping\"}\n".to_vec());
        assert_eq!(texts(&records), vec!["{\"event\":\"ping\"}"]);
        assert_eq!(assembler.pending_len(), 0);
    }

    #[test]
    fn test_inner_terminator_waits_for_trailing_terminator() {
        let mut assembler = LineAssembler::new();

        // Contains a full line, but the chunk does not end on a terminator.
        assert!(assembler.push(b"data: one\ndata: tw".to_vec()).is_empty());

        let records = assembler.push(b"o\n".to_vec());
        assert_eq!(texts(&records), vec!["one", "two"]);
    }

    #[test]
    fn test_multiple_lines_in_one_chunk() {
        let mut assembler = LineAssembler::new();
        let records = assembler.push(b"data: a\n\ndata: b\n\ndata: c\n".to_vec());

        assert_eq!(texts(&records), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_blank_and_whitespace_lines_are_dropped() {
        let mut assembler = LineAssembler::new();
        let records = assembler.push(b"\n   \n\t\ndata: x\n\n".to_vec());

        assert_eq!(texts(&records), vec!["x"]);
    }

    #[test]
    fn test_prefix_only_line_is_dropped() {
        let mut assembler = LineAssembler::new();
        let records = assembler.push(b"data: \ndata: x\n".to_vec());

        assert_eq!(texts(&records), vec!["x"]);
    }

    #[test]
    fn test_prefix_is_only_stripped_at_line_start() {
        let mut assembler = LineAssembler::new();
        let records = assembler.push(b"{\"note\":\"data: inside\"}\n".to_vec());

        assert_eq!(texts(&records), vec!["{\"note\":\"data: inside\"}"]);
    }

    #[test]
    fn test_crlf_lines() {
        let mut assembler = LineAssembler::new();
        let records = assembler.push(b"data: a\r\n\r\ndata: b\r\n".to_vec());

        assert_eq!(texts(&records), vec!["a", "b"]);
    }

    #[test]
    fn test_custom_prefix() {
        let mut assembler = LineAssembler::with_prefix("payload: ");
        let records = assembler.push(b"payload: a\ndata: b\n".to_vec());

        assert_eq!(texts(&records), vec!["a", "data: b"]);
    }

    #[test]
    fn test_split_inside_multibyte_character() {
        let mut assembler = LineAssembler::new();
        let line = "data: {\"text\":\"héllo\"}\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;

        assert!(assembler.push(line[..split].to_vec()).is_empty());
        let records = assembler.push(line[split..].to_vec());

        assert_eq!(texts(&records), vec!["{\"text\":\"héllo\"}"]);
    }

    #[test]
    fn test_finish_drains_unterminated_tail() {
        let mut assembler = LineAssembler::new();
        assert!(assembler.push(b"data: a\ndata: b".to_vec()).is_empty());

        let records = assembler.finish();
        assert_eq!(texts(&records), vec!["a", "b"]);
        assert_eq!(assembler.pending_len(), 0);
        assert!(assembler.finish().is_empty());
    }

    #[test]
    fn test_station_process_and_reset() {
        let mut assembler = LineAssembler::new();

        assert_eq!(assembler.process(b"data: a".to_vec()), Ok(None));
        assembler.reset();
        assert_eq!(assembler.pending_len(), 0);
        assert_eq!(assembler.flush(), None);

        let output = assembler.process(b"data: b\n".to_vec()).unwrap();
        assert_eq!(output, Some(vec![LogicalRecord::new("b")]));
    }

    #[test]
    fn test_empty_chunk_emits_nothing() {
        let mut assembler = LineAssembler::new();
        assert!(assembler.push(Vec::new()).is_empty());
        assert_eq!(assembler.pending_len(), 0);
    }
}
