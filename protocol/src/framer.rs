//! Reassembles discrete records from a raw byte stream.
//!
//! The framer only finds line boundaries; it knows nothing about message
//! types. Partial trailing data is buffered until the next feed, so chunk
//! boundaries can fall anywhere, including mid-field or mid-escape.

use crate::{ProtocolError, Record};

#[derive(Debug, Default)]
pub struct Framer {
    buffer: Vec<u8>,
}

impl Framer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, producing every record completed by this chunk.
    ///
    /// Empty lines are keep-alives and produce no record.
    pub fn feed(&mut self, data: &[u8]) -> Result<Vec<Record>, ProtocolError> {
        self.buffer.extend_from_slice(data);
        let mut records = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = &line[..line.len() - 1];
            if line.is_empty() {
                continue;
            }
            let line = std::str::from_utf8(line).map_err(|_| ProtocolError::InvalidUtf8)?;
            records.push(Record::parse(line));
        }
        Ok(records)
    }

    /// Bytes held back waiting for a line terminator.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_str(framer: &mut Framer, data: &str) -> Vec<Record> {
        framer.feed(data.as_bytes()).unwrap()
    }

    #[test]
    fn test_single_complete_line() {
        let mut framer = Framer::new();
        let records = feed_str(&mut framer, "a,b,c\n");
        assert_eq!(records.len(), 1);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_partial_line_buffered_across_feeds() {
        let mut framer = Framer::new();
        assert!(feed_str(&mut framer, "a,b").is_empty());
        assert_eq!(framer.pending(), 3);
        let records = feed_str(&mut framer, ",c\nd");
        assert_eq!(records.len(), 1);
        let mut record = records.into_iter().next().unwrap();
        assert_eq!(record.str().unwrap(), "a");
        assert_eq!(record.str().unwrap(), "b");
        assert_eq!(record.str().unwrap(), "c");
        assert_eq!(framer.pending(), 1);
    }

    #[test]
    fn test_split_mid_escape_sequence() {
        let mut framer = Framer::new();
        assert!(feed_str(&mut framer, "a\\").is_empty());
        let records = feed_str(&mut framer, ",b,1\n");
        assert_eq!(records.len(), 1);
        let mut record = records.into_iter().next().unwrap();
        assert_eq!(record.str().unwrap(), "a,b");
        assert_eq!(record.int().unwrap(), 1);
    }

    #[test]
    fn test_empty_lines_are_keepalives() {
        let mut framer = Framer::new();
        let records = feed_str(&mut framer, "\n\na,b\n\n");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_chunking_is_equivalent_to_one_shot() {
        let data = "a\\,b,1,true\nc,2,false\nx\\\\y,,3\n";
        let mut one_shot = Framer::new();
        let expected = feed_str(&mut one_shot, data);

        for chunk_size in 1..data.len() {
            let mut framer = Framer::new();
            let mut records = Vec::new();
            for chunk in data.as_bytes().chunks(chunk_size) {
                records.extend(framer.feed(chunk).unwrap());
            }
            assert_eq!(records, expected, "chunk size {chunk_size}");
        }
    }

    #[test]
    fn test_two_feeds_with_leading_keepalive() {
        let mut framer = Framer::new();
        let records = feed_str(&mut framer, "a\\,b,1,true\n");
        assert_eq!(records.len(), 1);
        let mut record = records.into_iter().next().unwrap();
        assert_eq!(record.str().unwrap(), "a,b");
        assert_eq!(record.str().unwrap(), "1");
        assert_eq!(record.str().unwrap(), "true");

        let records = feed_str(&mut framer, "\nc,2,false\n");
        assert_eq!(records.len(), 1);
        let mut record = records.into_iter().next().unwrap();
        assert_eq!(record.str().unwrap(), "c");
        assert_eq!(record.str().unwrap(), "2");
        assert_eq!(record.str().unwrap(), "false");
    }
}
