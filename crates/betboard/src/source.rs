//! Log sources
//!
//! A [`LogSource`] hands the processor raw logs in chain order. Lines that
//! cannot be parsed are passed through as [`SourceItem::Malformed`] so the
//! processor can fail or dead-letter them like any other decode failure.

use crate::decoder::RawLog;
use betboard_core::{EventPosition, Result};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceItem {
    Log(RawLog),
    Malformed { payload: String, reason: String },
}

impl SourceItem {
    pub fn position(&self) -> Option<EventPosition> {
        match self {
            SourceItem::Log(log) => Some(log.position()),
            SourceItem::Malformed { .. } => None,
        }
    }

    /// The item as it was received, for dead-letter records.
    pub fn payload(&self) -> Result<String> {
        match self {
            SourceItem::Log(log) => Ok(serde_json::to_string(log)?),
            SourceItem::Malformed { payload, .. } => Ok(payload.clone()),
        }
    }
}

pub trait LogSource: Send {
    /// Up to `max` items. An empty batch means nothing is available right
    /// now; a following source may return more later.
    fn fetch(&mut self, max: usize) -> Result<Vec<SourceItem>>;
}

/// Reads newline-delimited JSON [`RawLog`]s from a file.
///
/// In follow mode an unterminated last line is held back until the writer
/// finishes it; otherwise it is read as a complete line.
pub struct JsonLinesSource {
    path: PathBuf,
    reader: BufReader<File>,
    partial: Vec<u8>,
    line_number: u64,
    follow: bool,
}

impl JsonLinesSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self {
            path,
            reader: BufReader::new(file),
            partial: Vec::new(),
            line_number: 0,
            follow: false,
        })
    }

    /// Keep polling the file for appended lines.
    pub fn following(mut self) -> Self {
        self.follow = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn malformed(&self, payload: &str, reason: impl std::fmt::Display) -> SourceItem {
        SourceItem::Malformed {
            payload: payload.to_string(),
            reason: format!("{} line {}: {}", self.path.display(), self.line_number, reason),
        }
    }

    /// Bytes that are not UTF-8 are kept lossily in the payload.
    fn parse_line(&mut self, bytes: &[u8]) -> Option<SourceItem> {
        self.line_number += 1;
        let line = match std::str::from_utf8(bytes) {
            Ok(line) => line.trim(),
            Err(e) => {
                let lossy = String::from_utf8_lossy(bytes);
                return Some(self.malformed(lossy.trim(), e));
            }
        };
        if line.is_empty() {
            return None;
        }
        Some(match serde_json::from_str::<RawLog>(line) {
            Ok(log) => SourceItem::Log(log),
            Err(e) => self.malformed(line, e),
        })
    }
}

impl LogSource for JsonLinesSource {
    fn fetch(&mut self, max: usize) -> Result<Vec<SourceItem>> {
        let mut items = Vec::new();
        while items.len() < max {
            if self.reader.read_until(b'\n', &mut self.partial)? == 0 {
                if !self.follow && !self.partial.is_empty() {
                    let line = std::mem::take(&mut self.partial);
                    items.extend(self.parse_line(&line));
                }
                break;
            }

            if self.partial.last() != Some(&b'\n') {
                continue;
            }
            let line = std::mem::take(&mut self.partial);
            items.extend(self.parse_line(&line));
        }
        Ok(items)
    }
}

/// In-memory source, mostly for tests.
#[derive(Debug, Default)]
pub struct VecSource {
    items: VecDeque<SourceItem>,
}

impl VecSource {
    pub fn new(logs: impl IntoIterator<Item = RawLog>) -> Self {
        Self {
            items: logs.into_iter().map(SourceItem::Log).collect(),
        }
    }

    pub fn push(&mut self, item: SourceItem) {
        self.items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl LogSource for VecSource {
    fn fetch(&mut self, max: usize) -> Result<Vec<SourceItem>> {
        let n = max.min(self.items.len());
        Ok(self.items.drain(..n).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{abi, encode_log};
    use alloy_primitives::{Address, U256};
    use std::io::Write;

    fn log(block: u64) -> RawLog {
        let event = abi::BetStateChanged {
            betID: U256::from(1),
            state: 3,
        };
        encode_log(
            &event,
            Address::repeat_byte(0xB0),
            EventPosition::new(block, 0, 0),
            block * 12,
            Address::repeat_byte(0x01),
        )
    }

    fn line(block: u64) -> String {
        format!("{}\n", serde_json::to_string(&log(block)).unwrap())
    }

    #[test]
    fn test_reads_lines_in_batches() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}\n{}{}", line(1).trim_end(), line(2), line(3)).unwrap();
        file.flush().unwrap();

        let mut source = JsonLinesSource::open(file.path()).unwrap();
        let first = source.fetch(2).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].position(), Some(EventPosition::new(2, 0, 0)));

        let rest = source.fetch(10).unwrap();
        assert_eq!(rest, vec![SourceItem::Log(log(3))]);
        assert!(source.fetch(10).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_and_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "\n{{\"address\": 1}}\n{}", line(4)).unwrap();
        file.flush().unwrap();

        let items = JsonLinesSource::open(file.path()).unwrap().fetch(10).unwrap();
        assert_eq!(items.len(), 2);
        assert!(matches!(
            &items[0],
            SourceItem::Malformed { payload, reason } if payload == "{\"address\": 1}" && reason.contains("line 2")
        ));
        assert_eq!(items[1], SourceItem::Log(log(4)));
    }

    #[test]
    fn test_follow_waits_for_complete_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let full = line(5);
        let (head, tail) = full.split_at(20);
        write!(file, "{}", head).unwrap();
        file.flush().unwrap();

        let mut source = JsonLinesSource::open(file.path()).unwrap().following();
        assert!(source.fetch(10).unwrap().is_empty());

        write!(file, "{}", tail).unwrap();
        file.flush().unwrap();
        assert_eq!(source.fetch(10).unwrap(), vec![SourceItem::Log(log(5))]);
    }

    #[test]
    fn test_unterminated_last_line_without_follow() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", line(6).trim_end()).unwrap();
        file.flush().unwrap();

        let mut source = JsonLinesSource::open(file.path()).unwrap();
        assert_eq!(source.fetch(10).unwrap(), vec![SourceItem::Log(log(6))]);
    }

    #[test]
    fn test_invalid_utf8_line_is_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"bad\": \"\xff\xfe\"}\n").unwrap();
        write!(file, "{}", line(7)).unwrap();
        file.flush().unwrap();

        let mut source = JsonLinesSource::open(file.path()).unwrap();
        let items = source.fetch(10).unwrap();
        assert_eq!(items.len(), 2);
        assert!(matches!(
            &items[0],
            SourceItem::Malformed { payload, reason }
                if payload.starts_with("{\"bad\"") && reason.contains("line 1")
        ));
        assert_eq!(items[1], SourceItem::Log(log(7)));
    }

    #[test]
    fn test_vec_source_drains() {
        let mut source = VecSource::new(vec![log(1), log(2), log(3)]);
        assert_eq!(source.fetch(2).unwrap().len(), 2);
        assert_eq!(source.len(), 1);
        assert_eq!(source.fetch(2).unwrap().len(), 1);
        assert!(source.is_empty());
    }
}
