//! Recorded sample sources

use anyhow::Context;
use eeg_core::{EegError, EegResult, SampleSource};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Replays raw readings from text, one per line.
///
/// Blank lines and `#` comments are skipped. For CSV input only the first
/// column is read, and a non-numeric first content line is taken as a header.
pub struct ReplaySource<R: BufRead> {
    reader: R,
    name: String,
    line_no: usize,
    line: String,
    /// A sample or header has been read; later non-numeric lines are errors
    past_header: bool,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path).with_context(|| format!("failed to open recording {}", path.display()))?;
        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            name: name.into(),
            line_no: 0,
            line: String::new(),
            past_header: false,
        }
    }

    /// Lines consumed so far, comments included
    pub fn line_number(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> SampleSource for ReplaySource<R> {
    fn next_sample(&mut self) -> EegResult<Option<f64>> {
        loop {
            self.line.clear();
            let read = self.reader.read_line(&mut self.line).map_err(|e| EegError::SourceError {
                message: format!("{}: read failed after line {}: {}", self.name, self.line_no, e),
            })?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let content = self.line.trim();
            if content.is_empty() || content.starts_with('#') {
                continue;
            }

            let field = content.split(',').next().unwrap_or(content).trim();
            let header_allowed = !self.past_header;
            self.past_header = true;
            match field.parse::<f64>() {
                Ok(value) => return Ok(Some(value)),
                Err(_) if header_allowed => continue,
                Err(_) => {
                    return Err(EegError::SourceError {
                        message: format!("{}:{}: invalid sample '{}'", self.name, self.line_no, field),
                    })
                }
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn drain<R: BufRead>(source: &mut ReplaySource<R>) -> Vec<f64> {
        std::iter::from_fn(|| source.next_sample().unwrap()).collect()
    }

    #[test]
    fn test_plain_values() {
        let mut source = ReplaySource::new(Cursor::new("512\n  515.5 \n\n# electrode check\n509\n"), "mem");
        assert_eq!(drain(&mut source), vec![512.0, 515.5, 509.0]);
        assert_eq!(source.line_number(), 5);
        assert_eq!(source.next_sample().unwrap(), None);
    }

    #[test]
    fn test_csv_with_header() {
        let mut source = ReplaySource::new(Cursor::new("raw,micros\n512,0\n520,3906\n"), "mem.csv");
        assert_eq!(drain(&mut source), vec![512.0, 520.0]);
    }

    #[test]
    fn test_header_after_comments() {
        let text = "# session 4, Fp1\n\nraw,micros\n512,0\n520,3906\n";
        let mut source = ReplaySource::new(Cursor::new(text), "mem.csv");
        assert_eq!(drain(&mut source), vec![512.0, 520.0]);
    }

    #[test]
    fn test_second_header_is_an_error() {
        let mut source = ReplaySource::new(Cursor::new("raw\nmicros\n512\n"), "rec.csv");
        match source.next_sample() {
            Err(EegError::SourceError { message }) => assert!(message.contains("rec.csv:2")),
            other => panic!("expected source error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_line_is_an_error() {
        let mut source = ReplaySource::new(Cursor::new("512\nbogus\n"), "rec.txt");
        assert_eq!(source.next_sample().unwrap(), Some(512.0));
        match source.next_sample() {
            Err(EegError::SourceError { message }) => assert!(message.contains("rec.txt:2")),
            other => panic!("expected source error, got {:?}", other),
        }
    }
}
