//! Fragment file reading: the Fragment Reader (L) collaborator.
//!
//! Streams a tab-separated fragment file (plain or gzip-compressed, detected
//! by a `.gz` suffix) into typed [`FragmentRecord`]s. Grounded on the BED
//! reader this toolkit already has, generalized from BED3/BED6 columns to
//! the fragment schema (`chrom, start, end, barcode, [count]`).

use crate::error::{FragmentError, Result};
use crate::types::FragmentRecord;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// A streaming fragment file reader.
pub struct FragmentReader<R: Read> {
    reader: BufReader<R>,
    path: PathBuf,
    line_number: usize,
    buffer: String,
}

impl FragmentReader<Box<dyn Read>> {
    /// Open a fragment file from a path, transparently decompressing it if
    /// the path ends in `.gz`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        crate::error::require_exists(path)?;
        let file = File::open(path)?;
        let reader: Box<dyn Read> = if path.extension().is_some_and(|e| e == "gz") {
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(FragmentReader {
            reader: BufReader::with_capacity(1 << 20, reader),
            path: path.to_path_buf(),
            line_number: 0,
            buffer: String::with_capacity(256),
        })
    }
}

impl<R: Read> FragmentReader<R> {
    /// Wrap an already-decompressed reader (mainly for tests).
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader: BufReader::new(reader),
            path: path.into(),
            line_number: 0,
            buffer: String::with_capacity(256),
        }
    }

    /// Read the next record, skipping comment/blank lines.
    pub fn read_record(&mut self) -> Result<Option<FragmentRecord>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buffer.trim_end_matches(['\n', '\r']);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            return self.parse_line(line).map(Some);
        }
    }

    fn parse_line(&self, line: &str) -> Result<FragmentRecord> {
        let mut fields = line.split('\t');
        let err = |message: String| FragmentError::SchemaMismatch {
            path: self.path.clone(),
            message,
        };

        let chrom = fields
            .next()
            .ok_or_else(|| err("missing chrom column".to_string()))?;
        let start_str = fields
            .next()
            .ok_or_else(|| err("missing start column".to_string()))?;
        let end_str = fields
            .next()
            .ok_or_else(|| err("missing end column".to_string()))?;
        let barcode = fields
            .next()
            .ok_or_else(|| err("fragment rows need at least 4 columns".to_string()))?;
        let count_str = fields.next();

        let start: i32 = start_str.parse().map_err(|_| FragmentError::Parse {
            path: self.path.clone(),
            line: self.line_number,
            message: format!("invalid start: '{start_str}'"),
        })?;
        let end: i32 = end_str.parse().map_err(|_| FragmentError::Parse {
            path: self.path.clone(),
            line: self.line_number,
            message: format!("invalid end: '{end_str}'"),
        })?;
        if start < 0 {
            return Err(FragmentError::Parse {
                path: self.path.clone(),
                line: self.line_number,
                message: format!("negative start: {start}"),
            });
        }
        if end <= start {
            return Err(FragmentError::Parse {
                path: self.path.clone(),
                line: self.line_number,
                message: format!("end ({end}) <= start ({start})"),
            });
        }

        let count = match count_str {
            None | Some(".") => 1,
            Some(s) => s.parse().map_err(|_| FragmentError::Parse {
                path: self.path.clone(),
                line: self.line_number,
                message: format!("invalid count: '{s}'"),
            })?,
        };
        if count <= 0 {
            return Err(FragmentError::Parse {
                path: self.path.clone(),
                line: self.line_number,
                message: format!("non-positive count: {count}"),
            });
        }

        Ok(FragmentRecord::new(chrom, start, end, barcode, count))
    }

    pub fn records(self) -> FragmentRecordIter<R> {
        FragmentRecordIter { reader: self }
    }
}

pub struct FragmentRecordIter<R: Read> {
    reader: FragmentReader<R>,
}

impl<R: Read> Iterator for FragmentRecordIter<R> {
    type Item = Result<FragmentRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Read every fragment from a path into memory, for the coverage engine
/// (which needs random per-chromosome access during depth accumulation).
pub fn read_fragments<P: AsRef<Path>>(path: P) -> Result<Vec<FragmentRecord>> {
    FragmentReader::from_path(path)?.records().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let content = "chr1\t100\t200\tBC1\nchr1\t300\t400\tBC2\t3\n";
        let reader = FragmentReader::new(content.as_bytes(), "test.tsv");
        let records: Vec<_> = reader.records().collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].count, 1);
        assert_eq!(records[1].count, 3);
    }

    #[test]
    fn test_dot_count_defaults_to_one() {
        let content = "chr1\t100\t200\tBC1\t.\n";
        let reader = FragmentReader::new(content.as_bytes(), "test.tsv");
        let records: Vec<_> = reader.records().collect::<Result<_>>().unwrap();
        assert_eq!(records[0].count, 1);
    }

    #[test]
    fn test_skip_comments_and_blank() {
        let content = "# header\n\nchr1\t100\t200\tBC1\n";
        let reader = FragmentReader::new(content.as_bytes(), "test.tsv");
        let records: Vec<_> = reader.records().collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_invalid_end_before_start() {
        let content = "chr1\t200\t100\tBC1\n";
        let reader = FragmentReader::new(content.as_bytes(), "test.tsv");
        let result: Result<Vec<_>> = reader.records().collect();
        assert!(result.is_err());
    }

    #[test]
    fn test_too_few_columns() {
        let content = "chr1\t100\t200\n";
        let reader = FragmentReader::new(content.as_bytes(), "test.tsv");
        let result: Result<Vec<_>> = reader.records().collect();
        assert!(matches!(result, Err(FragmentError::SchemaMismatch { .. })));
    }
}
