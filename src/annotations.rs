//! Loading the two annotation tables the `split` command needs: the
//! sample-to-fragment-file table and the cell-type-barcode table.
//!
//! Grounded on the original CLI's validation order (existence, then
//! required-header check, then duplicate-key checks while building the
//! lookup tables) — kept here rather than in the `split` command module so
//! it can be unit tested independently of clap.

use crate::error::{FragmentError, Result};
use crate::types::BarcodeSet;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// `sample_id -> fragment_file_path`, parsed from a delimited table with a
/// header naming the sample and path columns.
pub fn load_sample_to_fragment_file(
    path: &Path,
    sep: char,
    sample_col: &str,
    path_col: &str,
) -> Result<HashMap<String, PathBuf>> {
    crate::error::require_exists(path)?;
    let file = File::open(path)?;
    let mut lines = BufReader::new(file).lines();

    let header = lines.next().ok_or_else(|| FragmentError::SchemaMismatch {
        path: path.to_path_buf(),
        message: "file is empty".to_string(),
    })??;
    let columns: Vec<&str> = header.split(sep).collect();
    let sample_idx = column_index(&columns, sample_col, path)?;
    let path_idx = column_index(&columns, path_col, path)?;

    let mut out = HashMap::new();
    for (line_num, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(sep).collect();
        let sample = require_field(&fields, sample_idx, path, line_num + 2)?;
        let frag_path = require_field(&fields, path_idx, path, line_num + 2)?;
        if out.contains_key(sample) {
            return Err(FragmentError::DuplicateKey {
                kind: "sample",
                key: sample.to_string(),
            });
        }
        out.insert(sample.to_string(), PathBuf::from(frag_path));
    }
    Ok(out)
}

/// `sample_id -> (cell_type -> BarcodeSet)`, grouped from a delimited table
/// with `(sample, cell_type, barcode)` rows. A `(sample, cell_type)` pair
/// may appear across many rows (one per barcode); rows are grouped, not
/// overwritten, so repeats just add to the same set.
pub fn load_cell_type_barcodes(
    path: &Path,
    sep: char,
    sample_col: &str,
    cell_type_col: &str,
    barcode_col: &str,
) -> Result<HashMap<String, HashMap<String, BarcodeSet>>> {
    crate::error::require_exists(path)?;
    let file = File::open(path)?;
    let mut lines = BufReader::new(file).lines();

    let header = lines.next().ok_or_else(|| FragmentError::SchemaMismatch {
        path: path.to_path_buf(),
        message: "file is empty".to_string(),
    })??;
    let columns: Vec<&str> = header.split(sep).collect();
    let sample_idx = column_index(&columns, sample_col, path)?;
    let cell_type_idx = column_index(&columns, cell_type_col, path)?;
    let barcode_idx = column_index(&columns, barcode_col, path)?;

    let mut grouped: HashMap<String, HashMap<String, BarcodeSet>> = HashMap::new();

    for (line_num, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(sep).collect();
        let sample = require_field(&fields, sample_idx, path, line_num + 2)?;
        let cell_type = require_field(&fields, cell_type_idx, path, line_num + 2)?;
        let barcode = require_field(&fields, barcode_idx, path, line_num + 2)?;

        grouped
            .entry(sample.to_string())
            .or_default()
            .entry(cell_type.to_string())
            .or_default()
            .insert(barcode.to_string());
    }

    Ok(grouped)
}

fn column_index(columns: &[&str], name: &str, path: &Path) -> Result<usize> {
    columns
        .iter()
        .position(|c| *c == name)
        .ok_or_else(|| FragmentError::SchemaMismatch {
            path: path.to_path_buf(),
            message: format!("missing required column '{name}'"),
        })
}

fn require_field<'a>(fields: &[&'a str], idx: usize, path: &Path, line: usize) -> Result<&'a str> {
    fields.get(idx).copied().ok_or_else(|| FragmentError::Parse {
        path: path.to_path_buf(),
        line,
        message: format!("expected at least {} columns", idx + 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_sample_to_fragment_file() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "sample\tpath_to_fragment_file").unwrap();
        writeln!(f, "A\t/data/a.tsv.gz").unwrap();
        writeln!(f, "B\t/data/b.tsv.gz").unwrap();

        let map =
            load_sample_to_fragment_file(f.path(), '\t', "sample", "path_to_fragment_file")
                .unwrap();
        assert_eq!(map.get("A").unwrap(), &PathBuf::from("/data/a.tsv.gz"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_duplicate_sample_is_error() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "sample\tpath_to_fragment_file").unwrap();
        writeln!(f, "A\t/data/a.tsv.gz").unwrap();
        writeln!(f, "A\t/data/a2.tsv.gz").unwrap();

        let err =
            load_sample_to_fragment_file(f.path(), '\t', "sample", "path_to_fragment_file")
                .unwrap_err();
        assert!(matches!(err, FragmentError::DuplicateKey { .. }));
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "sample\twrong_column").unwrap();
        writeln!(f, "A\t/data/a.tsv.gz").unwrap();

        let err =
            load_sample_to_fragment_file(f.path(), '\t', "sample", "path_to_fragment_file")
                .unwrap_err();
        assert!(matches!(err, FragmentError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_load_cell_type_barcodes() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "sample\tcell_type\tcell_barcode").unwrap();
        writeln!(f, "A\tT1\tBC1").unwrap();
        writeln!(f, "A\tT1\tBC2").unwrap();
        writeln!(f, "A\tT2\tBC3").unwrap();

        let map =
            load_cell_type_barcodes(f.path(), '\t', "sample", "cell_type", "cell_barcode")
                .unwrap();
        let sample_a = map.get("A").unwrap();
        assert_eq!(sample_a.get("T1").unwrap().len(), 2);
        assert!(sample_a.contains_key("T2"));
    }
}
