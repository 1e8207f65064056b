//! Core data types shared by the split/merge and coverage engines.

use crate::error::{FragmentError, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A single ATAC-seq fragment: a half-open interval `[start, end)` on a
/// chromosome, tagged with a cell barcode and a duplicate count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FragmentRecord {
    pub chrom: String,
    pub start: i32,
    pub end: i32,
    pub barcode: String,
    pub count: i32,
}

impl FragmentRecord {
    pub fn new(
        chrom: impl Into<String>,
        start: i32,
        end: i32,
        barcode: impl Into<String>,
        count: i32,
    ) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
            barcode: barcode.into(),
            count,
        }
    }

    #[inline]
    pub fn len(&self) -> i32 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Ordered chromosome-name to size mapping. Order defines chromosome
/// emission order for every downstream operation. Unlike the BED-toolkit
/// `Genome` this is grounded on, a duplicate chromosome in the source file
/// is a hard [`FragmentError::DuplicateKey`], not a silent overwrite: the
/// split/merge pipeline uses chromosome order as a correctness invariant,
/// so a silently-reordered duplicate would corrupt shard naming.
#[derive(Debug, Clone, Default)]
pub struct ChromSizes {
    sizes: FxHashMap<String, u32>,
    order: Vec<String>,
}

impl ChromSizes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a tab-delimited `chrom\tsize` file. `#`-comments and blank
    /// lines are skipped. A duplicate chromosome name is a fatal error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        crate::error::require_exists(path)?;
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut out = Self::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t');
            let chrom = fields.next().ok_or_else(|| FragmentError::Parse {
                path: path.to_path_buf(),
                line: line_num + 1,
                message: "missing chromosome column".to_string(),
            })?;
            let size_str = fields.next().ok_or_else(|| FragmentError::Parse {
                path: path.to_path_buf(),
                line: line_num + 1,
                message: "missing size column".to_string(),
            })?;
            let size: u32 = size_str.parse().map_err(|_| FragmentError::Parse {
                path: path.to_path_buf(),
                line: line_num + 1,
                message: format!("invalid chromosome size: '{size_str}'"),
            })?;
            out.insert(chrom.to_string(), size)?;
        }
        Ok(out)
    }

    /// Insert a chromosome, erroring if it is already present.
    pub fn insert(&mut self, chrom: String, size: u32) -> Result<()> {
        if self.sizes.contains_key(&chrom) {
            return Err(FragmentError::DuplicateKey {
                kind: "chromosome",
                key: chrom,
            });
        }
        self.order.push(chrom.clone());
        self.sizes.insert(chrom, size);
        Ok(())
    }

    #[inline]
    pub fn chrom_size(&self, chrom: &str) -> Option<u32> {
        self.sizes.get(chrom).copied()
    }

    #[inline]
    pub fn has_chrom(&self, chrom: &str) -> bool {
        self.sizes.contains_key(chrom)
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// A set of cell barcodes, membership-tested per fragment.
pub type BarcodeSet = FxHashSet<String>;

/// Dense per-chromosome depth track. Transient: allocated, filled, then
/// compacted into [`RunSegment`]s and freed.
#[derive(Debug, Clone)]
pub struct DepthArray {
    pub chrom: String,
    pub depth: Vec<u32>,
}

impl DepthArray {
    pub fn zeroed(chrom: impl Into<String>, size: u32) -> Self {
        Self {
            chrom: chrom.into(),
            depth: vec![0u32; size as usize],
        }
    }
}

/// A compacted, non-zero run of constant depth.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSegment {
    pub chrom: String,
    pub start: u32,
    pub end: u32,
    pub value: f32,
}
