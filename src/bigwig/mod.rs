//! BigWig Emitter (C3): adapts compacted coverage runs to a bigWig writer.
//!
//! The bigWig binary container (header, R-tree index, zoom levels) is
//! intentionally opaque here — this module never touches it directly. It
//! only defines the [`BigWigWriter`] capability contract and resolves a
//! writer name to a concrete implementation, both backed by the real
//! `bigtools` crate (see [`bigtools_writer`] and DESIGN.md for why both
//! selectable names share that one dependency).

pub mod bigtools_writer;

use crate::coverage::ChromCoverage;
use crate::error::{FragmentError, Result};
use crate::types::ChromSizes;
use std::path::Path;

/// The bigWig writer capability: write a header, add runs (batch or one at
/// a time), then close. Implementations must produce byte-identical output
/// regardless of which add path is used.
pub trait BigWigWriter {
    fn add_header(&mut self, chrom_sizes: &ChromSizes) -> Result<()>;

    /// Add an entire chromosome's runs in one call.
    fn add_entries_batch(&mut self, chrom: &str, starts: &[u32], ends: &[u32], values: &[f32]) -> Result<()>;

    /// Add a single run. Default implementation forwards to the batch path
    /// with a one-element slice so both paths funnel through the same
    /// underlying writer call.
    fn add_entry(&mut self, chrom: &str, start: u32, end: u32, value: f32) -> Result<()> {
        self.add_entries_batch(chrom, &[start], &[end], &[value])
    }

    fn close(self: Box<Self>) -> Result<()>;
}

/// Resolve a writer name to a concrete implementation. Fails before any
/// file is opened on an unrecognized name (`UnknownWriter`).
pub fn resolve_writer(name: &str, output_path: &Path) -> Result<Box<dyn BigWigWriter>> {
    match name {
        "primary" => Ok(Box::new(bigtools_writer::PrimaryWriter::create(output_path)?)),
        "alternate" => Ok(Box::new(bigtools_writer::AlternateWriter::create(output_path)?)),
        other => Err(FragmentError::UnknownWriter {
            name: other.to_string(),
        }),
    }
}

/// Drive a resolved writer over the full coverage stream: write the header
/// once, then for each chromosome emit its runs through whichever add path
/// the writer implementation favors internally.
pub fn emit(
    writer: &mut dyn BigWigWriter,
    chrom_sizes: &ChromSizes,
    coverage: &[ChromCoverage],
) -> Result<()> {
    writer.add_header(chrom_sizes)?;
    for chrom_coverage in coverage {
        if chrom_coverage.runs.is_empty() {
            continue;
        }
        let starts: Vec<u32> = chrom_coverage.runs.iter().map(|r| r.start).collect();
        let ends: Vec<u32> = chrom_coverage.runs.iter().map(|r| r.end).collect();
        let values: Vec<f32> = chrom_coverage.runs.iter().map(|r| r.value).collect();
        writer.add_entries_batch(&chrom_coverage.chrom, &starts, &ends, &values)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_unknown_writer_fails_before_io() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nonexistent_subdir").join("out.bw");
        let err = resolve_writer("bogus", &out).unwrap_err();
        assert!(matches!(err, FragmentError::UnknownWriter { .. }));
        // No file or directory should have been created for an unknown name.
        assert!(!out.parent().unwrap().exists());
    }
}
