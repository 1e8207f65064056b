#![allow(clippy::too_many_arguments)]

//! Split single-cell ATAC-seq fragment files by cell type and build genome
//! coverage bigWig tracks.
//!
//! Two engines:
//! - [`split`] (Engine S): partition per-sample fragment files by cell
//!   type, then k-way merge the per-sample shards back into one sorted
//!   fragment file per cell type.
//! - [`coverage`] + [`bigwig`] (Engine C): accumulate per-base genome
//!   coverage from fragments and emit it as a bigWig track.

pub mod annotations;
pub mod bigwig;
pub mod commands;
pub mod coverage;
pub mod error;
pub mod fragment;
pub mod runtime;
pub mod split;
pub mod types;

pub use error::{FragmentError, Result};
pub use fragment::{read_fragments, FragmentReader};
pub use types::{BarcodeSet, ChromSizes, DepthArray, FragmentRecord, RunSegment};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::commands::{BigwigCommand, SplitCommand};
    pub use crate::error::{FragmentError, Result};
    pub use crate::types::{ChromSizes, FragmentRecord};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_workflow() {
        let mut chrom_sizes = ChromSizes::new();
        chrom_sizes.insert("chr1".to_string(), 100).unwrap();
        let fragments = vec![FragmentRecord::new("chr1", 2, 5, "BC1", 1)];
        let coverage =
            coverage::compute_coverage(&fragments, &chrom_sizes, false, false, 1.0).unwrap();
        assert_eq!(coverage.len(), 1);
        assert_eq!(coverage[0].runs.len(), 1);
    }
}
