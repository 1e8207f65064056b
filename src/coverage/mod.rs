//! Engine C: genome coverage computation (C1 depth accumulation + C2
//! run-length compaction), exposed as a single coverage stream that the
//! bigWig emitter (C3, in [`crate::bigwig`]) consumes one chromosome at a
//! time.

pub mod compact;
pub mod depth;

use crate::error::Result;
use crate::types::{ChromSizes, FragmentRecord, RunSegment};

/// One chromosome's worth of compacted coverage.
#[derive(Debug, Clone)]
pub struct ChromCoverage {
    pub chrom: String,
    pub runs: Vec<RunSegment>,
}

/// Run depth accumulation (C1) and compaction (C2) over every chromosome
/// with at least one fragment, in `chrom_sizes` order.
pub fn compute_coverage(
    fragments: &[FragmentRecord],
    chrom_sizes: &ChromSizes,
    cut_sites: bool,
    normalize: bool,
    scaling_factor: f64,
) -> Result<Vec<ChromCoverage>> {
    let (arrays, n_fragments) = depth::accumulate_depth(fragments, chrom_sizes, cut_sites)?;
    Ok(arrays
        .into_iter()
        .map(|array| {
            let chrom = array.chrom.clone();
            let runs = compact::compact(&array, n_fragments, normalize, scaling_factor);
            ChromCoverage { chrom, runs }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_coverage_end_to_end() {
        // E2 from the design notes: two overlapping fragments on chr1 size 10.
        let mut cs = ChromSizes::new();
        cs.insert("chr1".to_string(), 10).unwrap();
        let frags = vec![
            FragmentRecord::new("chr1", 0, 4, "BC1", 1),
            FragmentRecord::new("chr1", 2, 6, "BC2", 1),
        ];
        let coverage = compute_coverage(&frags, &cs, false, false, 1.0).unwrap();
        assert_eq!(coverage.len(), 1);
        assert_eq!(coverage[0].chrom, "chr1");
        assert_eq!(
            coverage[0]
                .runs
                .iter()
                .map(|r| (r.start, r.end, r.value))
                .collect::<Vec<_>>(),
            vec![(0, 2, 1.0), (2, 4, 2.0), (4, 6, 1.0)]
        );
    }

    #[test]
    fn test_empty_chromosome_produces_no_runs() {
        let mut cs = ChromSizes::new();
        cs.insert("chr1".to_string(), 10).unwrap();
        cs.insert("chr2".to_string(), 10).unwrap();
        let frags = vec![FragmentRecord::new("chr1", 0, 4, "BC1", 1)];
        let coverage = compute_coverage(&frags, &cs, false, false, 1.0).unwrap();
        assert_eq!(coverage.len(), 1);
        assert_eq!(coverage[0].chrom, "chr1");
    }
}
