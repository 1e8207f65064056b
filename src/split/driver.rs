//! Parallel Driver (P): Phase A (split) over samples, a barrier, then
//! Phase B (merge) over cell types.
//!
//! Grounded on the toolkit's rayon-based chromosome-parallel dispatch in
//! `parallel.rs`, generalized from "one rayon task per chromosome" to "one
//! rayon task per sample" (phase A) and "one rayon task per cell type"
//! (phase B), with an explicit barrier in between that verifies every shard
//! phase A was supposed to produce actually exists on disk.

use crate::error::{FragmentError, Result};
use crate::split::merger::{merge_cell_type, ShardSource};
use crate::split::splitter::{shard_path, split_sample};
use crate::types::{BarcodeSet, ChromSizes};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One sample's inputs: its fragment file and its per-cell-type barcode
/// sets.
pub struct SampleInput {
    pub sample_id: String,
    pub fragment_path: PathBuf,
    pub cell_types: FxHashMap<String, BarcodeSet>,
}

/// Drive the full split+merge pipeline: Phase A splits every sample in
/// parallel, a barrier verifies the expected shards exist, then Phase B
/// merges every cell type in parallel into `{output_dir}/{cell_type}.fragments.tsv.gz`.
pub fn run_split_merge(
    samples: &[SampleInput],
    all_cell_types: &[String],
    chrom_sizes: &ChromSizes,
    temp_dir: &Path,
    output_dir: &Path,
    add_sample_id: bool,
    clear_temp: bool,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    // Phase A: split every sample concurrently.
    let phase_a_results: Vec<Result<Vec<PathBuf>>> = samples
        .par_iter()
        .map(|sample| split_sample(&sample.fragment_path, &sample.cell_types, chrom_sizes, temp_dir))
        .collect();
    for r in phase_a_results {
        r?;
    }

    // Barrier: every (sample, cell_type, chrom) triple implied by
    // `chrom_sizes.chromosomes() x sample.cell_types.keys()` must have a
    // shard file on disk — `split_sample` always produces that full cross
    // product (empty shards included), so any absence here means phase A
    // genuinely lost a file it should have created.
    for sample in samples {
        for cell_type in sample.cell_types.keys() {
            for chrom in chrom_sizes.chromosomes() {
                let path = shard_path(temp_dir, cell_type, chrom);
                if !path.exists() {
                    return Err(FragmentError::ShardMissing {
                        sample: sample.sample_id.clone(),
                        cell_type: cell_type.clone(),
                        chrom: chrom.to_string(),
                        path,
                    });
                }
            }
        }
    }

    // Phase B: merge every cell type concurrently.
    let outputs: Vec<Result<PathBuf>> = all_cell_types
        .par_iter()
        .map(|cell_type| -> Result<PathBuf> {
            let mut shards_by_chrom: HashMap<String, Vec<ShardSource>> = HashMap::new();
            for chrom in chrom_sizes.chromosomes() {
                let mut sources = Vec::new();
                for sample in samples {
                    let path = shard_path(temp_dir, cell_type, chrom);
                    if path.exists() {
                        sources.push(ShardSource {
                            path,
                            sample_id: sample.sample_id.clone(),
                        });
                    }
                }
                if !sources.is_empty() {
                    shards_by_chrom.insert(chrom.to_string(), sources);
                }
            }
            let sanitized = sanitize_cell_type(cell_type);
            let out_path = output_dir.join(format!("{sanitized}.fragments.tsv.gz"));
            merge_cell_type(chrom_sizes, &shards_by_chrom, add_sample_id, &out_path)?;
            Ok(out_path)
        })
        .collect();

    let mut output_paths = Vec::with_capacity(outputs.len());
    for r in outputs {
        output_paths.push(r?);
    }

    if clear_temp {
        for cell_type in all_cell_types {
            for chrom in chrom_sizes.chromosomes() {
                let path = shard_path(temp_dir, cell_type, chrom);
                let _ = std::fs::remove_file(path);
            }
        }
    }

    Ok(output_paths)
}

/// Replace spaces and path separators so a cell type name is always a safe
/// single filename component (§6).
pub fn sanitize_cell_type(cell_type: &str) -> String {
    cell_type.replace([' ', '/'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fragments(path: &Path, content: &str) {
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_sanitize_cell_type() {
        assert_eq!(sanitize_cell_type("T cell/naive"), "T_cell_naive");
    }

    #[test]
    fn test_end_to_end_split_merge() {
        let dir = tempfile::tempdir().unwrap();
        let sample_a_path = dir.path().join("a.tsv");
        let sample_b_path = dir.path().join("b.tsv");
        write_fragments(&sample_a_path, "chr1\t10\t20\tBC1\nchr1\t50\t60\tBC2\n");
        write_fragments(&sample_b_path, "chr1\t10\t20\tBC1\nchr1\t15\t25\tBC3\n");

        let mut chrom_sizes = ChromSizes::new();
        chrom_sizes.insert("chr1".to_string(), 1000).unwrap();

        let mut t1 = BarcodeSet::default();
        t1.insert("BC1".to_string());
        let mut cell_types_a = FxHashMap::default();
        cell_types_a.insert("T1".to_string(), t1.clone());
        let mut cell_types_b = FxHashMap::default();
        cell_types_b.insert("T1".to_string(), t1);

        let samples = vec![
            SampleInput {
                sample_id: "A".to_string(),
                fragment_path: sample_a_path,
                cell_types: cell_types_a,
            },
            SampleInput {
                sample_id: "B".to_string(),
                fragment_path: sample_b_path,
                cell_types: cell_types_b,
            },
        ];

        let temp_dir = dir.path().join("temp");
        let output_dir = dir.path().join("out");
        let outputs = run_split_merge(
            &samples,
            &["T1".to_string()],
            &chrom_sizes,
            &temp_dir,
            &output_dir,
            false,
            true,
        )
        .unwrap();

        assert_eq!(outputs.len(), 1);
        let records = crate::fragment::read_fragments(&outputs[0]).unwrap();
        // BC1 appears once from A and once from B.
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.barcode == "BC1"));

        // clear_temp removed the shard files.
        assert!(!shard_path(&temp_dir, "T1", "chr1").exists());
    }

    #[test]
    fn test_barrier_reports_real_triple_for_missing_shard() {
        let dir = tempfile::tempdir().unwrap();
        let sample_path = dir.path().join("a.tsv");
        write_fragments(&sample_path, "chr1\t10\t20\tBC1\n");

        let mut chrom_sizes = ChromSizes::new();
        chrom_sizes.insert("chr1".to_string(), 1000).unwrap();

        let mut t1 = BarcodeSet::default();
        t1.insert("BC1".to_string());
        let mut cell_types = FxHashMap::default();
        cell_types.insert("T1".to_string(), t1);

        let samples = vec![SampleInput {
            sample_id: "A".to_string(),
            fragment_path: sample_path,
            cell_types,
        }];

        let temp_dir = dir.path().join("temp");
        let output_dir = dir.path().join("out");

        // Run phase A directly, then tamper with its output to simulate a
        // shard that phase A claimed to produce but that vanished before
        // the barrier ran.
        split_sample(&samples[0].fragment_path, &samples[0].cell_types, &chrom_sizes, &temp_dir)
            .unwrap();
        std::fs::remove_file(shard_path(&temp_dir, "T1", "chr1")).unwrap();

        let err = run_split_merge(&samples, &["T1".to_string()], &chrom_sizes, &temp_dir, &output_dir, false, false)
            .unwrap_err();
        match err {
            FragmentError::ShardMissing { sample, cell_type, chrom, .. } => {
                assert_eq!(sample, "A");
                assert_eq!(cell_type, "T1");
                assert_eq!(chrom, "chr1");
            }
            other => panic!("expected ShardMissing, got {other:?}"),
        }
    }
}
