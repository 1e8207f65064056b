//! `split` command: partition per-sample fragment files by cell type and
//! merge into one fragment file per cell type.
//!
//! Thin collaborator: loads and validates the two annotation tables and the
//! chrom-sizes file, builds the per-sample [`SampleInput`] list, then
//! delegates to [`crate::split::run_split_merge`].

use crate::annotations::{load_cell_type_barcodes, load_sample_to_fragment_file};
use crate::error::{FragmentError, Result};
use crate::split::{run_split_merge, SampleInput};
use crate::types::ChromSizes;
use rustc_hash::FxHashMap;
use std::path::PathBuf;

pub struct SplitCommand {
    pub sample_fragments_path: PathBuf,
    pub cell_type_barcodes_path: PathBuf,
    pub chrom_sizes_path: PathBuf,
    pub output_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub n_cpu: usize,
    pub separator: char,
    pub sample_col: String,
    pub path_col: String,
    pub cell_type_col: String,
    pub barcode_col: String,
    pub clear_temp: bool,
    pub add_sample_id: bool,
}

impl SplitCommand {
    pub fn run(&self) -> Result<Vec<PathBuf>> {
        crate::error::require_exists(&self.sample_fragments_path)?;
        crate::error::require_exists(&self.cell_type_barcodes_path)?;
        crate::error::require_exists(&self.chrom_sizes_path)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.n_cpu)
            .build()
            .map_err(|e| FragmentError::Writer(e.to_string()))?;

        let chrom_sizes = ChromSizes::from_file(&self.chrom_sizes_path)?;

        let sample_to_path = load_sample_to_fragment_file(
            &self.sample_fragments_path,
            self.separator,
            &self.sample_col,
            &self.path_col,
        )?;
        let sample_to_cell_types = load_cell_type_barcodes(
            &self.cell_type_barcodes_path,
            self.separator,
            &self.sample_col,
            &self.cell_type_col,
            &self.barcode_col,
        )?;

        // Both tables must name the same set of samples, matching the
        // original tool's cross-validation.
        let mut sample_ids: Vec<&String> = sample_to_path.keys().collect();
        sample_ids.sort();
        let mut annotated_ids: Vec<&String> = sample_to_cell_types.keys().collect();
        annotated_ids.sort();
        if sample_ids != annotated_ids {
            return Err(FragmentError::SchemaMismatch {
                path: self.cell_type_barcodes_path.clone(),
                message: "sample ids in the fragment table and the cell-type table must match"
                    .to_string(),
            });
        }

        let mut all_cell_types: std::collections::BTreeSet<String> = Default::default();
        let mut samples = Vec::with_capacity(sample_to_path.len());
        for (sample_id, fragment_path) in &sample_to_path {
            let cell_types: FxHashMap<String, crate::types::BarcodeSet> = sample_to_cell_types
                [sample_id]
                .iter()
                .map(|(cell_type, barcodes)| {
                    all_cell_types.insert(cell_type.clone());
                    (cell_type.clone(), barcodes.clone())
                })
                .collect();
            samples.push(SampleInput {
                sample_id: sample_id.clone(),
                fragment_path: fragment_path.clone(),
                cell_types,
            });
        }
        let all_cell_types: Vec<String> = all_cell_types.into_iter().collect();

        let output_dir = self.output_dir.clone();
        let temp_dir = self.temp_dir.clone();
        let add_sample_id = self.add_sample_id;
        let clear_temp = self.clear_temp;

        pool.install(|| {
            run_split_merge(
                &samples,
                &all_cell_types,
                &chrom_sizes,
                &temp_dir,
                &output_dir,
                add_sample_id,
                clear_temp,
            )
        })
    }
}
