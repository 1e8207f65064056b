//! Run-length Compactor (C2).
//!
//! Collapses a dense [`DepthArray`] into non-zero [`RunSegment`]s, applying
//! RPM normalization and/or a flat scaling factor. The run-boundary scan is
//! the same "record indices where the value changes" coalescing the toolkit
//! uses in `streaming_genomecov.rs`'s `sweep_events`, just run directly over
//! a materialized array instead of over sweep-line events.

use crate::types::{DepthArray, RunSegment};

/// Collapse one chromosome's depth array into non-zero runs, applying
/// normalization (RPM, using `n_fragments`) and/or scaling.
pub fn compact(array: &DepthArray, n_fragments: u64, normalize: bool, scaling_factor: f64) -> Vec<RunSegment> {
    if normalize && n_fragments == 0 {
        return Vec::new();
    }
    let rpm_scaling_factor = n_fragments as f64 / 1_000_000.0;

    let depth = &array.depth;
    if depth.is_empty() {
        return Vec::new();
    }

    let mut runs = Vec::new();
    let mut run_start = 0usize;
    for i in 1..=depth.len() {
        let boundary = i == depth.len() || depth[i] != depth[run_start];
        if boundary {
            let raw = depth[run_start] as f64;
            let value = if normalize {
                raw / rpm_scaling_factor * scaling_factor
            } else if scaling_factor != 1.0 {
                raw * scaling_factor
            } else {
                raw
            };
            if value != 0.0 {
                runs.push(RunSegment {
                    chrom: array.chrom.clone(),
                    start: run_start as u32,
                    end: i as u32,
                    value: value as f32,
                });
            }
            run_start = i;
        }
    }
    runs
}
