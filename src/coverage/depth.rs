//! Depth Accumulator (C1).
//!
//! Builds one dense [`DepthArray`] per chromosome from a set of fragments,
//! either counting whole-fragment overlap or 1bp Tn5 cut sites. A literal
//! dense array (rather than the toolkit's sweep-event coalescing) is used
//! here because the compactor's correctness property (§8 property 7 —
//! `runs` must reconstruct the original `DepthArray` exactly) is most
//! directly checked against a real materialized array; the run-length
//! coalescing logic that turns it into runs is still lifted straight from
//! `streaming_genomecov.rs`'s `sweep_events`.
//!
//! Before accumulation, fragments are deduplicated on
//! `(chrom, start, end, barcode)`, matching the count-column handling in
//! `read_fragments_to_polars_df`'s `group_by` step: duplicate rows for the
//! same fragment collapse into one record so they contribute a single unit
//! of depth, not one unit per duplicate line.

use crate::runtime;
use crate::types::{ChromSizes, DepthArray, FragmentRecord};
use rustc_hash::FxHashMap;

/// Build depth arrays for every chromosome in `chrom_sizes` that has at
/// least one fragment. Returns the arrays (in chrom_sizes order, only for
/// non-empty chromosomes) plus the total fragment count `N` used for RPM
/// normalization.
pub fn accumulate_depth(
    fragments: &[FragmentRecord],
    chrom_sizes: &ChromSizes,
    cut_sites: bool,
) -> crate::error::Result<(Vec<DepthArray>, u64)> {
    let fragments = dedup_fragments(fragments);

    let mut by_chrom: FxHashMap<&str, Vec<&FragmentRecord>> = FxHashMap::default();
    let mut dropped_unknown = 0u64;

    for frag in &fragments {
        if chrom_sizes.has_chrom(&frag.chrom) {
            by_chrom.entry(&frag.chrom).or_default().push(frag);
        } else {
            dropped_unknown += 1;
        }
    }
    if dropped_unknown > 0 {
        log::warn!("{dropped_unknown} fragment(s) on chromosomes absent from chrom sizes were dropped");
    }

    let mut arrays = Vec::new();
    let mut n_fragments: u64 = 0;

    for chrom in chrom_sizes.chromosomes() {
        let Some(frags) = by_chrom.get(chrom) else {
            continue;
        };
        let size = chrom_sizes.chrom_size(chrom).unwrap();
        let mut array = DepthArray::zeroed(chrom, size);

        for frag in frags.iter() {
            n_fragments += 1;
            let end = runtime::clip_or_reject_end(chrom, frag.start as i64, frag.end as i64, size)?
                as i32;
            let start = frag.start;
            if cut_sites {
                increment_range(&mut array.depth, start, (start + 1).min(end));
                increment_range(&mut array.depth, (end - 1).max(start), end);
            } else {
                increment_range(&mut array.depth, start, end);
            }
        }
        arrays.push(array);
    }

    Ok((arrays, n_fragments))
}

/// Collapse duplicate `(chrom, start, end, barcode)` rows into a single
/// record whose count is the sum, matching `read_fragments_to_polars_df`'s
/// `group_by(["Chromosome", "Start", "End", "Name"])` step. Depth
/// accumulation still counts each surviving record once — the summed count
/// is carried along as metadata, not used as a per-base weight — so without
/// this pass, duplicate lines for the same fragment would each add their
/// own unit of depth at that locus instead of collapsing to one.
fn dedup_fragments(fragments: &[FragmentRecord]) -> Vec<FragmentRecord> {
    let mut index: FxHashMap<(&str, i32, i32, &str), usize> = FxHashMap::default();
    let mut deduped: Vec<FragmentRecord> = Vec::with_capacity(fragments.len());

    for frag in fragments {
        let key = (frag.chrom.as_str(), frag.start, frag.end, frag.barcode.as_str());
        if let Some(&i) = index.get(&key) {
            deduped[i].count += frag.count;
        } else {
            index.insert(key, deduped.len());
            deduped.push(frag.clone());
        }
    }
    deduped
}

#[inline]
fn increment_range(depth: &mut [u32], start: i32, end: i32) {
    let start = start.max(0) as usize;
    let end = (end.max(0) as usize).min(depth.len());
    for d in &mut depth[start..end] {
        *d += 1;
    }
}
