//! Cell-type Merger (S2).
//!
//! K-way merges the per-sample shards for one cell type into a single
//! coordinate-sorted gzip fragment file, one chromosome at a time in
//! [`crate::types::ChromSizes`] order. Grounded on the toolkit's streaming
//! multi-file intersection command: same min-heap-over-`BufRead`-sources
//! skeleton (seed the heap with one record per source, pop the min, pull the
//! next record from the same source), but S2 must preserve every record
//! (including exact duplicates) rather than collapse them into coverage
//! events, so the sweep-line half of that command has no counterpart here.

use crate::error::Result;
use crate::fragment::FragmentReader;
use crate::split::writer::{remove_partial, FragmentWriter};
use crate::types::{ChromSizes, FragmentRecord};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::path::{Path, PathBuf};

/// One per-sample shard file contributing to a cell type's merge, in the
/// stable order used to break ties between otherwise-identical records.
#[derive(Debug, Clone)]
pub struct ShardSource {
    pub path: PathBuf,
    /// Prefix applied to every barcode from this source when
    /// `add_sample_id` is enabled.
    pub sample_id: String,
}

struct HeapEntry {
    start: i32,
    end: i32,
    barcode: String,
    count: i32,
    source_idx: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end && self.barcode == other.barcode
    }
}
impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap; ties broken by ascending source index so
        // shard input order is preserved (merge stability, §8 property 3).
        other
            .start
            .cmp(&self.start)
            .then(other.end.cmp(&self.end))
            .then(other.barcode.cmp(&self.barcode))
            .then(other.source_idx.cmp(&self.source_idx))
    }
}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct ShardReader {
    reader: FragmentReader<Box<dyn std::io::Read>>,
    sample_id: String,
    add_sample_id: bool,
    chrom: String,
}

impl ShardReader {
    fn next(&mut self) -> Result<Option<FragmentRecord>> {
        match self.reader.read_record()? {
            Some(mut rec) => {
                if self.add_sample_id {
                    rec.barcode = format!("{}_{}", self.sample_id, rec.barcode);
                }
                rec.chrom = self.chrom.clone();
                Ok(Some(rec))
            }
            None => Ok(None),
        }
    }
}

/// Merge the shards for one chromosome of one cell type, writing merged
/// records to `out`. Sources whose shard file does not exist are skipped —
/// the caller (the parallel driver) is responsible for deciding whether a
/// missing shard is expected or a fatal [`crate::error::FragmentError::ShardMissing`].
fn merge_chromosome(
    chrom: &str,
    sources: &[ShardSource],
    add_sample_id: bool,
    out: &mut FragmentWriter,
) -> Result<()> {
    let mut readers = Vec::with_capacity(sources.len());
    for source in sources {
        if !source.path.exists() {
            continue;
        }
        readers.push(ShardReader {
            reader: FragmentReader::from_path(&source.path)?,
            sample_id: source.sample_id.clone(),
            add_sample_id,
            chrom: chrom.to_string(),
        });
    }

    let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::with_capacity(readers.len());
    for (idx, reader) in readers.iter_mut().enumerate() {
        if let Some(rec) = reader.next()? {
            heap.push(HeapEntry {
                start: rec.start,
                end: rec.end,
                barcode: rec.barcode,
                count: rec.count,
                source_idx: idx,
            });
        }
    }

    while let Some(entry) = heap.pop() {
        out.write_record(&FragmentRecord::new(
            chrom,
            entry.start,
            entry.end,
            entry.barcode,
            entry.count,
        ))?;
        if let Some(rec) = readers[entry.source_idx].next()? {
            heap.push(HeapEntry {
                start: rec.start,
                end: rec.end,
                barcode: rec.barcode,
                count: rec.count,
                source_idx: entry.source_idx,
            });
        }
    }
    Ok(())
}

/// Merge every chromosome's shards for one cell type into a single output
/// file. `shards_by_chrom` maps chromosome name to that chromosome's
/// [`ShardSource`] list, already ordered by sample appearance order.
pub fn merge_cell_type(
    chrom_sizes: &ChromSizes,
    shards_by_chrom: &std::collections::HashMap<String, Vec<ShardSource>>,
    add_sample_id: bool,
    output_path: &Path,
) -> Result<()> {
    let empty = Vec::new();
    let result = (|| -> Result<()> {
        let mut writer = FragmentWriter::create(output_path)?;
        for chrom in chrom_sizes.chromosomes() {
            let sources = shards_by_chrom.get(chrom).unwrap_or(&empty);
            if sources.is_empty() {
                continue;
            }
            merge_chromosome(chrom, sources, add_sample_id, &mut writer)?;
        }
        writer.close()
    })();

    if result.is_err() {
        remove_partial(output_path);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::read_fragments;
    use crate::split::writer::FragmentWriter as FW;
    use std::collections::HashMap;

    fn write_shard(dir: &Path, name: &str, records: &[(&str, i32, i32, &str, i32)]) -> PathBuf {
        let path = dir.join(name);
        let mut w = FW::create(&path).unwrap();
        for (chrom, s, e, bc, c) in records {
            w.write_record(&FragmentRecord::new(*chrom, *s, *e, *bc, *c))
                .unwrap();
        }
        w.close().unwrap();
        path
    }

    #[test]
    fn test_merge_two_shards_preserves_order_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let shard_a = write_shard(
            dir.path(),
            "a.chr1.tsv.gz",
            &[("chr1", 10, 20, "BC1", 1), ("chr1", 30, 40, "BC2", 1)],
        );
        let shard_b = write_shard(
            dir.path(),
            "b.chr1.tsv.gz",
            &[("chr1", 10, 20, "BC1", 1), ("chr1", 15, 25, "BC3", 1)],
        );

        let mut chrom_sizes = ChromSizes::new();
        chrom_sizes.insert("chr1".to_string(), 1000).unwrap();

        let mut shards_by_chrom = HashMap::new();
        shards_by_chrom.insert(
            "chr1".to_string(),
            vec![
                ShardSource { path: shard_a, sample_id: "A".to_string() },
                ShardSource { path: shard_b, sample_id: "B".to_string() },
            ],
        );

        let out_path = dir.path().join("T1.fragments.tsv.gz");
        merge_cell_type(&chrom_sizes, &shards_by_chrom, false, &out_path).unwrap();

        let merged = read_fragments(&out_path).unwrap();
        // duplicate (chr1,10,20,BC1) appears twice, stable tie-break: A before B
        assert_eq!(merged.len(), 4);
        assert_eq!(
            merged.iter().map(|r| (r.start, r.end, r.barcode.as_str())).collect::<Vec<_>>(),
            vec![(10, 20, "BC1"), (10, 20, "BC1"), (15, 25, "BC3"), (30, 40, "BC2")]
        );
    }

    #[test]
    fn test_merge_with_sample_id_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let shard_a = write_shard(dir.path(), "a.chr1.tsv.gz", &[("chr1", 10, 20, "BC1", 1)]);

        let mut chrom_sizes = ChromSizes::new();
        chrom_sizes.insert("chr1".to_string(), 1000).unwrap();

        let mut shards_by_chrom = HashMap::new();
        shards_by_chrom.insert(
            "chr1".to_string(),
            vec![ShardSource { path: shard_a, sample_id: "sampleA".to_string() }],
        );

        let out_path = dir.path().join("T1.fragments.tsv.gz");
        merge_cell_type(&chrom_sizes, &shards_by_chrom, true, &out_path).unwrap();

        let merged = read_fragments(&out_path).unwrap();
        assert_eq!(merged[0].barcode, "sampleA_BC1");
    }
}
