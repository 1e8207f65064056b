//! Per-sample Splitter (S1).
//!
//! Streams one sample's fragment file once, writing each record to every
//! `{temp_dir}/{cell_type}.{chrom}.tsv.gz` shard whose barcode set contains
//! the record's barcode. Writers are opened lazily as matching records are
//! seen, but every `(cell_type, chrom)` pair in this sample's cell-type map
//! always ends up with a shard file — combinations that never saw a
//! matching record get an empty one — so the driver's barrier (P, in
//! `driver.rs`) can tell a genuinely missing shard from a legitimately
//! empty one.

use crate::error::Result;
use crate::fragment::FragmentReader;
use crate::runtime;
use crate::split::writer::{remove_partial, FragmentWriter};
use crate::types::{BarcodeSet, ChromSizes};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// `cell_type -> BarcodeSet` for one sample.
pub type SampleCellTypes<'a> = &'a FxHashMap<String, BarcodeSet>;

pub fn shard_path(temp_dir: &Path, cell_type: &str, chrom: &str) -> PathBuf {
    temp_dir.join(format!("{cell_type}.{chrom}.tsv.gz"))
}

/// Split one sample's fragment file into per-(cell_type, chrom) shards.
/// Returns the full `(cell_type, chrom)` cross-product of shard paths for
/// this sample — every one of them exists on disk when this returns `Ok`,
/// empty or not.
pub fn split_sample(
    fragment_path: &Path,
    cell_types: SampleCellTypes<'_>,
    chrom_sizes: &ChromSizes,
    temp_dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(temp_dir)?;
    let mut writers: FxHashMap<(String, String), FragmentWriter> = FxHashMap::default();

    let result = (|| -> Result<()> {
        let reader = FragmentReader::from_path(fragment_path)?;
        for rec in reader.records() {
            let rec = rec?;
            let chrom = runtime::apply_chrom_prefix(&rec.chrom);
            if !chrom_sizes.has_chrom(&chrom) {
                log::warn!(
                    "{}: chromosome '{}' not in chrom sizes, dropping record",
                    fragment_path.display(),
                    chrom
                );
                continue;
            }
            for (cell_type, barcodes) in cell_types {
                if barcodes.contains(&rec.barcode) {
                    let key = (cell_type.clone(), chrom.clone());
                    let writer = match writers.get_mut(&key) {
                        Some(w) => w,
                        None => {
                            let path = shard_path(temp_dir, cell_type, &chrom);
                            let w = FragmentWriter::create(&path)?;
                            writers.entry(key.clone()).or_insert(w)
                        }
                    };
                    writer.write_record(&rec)?;
                }
            }
        }

        // Every (cell_type, chrom) pair this sample's cell-type map implies
        // gets a shard file, even if no record ever matched it, so phase
        // A's output is exactly the cross product the driver's barrier
        // checks against.
        for cell_type in cell_types.keys() {
            for chrom in chrom_sizes.chromosomes() {
                let key = (cell_type.clone(), chrom.to_string());
                if !writers.contains_key(&key) {
                    let path = shard_path(temp_dir, cell_type, chrom);
                    let w = FragmentWriter::create(&path)?;
                    writers.insert(key, w);
                }
            }
        }
        Ok(())
    })();

    match result {
        Ok(()) => {
            let mut paths = Vec::with_capacity(writers.len());
            for (_, writer) in writers {
                let path = writer.path().to_path_buf();
                writer.close()?;
                paths.push(path);
            }
            Ok(paths)
        }
        Err(e) => {
            for (_, writer) in writers {
                let path = writer.path().to_path_buf();
                drop(writer);
                remove_partial(&path);
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::read_fragments;
    use std::io::Write;

    fn write_fragments(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_split_basic() {
        let dir = tempfile::tempdir().unwrap();
        let frag_path = write_fragments(
            dir.path(),
            "sample.tsv",
            "chr1\t10\t20\tBC1\nchr1\t30\t40\tBC2\nchr2\t1\t5\tBC1\n",
        );

        let mut chrom_sizes = ChromSizes::new();
        chrom_sizes.insert("chr1".to_string(), 1000).unwrap();
        chrom_sizes.insert("chr2".to_string(), 1000).unwrap();

        let mut cell_types: FxHashMap<String, BarcodeSet> = FxHashMap::default();
        let mut t1 = BarcodeSet::default();
        t1.insert("BC1".to_string());
        cell_types.insert("T1".to_string(), t1);

        let temp = dir.path().join("temp");
        let paths = split_sample(&frag_path, &cell_types, &chrom_sizes, &temp).unwrap();
        assert_eq!(paths.len(), 2); // T1.chr1, T1.chr2

        let chr1_records = read_fragments(shard_path(&temp, "T1", "chr1")).unwrap();
        assert_eq!(chr1_records.len(), 1);
        assert_eq!(chr1_records[0].barcode, "BC1");
    }

    #[test]
    fn test_split_drops_unknown_chrom() {
        let dir = tempfile::tempdir().unwrap();
        let frag_path = write_fragments(dir.path(), "sample.tsv", "chrUn\t10\t20\tBC1\n");

        let mut chrom_sizes = ChromSizes::new();
        chrom_sizes.insert("chr1".to_string(), 1000).unwrap();

        let mut cell_types: FxHashMap<String, BarcodeSet> = FxHashMap::default();
        let mut t1 = BarcodeSet::default();
        t1.insert("BC1".to_string());
        cell_types.insert("T1".to_string(), t1);

        let temp = dir.path().join("temp");
        let paths = split_sample(&frag_path, &cell_types, &chrom_sizes, &temp).unwrap();
        // The one fragment's chromosome isn't in chrom_sizes and is dropped,
        // but the (T1, chr1) shard the cross product expects is still
        // created, empty.
        assert_eq!(paths.len(), 1);
        let records = read_fragments(&paths[0]).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_split_creates_empty_shard_for_untouched_combination() {
        let dir = tempfile::tempdir().unwrap();
        let frag_path = write_fragments(dir.path(), "sample.tsv", "chr1\t10\t20\tBC1\n");

        let mut chrom_sizes = ChromSizes::new();
        chrom_sizes.insert("chr1".to_string(), 1000).unwrap();
        chrom_sizes.insert("chr2".to_string(), 1000).unwrap();

        let mut cell_types: FxHashMap<String, BarcodeSet> = FxHashMap::default();
        let mut t1 = BarcodeSet::default();
        t1.insert("BC1".to_string());
        cell_types.insert("T1".to_string(), t1);

        let temp = dir.path().join("temp");
        let paths = split_sample(&frag_path, &cell_types, &chrom_sizes, &temp).unwrap();
        // T1.chr1 has the one matching record; T1.chr2 never sees a match
        // but the cross product still requires it to exist.
        assert_eq!(paths.len(), 2);
        assert!(shard_path(&temp, "T1", "chr2").exists());
        assert!(read_fragments(shard_path(&temp, "T1", "chr2")).unwrap().is_empty());
    }
}
