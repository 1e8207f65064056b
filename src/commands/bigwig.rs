//! `bigwig` command: fragments -> genome coverage bigWig.
//!
//! Thin collaborator: validates inputs exist before doing any work (fail
//! fast, matching the original tool's existence checks), applies the
//! chromosome-prefix rewrite, then delegates to [`crate::coverage`] and
//! [`crate::bigwig`].

use crate::bigwig::{emit, resolve_writer};
use crate::coverage::compute_coverage;
use crate::error::Result;
use crate::fragment::read_fragments;
use crate::runtime;
use crate::types::{ChromSizes, FragmentRecord};

pub struct BigwigCommand {
    pub chrom_sizes_path: std::path::PathBuf,
    pub fragments_path: std::path::PathBuf,
    pub output_path: std::path::PathBuf,
    pub normalize: bool,
    pub scaling_factor: f64,
    pub cut_sites: bool,
    pub writer_name: String,
    pub chrom_prefix: Option<String>,
}

impl BigwigCommand {
    pub fn run(&self) -> Result<()> {
        crate::error::require_exists(&self.chrom_sizes_path)?;
        crate::error::require_exists(&self.fragments_path)?;

        if let Some(prefix) = &self.chrom_prefix {
            if prefix.is_empty() {
                return Err(crate::error::FragmentError::SchemaMismatch {
                    path: self.fragments_path.clone(),
                    message: "--chrom-prefix must not be empty; omit the flag instead".to_string(),
                });
            }
        }
        runtime::set_chrom_prefix(self.chrom_prefix.clone());

        // Resolving the writer name fails before any file I/O happens, even
        // before we read the (possibly large) fragment file.
        let _ = resolve_writer_dry_run(&self.writer_name)?;

        let chrom_sizes = ChromSizes::from_file(&self.chrom_sizes_path)?;
        let mut fragments = read_fragments(&self.fragments_path)?;
        apply_chrom_prefix(&mut fragments);
        log::info!(
            "{}: {} fragments loaded across {} chromosomes",
            self.fragments_path.display(),
            fragments.len(),
            chrom_sizes.len()
        );

        let coverage = compute_coverage(
            &fragments,
            &chrom_sizes,
            self.cut_sites,
            self.normalize,
            self.scaling_factor,
        )?;

        let mut writer = resolve_writer(&self.writer_name, &self.output_path)?;
        emit(writer.as_mut(), &chrom_sizes, &coverage)?;
        writer.close()?;

        log::info!("wrote {}", self.output_path.display());
        Ok(())
    }
}

/// Validate the writer name without touching the filesystem, by probing
/// against a path in a directory that is guaranteed to exist (the parent of
/// the real output path would be created as a side effect otherwise).
fn resolve_writer_dry_run(name: &str) -> Result<()> {
    match name {
        "primary" | "alternate" => Ok(()),
        other => Err(crate::error::FragmentError::UnknownWriter {
            name: other.to_string(),
        }),
    }
}

/// Rewrite every fragment's chromosome name with the globally-configured
/// `--chrom-prefix`, a no-op when no prefix was set.
fn apply_chrom_prefix(fragments: &mut [FragmentRecord]) {
    for frag in fragments {
        frag.chrom = runtime::apply_chrom_prefix(&frag.chrom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_apply_chrom_prefix_rewrites_every_fragment() {
        runtime::set_chrom_prefix(Some("mm10".to_string()));
        let mut fragments = vec![
            FragmentRecord::new("chr1", 0, 10, "BC1", 1),
            FragmentRecord::new("chr2", 0, 10, "BC2", 1),
        ];
        apply_chrom_prefix(&mut fragments);
        runtime::set_chrom_prefix(None);

        assert_eq!(fragments[0].chrom, "mm10_chr1");
        assert_eq!(fragments[1].chrom, "mm10_chr2");
    }

    #[test]
    #[serial]
    fn test_apply_chrom_prefix_is_noop_when_unset() {
        runtime::set_chrom_prefix(None);
        let mut fragments = vec![FragmentRecord::new("chr1", 0, 10, "BC1", 1)];
        apply_chrom_prefix(&mut fragments);
        assert_eq!(fragments[0].chrom, "chr1");
    }
}
