//! Crate-wide error type.
//!
//! Every fallible operation in this crate returns [`FragmentError`]. The
//! variants map directly onto the abstract error kinds the tools distinguish
//! between: missing inputs are checked eagerly, parse/schema problems carry
//! enough context to find the offending line, and worker failures during the
//! split/merge pipeline carry the shard identity they occurred on.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FragmentError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{path}: no such file")]
    InputMissing { path: PathBuf },

    #[error("{path}: {message}")]
    SchemaMismatch { path: PathBuf, message: String },

    #[error("{path}, line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("duplicate {kind}: {key}")]
    DuplicateKey { kind: &'static str, key: String },

    #[error("{chrom}:{start}-{end} exceeds chromosome size {chrom_size}")]
    OutOfRange {
        chrom: String,
        start: i64,
        end: i64,
        chrom_size: u32,
    },

    #[error("writer error: {0}")]
    Writer(String),

    #[error("unknown bigwig writer '{name}' (expected \"primary\" or \"alternate\")")]
    UnknownWriter { name: String },

    #[error("shard missing for sample={sample} cell_type={cell_type} chrom={chrom}: {path}")]
    ShardMissing {
        sample: String,
        cell_type: String,
        chrom: String,
        path: PathBuf,
    },
}

pub type Result<T> = std::result::Result<T, FragmentError>;

/// Verify a required input file exists before any worker spawns.
pub fn require_exists(path: &std::path::Path) -> Result<()> {
    if !path.exists() {
        return Err(FragmentError::InputMissing {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
