// Clippy allows
#![allow(clippy::too_many_arguments)]

//! sft: single-cell ATAC-seq fragment tools
//!
//! Usage: sft <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use scatac_fragment_tools::commands::{BigwigCommand, SplitCommand};
use scatac_fragment_tools::runtime;
use scatac_fragment_tools::Result;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "sft")]
#[command(version)]
#[command(about = "Split single-cell ATAC-seq fragments by cell type and build coverage bigWigs", long_about = None)]
struct Cli {
    /// Fail instead of clipping a fragment end past its chromosome size.
    #[arg(long, global = true)]
    strict_coordinates: bool,

    /// Raise the log level to debug.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Accumulate genome coverage from a fragment file and write a bigWig.
    Bigwig {
        /// Chromosome sizes file (chrom\tsize, no header).
        #[arg(long = "chrom")]
        chrom_sizes: PathBuf,

        /// Fragment file, plain or gzip-compressed.
        #[arg(long = "frag")]
        fragments: PathBuf,

        /// Output bigWig path.
        #[arg(long = "bw")]
        output: PathBuf,

        /// Normalize depth to reads per million before scaling.
        #[arg(long)]
        normalize: bool,

        /// Multiplicative scaling factor applied to every base's value.
        #[arg(long, default_value_t = 1.0)]
        scaling: f64,

        /// Count 1bp Tn5 cut sites at fragment ends instead of whole-fragment depth.
        #[arg(long)]
        cut_sites: bool,

        /// bigWig writer backend: "primary" or "alternate".
        #[arg(long, default_value = "primary")]
        writer: String,

        /// Prepend this string to every fragment chromosome name before
        /// looking it up in the chrom-sizes file.
        #[arg(long)]
        chrom_prefix: Option<String>,
    },

    /// Partition per-sample fragment files by cell type, then merge per
    /// cell type into one sorted fragment file each.
    Split {
        /// Table mapping sample id to its fragment file path.
        #[arg(long)]
        sample_fragments: PathBuf,

        /// Table mapping (sample, cell_type) rows to cell barcodes.
        #[arg(long)]
        cell_type_barcodes: PathBuf,

        /// Chromosome sizes file.
        #[arg(long = "chrom")]
        chrom_sizes: PathBuf,

        /// Directory to write one merged fragment file per cell type into.
        #[arg(long)]
        output: PathBuf,

        /// Directory for intermediate per-sample shards.
        #[arg(long, default_value = "./tmp")]
        temp: PathBuf,

        /// Worker pool size used for both the split and merge phases.
        #[arg(long, default_value_t = 1)]
        n_cpu: usize,

        /// Column delimiter shared by both annotation tables.
        #[arg(long, default_value = "\t")]
        sep: String,

        #[arg(long, default_value = "sample")]
        sample_col: String,

        #[arg(long, default_value = "path_to_fragment_file")]
        path_col: String,

        #[arg(long, default_value = "cell_type")]
        cell_type_col: String,

        #[arg(long, default_value = "cell_barcode")]
        barcode_col: String,

        /// Delete the per-sample shard files once the merge succeeds.
        #[arg(long)]
        clear_temp: bool,

        /// Prefix every barcode with its sample id before merging.
        #[arg(long)]
        add_sample_id: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    runtime::set_strict_coordinates(cli.strict_coordinates);

    let result = match cli.command {
        Commands::Bigwig {
            chrom_sizes,
            fragments,
            output,
            normalize,
            scaling,
            cut_sites,
            writer,
            chrom_prefix,
        } => BigwigCommand {
            chrom_sizes_path: chrom_sizes,
            fragments_path: fragments,
            output_path: output,
            normalize,
            scaling_factor: scaling,
            cut_sites,
            writer_name: writer,
            chrom_prefix,
        }
        .run(),

        Commands::Split {
            sample_fragments,
            cell_type_barcodes,
            chrom_sizes,
            output,
            temp,
            n_cpu,
            sep,
            sample_col,
            path_col,
            cell_type_col,
            barcode_col,
            clear_temp,
            add_sample_id,
        } => run_split(
            sample_fragments,
            cell_type_barcodes,
            chrom_sizes,
            output,
            temp,
            n_cpu,
            sep,
            sample_col,
            path_col,
            cell_type_col,
            barcode_col,
            clear_temp,
            add_sample_id,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_split(
    sample_fragments_path: PathBuf,
    cell_type_barcodes_path: PathBuf,
    chrom_sizes_path: PathBuf,
    output_dir: PathBuf,
    temp_dir: PathBuf,
    n_cpu: usize,
    sep: String,
    sample_col: String,
    path_col: String,
    cell_type_col: String,
    barcode_col: String,
    clear_temp: bool,
    add_sample_id: bool,
) -> Result<()> {
    let separator = sep.chars().next().unwrap_or('\t');
    let outputs = SplitCommand {
        sample_fragments_path,
        cell_type_barcodes_path,
        chrom_sizes_path,
        output_dir,
        temp_dir,
        n_cpu: n_cpu.max(1),
        separator,
        sample_col,
        path_col,
        cell_type_col,
        barcode_col,
        clear_temp,
        add_sample_id,
    }
    .run()?;

    for path in outputs {
        println!("{}", path.display());
    }
    Ok(())
}
