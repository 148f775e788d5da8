//! 细胞/细胞核掩膜质控: 自动过滤, 人工复核, 定稿.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

mod result;
mod runner;

#[derive(Parser, Debug)]
#[command(name = "qc-review")]
#[command(about = "Filter cell/nucleus label masks and finalize each image through review.")]
pub struct Args {
    /// Directory of `{id}.npy` pixel stacks. Defaults to $QC_IMAGE_DIR or ~/dataset/qc/images.
    #[arg(long)]
    images: Option<PathBuf>,

    /// Raw labels: `.npz` archive with `{id}_cells.npy`/`{id}_nuclei.npy` entries, or a
    /// positional (N, 2, H, W) `.npy` matched to the sorted image ids.
    /// Defaults to $QC_LABEL_PATH or ~/dataset/qc/labels.npz.
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Output directory for finalized masks. Defaults to $QC_OUTPUT_DIR or ~/dataset/qc/masks.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// YAML config file; missing fields fall back to the built-in defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// External review program, run as `<program> [reviewer-arg..] <session dir>`.
    /// Required unless --accept is given.
    #[arg(long, conflicts_with = "accept", required_unless_present = "accept")]
    reviewer: Option<String>,

    /// Extra argument passed to the review program before the session dir. Repeatable.
    #[arg(long = "reviewer-arg", allow_hyphen_values = true)]
    reviewer_args: Vec<String>,

    /// Accept the automated result without interactive review.
    #[arg(long, default_value_t = false)]
    accept: bool,

    /// Skip the fluorescence inclusion rule.
    #[arg(long, default_value_t = false)]
    no_fluoro: bool,

    /// Write a `{id}_mask.png` preview next to each finalized mask.
    #[arg(long, default_value_t = false)]
    preview: bool,

    /// Log more detail: -v for debug, -vv for trace. $RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let level = match args.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(level)
        .env()
        .init()
    {
        eprintln!("failed to initialise logger: {e}");
    }

    match runner::run(&args) {
        Ok(summary) => {
            result::analyze(&summary);
            if summary.is_complete() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::from(2)
        }
    }
}
