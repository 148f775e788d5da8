//! 程序运行函数.

use crate::Args;
use cell_berry::dataset::ImageSource;
use cell_berry::review::{run_review, AcceptReviewer, ExternalReviewer, Reviewer, RunSummary};
use cell_berry::{QcConfig, QcError};
use std::path::PathBuf;
use thiserror::Error;
use utils::loader;

/// 运行错误.
#[derive(Error, Debug)]
pub enum RunError {
    /// 命令行未给出路径, 且无法定位用户主目录作为默认值.
    #[error("no {0} given and no home directory to fall back to")]
    NoPath(&'static str),

    /// 质控流程错误.
    #[error(transparent)]
    Qc(#[from] QcError),
}

fn resolve(
    given: &Option<PathBuf>,
    fallback: Option<PathBuf>,
    what: &'static str,
) -> Result<PathBuf, RunError> {
    given.clone().or(fallback).ok_or(RunError::NoPath(what))
}

/// 按命令行选项组装配置.
fn config(args: &Args) -> Result<QcConfig, QcError> {
    let mut config = match &args.config {
        Some(p) => QcConfig::from_yaml_file(p)?,
        None => QcConfig::default(),
    };
    if args.no_fluoro {
        config.filter_fluoro = false;
    }
    if args.preview {
        config.write_preview = true;
    }
    Ok(config)
}

/// 未给出外部程序时命令行保证了 `--accept`.
fn reviewer(args: &Args) -> Box<dyn Reviewer> {
    match &args.reviewer {
        Some(program) => Box::new(ExternalReviewer::new(program).args(&args.reviewer_args)),
        None => Box::new(AcceptReviewer),
    }
}

/// 实际运行.
pub fn run(args: &Args) -> Result<RunSummary, RunError> {
    let config = config(args)?;
    let mut reviewer = reviewer(args);

    let image_dir = resolve(&args.images, loader::image_dir_from_env_or_home(), "image dir")?;
    let label_path = resolve(&args.labels, loader::label_path_from_env_or_home(), "labels")?;
    let output_dir = resolve(&args.output, loader::output_dir_from_env_or_home(), "output dir")?;

    let images = loader::image_loader(&image_dir)?;
    log::info!("{} pixel stack(s) in {}", images.len(), image_dir.display());
    let labels = loader::label_loader(&label_path, images.ids())?;

    Ok(run_review(
        &images,
        labels.as_provider(),
        &output_dir,
        &config,
        reviewer.as_mut(),
    )?)
}
