//! 对 `cell-berry::dataset` 的更一层封装. 提供更直接的输入/输出路径与加载器.

use cell_berry::dataset::{ImageDir, LabelProvider, NpzArchive, StackedLabels};
use cell_berry::QcResult;
use std::env;
use std::path::{Path, PathBuf};

/// 按 "环境变量, 否则 `$HOME/dataset/qc/..`" 的顺序解析路径.
fn env_or_home(var: &str, rest: &[&str]) -> Option<PathBuf> {
    match env::var_os(var) {
        Some(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => cell_berry::dataset::home_dataset_dir_with(
            std::iter::once("qc").chain(rest.iter().copied()),
        ),
    }
}

/// 获取像素栈目录.
///
/// 1. 若环境变量 `$QC_IMAGE_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/qc/images`.
pub fn image_dir_from_env_or_home() -> Option<PathBuf> {
    env_or_home("QC_IMAGE_DIR", &["images"])
}

/// 获取原始标签文件路径.
///
/// 1. 若环境变量 `$QC_LABEL_PATH` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/qc/labels.npz`.
pub fn label_path_from_env_or_home() -> Option<PathBuf> {
    env_or_home("QC_LABEL_PATH", &["labels.npz"])
}

/// 获取定稿掩膜输出目录.
///
/// 1. 若环境变量 `$QC_OUTPUT_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/qc/masks`.
pub fn output_dir_from_env_or_home() -> Option<PathBuf> {
    env_or_home("QC_OUTPUT_DIR", &["masks"])
}

/// 打开像素栈目录.
#[inline]
pub fn image_loader<P: AsRef<Path>>(path: P) -> QcResult<ImageDir> {
    Ok(ImageDir::open(path)?)
}

/// 原始标签来源.
pub enum Labels {
    /// 按图像名索引的 `.npz` 归档.
    Archive(NpzArchive),
    /// 按位置索引的 `.npy` 容器.
    Stacked(StackedLabels),
}

impl Labels {
    /// 以 trait object 的形式使用.
    pub fn as_provider(&self) -> &dyn LabelProvider {
        match self {
            Labels::Archive(a) => a,
            Labels::Stacked(s) => s,
        }
    }
}

/// 打开原始标签文件.
///
/// `.npy` 文件视为按位置索引的 (N, 2, H, W) 容器, 依次绑定到 `ids`,
/// 个数不一致时直接报错. 其余文件视为 `.npz` 归档, 此时 `ids`
/// 中没有完整标签的图像会在加载时逐一记录警告, 运行时这些图像将失败.
pub fn label_loader<P: AsRef<Path>>(path: P, ids: Vec<String>) -> QcResult<Labels> {
    let path = path.as_ref();
    if path.extension().is_some_and(|e| e == "npy") {
        return Ok(Labels::Stacked(StackedLabels::open(path, ids)?));
    }
    let archive = NpzArchive::new(path)?;
    let missing = archive.missing(ids.iter().map(String::as_str));
    for id in missing.iter() {
        log::warn!("no cell/nucleus labels for `{id}` in {}", path.display());
    }
    if !missing.is_empty() {
        log::warn!("{} of {} image(s) have no labels", missing.len(), ids.len());
    }
    Ok(Labels::Archive(archive))
}
