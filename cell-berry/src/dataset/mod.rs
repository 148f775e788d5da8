//! 数据集操作.
//!
//! 像素栈由 [`ImageSource`] 提供, 原始标签由 [`LabelProvider`] 提供.
//! 两者都按图像名 (id) 显式索引, 不依赖任何位置顺序.

use crate::{MaskPair, PixelStack, QcError, QcResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

mod images;
mod npz_database;
mod stacked;

pub use images::ImageDir;
pub use npz_database::NpzArchive;
pub use stacked::StackedLabels;

/// 像素栈提供者.
pub trait ImageSource {
    /// 按升序返回所有图像名.
    fn ids(&self) -> Vec<String>;

    /// 加载图像 `id` 的像素栈. 不存在时返回 [`QcError::MissingImage`].
    fn load(&self, id: &str) -> QcResult<PixelStack>;
}

/// 原始 (细胞, 细胞核) 标签提供者.
pub trait LabelProvider {
    /// 获取图像 `id` 的原始标签. 不存在时返回 [`QcError::MissingImage`].
    fn labels(&self, id: &str) -> QcResult<MaskPair>;
}

impl ImageSource for BTreeMap<String, PixelStack> {
    fn ids(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }

    fn load(&self, id: &str) -> QcResult<PixelStack> {
        self.get(id)
            .cloned()
            .ok_or_else(|| QcError::MissingImage(id.to_owned()))
    }
}

impl LabelProvider for BTreeMap<String, MaskPair> {
    fn labels(&self, id: &str) -> QcResult<MaskPair> {
        self.get(id)
            .cloned()
            .ok_or_else(|| QcError::MissingImage(id.to_owned()))
    }
}

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}
