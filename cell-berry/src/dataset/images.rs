//! `.npy` 像素栈目录加载器.
//!
//! 按图像名按需读取像素栈.

use super::ImageSource;
use crate::consts::files::PIXEL_EXTENSION;
use crate::{PixelStack, QcError, QcResult};
use std::io;
use std::path::{Path, PathBuf};

/// 一个目录下的全部 `{id}.npy` 像素栈.
///
/// 打开时只列出文件名, 像素数据在 [`ImageSource::load`] 时才读取.
#[derive(Debug, Clone)]
pub struct ImageDir {
    path: PathBuf,
    ids: Vec<String>,
}

impl ImageDir {
    /// 扫描目录 `path` 下所有扩展名为 `npy` 的文件. 图像名为去掉扩展名的文件名,
    /// 按升序排列.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_owned();
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&path)? {
            let p = entry?.path();
            if !p.is_file() || p.extension().map_or(true, |e| e != PIXEL_EXTENSION) {
                continue;
            }
            if let Some(stem) = p.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_owned());
            }
        }
        ids.sort_unstable();
        Ok(Self { path, ids })
    }

    /// 目录路径.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 图像个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// 目录下是否没有任何图像.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn file_of(&self, id: &str) -> PathBuf {
        self.path.join(format!("{id}.{PIXEL_EXTENSION}"))
    }
}

impl ImageSource for ImageDir {
    fn ids(&self) -> Vec<String> {
        self.ids.clone()
    }

    fn load(&self, id: &str) -> QcResult<PixelStack> {
        if self.ids.binary_search_by(|i| i.as_str().cmp(id)).is_err() {
            return Err(QcError::MissingImage(id.to_owned()));
        }
        PixelStack::open(self.file_of(id))
    }
}

#[cfg(test)]
mod tests {
    use super::ImageDir;
    use crate::dataset::ImageSource;
    use crate::QcError;
    use ndarray::Array3;
    use ndarray_npy::write_npy;

    #[test]
    fn test_image_dir() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path();
        write_npy(p.join("b.npy"), &Array3::<u16>::zeros((2, 3, 4))).unwrap();
        write_npy(p.join("a.npy"), &Array3::<f32>::ones((1, 3, 4))).unwrap();
        std::fs::write(p.join("notes.txt"), "x").unwrap();

        let images = ImageDir::open(p).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images.ids(), vec!["a".to_owned(), "b".to_owned()]);

        let b = images.load("b").unwrap();
        assert_eq!(b.channels(), 2);
        assert_eq!(b.shape(), (3, 4));
        assert!(matches!(images.load("c"), Err(QcError::MissingImage(id)) if id == "c"));
    }
}
