use super::{check_shape, ReviewError, ReviewOutcome, Reviewer};
use crate::{read_label_array, Label, MaskPair, PixelStack, QcError};
use ndarray::Array2;
use ndarray_npy::{write_npy, WriteNpyError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 会话目录中的文件名.
pub mod session {
    /// 像素栈, (通道, 行, 列), `f32`.
    pub const IMAGE: &str = "image.npy";
    /// 暂定细胞标签, `u32`.
    pub const CELLS: &str = "cells.npy";
    /// 暂定细胞核标签, `u32`.
    pub const NUCLEI: &str = "nuclei.npy";
    /// 复核后的细胞标签, 由外部程序写出.
    pub const CELLS_REVIEWED: &str = "cells_reviewed.npy";
    /// 复核后的细胞核标签, 由外部程序写出.
    pub const NUCLEI_REVIEWED: &str = "nuclei_reviewed.npy";
    /// 传给外部程序的图像名环境变量.
    pub const ID_ENV: &str = "QC_IMAGE_ID";
}

/// 通过外部程序进行交互复核.
///
/// 每张图像新建一个会话目录, 写入 `image.npy`, `cells.npy`, `nuclei.npy`,
/// 然后以 `program [args..] <会话目录>` 启动外部程序并等待其退出.
/// 程序正常退出且写出了 `cells_reviewed.npy` 与 `nuclei_reviewed.npy`
/// 时视为复核完成; 非零退出或缺少任一输出视为放弃.
#[derive(Debug, Clone)]
pub struct ExternalReviewer {
    program: OsString,
    args: Vec<OsString>,
    workdir: Option<PathBuf>,
}

impl ExternalReviewer {
    /// 以外部程序 `program` 创建, 初始没有额外参数.
    pub fn new<S: Into<OsString>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            workdir: None,
        }
    }

    /// 追加一个位于会话目录之前的参数.
    pub fn arg<S: Into<OsString>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// 追加多个位于会话目录之前的参数.
    pub fn args<S: Into<OsString>, I: IntoIterator<Item = S>>(mut self, args: I) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// 在 `dir` 下创建会话目录. 默认使用系统临时目录.
    pub fn session_root<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    fn new_session(&self) -> std::io::Result<tempfile::TempDir> {
        let mut b = tempfile::Builder::new();
        b.prefix("qc-review-");
        match &self.workdir {
            Some(dir) => b.tempdir_in(dir),
            None => b.tempdir(),
        }
    }

    /// 读取外部程序写出的一层标签. 文件不存在时返回 `None`.
    fn read_layer(dir: &Path, name: &str) -> Result<Option<Array2<Label>>, ReviewError> {
        match read_label_array(dir.join(name)) {
            Ok(a) => Ok(Some(a)),
            Err(QcError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Reviewer for ExternalReviewer {
    fn review(
        &mut self,
        id: &str,
        pixels: &PixelStack,
        provisional: &MaskPair,
    ) -> Result<ReviewOutcome, ReviewError> {
        let dir = self.new_session()?;
        let exchange = |e: WriteNpyError| ReviewError::Exchange(e.into());
        write_npy(dir.path().join(session::IMAGE), &pixels.data()).map_err(exchange)?;
        write_npy(dir.path().join(session::CELLS), &provisional.cells()).map_err(exchange)?;
        write_npy(dir.path().join(session::NUCLEI), &provisional.nuclei()).map_err(exchange)?;

        log::debug!(
            "launching {:?} for `{id}` in {}",
            self.program,
            dir.path().display()
        );
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(dir.path())
            .env(session::ID_ENV, id)
            .status()
            .map_err(|e| ReviewError::Unavailable(format!("{:?}: {e}", self.program)))?;
        if !status.success() {
            log::info!("review of `{id}` abandoned ({status})");
            return Ok(ReviewOutcome::Abandoned);
        }

        let cells = Self::read_layer(dir.path(), session::CELLS_REVIEWED)?;
        let nuclei = Self::read_layer(dir.path(), session::NUCLEI_REVIEWED)?;
        let (Some(cells), Some(nuclei)) = (cells, nuclei) else {
            log::info!("review of `{id}` abandoned (no reviewed layers written)");
            return Ok(ReviewOutcome::Abandoned);
        };
        check_shape(provisional.shape(), cells.dim())?;
        check_shape(provisional.shape(), nuclei.dim())?;
        Ok(ReviewOutcome::Finished(MaskPair::new(cells, nuclei)?))
    }
}
