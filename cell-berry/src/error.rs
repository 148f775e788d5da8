//! 运行时错误.

use crate::config::ConfigError;
use crate::Idx2d;
use ndarray_npy::{ReadNpyError, ReadNpzError, WriteNpyError};
use thiserror::Error;

/// 质控流程的错误.
///
/// 除 [`QcError::Io`] 等底层错误外, 其余变体都是输入契约违例,
/// 只对出错的那一张图像致命.
#[derive(Error, Debug)]
pub enum QcError {
    /// 标签图与强度图 (或两层标签图之间) 的形状不一致.
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// 期望形状 (行, 列).
        expected: Idx2d,
        /// 实际形状 (行, 列).
        found: Idx2d,
    },

    /// 指定通道超出像素栈的通道数.
    #[error("channel {channel} out of range, pixel stack has {channels} channel(s)")]
    ChannelOutOfRange {
        /// 请求的通道下标.
        channel: usize,
        /// 像素栈通道数.
        channels: usize,
    },

    /// 输入中找不到该图像.
    #[error("image `{0}` not found in input")]
    MissingImage(String),

    /// 负标签值.
    #[error("negative label value {0}")]
    NegativeLabel(i64),

    /// 非整数标签值 (含 NaN, inf).
    #[error("non-integer label value {0}")]
    NonIntegerLabel(f64),

    /// 标签值超出 `u32`.
    #[error("label value {0} does not fit in u32")]
    LabelOverflow(u64),

    /// 负的或非有限的像素强度.
    #[error("invalid intensity value {0}")]
    InvalidIntensity(f64),

    /// 数组的元素类型不受支持.
    #[error("unsupported array dtype")]
    UnsupportedDtype,

    /// 按位置索引的标签容器与图像列表长度不一致.
    #[error("label container holds {labels} image(s) but {images} image id(s) were given")]
    ContainerLenMismatch {
        /// 容器中的图像数.
        labels: usize,
        /// 图像 id 个数.
        images: usize,
    },

    /// 掩膜栈不是两层 (细胞, 细胞核).
    #[error("expected a two-layer mask stack, found {0} layer(s)")]
    LayerCount(usize),

    /// 该图像已有定稿掩膜.
    #[error("finalized mask for `{0}` already exists")]
    AlreadyFinalized(String),

    /// 底层 I/O 错误.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 读取 npy 错误.
    #[error("npy read error: {0}")]
    ReadNpy(#[from] ReadNpyError),

    /// 读取 npz 错误.
    #[error("npz read error: {0}")]
    ReadNpz(#[from] ReadNpzError),

    /// 写入 npy 错误.
    #[error("npy write error: {0}")]
    WriteNpy(#[from] WriteNpyError),

    /// 复核台账编解码错误.
    #[error("review ledger error: {0}")]
    Ledger(#[from] bincode::Error),

    /// 配置错误.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 写预览图错误.
    #[error("preview image error: {0}")]
    Image(#[from] image::ImageError),
}

/// 质控流程结果.
pub type QcResult<T> = Result<T, QcError>;
