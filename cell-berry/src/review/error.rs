use crate::{Idx2d, QcError};
use thiserror::Error;

/// 人工复核错误. 出现该错误时, 当前图像不会定稿, 下次运行仍可复核.
#[derive(Error, Debug)]
pub enum ReviewError {
    /// 复核工具不可用 (例如外部程序无法启动).
    #[error("reviewer unavailable: {0}")]
    Unavailable(String),

    /// 复核返回的某一层形状与暂定掩膜不一致.
    #[error("reviewed layer changed shape: expected {expected:?}, found {found:?}")]
    ShapeChanged {
        /// 暂定掩膜的形状 (行, 列).
        expected: Idx2d,
        /// 复核返回的形状 (行, 列).
        found: Idx2d,
    },

    /// 创建会话目录等底层 I/O 错误.
    #[error("I/O error during review: {0}")]
    Io(#[from] std::io::Error),

    /// 与复核工具交换会话文件时出错.
    #[error("review session exchange failed: {0}")]
    Exchange(#[from] QcError),
}
