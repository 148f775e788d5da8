//! 人工复核与定稿.
//!
//! 自动过滤给出暂定掩膜后, 由 [`Reviewer`] 交给人 (或其他工具) 修改,
//! 再由 [`run_review`] 以 "只写一次" 的方式持久化. 已定稿的图像在之后的运行中
//! 直接跳过, 因此流程可以随时中断, 随时续跑.

use crate::{Idx2d, MaskPair, PixelStack};

mod error;
mod external;
mod ledger;
mod orchestrator;

pub use error::ReviewError;
pub use external::{session, ExternalReviewer};
pub use ledger::ReviewLedger;
pub use orchestrator::{run_review, DeferReason, Deferred, ImageFailure, RunSummary};

/// 复核结果.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// 复核完成, 附带最终的 (细胞, 细胞核) 掩膜.
    Finished(MaskPair),

    /// 复核被放弃. 该图像不定稿, 下次运行重新复核.
    Abandoned,
}

/// 复核能力. 调用方阻塞直到复核结束.
pub trait Reviewer {
    /// 复核图像 `id`. `provisional` 为自动过滤给出的暂定掩膜.
    fn review(
        &mut self,
        id: &str,
        pixels: &PixelStack,
        provisional: &MaskPair,
    ) -> Result<ReviewOutcome, ReviewError>;
}

/// 原样接受暂定掩膜, 用于无人值守的批处理.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptReviewer;

impl Reviewer for AcceptReviewer {
    fn review(
        &mut self,
        _id: &str,
        _pixels: &PixelStack,
        provisional: &MaskPair,
    ) -> Result<ReviewOutcome, ReviewError> {
        Ok(ReviewOutcome::Finished(provisional.clone()))
    }
}

impl<R: Reviewer + ?Sized> Reviewer for Box<R> {
    fn review(
        &mut self,
        id: &str,
        pixels: &PixelStack,
        provisional: &MaskPair,
    ) -> Result<ReviewOutcome, ReviewError> {
        (**self).review(id, pixels, provisional)
    }
}

/// 检查复核返回的一层掩膜形状未变.
pub(crate) fn check_shape(expected: Idx2d, found: Idx2d) -> Result<(), ReviewError> {
    if expected != found {
        return Err(ReviewError::ShapeChanged { expected, found });
    }
    Ok(())
}
