//! 过滤规则集合.
//!
//! 每个规则都接受一张标签图 (以及需要时的强度图和参数), 返回一张新的同形状标签图:
//! 不满足保留条件的对象被整体置为背景, 满足条件的对象像素值保持不变.

mod border;
mod fluoro;
mod saturation;
mod size;

pub use border::{clear_border, in_border_band};
pub use fluoro::keep_fluoro_positive;
pub use saturation::remove_saturated;
pub use size::remove_small;

use crate::consts::BACKGROUND;
use crate::stats::label_stats;
use crate::{Label, QcResult};
use ndarray::{Array2, ArrayView2};
use std::collections::HashSet;

/// 将不在 `keep` 中的标签全部置为背景.
pub fn retain_labels(labels: ArrayView2<Label>, keep: &HashSet<Label>) -> Array2<Label> {
    labels.mapv(|l| if keep.contains(&l) { l } else { BACKGROUND })
}

/// 按超门限像素占比筛选标签. 占比满足 `pred` 的标签被保留, 零像素标签一律排除.
fn retain_by_fraction(
    labels: ArrayView2<Label>,
    intensity: ArrayView2<f32>,
    threshold: f32,
    pred: impl Fn(f64) -> bool,
) -> QcResult<Array2<Label>> {
    let keep: HashSet<Label> = label_stats(labels, intensity, threshold)?
        .into_iter()
        .filter_map(|(l, s)| s.fraction().is_some_and(&pred).then_some(l))
        .collect();
    Ok(retain_labels(labels, &keep))
}
