//! 标签统计引擎.
//!
//! 对一张标签图和与之配准的强度图, 逐标签统计像素数以及强度严格大于门限的像素数.
//! 背景标签 `0` 永远不出现在结果中. 计数是精确的, 不做采样.

use crate::consts::is_object;
use crate::{Label, QcError, QcResult};
use itertools::Itertools;
use ndarray::{ArrayView2, Zip};
use std::collections::HashMap;

/// 单个标签的统计信息.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelStats {
    /// 该标签的像素数.
    pub pixel_count: usize,

    /// 其中强度严格大于门限的像素数.
    pub above_threshold: usize,
}

impl LabelStats {
    /// 超过门限的像素占比. 零像素标签没有定义, 返回 `None`.
    #[inline]
    pub fn fraction(&self) -> Option<f64> {
        (self.pixel_count > 0).then(|| self.above_threshold as f64 / self.pixel_count as f64)
    }

    #[inline]
    fn push(&mut self, above: bool) {
        self.pixel_count += 1;
        self.above_threshold += usize::from(above);
    }

    #[inline]
    fn merge(&mut self, other: &LabelStats) {
        self.pixel_count += other.pixel_count;
        self.above_threshold += other.above_threshold;
    }
}

/// 标签 -> 统计信息.
pub type LabelStatsMap = HashMap<Label, LabelStats>;

/// 检查标签图与强度图形状一致.
fn check_shape(labels: &ArrayView2<Label>, intensity: &ArrayView2<f32>) -> QcResult<()> {
    if labels.dim() != intensity.dim() {
        return Err(QcError::ShapeMismatch {
            expected: labels.dim(),
            found: intensity.dim(),
        });
    }
    Ok(())
}

/// 逐标签统计像素数和强度严格大于 `threshold` 的像素数.
///
/// `labels` 与 `intensity` 形状不一致时返回 [`QcError::ShapeMismatch`].
pub fn compute_label_stats(
    labels: ArrayView2<Label>,
    intensity: ArrayView2<f32>,
    threshold: f32,
) -> QcResult<LabelStatsMap> {
    check_shape(&labels, &intensity)?;
    let mut ans = LabelStatsMap::new();
    Zip::from(&labels).and(&intensity).for_each(|&l, &v| {
        if is_object(l) {
            ans.entry(l).or_default().push(v > threshold);
        }
    });
    Ok(ans)
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use ndarray::Axis;
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};

        /// 借助 `rayon`, 按行并行地计算 [`compute_label_stats`]. 结果与串行版本完全一致.
        pub fn par_compute_label_stats(
            labels: ArrayView2<Label>,
            intensity: ArrayView2<f32>,
            threshold: f32,
        ) -> QcResult<LabelStatsMap> {
            check_shape(&labels, &intensity)?;
            let ans = labels
                .axis_iter(Axis(0))
                .into_par_iter()
                .zip(intensity.axis_iter(Axis(0)).into_par_iter())
                .fold(LabelStatsMap::new, |mut acc, (l_row, i_row)| {
                    for (&l, &v) in l_row.iter().zip(i_row.iter()) {
                        if is_object(l) {
                            acc.entry(l).or_default().push(v > threshold);
                        }
                    }
                    acc
                })
                .reduce(LabelStatsMap::new, |mut a, b| {
                    for (l, s) in b.iter() {
                        a.entry(*l).or_default().merge(s);
                    }
                    a
                });
            Ok(ans)
        }

        /// 过滤规则内部使用的统计入口.
        #[inline]
        pub(crate) fn label_stats(
            labels: ArrayView2<Label>,
            intensity: ArrayView2<f32>,
            threshold: f32,
        ) -> QcResult<LabelStatsMap> {
            par_compute_label_stats(labels, intensity, threshold)
        }
    } else {
        /// 过滤规则内部使用的统计入口.
        #[inline]
        pub(crate) fn label_stats(
            labels: ArrayView2<Label>,
            intensity: ArrayView2<f32>,
            threshold: f32,
        ) -> QcResult<LabelStatsMap> {
            compute_label_stats(labels, intensity, threshold)
        }
    }
}

/// 逐标签统计像素数 (面积).
pub fn label_areas(labels: ArrayView2<Label>) -> HashMap<Label, usize> {
    labels.iter().copied().filter(|&l| is_object(l)).counts()
}

/// 标签图中出现的所有正标签, 升序排列.
pub fn distinct_labels(labels: ArrayView2<Label>) -> Vec<Label> {
    labels
        .iter()
        .copied()
        .filter(|&l| is_object(l))
        .unique()
        .sorted_unstable()
        .collect()
}
