use super::retain_labels;
use crate::stats::label_areas;
use crate::Label;
use ndarray::{Array2, ArrayView2};
use std::collections::HashSet;

/// 最小面积排除.
///
/// 像素数严格小于 `min_area` 的对象被整体置为背景, 其余对象逐像素保持不变.
pub fn remove_small(labels: ArrayView2<Label>, min_area: usize) -> Array2<Label> {
    let keep: HashSet<Label> = label_areas(labels)
        .into_iter()
        .filter_map(|(l, area)| (area >= min_area).then_some(l))
        .collect();
    retain_labels(labels, &keep)
}
