use crate::consts::{is_object, BACKGROUND};
use crate::{Idx2d, Label};
use ndarray::{Array2, ArrayView2};
use std::collections::HashSet;

/// 判断 `(h, w)` 是否落在形状为 `shape` 的图像的边缘带内.
///
/// 边缘带宽度为 `buffer + 1`: `buffer == 0` 时仅包含最外一圈像素.
#[inline]
pub fn in_border_band((h, w): Idx2d, shape: Idx2d, buffer: usize) -> bool {
    let band = buffer.saturating_add(1);
    let (height, width) = shape;
    h < band || w < band || height - h <= band || width - w <= band
}

/// 边缘排除.
///
/// 任何有像素落入边缘带 (见 [`in_border_band`]) 的对象被整体置为背景,
/// 无论它在图像内部延伸多远. 该操作是幂等的.
pub fn clear_border(labels: ArrayView2<Label>, buffer: usize) -> Array2<Label> {
    let shape = labels.dim();
    let touching: HashSet<Label> = labels
        .indexed_iter()
        .filter_map(|(pos, &l)| (is_object(l) && in_border_band(pos, shape, buffer)).then_some(l))
        .collect();
    labels.mapv(|l| if touching.contains(&l) { BACKGROUND } else { l })
}
