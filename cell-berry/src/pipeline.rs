//! 自动过滤流水线.
//!
//! 规则按固定顺序组合, 每一步都只会缩小候选集合:
//!
//! 1. 对原始细胞标签做饱和排除;
//! 2. 对 1 的结果做边缘排除;
//! 3. 若开启荧光过滤, 对 2 的结果做荧光阳性保留;
//! 4. 仅保留落在存活细胞像素上的细胞核像素 (胞内细胞核);
//! 5. 对胞内细胞核做最小面积排除. 面积按与细胞相交后的像素数计算.

use crate::consts::{is_object, BACKGROUND};
use crate::filter::{clear_border, keep_fluoro_positive, remove_saturated, remove_small};
use crate::stats::distinct_labels;
use crate::{Label, MaskPair, PixelStack, QcConfig, QcError, QcResult};
use ndarray::{Array2, ArrayView2, Zip};
use std::fmt;

/// 各阶段结束后剩余的对象个数.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterReport {
    /// 原始细胞数.
    pub raw_cells: usize,

    /// 饱和排除后的细胞数.
    pub unsaturated_cells: usize,

    /// 边缘排除后的细胞数.
    pub interior_cells: usize,

    /// 荧光阳性保留后的细胞数. 未开启该过滤时为 `None`.
    pub fluoro_cells: Option<usize>,

    /// 原始细胞核数.
    pub raw_nuclei: usize,

    /// 胞内细胞核数.
    pub intra_cell_nuclei: usize,

    /// 面积过滤后的细胞核数.
    pub sized_nuclei: usize,
}

impl FilterReport {
    /// 最终保留的细胞数.
    #[inline]
    pub fn final_cells(&self) -> usize {
        self.fluoro_cells.unwrap_or(self.interior_cells)
    }
}

impl fmt::Display for FilterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cells {} -> {} (saturation) -> {} (border)",
            self.raw_cells, self.unsaturated_cells, self.interior_cells
        )?;
        if let Some(n) = self.fluoro_cells {
            write!(f, " -> {n} (fluoro)")?;
        }
        write!(
            f,
            "; nuclei {} -> {} (intra-cell) -> {} (area)",
            self.raw_nuclei, self.intra_cell_nuclei, self.sized_nuclei
        )
    }
}

/// 自动过滤结果: 暂定的两层掩膜与各阶段计数.
#[derive(Clone, Debug)]
pub struct FilteredMasks {
    /// 暂定的 (细胞, 细胞核) 掩膜, 待人工复核.
    pub masks: MaskPair,

    /// 各阶段计数.
    pub report: FilterReport,
}

/// 胞内细胞核: 细胞标签非背景处保留 `nuclei` 的值, 其余位置置为背景.
///
/// 一个细胞核只要有像素与存活细胞重叠就会 (部分地) 留下, 与重叠比例无关.
pub fn intra_cell_nuclei(
    cells: ArrayView2<Label>,
    nuclei: ArrayView2<Label>,
) -> QcResult<Array2<Label>> {
    if cells.dim() != nuclei.dim() {
        return Err(QcError::ShapeMismatch {
            expected: cells.dim(),
            found: nuclei.dim(),
        });
    }
    Ok(Zip::from(&cells)
        .and(&nuclei)
        .map_collect(|&c, &n| if is_object(c) { n } else { BACKGROUND }))
}

/// 对一张图像运行自动过滤流水线.
///
/// `filter_fluoro` 决定是否运行荧光阳性保留; 其余参数取自 `config`.
/// 像素栈与掩膜的行列不一致时返回 [`QcError::ShapeMismatch`],
/// `config.channel` 超出像素栈通道数时返回 [`QcError::ChannelOutOfRange`].
pub fn filter_masks_auto(
    pixels: &PixelStack,
    raw: &MaskPair,
    filter_fluoro: bool,
    config: &QcConfig,
) -> QcResult<FilteredMasks> {
    if pixels.shape() != raw.shape() {
        return Err(QcError::ShapeMismatch {
            expected: pixels.shape(),
            found: raw.shape(),
        });
    }
    let intensity = pixels.channel(config.channel)?;
    let count = |a: ArrayView2<Label>| distinct_labels(a).len();

    let mut report = FilterReport {
        raw_cells: count(raw.cells()),
        raw_nuclei: count(raw.nuclei()),
        ..Default::default()
    };

    let cells = remove_saturated(
        raw.cells(),
        intensity,
        config.saturation_threshold,
        config.saturation_frac_cutoff,
    )?;
    report.unsaturated_cells = count(cells.view());

    let mut cells = clear_border(cells.view(), config.border_buffer);
    report.interior_cells = count(cells.view());

    if filter_fluoro {
        cells = keep_fluoro_positive(
            cells.view(),
            intensity,
            config.fluoro_threshold,
            config.fluoro_frac_cutoff,
        )?;
        report.fluoro_cells = Some(count(cells.view()));
    }

    let nuclei = intra_cell_nuclei(cells.view(), raw.nuclei())?;
    report.intra_cell_nuclei = count(nuclei.view());

    let nuclei = remove_small(nuclei.view(), config.nucleus_min_area);
    report.sized_nuclei = count(nuclei.view());

    Ok(FilteredMasks {
        masks: MaskPair::new(cells, nuclei)?,
        report,
    })
}
