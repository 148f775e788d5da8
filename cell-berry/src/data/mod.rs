use std::io::{BufWriter, Write};
use std::path::Path;

use ndarray::{stack, Array2, Array3, ArrayView2, ArrayView3, Axis, Ix2, Ix3};
use ndarray_npy::WriteNpyExt;

use crate::{Idx2d, Label, QcError, QcResult};

mod npy;
mod save;

pub(crate) use npy::{decode_intensities, decode_labels, NpzEntry};

pub use save::ImgWriteVis;

/// 多通道像素栈, 按 (通道, 行, 列) 组织. 强度值以 `f32` 保存,
/// 且保证非负, 有限.
///
/// 该结构是只读的.
#[derive(Debug, Clone)]
pub struct PixelStack {
    data: Array3<f32>,
}

impl PixelStack {
    /// 从裸数据创建. 若存在负值或非有限值, 返回
    /// [`QcError::InvalidIntensity`].
    pub fn new(data: Array3<f32>) -> QcResult<Self> {
        if let Some(&bad) = data.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(QcError::InvalidIntensity(bad as f64));
        }
        Ok(Self { data })
    }

    /// 打开 `.npy` 格式的像素栈. 支持 u8/u16/u32/i16/i32/f32/f64 元素类型.
    pub fn open<P: AsRef<Path>>(path: P) -> QcResult<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let data = decode_intensities::<_, Ix3>(&mut bytes.as_slice())?;
        Ok(Self { data })
    }

    /// 通道个数.
    #[inline]
    pub fn channels(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// 单通道图像的形状 (行, 列).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let (_, h, w) = self.data.dim();
        (h, w)
    }

    /// 获取第 `index` 个通道的视图.
    pub fn channel(&self, index: usize) -> QcResult<ArrayView2<'_, f32>> {
        if index >= self.channels() {
            return Err(QcError::ChannelOutOfRange {
                channel: index,
                channels: self.channels(),
            });
        }
        Ok(self.data.index_axis(Axis(0), index))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array3<f32> {
        self.data
    }
}

/// 一张图像的两层实例标签: 细胞与细胞核.
///
/// 两层形状保证一致.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskPair {
    cells: Array2<Label>,
    nuclei: Array2<Label>,
}

impl MaskPair {
    /// 组合细胞和细胞核标签. 两者形状不一致时返回 [`QcError::ShapeMismatch`].
    pub fn new(cells: Array2<Label>, nuclei: Array2<Label>) -> QcResult<Self> {
        if cells.dim() != nuclei.dim() {
            return Err(QcError::ShapeMismatch {
                expected: cells.dim(),
                found: nuclei.dim(),
            });
        }
        Ok(Self { cells, nuclei })
    }

    /// 从 (2, 行, 列) 的掩膜栈拆分. 第一维依次为细胞, 细胞核.
    pub fn from_stack(stack: Array3<Label>) -> QcResult<Self> {
        let layers = stack.len_of(Axis(0));
        if layers != 2 {
            return Err(QcError::LayerCount(layers));
        }
        let cells = stack.index_axis(Axis(0), 0).to_owned();
        let nuclei = stack.index_axis(Axis(0), 1).to_owned();
        Ok(Self { cells, nuclei })
    }

    /// 打开 `.npy` 格式的 (2, 行, 列) 掩膜栈.
    pub fn open<P: AsRef<Path>>(path: P) -> QcResult<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_stack(decode_labels::<_, Ix3>(&mut bytes.as_slice())?)
    }

    /// 叠成 (2, 行, 列) 的掩膜栈.
    pub fn stack(&self) -> Array3<Label> {
        // 两层形状一致, 该操作不会生成 `Err`, 可直接 unwrap.
        stack(Axis(0), &[self.cells.view(), self.nuclei.view()]).unwrap()
    }

    /// 以 `.npy` 格式 (元素类型 `u32`) 写出掩膜栈.
    pub fn save<W: Write>(&self, w: W) -> QcResult<()> {
        let mut w = BufWriter::new(w);
        self.stack().write_npy(&mut w)?;
        w.flush()?;
        Ok(())
    }

    /// 细胞标签.
    #[inline]
    pub fn cells(&self) -> ArrayView2<'_, Label> {
        self.cells.view()
    }

    /// 细胞核标签.
    #[inline]
    pub fn nuclei(&self) -> ArrayView2<'_, Label> {
        self.nuclei.view()
    }

    /// 形状 (行, 列).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.cells.dim()
    }

    /// 直接获得 (细胞, 细胞核) 底层数据.
    #[inline]
    pub fn into_raw(self) -> (Array2<Label>, Array2<Label>) {
        (self.cells, self.nuclei)
    }
}

/// 打开 `.npy` 格式的单层标签图.
pub fn read_label_array<P: AsRef<Path>>(path: P) -> QcResult<Array2<Label>> {
    let bytes = std::fs::read(path.as_ref())?;
    decode_labels::<_, Ix2>(&mut bytes.as_slice())
}
