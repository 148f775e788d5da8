//! 通用常量.

use crate::Label;

/// 背景标签值.
pub const BACKGROUND: Label = 0;

/// 像素是否是背景?
#[inline]
pub const fn is_background(label: Label) -> bool {
    label == BACKGROUND
}

/// 像素是否属于某个对象?
#[inline]
pub const fn is_object(label: Label) -> bool {
    !is_background(label)
}

/// 质控参数的默认值. 与上游分割流程长期使用的取值保持一致.
pub mod defaults {
    /// 饱和强度门限. 严格大于该值的像素视为饱和.
    pub const SATURATION_THRESHOLD: f32 = 60000.0;

    /// 饱和像素占比上限. 占比达到该值的细胞被排除.
    pub const SATURATION_FRAC_CUTOFF: f64 = 0.05;

    /// 细胞核最小面积 (像素数).
    pub const NUCLEUS_MIN_AREA: usize = 8000;

    /// 边缘缓冲宽度.
    pub const BORDER_BUFFER: usize = 10;

    /// 用于强度判断的通道下标.
    pub const CHANNEL_OF_INTEREST: usize = 1;

    /// 荧光强度门限.
    pub const FLUORO_THRESHOLD: f32 = 200.0;

    /// 荧光阳性像素占比下限. 占比必须严格超过该值才保留.
    pub const FLUORO_FRAC_CUTOFF: f64 = 0.1;
}

/// 文件命名约定.
pub mod files {
    /// 定稿掩膜文件后缀, 完整文件名为 `{id}_mask.npy`.
    pub const MASK_SUFFIX: &str = "_mask.npy";

    /// 定稿掩膜预览图后缀.
    pub const PREVIEW_SUFFIX: &str = "_mask.png";

    /// 复核台账文件名.
    pub const LEDGER: &str = ".review_ledger.bin";

    /// npz 标签归档中细胞标签条目后缀, 完整条目名为 `{id}_cells.npy`.
    pub const CELLS_ENTRY_SUFFIX: &str = "_cells.npy";

    /// npz 标签归档中细胞核标签条目后缀.
    pub const NUCLEI_ENTRY_SUFFIX: &str = "_nuclei.npy";

    /// 像素栈文件扩展名.
    pub const PIXEL_EXTENSION: &str = "npy";
}
