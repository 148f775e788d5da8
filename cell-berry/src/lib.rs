#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 对显微镜图像的细胞/细胞核实例分割掩膜进行自动质控,
//! 并驱动人工复核, 最终为每张图像持久化一份定稿掩膜.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 像素栈按 (通道, 行, 列) 组织, 标签图按 (行, 列) 组织, 三者必须空间配准.
//!   形状不一致时返回 [`QcError::ShapeMismatch`], 绝不截断或广播.
//! 2. 标签值 `0` 永远是背景, 正整数各自代表一个对象实例.
//! 3. 所有过滤规则都是 (标签图, 强度图, 参数) 的纯函数, 参数由
//!   [`QcConfig`] 显式传入, 不读取任何全局状态.
//!
//! # 开发计划
//!
//! ### 标签统计引擎 ✅
//!
//! 逐标签统计像素数和超过强度门限的像素数.
//!
//! 实现位于 `cell-berry/src/stats.rs`.
//!
//! ### 过滤规则 ✅
//!
//! 饱和排除, 荧光阳性保留, 边缘排除, 最小面积排除.
//!
//! 实现位于 `cell-berry/src/filter`.
//!
//! ### 自动过滤流水线 ✅
//!
//! 固定顺序组合上述规则. 保留下来的细胞区域作为细胞核的空间门控.
//!
//! 实现位于 `cell-berry/src/pipeline.rs`.
//!
//! ### 人工复核编排 ✅
//!
//! 幂等, 可断点续跑. 已定稿的图像永不重算, 永不覆写.
//!
//! 实现位于 `cell-berry/src/review`.
//!
//! ### 数据加载 ✅
//!
//! 1. `.npy` 像素栈目录. ✅
//! 2. 按图像名显式索引的 `.npz` 标签归档. ✅
//! 3. 旧式按位置索引的 `(N, 2, H, W)` 标签容器, 加载时校验数量. ✅
//!
//! 实现位于 `cell-berry/src/dataset`.
//!
//! ### 定稿掩膜预览图 ✅
//!
//! 实现位于 `cell-berry/src/data/save.rs`.

/// 二维索引 (行, 列), 同时也用作二维形状.
pub type Idx2d = (usize, usize);

/// 标签像素类型. `0` 为背景.
pub type Label = u32;

mod error;

pub use error::{QcError, QcResult};

pub mod config;

pub use config::{ConfigError, QcConfig};

pub mod consts;

/// 像素栈与标签掩膜基础数据结构.
mod data;

pub use data::{read_label_array, ImgWriteVis, MaskPair, PixelStack};

pub mod dataset;

pub mod filter;

pub mod pipeline;

pub mod prelude;

pub mod review;

pub mod stats;
