//! 掩膜的可视化存储.

use crate::consts::is_background;
use crate::{Label, MaskPair};
use image::ImageResult;
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 与 `.npy` 定稿掩膜不同, 该方式保存的图片仅供人眼检查,
/// 不保留原始标签值, 下游流程不应读取它.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save_vis<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 使标签更有利于单通道可视化. 背景为黑色, 相邻编号的对象得到差异较大的亮度.
#[inline]
pub(crate) fn pretty(label: Label) -> u8 {
    if is_background(label) {
        0
    } else {
        // 64..=255
        64 + (label.wrapping_mul(97) % 192) as u8
    }
}

/// 细胞映射到红色通道, 细胞核映射到蓝色通道.
impl ImgWriteVis for MaskPair {
    fn save_vis<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = image::RgbImage::new(width as u32, height as u32);
        let nuclei = self.nuclei();
        for ((h, w), &cell) in self.cells().indexed_iter() {
            let nucleus = nuclei[(h, w)];
            buf.put_pixel(
                w as u32,
                h as u32,
                image::Rgb([pretty(cell), 0, pretty(nucleus)]),
            );
        }
        buf.save(path)
    }
}
