use super::retain_by_fraction;
use crate::{Label, QcResult};
use ndarray::{Array2, ArrayView2};

/// 荧光阳性保留 (与饱和排除方向相反).
///
/// 强度严格大于 `threshold` 的像素占比严格大于 `frac_cutoff` 的对象被保留,
/// 其余整体置为背景.
pub fn keep_fluoro_positive(
    labels: ArrayView2<Label>,
    intensity: ArrayView2<f32>,
    threshold: f32,
    frac_cutoff: f64,
) -> QcResult<Array2<Label>> {
    retain_by_fraction(labels, intensity, threshold, |f| f > frac_cutoff)
}

#[cfg(test)]
mod tests {
    use super::keep_fluoro_positive;
    use ndarray::{array, Array2};

    #[test]
    fn test_fluoro_inclusion() {
        // 标签 1: 1/4 亮; 标签 2: 0/4 亮; 标签 3: 1/10 亮 (不严格大于 0.1).
        let labels = array![
            [1, 1, 2, 2, 3, 3, 3, 3, 3],
            [1, 1, 2, 2, 3, 3, 3, 3, 3],
        ];
        let inten = array![
            [500.0, 0.0, 0.0, 200.0, 201.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];
        let out = keep_fluoro_positive(labels.view(), inten.view(), 200.0, 0.1).unwrap();
        assert_eq!(
            out,
            array![
                [1, 1, 0, 0, 0, 0, 0, 0, 0],
                [1, 1, 0, 0, 0, 0, 0, 0, 0],
            ]
        );
    }

    #[test]
    fn test_background_only() {
        let labels = Array2::<u32>::zeros((4, 4));
        let inten = Array2::from_elem((4, 4), 1000.0f32);
        let out = keep_fluoro_positive(labels.view(), inten.view(), 200.0, 0.1).unwrap();
        assert_eq!(out, labels);
    }
}
