use super::retain_by_fraction;
use crate::{Label, QcResult};
use ndarray::{Array2, ArrayView2};

/// 饱和排除.
///
/// 对每个对象统计强度严格大于 `threshold` 的像素占比, 占比严格小于 `frac_cutoff`
/// 时保留, 否则整体置为背景. 全部像素都饱和的对象一定被排除.
///
/// `labels` 与 `intensity` 形状不一致时返回 [`crate::QcError::ShapeMismatch`].
pub fn remove_saturated(
    labels: ArrayView2<Label>,
    intensity: ArrayView2<f32>,
    threshold: f32,
    frac_cutoff: f64,
) -> QcResult<Array2<Label>> {
    retain_by_fraction(labels, intensity, threshold, |f| f < frac_cutoff)
}

#[cfg(test)]
mod tests {
    use super::remove_saturated;
    use ndarray::Array2;

    /// 两个 1000 像素的细胞, 分别有 60 和 40 个饱和像素.
    #[test]
    fn test_saturation_scenario() {
        let labels = Array2::from_shape_fn((40, 50), |(h, _)| if h < 20 { 1 } else { 2 });
        let inten = Array2::from_shape_fn((40, 50), |(h, w)| {
            let saturated = h == 0 || (h == 1 && w < 10) // 60 个
                || (h == 20 && w < 40); // 40 个
            if saturated {
                60001.0
            } else {
                1000.0
            }
        });
        let out = remove_saturated(labels.view(), inten.view(), 60000.0, 0.05).unwrap();
        assert!(out.iter().all(|&l| l != 1));
        assert_eq!(out.iter().filter(|&&l| l == 2).count(), 1000);
    }

    #[test]
    fn test_threshold_is_strict() {
        let labels = Array2::from_elem((2, 2), 3u32);
        let inten = Array2::from_elem((2, 2), 60000.0f32);
        let out = remove_saturated(labels.view(), inten.view(), 60000.0, 0.05).unwrap();
        assert_eq!(out, labels);

        let inten = Array2::from_elem((2, 2), 60000.5f32);
        let out = remove_saturated(labels.view(), inten.view(), 60000.0, 0.05).unwrap();
        assert!(out.iter().all(|&l| l == 0));
    }

    #[test]
    fn test_shape_preserved_and_mismatch() {
        let labels = Array2::<u32>::zeros((3, 5));
        let out = remove_saturated(labels.view(), Array2::zeros((3, 5)).view(), 1.0, 0.5).unwrap();
        assert_eq!(out.dim(), (3, 5));
        assert!(remove_saturated(labels.view(), Array2::zeros((5, 3)).view(), 1.0, 0.5).is_err());
    }
}
