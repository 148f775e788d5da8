//! `.npy` / `.npz` 数组解码.
//!
//! 上游工具保存标签图和像素栈时使用的元素类型并不统一 (uint16, int32,
//! float64 等都出现过), 因此这里依次尝试若干类型, 并在转换时检查取值.

use crate::consts::BACKGROUND;
use crate::{Label, QcError, QcResult};
use ndarray::{Array, Dimension, OwnedRepr};
use ndarray_npy::{NpzReader, ReadNpyError, ReadNpyExt, ReadNpzError, ReadableElement};
use std::io::{Read, Seek};

/// 能按给定元素类型反复读取同一个数组的数据源.
pub(crate) trait ArraySource {
    /// 以元素类型 `T` 读取数组. 类型不符时返回 `Ok(None)`.
    fn read<T: ReadableElement, D: Dimension>(&mut self) -> QcResult<Option<Array<T, D>>>;
}

/// 内存中的完整 `.npy` 字节流.
impl ArraySource for &[u8] {
    fn read<T: ReadableElement, D: Dimension>(&mut self) -> QcResult<Option<Array<T, D>>> {
        match Array::<T, D>::read_npy(*self) {
            Ok(a) => Ok(Some(a)),
            Err(ReadNpyError::WrongDescriptor(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// `.npz` 归档中的一个条目.
pub(crate) struct NpzEntry<'a, R: Read + Seek> {
    pub(crate) reader: &'a mut NpzReader<R>,
    pub(crate) name: &'a str,
}

impl<R: Read + Seek> ArraySource for NpzEntry<'_, R> {
    fn read<T: ReadableElement, D: Dimension>(&mut self) -> QcResult<Option<Array<T, D>>> {
        match self.reader.by_name::<OwnedRepr<T>, D>(self.name) {
            Ok(a) => Ok(Some(a)),
            Err(ReadNpzError::Npy(ReadNpyError::WrongDescriptor(_))) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// 逐元素转换, 遇到的第一个非法值作为错误返回.
fn convert<T, U, D, F>(a: Array<T, D>, fill: U, conv: F) -> QcResult<Array<U, D>>
where
    T: Clone,
    D: Dimension,
    F: Fn(T) -> QcResult<U>,
    U: Copy,
{
    let mut first_err = None;
    let out = a.mapv(|v| {
        conv(v).unwrap_or_else(|e| {
            first_err.get_or_insert(e);
            fill
        })
    });
    match first_err {
        Some(e) => Err(e),
        None => Ok(out),
    }
}

fn signed_label(v: i64) -> QcResult<Label> {
    if v < 0 {
        return Err(QcError::NegativeLabel(v));
    }
    Label::try_from(v).map_err(|_| QcError::LabelOverflow(v as u64))
}

fn float_label(v: f64) -> QcResult<Label> {
    if !v.is_finite() || v.fract() != 0.0 {
        return Err(QcError::NonIntegerLabel(v));
    }
    if v < 0.0 {
        return Err(QcError::NegativeLabel(v as i64));
    }
    if v > Label::MAX as f64 {
        return Err(QcError::LabelOverflow(v as u64));
    }
    Ok(v as Label)
}

fn intensity(v: f64) -> QcResult<f32> {
    if v.is_finite() && v >= 0.0 {
        Ok(v as f32)
    } else {
        Err(QcError::InvalidIntensity(v))
    }
}

/// 解码标签数组.
///
/// 负值, 非整数值和超出 `u32` 的值都是输入契约违例.
pub(crate) fn decode_labels<S: ArraySource, D: Dimension>(src: &mut S) -> QcResult<Array<Label, D>> {
    macro_rules! attempt {
        ($t: ty, $conv: expr) => {
            if let Some(a) = src.read::<$t, D>()? {
                return convert(a, BACKGROUND, $conv);
            }
        };
    }
    if let Some(a) = src.read::<Label, D>()? {
        return Ok(a);
    }
    attempt!(u16, |v| Ok(Label::from(v)));
    attempt!(u8, |v| Ok(Label::from(v)));
    attempt!(i32, |v| signed_label(i64::from(v)));
    attempt!(i64, signed_label);
    attempt!(u64, |v| Label::try_from(v).map_err(|_| QcError::LabelOverflow(v)));
    attempt!(f64, float_label);
    attempt!(f32, |v| float_label(f64::from(v)));
    Err(QcError::UnsupportedDtype)
}

/// 解码像素强度数组, 统一转换为 `f32`.
///
/// 负值和非有限值是输入契约违例.
pub(crate) fn decode_intensities<S: ArraySource, D: Dimension>(
    src: &mut S,
) -> QcResult<Array<f32, D>> {
    macro_rules! attempt {
        ($t: ty) => {
            if let Some(a) = src.read::<$t, D>()? {
                return convert(a, 0.0, |v| intensity(f64::from(v)));
            }
        };
    }
    attempt!(u16);
    attempt!(u8);
    attempt!(f32);
    attempt!(u32);
    attempt!(f64);
    attempt!(i16);
    attempt!(i32);
    Err(QcError::UnsupportedDtype)
}

#[cfg(test)]
mod tests {
    use super::{decode_intensities, decode_labels};
    use crate::{Label, QcError};
    use ndarray::{array, Array2, Ix2, Ix3};
    use ndarray_npy::WriteNpyExt;

    fn npy_bytes<T: WriteNpyExt>(a: &T) -> Vec<u8> {
        let mut buf = Vec::new();
        a.write_npy(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_decode_labels_widening() {
        let bytes = npy_bytes(&array![[0u16, 3], [7, 0]]);
        let a: Array2<Label> = decode_labels::<_, Ix2>(&mut bytes.as_slice()).unwrap();
        assert_eq!(a, array![[0, 3], [7, 0]]);

        let bytes = npy_bytes(&array![[0i32, 65536], [1, 2]]);
        let a: Array2<Label> = decode_labels::<_, Ix2>(&mut bytes.as_slice()).unwrap();
        assert_eq!(a[(0, 1)], 65536);
    }

    #[test]
    fn test_decode_labels_contract_violations() {
        let bytes = npy_bytes(&array![[0i64, -2]]);
        let e = decode_labels::<_, Ix2>(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(e, QcError::NegativeLabel(-2)));

        let bytes = npy_bytes(&array![[0.0f64, 1.5]]);
        let e = decode_labels::<_, Ix2>(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(e, QcError::NonIntegerLabel(_)));

        let bytes = npy_bytes(&array![[u64::MAX]]);
        let e = decode_labels::<_, Ix2>(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(e, QcError::LabelOverflow(_)));

        // 整数值的浮点标签是允许的.
        let bytes = npy_bytes(&array![[0.0f32, 4.0]]);
        let a = decode_labels::<_, Ix2>(&mut bytes.as_slice()).unwrap();
        assert_eq!(a, array![[0, 4]]);
    }

    #[test]
    fn test_decode_labels_wrong_ndim() {
        let bytes = npy_bytes(&array![[[1u32]]]);
        let e = decode_labels::<_, Ix2>(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(e, QcError::ReadNpy(_)));
    }

    #[test]
    fn test_decode_intensities() {
        let bytes = npy_bytes(&array![[[0u16, 60001]], [[5, 6]]]);
        let a = decode_intensities::<_, Ix3>(&mut bytes.as_slice()).unwrap();
        assert_eq!(a.shape(), &[2, 1, 2]);
        assert_eq!(a[(0, 0, 1)], 60001.0);

        let bytes = npy_bytes(&array![[[1.0f64, f64::NAN]]]);
        let e = decode_intensities::<_, Ix3>(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(e, QcError::InvalidIntensity(_)));
    }
}
