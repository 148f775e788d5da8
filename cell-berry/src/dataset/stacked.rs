use super::LabelProvider;
use crate::data::decode_labels;
use crate::{Label, MaskPair, QcError, QcResult};
use ndarray::{Array4, Axis, Ix4};
use std::collections::BTreeMap;
use std::path::Path;

/// 按位置组织的原始标签, 形状 (图像数, 2, 行, 列).
///
/// 第 `i` 个元素对应 `ids[i]`. 构造时校验元素个数与图像名个数一致,
/// 之后只按图像名访问.
#[derive(Debug, Clone)]
pub struct StackedLabels {
    map: BTreeMap<String, MaskPair>,
}

impl StackedLabels {
    /// 将 `stack` 按第一维拆开, 依次绑定到 `ids`.
    ///
    /// 个数不一致时返回 [`QcError::ContainerLenMismatch`],
    /// 第二维不是 2 时返回 [`QcError::LayerCount`].
    pub fn from_array(ids: Vec<String>, stack: Array4<Label>) -> QcResult<Self> {
        let (n, layers, _, _) = stack.dim();
        if n != ids.len() {
            return Err(QcError::ContainerLenMismatch {
                labels: n,
                images: ids.len(),
            });
        }
        if layers != 2 {
            return Err(QcError::LayerCount(layers));
        }
        let map = ids
            .into_iter()
            .zip(stack.axis_iter(Axis(0)))
            .map(|(id, pair)| Ok((id, MaskPair::from_stack(pair.to_owned())?)))
            .collect::<QcResult<_>>()?;
        Ok(Self { map })
    }

    /// 打开 `.npy` 格式的 (图像数, 2, 行, 列) 标签数组.
    pub fn open<P: AsRef<Path>>(path: P, ids: Vec<String>) -> QcResult<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let stack = decode_labels::<_, Ix4>(&mut bytes.as_slice())?;
        Self::from_array(ids, stack)
    }

    /// 绑定的图像名, 升序排列.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// 图像个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// 是否没有任何图像.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl LabelProvider for StackedLabels {
    fn labels(&self, id: &str) -> QcResult<MaskPair> {
        self.map.labels(id)
    }
}
