use super::LabelProvider;
use crate::consts::files::{CELLS_ENTRY_SUFFIX, NUCLEI_ENTRY_SUFFIX};
use crate::data::{decode_labels, NpzEntry};
use crate::{Label, MaskPair, QcError, QcResult};
use ndarray::{Array2, Ix2};
use ndarray_npy::NpzReader;
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::BufReader;
use std::path::Path;
use std::sync::Mutex;

/// Npz 文件归档.
///
/// 该结构可用于建模硬盘上按图像名显式索引的原始标签: 图像 `id` 的细胞标签存于条目
/// `{id}_cells.npy`, 细胞核标签存于条目 `{id}_nuclei.npy`.
pub struct NpzArchive {
    reader: Mutex<NpzReader<BufReader<File>>>,
    names: BTreeSet<String>,
}

impl NpzArchive {
    /// 打开路径 `p` 处的 npz 文件, 并读取其条目列表.
    pub fn new<P: AsRef<Path>>(p: P) -> QcResult<Self> {
        let file = OpenOptions::new().read(true).open(p.as_ref())?;
        let mut reader = NpzReader::new(BufReader::new(file))?;
        let names = reader.names()?.into_iter().collect();
        Ok(Self {
            reader: Mutex::new(reader),
            names,
        })
    }

    /// 获取底层 npz 文件包含的所有条目名.
    #[inline]
    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// 同时拥有细胞和细胞核条目的图像名, 升序排列.
    pub fn ids(&self) -> Vec<String> {
        self.label_names()
            .filter_map(|n| n.strip_suffix(CELLS_ENTRY_SUFFIX))
            .filter(|id| self.has(id))
            .map(str::to_owned)
            .collect()
    }

    /// 归档中是否有图像 `id` 的完整标签?
    #[inline]
    pub fn has(&self, id: &str) -> bool {
        self.names.contains(&format!("{id}{CELLS_ENTRY_SUFFIX}"))
            && self.names.contains(&format!("{id}{NUCLEI_ENTRY_SUFFIX}"))
    }

    /// `ids` 中在归档里没有完整标签的那些.
    pub fn missing<'a, I: IntoIterator<Item = &'a str>>(&self, ids: I) -> Vec<String> {
        ids.into_iter()
            .filter(|id| !self.has(id))
            .map(str::to_owned)
            .collect()
    }

    /// 通过 npz 条目名获取底层 2D 标签内容.
    pub fn label_by_name(&self, name: &str) -> QcResult<Array2<Label>> {
        // 持锁线程 panic 不会破坏 reader 的状态.
        let mut reader = self.reader.lock().unwrap_or_else(|e| e.into_inner());
        decode_labels::<_, Ix2>(&mut NpzEntry {
            reader: &mut *reader,
            name,
        })
    }
}

impl LabelProvider for NpzArchive {
    fn labels(&self, id: &str) -> QcResult<MaskPair> {
        if !self.has(id) {
            return Err(QcError::MissingImage(id.to_owned()));
        }
        let cells = self.label_by_name(&format!("{id}{CELLS_ENTRY_SUFFIX}"))?;
        let nuclei = self.label_by_name(&format!("{id}{NUCLEI_ENTRY_SUFFIX}"))?;
        MaskPair::new(cells, nuclei)
    }
}
