use crate::consts::files::{LEDGER, MASK_SUFFIX};
use crate::{MaskPair, QcError, QcResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// 台账文件内容.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    finished: BTreeSet<String>,
}

/// 复核台账: 哪些图像已经定稿.
///
/// 一张图像被视为已定稿, 当且仅当输出目录中存在其定稿掩膜 `{id}_mask.npy`,
/// 或者其 id 被记录在同目录的台账文件中. 前者保证即使台账丢失,
/// 已写出的结果也不会被重算或覆盖.
#[derive(Debug)]
pub struct ReviewLedger {
    dir: PathBuf,
    finished: BTreeSet<String>,
}

impl ReviewLedger {
    /// 打开 (必要时创建) 输出目录 `dir`, 扫描已有定稿掩膜并读取台账文件.
    pub fn open<P: AsRef<Path>>(dir: P) -> QcResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let mut finished = BTreeSet::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|n| n.strip_suffix(MASK_SUFFIX))
                .filter(|id| !id.is_empty())
            {
                finished.insert(id.to_owned());
            }
        }

        match File::open(dir.join(LEDGER)) {
            Ok(f) => {
                let file: LedgerFile = bincode::deserialize_from(BufReader::new(f))?;
                finished.extend(file.finished);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        log::debug!("ledger at {}: {} finished", dir.display(), finished.len());
        Ok(Self { dir, finished })
    }

    /// 图像 `id` 是否已定稿?
    #[inline]
    pub fn is_done(&self, id: &str) -> bool {
        self.finished.contains(id)
    }

    /// 已定稿图像的个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.finished.len()
    }

    /// 是否还没有任何图像定稿.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.finished.is_empty()
    }

    /// 已定稿的图像名, 升序.
    pub fn finished(&self) -> impl Iterator<Item = &str> {
        self.finished.iter().map(String::as_str)
    }

    /// 输出目录.
    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 图像 `id` 的定稿掩膜路径.
    pub fn artifact_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}{MASK_SUFFIX}"))
    }

    /// 定稿图像 `id`: 写出 `{id}_mask.npy`, 然后记入台账.
    ///
    /// 掩膜先写入同目录的临时文件, 再以不覆盖的方式改名,
    /// 因此中途崩溃不会留下残缺的定稿掩膜. 定稿掩膜已存在时返回
    /// [`QcError::AlreadyFinalized`]. 掩膜写出后台账写入失败只记录警告:
    /// 下次打开时目录扫描仍会认出该图像.
    pub fn commit(&mut self, id: &str, masks: &MaskPair) -> QcResult<PathBuf> {
        let path = self.artifact_path(id);
        if self.is_done(id) || path.exists() {
            return Err(QcError::AlreadyFinalized(id.to_owned()));
        }

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        masks.save(tmp.as_file_mut())?;
        tmp.as_file().sync_all()?;
        tmp.persist_noclobber(&path).map_err(|e| {
            if e.error.kind() == ErrorKind::AlreadyExists {
                QcError::AlreadyFinalized(id.to_owned())
            } else {
                QcError::Io(e.error)
            }
        })?;

        self.finished.insert(id.to_owned());
        if let Err(e) = self.persist() {
            log::warn!("failed to update review ledger after finalizing `{id}`: {e}");
        }
        Ok(path)
    }

    /// 把台账写回硬盘, 同样经由临时文件改名.
    fn persist(&self) -> QcResult<()> {
        let tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        {
            let mut w = BufWriter::new(tmp.as_file());
            bincode::serialize_into(
                &mut w,
                &LedgerFile {
                    finished: self.finished.clone(),
                },
            )?;
            w.flush()?;
        }
        tmp.persist(self.dir.join(LEDGER)).map_err(|e| e.error)?;
        Ok(())
    }
}
