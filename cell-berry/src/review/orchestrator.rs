use super::{check_shape, ReviewError, ReviewLedger, ReviewOutcome, Reviewer};
use crate::consts::files::PREVIEW_SUFFIX;
use crate::dataset::{ImageSource, LabelProvider};
use crate::pipeline::filter_masks_auto;
use crate::{ImgWriteVis, QcConfig, QcError, QcResult};
use std::fmt;
use std::path::{Path, PathBuf};

/// 推迟定稿的原因. 推迟的图像下次运行时重新复核.
#[derive(Debug)]
pub enum DeferReason {
    /// 复核被放弃.
    Abandoned,
    /// 复核出错 (工具不可用, 形状被改变等).
    Review(ReviewError),
}

/// 推迟定稿的图像.
#[derive(Debug)]
pub struct Deferred {
    /// 图像名.
    pub id: String,
    /// 推迟原因.
    pub reason: DeferReason,
}

/// 处理失败的图像. 多为输入契约违例, 需要修正输入后重跑.
#[derive(Debug)]
pub struct ImageFailure {
    /// 图像名.
    pub id: String,
    /// 导致失败的错误.
    pub error: QcError,
}

impl fmt::Display for ImageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.error)
    }
}

impl fmt::Display for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            DeferReason::Abandoned => write!(f, "{}: review abandoned", self.id),
            DeferReason::Review(e) => write!(f, "{}: {e}", self.id),
        }
    }
}

/// 一次运行的汇总. 每张图像恰好出现在其中一个列表里.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// 本次定稿的图像.
    pub reviewed: Vec<String>,
    /// 之前已定稿, 本次跳过的图像.
    pub skipped: Vec<String>,
    /// 本次推迟的图像.
    pub deferred: Vec<Deferred>,
    /// 本次失败的图像.
    pub failed: Vec<ImageFailure>,
}

impl RunSummary {
    /// 本次运行涉及的图像总数.
    pub fn total(&self) -> usize {
        self.reviewed.len() + self.skipped.len() + self.deferred.len() + self.failed.len()
    }

    /// 是否所有图像都已定稿?
    pub fn is_complete(&self) -> bool {
        self.deferred.is_empty() && self.failed.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} image(s): {} reviewed, {} skipped, {} deferred, {} failed",
            self.total(),
            self.reviewed.len(),
            self.skipped.len(),
            self.deferred.len(),
            self.failed.len()
        )
    }
}

enum Step {
    Reviewed(PathBuf),
    Deferred(DeferReason),
}

/// 对 `images` 中的全部图像运行 "自动过滤 + 人工复核 + 定稿".
///
/// 已在 `output_dir` 定稿的图像不读标签, 不过滤, 也不交给 `reviewer`.
/// 其余图像按图像名升序逐一处理; 单张图像的失败或放弃不影响后续图像.
///
/// 只有配置非法或输出目录/台账无法打开时才整体返回错误.
pub fn run_review<I, L, R, P>(
    images: &I,
    labels: &L,
    output_dir: P,
    config: &QcConfig,
    reviewer: &mut R,
) -> QcResult<RunSummary>
where
    I: ImageSource + ?Sized,
    L: LabelProvider + ?Sized,
    R: Reviewer + ?Sized,
    P: AsRef<Path>,
{
    config.validate()?;
    let mut ledger = ReviewLedger::open(output_dir)?;
    let mut summary = RunSummary::default();

    let mut ids = images.ids();
    ids.sort_unstable();
    ids.dedup();
    log::info!(
        "{} image(s), {} already finalized in {}",
        ids.len(),
        ledger.len(),
        ledger.dir().display()
    );

    for id in ids {
        if ledger.is_done(&id) {
            log::debug!("{id}: already finalized, skipped");
            summary.skipped.push(id);
            continue;
        }
        match review_one(&id, images, labels, config, reviewer, &mut ledger) {
            Ok(Step::Reviewed(path)) => {
                log::info!("{id}: finalized as {}", path.display());
                summary.reviewed.push(id);
            }
            Ok(Step::Deferred(reason)) => {
                let d = Deferred { id, reason };
                log::warn!("deferred {d}");
                summary.deferred.push(d);
            }
            Err(error) => {
                let e = ImageFailure { id, error };
                log::error!("failed {e}");
                summary.failed.push(e);
            }
        }
    }
    log::info!("{summary}");
    Ok(summary)
}

fn review_one<I, L, R>(
    id: &str,
    images: &I,
    labels: &L,
    config: &QcConfig,
    reviewer: &mut R,
    ledger: &mut ReviewLedger,
) -> QcResult<Step>
where
    I: ImageSource + ?Sized,
    L: LabelProvider + ?Sized,
    R: Reviewer + ?Sized,
{
    let pixels = images.load(id)?;
    let raw = labels.labels(id)?;
    let auto = filter_masks_auto(&pixels, &raw, config.filter_fluoro, config)?;
    log::info!("{id}: {}", auto.report);

    let masks = match reviewer.review(id, &pixels, &auto.masks) {
        Ok(ReviewOutcome::Finished(m)) => m,
        Ok(ReviewOutcome::Abandoned) => return Ok(Step::Deferred(DeferReason::Abandoned)),
        Err(e) => return Ok(Step::Deferred(DeferReason::Review(e))),
    };
    if let Err(e) = check_shape(auto.masks.shape(), masks.shape()) {
        return Ok(Step::Deferred(DeferReason::Review(e)));
    }

    let path = ledger.commit(id, &masks)?;
    if config.write_preview {
        let png = ledger.dir().join(format!("{id}{PREVIEW_SUFFIX}"));
        if let Err(e) = masks.save_vis(&png) {
            log::warn!("{id}: failed to write preview {}: {e}", png.display());
        }
    }
    Ok(Step::Reviewed(path))
}

#[cfg(test)]
mod tests {
    use super::{run_review, DeferReason};
    use crate::pipeline::filter_masks_auto;
    use crate::review::{AcceptReviewer, ReviewError, ReviewOutcome, Reviewer};
    use crate::{MaskPair, PixelStack, QcConfig, QcError};
    use ndarray::{s, Array2, Array3};
    use std::collections::{BTreeMap, HashSet};

    /// 记录调用, 对 `abandon` 中的图像放弃复核, 其余原样接受.
    #[derive(Default)]
    struct CountingReviewer {
        calls: Vec<String>,
        abandon: HashSet<String>,
    }

    impl Reviewer for CountingReviewer {
        fn review(
            &mut self,
            id: &str,
            _pixels: &PixelStack,
            provisional: &MaskPair,
        ) -> Result<ReviewOutcome, ReviewError> {
            self.calls.push(id.to_owned());
            if self.abandon.contains(id) {
                Ok(ReviewOutcome::Abandoned)
            } else {
                Ok(ReviewOutcome::Finished(provisional.clone()))
            }
        }
    }

    /// 返回形状错误的掩膜.
    struct ResizingReviewer;

    impl Reviewer for ResizingReviewer {
        fn review(
            &mut self,
            _id: &str,
            _pixels: &PixelStack,
            _provisional: &MaskPair,
        ) -> Result<ReviewOutcome, ReviewError> {
            let z = Array2::zeros((3, 3));
            Ok(ReviewOutcome::Finished(MaskPair::new(z.clone(), z).unwrap()))
        }
    }

    fn config() -> QcConfig {
        QcConfig {
            nucleus_min_area: 4,
            border_buffer: 1,
            channel: 0,
            ..Default::default()
        }
    }

    /// 12x12 图像: 内部细胞 1 (含核 5), 贴边细胞 2 (含核 6).
    fn sample() -> (PixelStack, MaskPair) {
        let mut cells = Array2::<u32>::zeros((12, 12));
        let mut nuclei = Array2::<u32>::zeros((12, 12));
        cells.slice_mut(s![3..9, 3..9]).fill(1);
        nuclei.slice_mut(s![4..7, 4..7]).fill(5);
        cells.slice_mut(s![0..3, 9..12]).fill(2);
        nuclei.slice_mut(s![0..2, 10..12]).fill(6);
        let pixels = Array3::<f32>::from_elem((1, 12, 12), 1000.0);
        (
            PixelStack::new(pixels).unwrap(),
            MaskPair::new(cells, nuclei).unwrap(),
        )
    }

    type Inputs = (BTreeMap<String, PixelStack>, BTreeMap<String, MaskPair>);

    fn inputs(ids: &[&str]) -> Inputs {
        let (p, m) = sample();
        let images = ids.iter().map(|id| (id.to_string(), p.clone())).collect();
        let labels = ids.iter().map(|id| (id.to_string(), m.clone())).collect();
        (images, labels)
    }

    #[test]
    fn test_rerun_skips_finalized() {
        let dir = tempfile::tempdir().unwrap();
        let (images, labels) = inputs(&["c", "a", "b"]);

        let mut r = CountingReviewer::default();
        let s = run_review(&images, &labels, dir.path(), &config(), &mut r).unwrap();
        assert_eq!(r.calls, vec!["a", "b", "c"]);
        assert_eq!(s.reviewed, vec!["a", "b", "c"]);
        assert!(s.is_complete());
        let before = std::fs::read(dir.path().join("b_mask.npy")).unwrap();

        let mut r = CountingReviewer::default();
        let s = run_review(&images, &labels, dir.path(), &config(), &mut r).unwrap();
        assert!(r.calls.is_empty());
        assert_eq!(s.skipped, vec!["a", "b", "c"]);
        assert!(s.reviewed.is_empty());
        assert_eq!(std::fs::read(dir.path().join("b_mask.npy")).unwrap(), before);
    }

    #[test]
    fn test_artifact_is_reviewed_masks() {
        let dir = tempfile::tempdir().unwrap();
        let (images, labels) = inputs(&["a"]);
        run_review(&images, &labels, dir.path(), &config(), &mut AcceptReviewer).unwrap();

        let (p, m) = sample();
        let auto = filter_masks_auto(&p, &m, true, &config()).unwrap();
        let saved = MaskPair::open(dir.path().join("a_mask.npy")).unwrap();
        assert_eq!(saved, auto.masks);
        // 贴边细胞及其细胞核都被去除.
        assert!(!saved.cells().iter().any(|&v| v == 2));
        assert!(!saved.nuclei().iter().any(|&v| v == 6));
        assert_eq!(saved.nuclei().iter().filter(|&&v| v == 5).count(), 9);
    }

    #[test]
    fn test_abandoned_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let (images, labels) = inputs(&["a", "b"]);

        let mut r = CountingReviewer {
            abandon: ["b".to_owned()].into_iter().collect(),
            ..Default::default()
        };
        let s = run_review(&images, &labels, dir.path(), &config(), &mut r).unwrap();
        assert_eq!(s.reviewed, vec!["a"]);
        assert_eq!(s.deferred.len(), 1);
        assert_eq!(s.deferred[0].id, "b");
        assert!(matches!(s.deferred[0].reason, DeferReason::Abandoned));
        assert!(!dir.path().join("b_mask.npy").exists());

        let mut r = CountingReviewer::default();
        let s = run_review(&images, &labels, dir.path(), &config(), &mut r).unwrap();
        assert_eq!(r.calls, vec!["b"]);
        assert_eq!(s.skipped, vec!["a"]);
        assert_eq!(s.reviewed, vec!["b"]);
    }

    #[test]
    fn test_failure_does_not_stop_run() {
        let dir = tempfile::tempdir().unwrap();
        let (images, mut labels) = inputs(&["a", "b", "c"]);
        labels.remove("b");
        // c 的标签形状与像素栈不一致.
        let z = Array2::zeros((5, 5));
        labels.insert("c".to_owned(), MaskPair::new(z.clone(), z).unwrap());

        let mut r = CountingReviewer::default();
        let s = run_review(&images, &labels, dir.path(), &config(), &mut r).unwrap();
        assert_eq!(r.calls, vec!["a"]);
        assert_eq!(s.reviewed, vec!["a"]);
        assert_eq!(s.failed.len(), 2);
        assert_eq!(s.failed[0].id, "b");
        assert!(matches!(s.failed[0].error, QcError::MissingImage(_)));
        assert_eq!(s.failed[1].id, "c");
        assert!(matches!(s.failed[1].error, QcError::ShapeMismatch { .. }));
        assert_eq!(s.total(), 3);
    }

    #[test]
    fn test_shape_changed_is_deferred() {
        let dir = tempfile::tempdir().unwrap();
        let (images, labels) = inputs(&["a"]);
        let mut r = ResizingReviewer;
        let s = run_review(&images, &labels, dir.path(), &config(), &mut r).unwrap();
        assert!(s.reviewed.is_empty());
        assert!(matches!(
            s.deferred[0].reason,
            DeferReason::Review(ReviewError::ShapeChanged { .. })
        ));
        assert!(!dir.path().join("a_mask.npy").exists());
    }

    #[test]
    fn test_preview_and_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let (images, labels) = inputs(&["a"]);
        let mut cfg = config();
        cfg.write_preview = true;
        run_review(&images, &labels, dir.path(), &cfg, &mut AcceptReviewer).unwrap();
        assert!(dir.path().join("a_mask.png").exists());

        cfg.fluoro_frac_cutoff = 2.0;
        let e = run_review(&images, &labels, dir.path(), &cfg, &mut AcceptReviewer);
        let e = e.unwrap_err();
        assert!(matches!(e, QcError::Config(_)));
    }

    #[test]
    fn test_dyn_reviewer() {
        let dir = tempfile::tempdir().unwrap();
        let (images, labels) = inputs(&["a"]);
        let mut r: Box<dyn Reviewer> = Box::new(AcceptReviewer);
        let s = run_review(&images, &labels, dir.path(), &config(), &mut r).unwrap();
        assert_eq!(s.reviewed, vec!["a"]);
    }
}
