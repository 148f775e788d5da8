//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Label};
pub use crate::{QcConfig, QcError, QcResult};

pub use crate::data::{read_label_array, ImgWriteVis, MaskPair, PixelStack};

pub use crate::consts::{defaults, is_background, is_object, BACKGROUND};

pub use crate::dataset::home_dataset_dir_with;
pub use crate::dataset::{ImageDir, ImageSource, LabelProvider, NpzArchive, StackedLabels};

pub use crate::filter::{clear_border, keep_fluoro_positive, remove_saturated, remove_small};
pub use crate::pipeline::{filter_masks_auto, FilterReport, FilteredMasks};
pub use crate::stats::{compute_label_stats, LabelStats};

pub use crate::review::{
    run_review, AcceptReviewer, ExternalReviewer, ReviewError, ReviewOutcome, Reviewer,
    RunSummary,
};
