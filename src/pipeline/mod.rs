//! Refinement pipelines composed from the codec, clipper, and suppressor.
//!
//! Two pipelines cover the two stages of a region-proposal detector.
//! [`ProposalRefiner`] takes one best class per region (argmax over the
//! score row); [`DetectionRefiner`] processes every foreground class column
//! independently. Both are thin orchestrations over the same leaf
//! components and share a validated [`RefineConfig`].

pub(crate) mod keep;

mod detection;
mod proposal;

pub use detection::DetectionRefiner;
pub use keep::KeepSet;
pub use proposal::ProposalRefiner;

use crate::util::{BoxRefineError, BoxRefineResult};

/// Configuration shared by both refinement pipelines.
///
/// Defaults match the usual Faster R-CNN inference settings: 21 classes
/// (background plus 20 foreground), identity delta normalization, five boxes
/// per class and per image, IoU 0.3, score threshold 0.3, stride 16.
#[derive(Clone, Debug)]
pub struct RefineConfig {
    /// Number of classes including the background class at index 0.
    pub num_classes: usize,
    /// Per-component delta normalization means `(dy, dx, dh, dw)`.
    pub target_means: [f32; 4],
    /// Per-component delta normalization standard deviations.
    pub target_stds: [f32; 4],
    /// Cap on NMS survivors per class.
    pub max_per_class: usize,
    /// Cap on detections per image across all classes.
    pub max_per_image: usize,
    /// IoU threshold for greedy NMS, in `[0, 1]`.
    pub nms_iou: f32,
    /// Minimum class score for a candidate, in `[0, 1]`.
    pub score_threshold: f32,
    /// Feature extractor stride in pixels; the minimum clipped box edge in
    /// the detection pipeline. The proposal pipeline applies no size filter.
    pub extractor_stride: f32,
    /// Run the per-class loop in parallel (effective with the `rayon`
    /// feature; results are identical to sequential execution).
    pub parallel: bool,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            num_classes: 21,
            target_means: [0.0; 4],
            target_stds: [1.0; 4],
            max_per_class: 5,
            max_per_image: 5,
            nms_iou: 0.3,
            score_threshold: 0.3,
            extractor_stride: 16.0,
            parallel: false,
        }
    }
}

impl RefineConfig {
    /// Validates thresholds and class count once, at pipeline construction.
    pub(crate) fn validate(&self) -> BoxRefineResult<()> {
        if !self.nms_iou.is_finite() || !(0.0..=1.0).contains(&self.nms_iou) {
            return Err(BoxRefineError::InvalidThreshold {
                value: self.nms_iou,
                context: "nms_iou",
            });
        }
        if !self.score_threshold.is_finite() || !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(BoxRefineError::InvalidThreshold {
                value: self.score_threshold,
                context: "score_threshold",
            });
        }
        if self.num_classes < 2 {
            return Err(BoxRefineError::InvalidClassCount {
                num_classes: self.num_classes,
            });
        }
        if !(self.extractor_stride > 0.0) {
            return Err(BoxRefineError::InvalidStride {
                stride: self.extractor_stride,
            });
        }
        for &std in &self.target_stds {
            if !(std > 0.0) {
                return Err(BoxRefineError::InvalidStd { value: std });
            }
        }
        Ok(())
    }
}

/// Rejects image bounds with a non-positive or non-finite dimension.
pub(crate) fn check_image_shape(image_shape: (f32, f32)) -> BoxRefineResult<()> {
    let (height, width) = image_shape;
    if !(height > 0.0) || !(width > 0.0) || !height.is_finite() || !width.is_finite() {
        return Err(BoxRefineError::InvalidImageShape { height, width });
    }
    Ok(())
}

/// Rejects an input sequence whose length disagrees with the region count.
pub(crate) fn check_len(
    context: &'static str,
    expected: usize,
    got: usize,
) -> BoxRefineResult<()> {
    if expected != got {
        return Err(BoxRefineError::LengthMismatch {
            expected,
            got,
            context,
        });
    }
    Ok(())
}
