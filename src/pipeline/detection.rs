//! Detection-head refinement: independent per-class score columns.
//!
//! Unlike the proposal stage, one region may yield candidates for several
//! classes at once: every foreground class is decoded with its own delta
//! column and scored with its own score column. The score threshold is
//! applied inside suppression and the clip stage enforces a stride-sized
//! minimum box edge; this asymmetry with the proposal stage is intentional.

use crate::clip::clip_filter;
use crate::codec;
use crate::geom::{BBox, Delta, Detection};
use crate::pipeline::{check_image_shape, check_len, RefineConfig};
use crate::suppress::nms::nms_boxes;
use crate::suppress::topk::top_k_by_score;
use crate::trace::{trace_event, trace_span};
use crate::util::math::softmax_in_place;
use crate::util::BoxRefineResult;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Refinement pipeline for detection-head outputs.
///
/// Built once from a validated [`RefineConfig`], then reused per inference
/// call. Scores arrive as raw head outputs; a row softmax is applied before
/// per-class slicing.
#[derive(Clone, Debug)]
pub struct DetectionRefiner {
    cfg: RefineConfig,
}

impl DetectionRefiner {
    /// Creates a refiner, validating the configuration once.
    pub fn new(cfg: RefineConfig) -> BoxRefineResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RefineConfig {
        &self.cfg
    }

    /// Refines detection-head candidates into final detections.
    ///
    /// `scores` holds one row of `num_classes` raw scores per region,
    /// `deltas` one row of `num_classes` delta columns per region
    /// (row-major), `rois` the reference boxes, and `image_shape` the
    /// `(height, width)` clip bounds. Returns `Ok(None)` when no class
    /// yields a survivor. The returned detections are the global top
    /// `max_per_image` by score across all classes; their order carries no
    /// guarantee.
    pub fn refine(
        &self,
        scores: &[f32],
        deltas: &[Delta],
        rois: &[BBox],
        image_shape: (f32, f32),
    ) -> BoxRefineResult<Option<Vec<Detection>>> {
        let num_classes = self.cfg.num_classes;
        check_image_shape(image_shape)?;
        check_len("scores", rois.len() * num_classes, scores.len())?;
        check_len("deltas", rois.len() * num_classes, deltas.len())?;

        let num_regions = rois.len();
        if num_regions == 0 {
            return Ok(None);
        }

        let _span =
            trace_span!("detection_refine", regions = num_regions, classes = num_classes).entered();

        // Row softmax over the raw head scores.
        let mut probs = scores.to_vec();
        for row in probs.chunks_mut(num_classes) {
            softmax_in_place(row);
        }

        // Class 0 is background and is never emitted. Classes are processed
        // in ascending id order; with rayon the per-class outputs are
        // collected in the same order, so results match sequential runs.
        #[cfg(feature = "rayon")]
        let per_class: Vec<Vec<Detection>> = if self.cfg.parallel {
            (1..num_classes)
                .into_par_iter()
                .map(|class_id| self.refine_one_class(class_id, &probs, deltas, rois, image_shape))
                .collect()
        } else {
            (1..num_classes)
                .map(|class_id| self.refine_one_class(class_id, &probs, deltas, rois, image_shape))
                .collect()
        };
        #[cfg(not(feature = "rayon"))]
        let per_class: Vec<Vec<Detection>> = (1..num_classes)
            .map(|class_id| self.refine_one_class(class_id, &probs, deltas, rois, image_shape))
            .collect();

        let all: Vec<Detection> = per_class.into_iter().flatten().collect();
        if all.is_empty() {
            return Ok(None);
        }
        trace_event!("class_survivors", count = all.len());

        // Global top-K across classes.
        let indices: Vec<usize> = (0..all.len()).collect();
        let all_scores: Vec<f32> = all.iter().map(|d| d.score).collect();
        let top = top_k_by_score(&indices, &all_scores, self.cfg.max_per_image);
        Ok(Some(top.into_iter().map(|idx| all[idx]).collect()))
    }

    /// Decode, clip, and suppress the candidates of one foreground class.
    fn refine_one_class(
        &self,
        class_id: usize,
        probs: &[f32],
        deltas: &[Delta],
        rois: &[BBox],
        image_shape: (f32, f32),
    ) -> Vec<Detection> {
        let num_classes = self.cfg.num_classes;
        let column: Vec<Delta> = (0..rois.len())
            .map(|idx| deltas[idx * num_classes + class_id])
            .collect();
        let decoded = codec::decode_all(rois, &column, self.cfg.target_means, self.cfg.target_stds);

        // Stride-sized minimum edge, unlike the proposal stage.
        let (clipped, clip_indices) = clip_filter(
            &decoded,
            image_shape.0,
            image_shape.1,
            Some(self.cfg.extractor_stride),
        );
        if clipped.is_empty() {
            return Vec::new();
        }

        // Gather this class's score column at the clip survivors only; the
        // suppressor then applies the score threshold itself.
        let class_scores: Vec<f32> = clip_indices
            .iter()
            .map(|&idx| probs[idx * num_classes + class_id])
            .collect();
        let kept = nms_boxes(
            &clipped,
            &class_scores,
            self.cfg.max_per_class,
            self.cfg.nms_iou,
            Some(self.cfg.score_threshold),
        );

        kept.into_iter()
            .map(|local| Detection {
                bbox: clipped[local],
                class_id,
                score: class_scores[local],
            })
            .collect()
    }
}
