//! Proposal-stage refinement: one best class per region.
//!
//! Each region contributes a single candidate, namely its argmax class and
//! that class's delta column. Background regions and low-scoring regions are
//! filtered through explicit keep-set intersections before per-class NMS.

use crate::clip::clip_filter;
use crate::codec;
use crate::geom::{BBox, Delta, Detection};
use crate::pipeline::keep::KeepSet;
use crate::pipeline::{check_image_shape, check_len, RefineConfig};
use crate::suppress::nms::nms_boxes;
use crate::suppress::topk::top_k_by_score;
use crate::trace::{trace_event, trace_span};
use crate::util::math::argmax;
use crate::util::BoxRefineResult;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Refinement pipeline for proposal-stage outputs.
///
/// Built once from a validated [`RefineConfig`], then reused per inference
/// call. The clip stage applies no minimum-size filter and the score
/// threshold is applied before suppression; both choices mirror the
/// detection head's training-time counterpart and deliberately differ from
/// [`DetectionRefiner`](crate::DetectionRefiner).
#[derive(Clone, Debug)]
pub struct ProposalRefiner {
    cfg: RefineConfig,
}

impl ProposalRefiner {
    /// Creates a refiner, validating the configuration once.
    pub fn new(cfg: RefineConfig) -> BoxRefineResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RefineConfig {
        &self.cfg
    }

    /// Refines proposal-stage candidates into final detections.
    ///
    /// `scores` holds one row of `num_classes` softmax probabilities per
    /// region, `deltas` one row of `num_classes` delta columns per region
    /// (row-major), `rois` the reference boxes, and `image_shape` the
    /// `(height, width)` clip bounds. Returns `Ok(None)` when no candidate
    /// survives filtering; that is the expected "no detections" outcome,
    /// not an error. Detections come back sorted by descending score.
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

        let _span = trace_span!("proposal_refine", regions = num_regions).entered();

        // Best class per region, its score, and the matching delta column.
        let mut class_ids = Vec::with_capacity(num_regions);
        let mut class_scores = Vec::with_capacity(num_regions);
        let mut selected_deltas = Vec::with_capacity(num_regions);
        for idx in 0..num_regions {
            let row = &scores[idx * num_classes..(idx + 1) * num_classes];
            // row is non-empty: num_classes >= 2 is enforced at construction
            let (class_id, score) = argmax(row).unwrap_or((0, f32::NEG_INFINITY));
            class_ids.push(class_id);
            class_scores.push(score);
            selected_deltas.push(deltas[idx * num_classes + class_id]);
        }

        // Decode against the reference boxes, then clip. No minimum-edge
        // filter at this stage.
        let mut refined = codec::decode_all(
            rois,
            &selected_deltas,
            self.cfg.target_means,
            self.cfg.target_stds,
        );
        let (clipped, clip_indices) = clip_filter(&refined, image_shape.0, image_shape.1, None);
        for (pos, &orig) in clip_indices.iter().enumerate() {
            refined[orig] = clipped[pos];
        }
        let clip_keep = KeepSet::from_indices(clip_indices);

        // Foreground ∩ score threshold ∩ clip survivors, all in the
        // original index space.
        let foreground: Vec<usize> = (0..num_regions).filter(|&i| class_ids[i] > 0).collect();
        let scored: Vec<usize> = (0..num_regions)
            .filter(|&i| class_scores[i] >= self.cfg.score_threshold)
            .collect();
        let keep = KeepSet::from_indices(foreground)
            .intersect(&KeepSet::from_indices(scored))
            .intersect(&clip_keep);
        if keep.is_empty() {
            return Ok(None);
        }
        trace_event!("pre_nms_keep", count = keep.len());

        // Per-class NMS over a sorted partition of the keep-set.
        let partition = partition_by_class(keep.as_slice(), &class_ids);
        let survivors = self.suppress_classes(&partition, &refined, &class_scores);
        let nms_keep = KeepSet::from_indices(survivors);

        // Defensive re-intersection; a correct suppressor only ever returns
        // members of `keep`, so this cannot remove anything.
        let keep = keep.intersect(&nms_keep);
        if keep.is_empty() {
            return Ok(None);
        }
        trace_event!("post_nms_keep", count = keep.len());

        let top = top_k_by_score(keep.as_slice(), &class_scores, self.cfg.max_per_image);
        let detections = top
            .into_iter()
            .map(|idx| Detection {
                bbox: refined[idx],
                class_id: class_ids[idx],
                score: class_scores[idx],
            })
            .collect();
        Ok(Some(detections))
    }

    fn suppress_classes(
        &self,
        partition: &[(usize, Vec<usize>)],
        refined: &[BBox],
        class_scores: &[f32],
    ) -> Vec<usize> {
        #[cfg(feature = "rayon")]
        if self.cfg.parallel {
            let per_class: Vec<Vec<usize>> = partition
                .par_iter()
                .map(|(_, members)| self.suppress_one_class(members, refined, class_scores))
                .collect();
            return per_class.into_iter().flatten().collect();
        }

        let mut survivors = Vec::new();
        for (_, members) in partition {
            survivors.extend(self.suppress_one_class(members, refined, class_scores));
        }
        survivors
    }

    /// NMS for one class; returns survivors remapped to original indices.
    fn suppress_one_class(
        &self,
        members: &[usize],
        refined: &[BBox],
        class_scores: &[f32],
    ) -> Vec<usize> {
        let boxes: Vec<BBox> = members.iter().map(|&i| refined[i]).collect();
        let scores: Vec<f32> = members.iter().map(|&i| class_scores[i]).collect();
        let local = nms_boxes(
            &boxes,
            &scores,
            self.cfg.max_per_class,
            self.cfg.nms_iou,
            None,
        );
        local.into_iter().map(|l| members[l]).collect()
    }
}

/// Groups keep-set members by class id, ascending, so the per-class loop
/// iterates in a fixed order regardless of input arrangement.
fn partition_by_class(keep: &[usize], class_ids: &[usize]) -> Vec<(usize, Vec<usize>)> {
    let mut partition: Vec<(usize, Vec<usize>)> = Vec::new();
    for &idx in keep {
        let class_id = class_ids[idx];
        match partition.binary_search_by_key(&class_id, |entry| entry.0) {
            Ok(pos) => partition[pos].1.push(idx),
            Err(pos) => partition.insert(pos, (class_id, vec![idx])),
        }
    }
    partition
}

#[cfg(test)]
mod tests {
    use super::partition_by_class;

    #[test]
    fn partition_groups_by_sorted_class_id() {
        let class_ids = [2, 1, 2, 3, 1];
        let partition = partition_by_class(&[0, 1, 2, 3, 4], &class_ids);
        assert_eq!(
            partition,
            vec![(1, vec![1, 4]), (2, vec![0, 2]), (3, vec![3])]
        );
    }

    #[test]
    fn partition_only_covers_keep_members() {
        let class_ids = [1, 1, 2];
        let partition = partition_by_class(&[0, 2], &class_ids);
        assert_eq!(partition, vec![(1, vec![0]), (2, vec![2])]);
    }
}
