//! Greedy non-maximum suppression over scored boxes.

use crate::geom::BBox;
use std::cmp::Ordering;

/// Descending score, ties broken by ascending candidate index.
fn candidate_cmp_desc(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Runs greedy NMS over one class's candidates.
///
/// Candidates below `score_threshold` are dropped first (when the threshold
/// is set). The rest are visited in descending score order; each kept box
/// suppresses every remaining box whose IoU with it reaches `iou_threshold`.
/// Stops once `max_output` boxes are kept.
///
/// Returns indices into the input slices, ordered by descending score with
/// ties broken by ascending index. The result is bit-reproducible for
/// identical inputs.
pub fn nms_boxes(
    boxes: &[BBox],
    scores: &[f32],
    max_output: usize,
    iou_threshold: f32,
    score_threshold: Option<f32>,
) -> Vec<usize> {
    debug_assert_eq!(boxes.len(), scores.len());
    if max_output == 0 {
        return Vec::new();
    }

    let mut order: Vec<(usize, f32)> = scores
        .iter()
        .copied()
        .enumerate()
        .filter(|&(_, score)| score_threshold.map_or(true, |t| score >= t))
        .collect();
    order.sort_by(candidate_cmp_desc);

    let mut kept: Vec<usize> = Vec::new();
    'outer: for &(idx, _) in order.iter() {
        for &kept_idx in kept.iter() {
            if boxes[kept_idx].iou(&boxes[idx]) >= iou_threshold {
                continue 'outer;
            }
        }
        kept.push(idx);
        if kept.len() == max_output {
            break;
        }
    }

    kept
}
