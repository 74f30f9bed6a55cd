//! Delta codec: converting between boxes and normalized regression deltas.
//!
//! `decode` is the inference-time transform turning a regression output into
//! an absolute box; `encode` is the training-time inverse producing the
//! regression target for a ground-truth box. Both normalize the raw delta
//! with per-component mean and standard deviation supplied by the caller
//! (model hyperparameters, fixed at inference time). Sizes go through
//! `exp`/`ln` so a decoded box always has positive extent.

use crate::geom::{BBox, Delta};

/// Decodes a box from a reference box and a normalized delta.
///
/// Total: never fails and never produces a non-positive size, but the
/// result may lie outside the image bounds. Clipping is a separate step.
pub fn decode(roi: BBox, delta: Delta, means: [f32; 4], stds: [f32; 4]) -> BBox {
    let dy = delta.dy * stds[0] + means[0];
    let dx = delta.dx * stds[1] + means[1];
    let dh = delta.dh * stds[2] + means[2];
    let dw = delta.dw * stds[3] + means[3];

    let h = roi.height();
    let w = roi.width();
    let cy = roi.y1 + 0.5 * h;
    let cx = roi.x1 + 0.5 * w;

    let cy = cy + dy * h;
    let cx = cx + dx * w;
    let h = h * dh.exp();
    let w = w * dw.exp();

    BBox::new(cy - 0.5 * h, cx - 0.5 * w, cy + 0.5 * h, cx + 0.5 * w)
}

/// Decodes one delta per reference box.
///
/// Element-wise identical to calling [`decode`] on each pair. The slices
/// must have equal length; pipelines validate this before calling.
pub fn decode_all(rois: &[BBox], deltas: &[Delta], means: [f32; 4], stds: [f32; 4]) -> Vec<BBox> {
    debug_assert_eq!(rois.len(), deltas.len());
    rois.iter()
        .zip(deltas.iter())
        .map(|(&roi, &delta)| decode(roi, delta, means, stds))
        .collect()
}

/// Encodes the normalized delta that maps `roi` onto `target`.
///
/// Exact algebraic inverse of [`decode`] when the reference box has positive
/// height and width and every std is positive.
pub fn encode(roi: BBox, target: BBox, means: [f32; 4], stds: [f32; 4]) -> Delta {
    let h = roi.height();
    let w = roi.width();
    let cy = roi.y1 + 0.5 * h;
    let cx = roi.x1 + 0.5 * w;

    let target_h = target.height();
    let target_w = target.width();
    let target_cy = target.y1 + 0.5 * target_h;
    let target_cx = target.x1 + 0.5 * target_w;

    let dy = (target_cy - cy) / h;
    let dx = (target_cx - cx) / w;
    let dh = (target_h / h).ln();
    let dw = (target_w / w).ln();

    Delta::new(
        (dy - means[0]) / stds[0],
        (dx - means[1]) / stds[1],
        (dh - means[2]) / stds[2],
        (dw - means[3]) / stds[3],
    )
}
