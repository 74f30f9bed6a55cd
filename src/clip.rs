//! Clipping boxes to image bounds and filtering degenerate survivors.

use crate::geom::BBox;

/// Clips every box into `[0, y_max] × [0, x_max]` and drops degenerate ones.
///
/// A box is dropped when its clipped height or width is not positive. When
/// `min_edge` is `Some(e)`, a box is additionally dropped when its shorter
/// clipped edge is below `e`; `None` disables the minimum-size filter
/// entirely. Returns the surviving boxes in input order together with their
/// indices into the input slice. Composing these indices with earlier
/// keep-sets is the caller's responsibility.
///
/// Idempotent: re-clipping the survivors with the same bounds keeps them all
/// and leaves every coordinate unchanged.
pub fn clip_filter(
    boxes: &[BBox],
    y_max: f32,
    x_max: f32,
    min_edge: Option<f32>,
) -> (Vec<BBox>, Vec<usize>) {
    let mut kept = Vec::with_capacity(boxes.len());
    let mut kept_indices = Vec::with_capacity(boxes.len());

    for (idx, bbox) in boxes.iter().enumerate() {
        let clipped = bbox.clamp_to(y_max, x_max);
        let h = clipped.height();
        let w = clipped.width();
        if h <= 0.0 || w <= 0.0 {
            continue;
        }
        if let Some(edge) = min_edge {
            if h.min(w) < edge {
                continue;
            }
        }
        kept.push(clipped);
        kept_indices.push(idx);
    }

    (kept, kept_indices)
}
