//! Box geometry primitives shared by every pipeline stage.
//!
//! Boxes are axis-aligned `(y_min, x_min, y_max, x_max)` corner tuples with
//! corner-exclusive sizes (`height = y2 - y1`, no "+1" fencepost). The same
//! convention applies whether coordinates are in pixels or normalized to the
//! image size; callers track which unit is in effect at a given stage.

/// Axis-aligned box in `(y_min, x_min, y_max, x_max)` order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    /// Top edge.
    pub y1: f32,
    /// Left edge.
    pub x1: f32,
    /// Bottom edge.
    pub y2: f32,
    /// Right edge.
    pub x2: f32,
}

impl BBox {
    /// Creates a box from corner coordinates.
    pub fn new(y1: f32, x1: f32, y2: f32, x2: f32) -> Self {
        Self { y1, x1, y2, x2 }
    }

    /// Height of the box; negative for inverted corners.
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Width of the box; negative for inverted corners.
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    /// Area, clamped at zero for degenerate boxes.
    pub fn area(&self) -> f32 {
        self.height().max(0.0) * self.width().max(0.0)
    }

    /// Clamps every coordinate into `[0, y_max]` / `[0, x_max]`.
    pub fn clamp_to(&self, y_max: f32, x_max: f32) -> BBox {
        BBox {
            y1: self.y1.clamp(0.0, y_max),
            x1: self.x1.clamp(0.0, x_max),
            y2: self.y2.clamp(0.0, y_max),
            x2: self.x2.clamp(0.0, x_max),
        }
    }

    /// Intersection over union with another box, in `[0, 1]`.
    ///
    /// A zero-area box has IoU 0 with everything, including itself.
    pub fn iou(&self, other: &BBox) -> f32 {
        let inter_y1 = self.y1.max(other.y1);
        let inter_x1 = self.x1.max(other.x1);
        let inter_y2 = self.y2.min(other.y2);
        let inter_x2 = self.x2.min(other.x2);

        let inter_h = (inter_y2 - inter_y1).max(0.0);
        let inter_w = (inter_x2 - inter_x1).max(0.0);
        let inter = inter_h * inter_w;
        if inter <= 0.0 {
            return 0.0;
        }

        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}

/// Box regression output `(dy, dx, dh, dw)` relative to a reference box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Delta {
    /// Center shift along y, in units of the reference height.
    pub dy: f32,
    /// Center shift along x, in units of the reference width.
    pub dx: f32,
    /// Log-ratio of target to reference height.
    pub dh: f32,
    /// Log-ratio of target to reference width.
    pub dw: f32,
}

impl Delta {
    /// Creates a delta from its four components.
    pub fn new(dy: f32, dx: f32, dh: f32, dw: f32) -> Self {
        Self { dy, dx, dh, dw }
    }
}

/// One final detection: a refined box, its class id, and its score.
///
/// `class_id` is always a foreground class in `[1, C-1]`; the background
/// class 0 is never emitted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    /// Refined, clipped box.
    pub bbox: BBox,
    /// Foreground class index.
    pub class_id: usize,
    /// Classification score of the emitted class.
    pub score: f32,
}
