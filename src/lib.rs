//! Boxrefine post-processes the outputs of region-proposal object detectors.
//!
//! Given per-region class scores, box regression deltas, and reference
//! boxes, this crate decodes and clips candidate boxes, suppresses
//! overlapping candidates per class, and selects the top-scoring final
//! detections. Two pipelines cover the two stages of a Faster R-CNN style
//! detector: [`ProposalRefiner`] keeps one best class per region, while
//! [`DetectionRefiner`] treats every foreground class column independently.
//! Optional parallelism over classes is available via the `rayon` feature.

pub mod clip;
pub mod codec;
pub mod geom;
pub mod pipeline;
mod suppress;
pub(crate) mod trace;
pub mod util;

pub use geom::{BBox, Delta, Detection};
pub use pipeline::{DetectionRefiner, KeepSet, ProposalRefiner, RefineConfig};
pub use util::{BoxRefineError, BoxRefineResult};

pub use clip::clip_filter;
pub use codec::{decode, decode_all, encode};
pub use suppress::nms::nms_boxes;
