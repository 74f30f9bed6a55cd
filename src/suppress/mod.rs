//! Candidate suppression and selection.
//!
//! Includes greedy per-class non-maximum suppression and deterministic
//! Top-K selection by score.

pub(crate) mod nms;
pub(crate) mod topk;
