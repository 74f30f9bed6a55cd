//! Error types for boxrefine.

use thiserror::Error;

/// Result alias for boxrefine operations.
pub type BoxRefineResult<T> = std::result::Result<T, BoxRefineError>;

/// Errors that can occur when configuring or running the refinement pipelines.
///
/// An empty result is not an error: pipelines signal "no detections" by
/// returning `Ok(None)`. Every variant here is either a caller contract
/// violation detected per call or a configuration problem detected once at
/// pipeline construction.
#[derive(Debug, Error, PartialEq)]
pub enum BoxRefineError {
    /// Two parallel input sequences disagree in length.
    #[error("length mismatch for {context}: expected {expected}, got {got}")]
    LengthMismatch {
        expected: usize,
        got: usize,
        context: &'static str,
    },
    /// Image bounds with a non-positive or non-finite dimension.
    #[error("invalid image shape: {height}x{width}")]
    InvalidImageShape { height: f32, width: f32 },
    /// A threshold outside its valid range.
    #[error("invalid {context}: {value}")]
    InvalidThreshold { value: f32, context: &'static str },
    /// Fewer than two classes (background plus at least one foreground class).
    #[error("invalid class count: {num_classes}")]
    InvalidClassCount { num_classes: usize },
    /// Non-positive feature extractor stride.
    #[error("invalid extractor stride: {stride}")]
    InvalidStride { stride: f32 },
    /// Non-positive delta normalization standard deviation.
    #[error("invalid target std: {value}")]
    InvalidStd { value: f32 },
}
