//! Error types for yolobox.

use thiserror::Error;

/// Result alias for yolobox operations.
pub type YoloBoxResult<T> = std::result::Result<T, YoloBoxError>;

/// Errors that can occur while decoding detector output.
///
/// Every variant is fatal to the decode call that produced it: the caller gets
/// no detections for that frame.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum YoloBoxError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A tensor dimension is zero or the dimension list is empty.
    #[error("invalid dimensions {dims:?} for layer `{layer}`")]
    InvalidDimensions { layer: String, dims: Vec<usize> },
    /// The layer buffer holds fewer elements than its dimensions require.
    #[error("buffer too small for layer `{layer}`: needed {needed}, got {got}")]
    BufferTooSmall {
        layer: String,
        needed: usize,
        got: usize,
    },
    /// The number of output layers does not match what the decoder expects.
    #[error("expected {expected} output layers, got {got}")]
    LayerCountMismatch { expected: usize, got: usize },
    /// A layer's shape does not encode what the decoder expects.
    #[error("shape mismatch in layer `{layer}`: {reason}")]
    ShapeMismatch { layer: String, reason: String },
    /// Strides derived from the network width and height disagree.
    #[error("stride mismatch in layer `{layer}`: width stride {stride_w}, height stride {stride_h}")]
    StrideMismatch {
        layer: String,
        stride_w: usize,
        stride_h: usize,
    },
    /// A layer holds a different element type than the decoder reads.
    #[error("layer `{layer}` holds {got} data, expected {expected}")]
    DataTypeMismatch {
        layer: String,
        expected: &'static str,
        got: &'static str,
    },
    /// No decoder preset is registered under this name.
    #[error("unknown decoder preset `{0}`")]
    UnknownPreset(String),
}
