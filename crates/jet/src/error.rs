//! Error types for the gabor-jet crate.

use gabor_record::RecordError;
use gabor_wavelet::WaveletError;

/// Error type for all fallible operations in the gabor-jet crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JetError {
    /// Returned for arguments that cannot be used, e.g. an empty jet list
    /// or an unknown similarity name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Returned when an input array has the wrong number of axes.
    #[error("dimension mismatch: expected {expected}, got shape {got:?}")]
    DimensionMismatch {
        /// Description of the required shape.
        expected: String,
        /// Shape that was supplied.
        got: Vec<usize>,
    },

    /// Returned when an extraction position lies outside the image.
    #[error("position ({}, {}) out of range [0, {height}) x [0, {width})", position[0], position[1])]
    OutOfRange {
        /// Requested `(row, col)`.
        position: [i32; 2],
        /// Image height.
        height: usize,
        /// Image width.
        width: usize,
    },

    /// Returned when two lengths that must agree differ.
    #[error("length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        /// Required length.
        expected: usize,
        /// Supplied length.
        got: usize,
    },

    /// Returned when samples of the wrong element type are supplied.
    #[error("type mismatch: expected {expected} samples, got {found}")]
    TypeMismatch {
        /// Required element type.
        expected: &'static str,
        /// Supplied element type.
        found: &'static str,
    },

    /// Returned when a normalisation would divide by zero.
    #[error("division by zero: {0}")]
    DivideByZero(String),

    /// Returned when an operation needs state that has not been set,
    /// e.g. a disparity estimate without a transform.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Wraps an error from the wavelet transform.
    #[error("wavelet error: {0}")]
    Wavelet(#[from] WaveletError),

    /// Wraps a failure of the record store while saving or loading.
    #[error("record error: {0}")]
    Record(#[from] RecordError),
}
