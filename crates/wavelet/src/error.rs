//! Error types for the gabor-wavelet crate.

use gabor_record::RecordError;

/// Error type for all fallible operations in the gabor-wavelet crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WaveletError {
    /// Returned for parameters that cannot describe a wavelet or transform,
    /// e.g. a zero resolution or a non-positive sigma.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Returned when an array does not have the required shape.
    #[error("dimension mismatch: expected {expected}, got shape {got:?}")]
    DimensionMismatch {
        /// Description of the required shape.
        expected: String,
        /// Shape that was supplied.
        got: Vec<usize>,
    },

    /// Wraps a failure of the record store while saving or loading.
    #[error("record error: {0}")]
    Record(#[from] RecordError),
}

impl WaveletError {
    /// Builds a [`WaveletError::DimensionMismatch`] for an exact expected shape.
    pub(crate) fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::DimensionMismatch {
            expected: format!("{expected:?}"),
            got: got.to_vec(),
        }
    }
}
