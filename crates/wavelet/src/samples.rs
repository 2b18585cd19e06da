//! Real or complex image input of arbitrary rank.

use ndarray::{Array, Array2, ArrayView, ArrayViewD, Dimension, Ix2};
use num_complex::Complex64;

use crate::error::WaveletError;

/// Borrowed array handed to the transform or jet constructors.
///
/// The rank is checked at use time, so callers can pass whatever array they
/// hold and get a [`WaveletError::DimensionMismatch`] back instead of a
/// compile error.
#[derive(Clone, Debug)]
pub enum Samples<'a> {
    /// Real-valued samples, e.g. a grey-level image.
    Real(ArrayViewD<'a, f64>),
    /// Complex-valued samples.
    Complex(ArrayViewD<'a, Complex64>),
}

impl<'a> Samples<'a> {
    /// Number of axes of the underlying array.
    pub fn ndim(&self) -> usize {
        match self {
            Self::Real(view) => view.ndim(),
            Self::Complex(view) => view.ndim(),
        }
    }

    /// Shape of the underlying array.
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Real(view) => view.shape(),
            Self::Complex(view) => view.shape(),
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Self::Complex(_))
    }

    /// Returns the complex view, or `None` for real samples.
    pub fn as_complex(&self) -> Option<ArrayViewD<'a, Complex64>> {
        match self {
            Self::Complex(view) => Some(view.clone()),
            Self::Real(_) => None,
        }
    }

    /// Copies a 2D input into an owned complex image.
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | input is not 2D | [`WaveletError::DimensionMismatch`] |
    /// | height or width is zero | [`WaveletError::InvalidArgument`] |
    pub fn to_complex_image(&self) -> Result<Array2<Complex64>, WaveletError> {
        if self.ndim() != 2 {
            return Err(WaveletError::DimensionMismatch {
                expected: "2D image".to_string(),
                got: self.shape().to_vec(),
            });
        }
        if self.shape().contains(&0) {
            return Err(WaveletError::InvalidArgument(format!(
                "image must not be empty, got shape {:?}",
                self.shape()
            )));
        }
        let image = match self {
            Self::Real(view) => view.mapv(|v| Complex64::new(v, 0.0)),
            Self::Complex(view) => view.to_owned(),
        };
        image
            .into_dimensionality::<Ix2>()
            .map_err(|e| WaveletError::InvalidArgument(e.to_string()))
    }
}

impl<'a, D: Dimension> From<ArrayView<'a, f64, D>> for Samples<'a> {
    fn from(view: ArrayView<'a, f64, D>) -> Self {
        Self::Real(view.into_dyn())
    }
}

impl<'a, D: Dimension> From<ArrayView<'a, Complex64, D>> for Samples<'a> {
    fn from(view: ArrayView<'a, Complex64, D>) -> Self {
        Self::Complex(view.into_dyn())
    }
}

impl<'a, D: Dimension> From<&'a Array<f64, D>> for Samples<'a> {
    fn from(array: &'a Array<f64, D>) -> Self {
        Self::Real(array.view().into_dyn())
    }
}

impl<'a, D: Dimension> From<&'a Array<Complex64, D>> for Samples<'a> {
    fn from(array: &'a Array<Complex64, D>) -> Self {
        Self::Complex(array.view().into_dyn())
    }
}
