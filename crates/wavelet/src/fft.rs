//! Planned 2D complex FFT built from row and column passes of `rustfft`.

use std::fmt;
use std::sync::Arc;

use ndarray::{Array2, Axis};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::error::WaveletError;

/// Forward and inverse 2D FFT for a fixed `height × width`.
///
/// Plans are created once and shared by all calls. The inverse transform is
/// normalised by `1 / (height · width)`, so `inverse(forward(x)) == x` up to
/// rounding (rustfft itself is unnormalised).
///
/// # Example
///
/// ```
/// use gabor_wavelet::Fft2d;
/// use ndarray::Array2;
/// use num_complex::Complex64;
///
/// let fft = Fft2d::new(4, 6);
/// let mut data = Array2::from_elem((4, 6), Complex64::new(1.0, 0.0));
/// fft.forward(&mut data).unwrap();
/// assert!((data[[0, 0]].re - 24.0).abs() < 1e-12);
/// fft.inverse(&mut data).unwrap();
/// assert!((data[[2, 3]].re - 1.0).abs() < 1e-12);
/// ```
#[derive(Clone)]
pub struct Fft2d {
    height: usize,
    width: usize,
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}

impl Fft2d {
    /// Plans forward and inverse transforms for `height × width` arrays.
    pub fn new(height: usize, width: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            height,
            width,
            row_forward: planner.plan_fft_forward(width),
            row_inverse: planner.plan_fft_inverse(width),
            col_forward: planner.plan_fft_forward(height),
            col_inverse: planner.plan_fft_inverse(height),
        }
    }

    /// Returns the planned `[height, width]`.
    pub fn shape(&self) -> [usize; 2] {
        [self.height, self.width]
    }

    /// In-place forward transform.
    ///
    /// # Errors
    ///
    /// [`WaveletError::DimensionMismatch`] if `data` is not `height × width`.
    pub fn forward(&self, data: &mut Array2<Complex64>) -> Result<(), WaveletError> {
        self.check_shape(data)?;
        let mut buffer = Vec::with_capacity(self.height.max(self.width));
        process_lanes(data, Axis(1), self.row_forward.as_ref(), &mut buffer);
        process_lanes(data, Axis(0), self.col_forward.as_ref(), &mut buffer);
        Ok(())
    }

    /// In-place normalised inverse transform.
    ///
    /// # Errors
    ///
    /// [`WaveletError::DimensionMismatch`] if `data` is not `height × width`.
    pub fn inverse(&self, data: &mut Array2<Complex64>) -> Result<(), WaveletError> {
        self.check_shape(data)?;
        let mut buffer = Vec::with_capacity(self.height.max(self.width));
        process_lanes(data, Axis(1), self.row_inverse.as_ref(), &mut buffer);
        process_lanes(data, Axis(0), self.col_inverse.as_ref(), &mut buffer);
        let norm = 1.0 / (self.height * self.width) as f64;
        data.mapv_inplace(|c| c * norm);
        Ok(())
    }

    fn check_shape(&self, data: &Array2<Complex64>) -> Result<(), WaveletError> {
        if data.dim() != (self.height, self.width) {
            return Err(WaveletError::shape_mismatch(
                &[self.height, self.width],
                data.shape(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Fft2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fft2d")
            .field("height", &self.height)
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

/// Runs `fft` over every 1D lane of `data` along `axis`.
///
/// Lanes are copied through `buffer` so that non-contiguous columns can be
/// processed as well.
fn process_lanes(
    data: &mut Array2<Complex64>,
    axis: Axis,
    fft: &dyn Fft<f64>,
    buffer: &mut Vec<Complex64>,
) {
    for mut lane in data.lanes_mut(axis) {
        buffer.clear();
        buffer.extend(lane.iter().copied());
        fft.process(buffer.as_mut_slice());
        lane.iter_mut()
            .zip(buffer.iter())
            .for_each(|(dst, &src)| *dst = src);
    }
}
