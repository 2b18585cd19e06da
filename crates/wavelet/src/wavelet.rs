//! A single Gabor wavelet sampled in the frequency domain.

use std::f64::consts::PI;

use gabor_record::RecordStore;
use ndarray::{Array2, ArrayView1, ArrayView2, Zip};
use num_complex::Complex64;

use crate::error::WaveletError;

/// Gabor wavelet of frequency `k = (ky, kx)` at a fixed image resolution.
///
/// The kernel is stored densely in FFT order, i.e. the DC component sits at
/// index `(0, 0)` and negative frequencies wrap around to the end of each
/// axis. Kernel values with `|value| <= epsilon` are stored as exactly 0.
///
/// For a frequency-domain coordinate `ω` the kernel is
///
/// ```text
/// ψ(ω) = |k|^pow · ( exp(-σ²|ω - k|² / 2|k|²) - dc · exp(-σ²(|ω|² + |k|²) / 2|k|²) )
/// ```
///
/// where `dc` is 1 when the wavelet is DC free and 0 otherwise.
#[derive(Clone, Debug)]
pub struct Wavelet {
    resolution: [usize; 2],
    frequency: [f64; 2],
    sigma: f64,
    power_of_k: f64,
    dc_free: bool,
    epsilon: f64,
    kernel: Array2<f64>,
}

impl Wavelet {
    /// Builds the kernel for an image of `resolution = [height, width]`.
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | zero height or width | [`WaveletError::InvalidArgument`] |
    /// | `sigma <= 0` or not finite | [`WaveletError::InvalidArgument`] |
    /// | `frequency` is the zero vector or not finite | [`WaveletError::InvalidArgument`] |
    /// | `power_of_k` not finite, `epsilon` negative or not finite | [`WaveletError::InvalidArgument`] |
    pub fn new(
        resolution: [usize; 2],
        frequency: [f64; 2],
        sigma: f64,
        power_of_k: f64,
        dc_free: bool,
        epsilon: f64,
    ) -> Result<Self, WaveletError> {
        let [height, width] = resolution;
        if height == 0 || width == 0 {
            return Err(WaveletError::InvalidArgument(format!(
                "resolution must be positive, got {height}x{width}"
            )));
        }
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(WaveletError::InvalidArgument(format!(
                "sigma must be > 0, got {sigma}"
            )));
        }
        let [ky, kx] = frequency;
        if !ky.is_finite() || !kx.is_finite() || (ky == 0.0 && kx == 0.0) {
            return Err(WaveletError::InvalidArgument(format!(
                "frequency must be a finite non-zero vector, got ({ky}, {kx})"
            )));
        }
        if !power_of_k.is_finite() {
            return Err(WaveletError::InvalidArgument(format!(
                "power_of_k must be finite, got {power_of_k}"
            )));
        }
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(WaveletError::InvalidArgument(format!(
                "epsilon must be finite and >= 0, got {epsilon}"
            )));
        }

        let kernel = build_kernel(resolution, frequency, sigma, power_of_k, dc_free, epsilon);
        Ok(Self {
            resolution,
            frequency,
            sigma,
            power_of_k,
            dc_free,
            epsilon,
            kernel,
        })
    }

    /// Multiplies a frequency-domain image with the kernel.
    ///
    /// # Errors
    ///
    /// [`WaveletError::DimensionMismatch`] if the image shape differs from
    /// the wavelet resolution.
    pub fn transform(
        &self,
        frequency_image: ArrayView2<'_, Complex64>,
    ) -> Result<Array2<Complex64>, WaveletError> {
        let mut output = Array2::zeros((self.resolution[0], self.resolution[1]));
        self.transform_into(frequency_image, &mut output)?;
        Ok(output)
    }

    /// Like [`transform`](Self::transform), writing into `output`.
    ///
    /// # Errors
    ///
    /// [`WaveletError::DimensionMismatch`] if either array shape differs from
    /// the wavelet resolution.
    pub fn transform_into(
        &self,
        frequency_image: ArrayView2<'_, Complex64>,
        output: &mut Array2<Complex64>,
    ) -> Result<(), WaveletError> {
        self.check_shape(frequency_image.shape())?;
        self.check_shape(output.shape())?;
        Zip::from(output)
            .and(&frequency_image)
            .and(&self.kernel)
            .for_each(|out, &value, &weight| *out = value * weight);
        Ok(())
    }

    /// The dense frequency-domain kernel in FFT order.
    pub fn wavelet(&self) -> &Array2<f64> {
        &self.kernel
    }

    pub fn resolution(&self) -> [usize; 2] {
        self.resolution
    }

    /// Frequency vector as `(ky, kx)`.
    pub fn frequency(&self) -> [f64; 2] {
        self.frequency
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn power_of_k(&self) -> f64 {
        self.power_of_k
    }

    pub fn dc_free(&self) -> bool {
        self.dc_free
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Writes the wavelet parameters into the current group of `store`.
    pub fn save<S: RecordStore + ?Sized>(&self, store: &mut S) -> Result<(), WaveletError> {
        let [height, width] = self.resolution;
        store.set_int_array1("Resolution", &[height as i64, width as i64])?;
        store.set_array1("Frequency", ArrayView1::from(&self.frequency))?;
        store.set_f64("Sigma", self.sigma)?;
        store.set_f64("PowOfK", self.power_of_k)?;
        store.set_bool("DCfree", self.dc_free)?;
        store.set_f64("Epsilon", self.epsilon)?;
        Ok(())
    }

    /// Reads wavelet parameters from the current group and rebuilds the kernel.
    ///
    /// # Errors
    ///
    /// Propagates record errors and the validation errors of [`Wavelet::new`].
    pub fn load<S: RecordStore + ?Sized>(store: &S) -> Result<Self, WaveletError> {
        let resolution = match store.read_int_array1("Resolution")?.as_slice() {
            &[height, width] => [to_extent(height)?, to_extent(width)?],
            other => {
                return Err(WaveletError::InvalidArgument(format!(
                    "Resolution must hold 2 values, got {}",
                    other.len()
                )));
            }
        };
        let frequency = match store.read_array1("Frequency")?.as_slice() {
            Some(&[ky, kx]) => [ky, kx],
            _ => {
                return Err(WaveletError::InvalidArgument(
                    "Frequency must hold 2 values".to_string(),
                ));
            }
        };
        Self::new(
            resolution,
            frequency,
            store.read_f64("Sigma")?,
            store.read_f64("PowOfK")?,
            store.read_bool("DCfree")?,
            store.read_f64("Epsilon")?,
        )
    }

    fn check_shape(&self, shape: &[usize]) -> Result<(), WaveletError> {
        if shape != self.resolution {
            return Err(WaveletError::shape_mismatch(&self.resolution, shape));
        }
        Ok(())
    }
}

impl PartialEq for Wavelet {
    fn eq(&self, other: &Self) -> bool {
        self.resolution == other.resolution
            && self.frequency == other.frequency
            && self.sigma == other.sigma
            && self.power_of_k == other.power_of_k
            && self.dc_free == other.dc_free
            && self.epsilon == other.epsilon
    }
}

fn to_extent(value: i64) -> Result<usize, WaveletError> {
    usize::try_from(value)
        .map_err(|_| WaveletError::InvalidArgument(format!("invalid resolution {value}")))
}

/// Centred frequency coordinates of one axis paired with their FFT index.
///
/// Coordinates run over `-n/2 .. n/2 + n%2` and map to `ω = i·2π/n`.
fn axis_frequencies(n: usize) -> impl Iterator<Item = (usize, f64)> {
    let n = n as i64;
    (-(n / 2)..n / 2 + n % 2).map(move |i| {
        let index = (i + n).rem_euclid(n) as usize;
        (index, i as f64 * 2.0 * PI / n as f64)
    })
}

fn build_kernel(
    [height, width]: [usize; 2],
    [ky, kx]: [f64; 2],
    sigma: f64,
    power_of_k: f64,
    dc_free: bool,
    epsilon: f64,
) -> Array2<f64> {
    let k_sq = ky * ky + kx * kx;
    let scale = sigma * sigma / (2.0 * k_sq);
    let prefactor = k_sq.powf(power_of_k / 2.0);

    let mut kernel = Array2::zeros((height, width));
    for (iy, wy) in axis_frequencies(height) {
        for (ix, wx) in axis_frequencies(width) {
            let dist_sq = (wy - ky).powi(2) + (wx - kx).powi(2);
            let mut value = (-scale * dist_sq).exp();
            if dc_free {
                value -= (-scale * (wy * wy + wx * wx + k_sq)).exp();
            }
            value *= prefactor;
            if value.abs() > epsilon {
                kernel[[iy, ix]] = value;
            }
        }
    }
    kernel
}
