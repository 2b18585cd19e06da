//! Gabor wavelet family over scales and directions.

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI};

use gabor_record::RecordStore;
use ndarray::{Array2, Array3};
use num_complex::Complex64;
use tracing::debug;

use crate::error::WaveletError;
use crate::fft::Fft2d;
use crate::samples::Samples;
use crate::wavelet::Wavelet;

/// Parameters of a Gabor wavelet family.
///
/// # Example
///
/// ```
/// use gabor_wavelet::TransformConfig;
///
/// let config = TransformConfig::new()
///     .with_number_of_scales(3)
///     .with_number_of_directions(4)
///     .with_dc_free(false);
/// assert_eq!(config.number_of_scales(), 3);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TransformConfig {
    number_of_scales: usize,
    number_of_directions: usize,
    sigma: f64,
    k_max: f64,
    k_fac: f64,
    power_of_k: f64,
    dc_free: bool,
    epsilon: f64,
}

impl TransformConfig {
    /// Creates a config with the default family.
    ///
    /// Defaults: 5 scales, 8 directions, `sigma = 2π`, `k_max = π/2`,
    /// `k_fac = 1/√2`, `power_of_k = 0`, `dc_free = true`, `epsilon = 1e-10`.
    pub fn new() -> Self {
        Self {
            number_of_scales: 5,
            number_of_directions: 8,
            sigma: 2.0 * PI,
            k_max: FRAC_PI_2,
            k_fac: FRAC_1_SQRT_2,
            power_of_k: 0.0,
            dc_free: true,
            epsilon: 1e-10,
        }
    }

    pub fn with_number_of_scales(mut self, number_of_scales: usize) -> Self {
        self.number_of_scales = number_of_scales;
        self
    }

    pub fn with_number_of_directions(mut self, number_of_directions: usize) -> Self {
        self.number_of_directions = number_of_directions;
        self
    }

    /// Sets the width of the Gaussian envelope relative to the wavelength.
    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// Sets the frequency of the finest scale.
    pub fn with_k_max(mut self, k_max: f64) -> Self {
        self.k_max = k_max;
        self
    }

    /// Sets the factor between consecutive scales.
    pub fn with_k_fac(mut self, k_fac: f64) -> Self {
        self.k_fac = k_fac;
        self
    }

    pub fn with_power_of_k(mut self, power_of_k: f64) -> Self {
        self.power_of_k = power_of_k;
        self
    }

    pub fn with_dc_free(mut self, dc_free: bool) -> Self {
        self.dc_free = dc_free;
        self
    }

    /// Sets the sparsification threshold for kernel values.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn number_of_scales(&self) -> usize {
        self.number_of_scales
    }

    pub fn number_of_directions(&self) -> usize {
        self.number_of_directions
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn k_max(&self) -> f64 {
        self.k_max
    }

    pub fn k_fac(&self) -> f64 {
        self.k_fac
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

    /// Checks that the parameters describe a non-empty family.
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | zero scales or directions | [`WaveletError::InvalidArgument`] |
    /// | `sigma`, `k_max` or `k_fac` not positive and finite | [`WaveletError::InvalidArgument`] |
    /// | `power_of_k` not finite, `epsilon` negative or not finite | [`WaveletError::InvalidArgument`] |
    pub fn validate(&self) -> Result<(), WaveletError> {
        if self.number_of_scales == 0 || self.number_of_directions == 0 {
            return Err(WaveletError::InvalidArgument(format!(
                "need at least one scale and one direction, got {} and {}",
                self.number_of_scales, self.number_of_directions
            )));
        }
        for (name, value) in [
            ("sigma", self.sigma),
            ("k_max", self.k_max),
            ("k_fac", self.k_fac),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(WaveletError::InvalidArgument(format!(
                    "{name} must be > 0, got {value}"
                )));
            }
        }
        if !self.power_of_k.is_finite() {
            return Err(WaveletError::InvalidArgument(format!(
                "power_of_k must be finite, got {}",
                self.power_of_k
            )));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(WaveletError::InvalidArgument(format!(
                "epsilon must be finite and >= 0, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Wavelets generated for one image resolution, with the matching FFT plan.
#[derive(Clone, Debug)]
struct WaveletBank {
    resolution: [usize; 2],
    wavelets: Vec<Wavelet>,
    fft: Fft2d,
}

/// Gabor wavelet transform.
///
/// Frequencies are laid out scale-major: entry `scale · directions + dir`
/// is `k_max · k_fac^scale · (sin θ, cos θ)` stored as `(ky, kx)` with
/// `θ = π · dir / directions`.
///
/// Wavelets are generated lazily for the resolution of the image passed to
/// [`apply`](Self::apply) and kept until an image of a different resolution
/// comes along.
///
/// # Example
///
/// ```
/// use gabor_wavelet::{Transform, TransformConfig};
/// use ndarray::Array2;
///
/// let mut transform = Transform::new(TransformConfig::new().with_number_of_scales(2)).unwrap();
/// let image = Array2::<f64>::zeros((16, 12));
/// let trafo_image = transform.apply(&image).unwrap();
/// assert_eq!(trafo_image.dim(), (16, 16, 12));
/// ```
#[derive(Clone, Debug)]
pub struct Transform {
    config: TransformConfig,
    wavelet_frequencies: Vec<[f64; 2]>,
    bank: Option<WaveletBank>,
}

impl Transform {
    /// Creates the transform and its frequency layout. No wavelets are
    /// generated yet.
    ///
    /// # Errors
    ///
    /// See [`TransformConfig::validate`].
    pub fn new(config: TransformConfig) -> Result<Self, WaveletError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: TransformConfig) -> Self {
        let directions = config.number_of_directions;
        let mut wavelet_frequencies = Vec::with_capacity(config.number_of_scales * directions);
        let mut k_abs = config.k_max;
        for _ in 0..config.number_of_scales {
            for dir in 0..directions {
                let angle = PI * dir as f64 / directions as f64;
                wavelet_frequencies.push([k_abs * angle.sin(), k_abs * angle.cos()]);
            }
            k_abs *= config.k_fac;
        }
        Self {
            config,
            wavelet_frequencies,
            bank: None,
        }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    pub fn number_of_wavelets(&self) -> usize {
        self.wavelet_frequencies.len()
    }

    pub fn number_of_scales(&self) -> usize {
        self.config.number_of_scales
    }

    pub fn number_of_directions(&self) -> usize {
        self.config.number_of_directions
    }

    pub fn sigma(&self) -> f64 {
        self.config.sigma
    }

    pub fn k_max(&self) -> f64 {
        self.config.k_max
    }

    pub fn k_fac(&self) -> f64 {
        self.config.k_fac
    }

    pub fn power_of_k(&self) -> f64 {
        self.config.power_of_k
    }

    pub fn dc_free(&self) -> bool {
        self.config.dc_free
    }

    pub fn epsilon(&self) -> f64 {
        self.config.epsilon
    }

    /// Frequency vectors `(ky, kx)` of all wavelets, scale-major.
    pub fn wavelet_frequencies(&self) -> &[[f64; 2]] {
        &self.wavelet_frequencies
    }

    /// Generated wavelets; empty until the first generation.
    pub fn wavelets(&self) -> &[Wavelet] {
        self.bank
            .as_ref()
            .map(|bank| bank.wavelets.as_slice())
            .unwrap_or(&[])
    }

    /// Resolution `[height, width]` of the generated wavelets, if any.
    pub fn resolution(&self) -> Option<[usize; 2]> {
        self.bank.as_ref().map(|bank| bank.resolution)
    }

    /// Generates the wavelets for `height × width` images.
    ///
    /// Calling this again with the same resolution does nothing; a different
    /// resolution replaces the previous wavelets.
    ///
    /// # Errors
    ///
    /// [`WaveletError::InvalidArgument`] for a zero height or width.
    pub fn generate_wavelets(&mut self, height: usize, width: usize) -> Result<(), WaveletError> {
        self.bank_for([height, width]).map(|_| ())
    }

    /// Transforms `image` into a `(number_of_wavelets, height, width)` stack
    /// of complex responses.
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | image is not 2D | [`WaveletError::DimensionMismatch`] |
    /// | image is empty | [`WaveletError::InvalidArgument`] |
    pub fn apply<'a>(
        &mut self,
        image: impl Into<Samples<'a>>,
    ) -> Result<Array3<Complex64>, WaveletError> {
        let image = image.into().to_complex_image()?;
        let (height, width) = image.dim();
        let mut output = Array3::zeros((self.number_of_wavelets(), height, width));
        self.transform_image(image, &mut output)?;
        Ok(output)
    }

    /// Like [`apply`](Self::apply), writing into a preallocated `output`.
    ///
    /// # Errors
    ///
    /// As [`apply`](Self::apply), plus [`WaveletError::DimensionMismatch`]
    /// when `output` is not `(number_of_wavelets, height, width)`.
    #[tracing::instrument(skip_all, fields(wavelets = self.number_of_wavelets()))]
    pub fn apply_into<'a>(
        &mut self,
        image: impl Into<Samples<'a>>,
        output: &mut Array3<Complex64>,
    ) -> Result<(), WaveletError> {
        let image = image.into().to_complex_image()?;
        let (height, width) = image.dim();
        let expected = [self.number_of_wavelets(), height, width];
        if output.shape() != expected {
            return Err(WaveletError::shape_mismatch(&expected, output.shape()));
        }
        self.transform_image(image, output)
    }

    /// Writes the transform parameters into the current group of `store`.
    pub fn save<S: RecordStore + ?Sized>(&self, store: &mut S) -> Result<(), WaveletError> {
        let config = &self.config;
        store.set_f64("Sigma", config.sigma)?;
        store.set_f64("PowOfK", config.power_of_k)?;
        store.set_f64("KMax", config.k_max)?;
        store.set_f64("KFac", config.k_fac)?;
        store.set_bool("DCfree", config.dc_free)?;
        store.set_i64("NumberOfScales", config.number_of_scales as i64)?;
        store.set_i64("NumberOfDirections", config.number_of_directions as i64)?;
        store.set_f64("Epsilon", config.epsilon)?;
        Ok(())
    }

    /// Reads transform parameters from the current group of `store`.
    ///
    /// # Errors
    ///
    /// Propagates record errors and the validation errors of
    /// [`Transform::new`].
    pub fn load<S: RecordStore + ?Sized>(store: &S) -> Result<Self, WaveletError> {
        let config = TransformConfig::new()
            .with_sigma(store.read_f64("Sigma")?)
            .with_power_of_k(store.read_f64("PowOfK")?)
            .with_k_max(store.read_f64("KMax")?)
            .with_k_fac(store.read_f64("KFac")?)
            .with_dc_free(store.read_bool("DCfree")?)
            .with_number_of_scales(read_count(store, "NumberOfScales")?)
            .with_number_of_directions(read_count(store, "NumberOfDirections")?)
            .with_epsilon(store.read_f64("Epsilon")?);
        Self::new(config)
    }

    fn transform_image(
        &mut self,
        mut image: Array2<Complex64>,
        output: &mut Array3<Complex64>,
    ) -> Result<(), WaveletError> {
        let (height, width) = image.dim();
        let bank = self.bank_for([height, width])?;
        bank.fft.forward(&mut image)?;

        let mut plane = Array2::zeros((height, width));
        for (wavelet, mut layer) in bank.wavelets.iter().zip(output.outer_iter_mut()) {
            wavelet.transform_into(image.view(), &mut plane)?;
            bank.fft.inverse(&mut plane)?;
            layer.assign(&plane);
        }
        Ok(())
    }

    /// Returns the bank for `resolution`, regenerating it when needed.
    /// The previous bank is kept if building a new one fails.
    fn bank_for(&mut self, resolution: [usize; 2]) -> Result<&WaveletBank, WaveletError> {
        let bank = match self.bank.take() {
            Some(bank) if bank.resolution == resolution => bank,
            previous => match self.build_bank(resolution) {
                Ok(bank) => bank,
                Err(e) => {
                    self.bank = previous;
                    return Err(e);
                }
            },
        };
        Ok(self.bank.insert(bank))
    }

    fn build_bank(&self, resolution: [usize; 2]) -> Result<WaveletBank, WaveletError> {
        let [height, width] = resolution;
        debug!(
            height,
            width,
            wavelets = self.number_of_wavelets(),
            "generating wavelet bank"
        );
        let config = &self.config;
        let wavelets = self
            .wavelet_frequencies
            .iter()
            .map(|&k| {
                Wavelet::new(
                    resolution,
                    k,
                    config.sigma,
                    config.power_of_k,
                    config.dc_free,
                    config.epsilon,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(WaveletBank {
            resolution,
            wavelets,
            fft: Fft2d::new(height, width),
        })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_valid_config(TransformConfig::default())
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        self.config == other.config
    }
}

fn read_count<S: RecordStore + ?Sized>(store: &S, name: &str) -> Result<usize, WaveletError> {
    let value = store.read_i64(name)?;
    usize::try_from(value)
        .map_err(|_| WaveletError::InvalidArgument(format!("{name} must be >= 0, got {value}")))
}
