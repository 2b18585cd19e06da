//! Gabor jets: the responses of all wavelets of a transform at one pixel.

use gabor_record::RecordStore;
use gabor_wavelet::Samples;
use ndarray::{Array1, Array2, ArrayView1, ArrayView3, ArrayViewD, Axis, Ix1, Ix3, Zip, s};
use num_complex::Complex64;

use crate::error::JetError;
use crate::phase;

/// Input for [`Jet::new`].
///
/// Coefficient arrays are passed as [`Samples`] so that rank and element
/// type are checked when the jet is built.
#[derive(Clone, Debug)]
pub enum JetSource<'a> {
    /// All-zero jet of the given length.
    ByLength(usize),
    /// Jet from a 1D complex coefficient vector.
    ByComplexVector {
        coefficients: Samples<'a>,
        normalize: bool,
    },
    /// Jet extracted from a `(wavelets, height, width)` complex stack at
    /// `position = (row, col)`. Both fields must be given.
    ByExtraction {
        trafo_image: Option<Samples<'a>>,
        position: Option<[i32; 2]>,
        normalize: bool,
    },
    /// Copy of another jet.
    ByCopy(&'a Jet),
    /// Average of a non-empty list of jets, see [`Jet::average`].
    ByAverage {
        jets: &'a [Jet],
        phase_aware: bool,
        normalize: bool,
    },
}

/// A Gabor jet stored as a `2 × length` array.
///
/// Row 0 holds the magnitudes (≥ 0), row 1 the phases in `(-π, π]`.
/// Equality via `==` is exact; use [`is_close`](Self::is_close) to compare
/// computed jets.
///
/// # Example
///
/// ```
/// use gabor_jet::Jet;
/// use ndarray::array;
/// use num_complex::Complex64;
///
/// let coefficients = array![Complex64::new(3.0, 0.0), Complex64::new(0.0, 4.0)];
/// let mut jet = Jet::from_complex(coefficients.view(), false).unwrap();
/// assert_eq!(jet.abs().to_vec(), vec![3.0, 4.0]);
/// let norm = jet.normalize().unwrap();
/// assert!((norm - 5.0).abs() < 1e-12);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Jet {
    data: Array2<f64>,
}

impl Jet {
    /// Builds a jet from any supported source.
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | real samples where complex ones are needed | [`JetError::TypeMismatch`] |
    /// | coefficient vector not 1D, trafo image not 3D | [`JetError::DimensionMismatch`] |
    /// | trafo image without position or vice versa | [`JetError::InvalidArgument`] |
    /// | position outside the trafo image | [`JetError::OutOfRange`] |
    /// | empty or unequal jet list for averaging | [`JetError::InvalidArgument`], [`JetError::LengthMismatch`] |
    /// | normalisation of an all-zero jet | [`JetError::DivideByZero`] |
    pub fn new(source: JetSource<'_>) -> Result<Self, JetError> {
        match source {
            JetSource::ByLength(length) => Ok(Self::zeros(length)),
            JetSource::ByComplexVector {
                coefficients,
                normalize,
            } => Self::from_complex(complex_vector(coefficients)?, normalize),
            JetSource::ByExtraction {
                trafo_image,
                position,
                normalize,
            } => match (trafo_image, position) {
                (Some(trafo_image), Some(position)) => {
                    Self::from_trafo_image(complex_stack(trafo_image)?, position, normalize)
                }
                (Some(_), None) => Err(JetError::InvalidArgument(
                    "trafo image given without a position".to_string(),
                )),
                (None, Some(_)) => Err(JetError::InvalidArgument(
                    "position given without a trafo image".to_string(),
                )),
                (None, None) => Err(JetError::InvalidArgument(
                    "extraction needs a trafo image and a position".to_string(),
                )),
            },
            JetSource::ByCopy(jet) => Ok(jet.clone()),
            JetSource::ByAverage {
                jets,
                phase_aware,
                normalize,
            } => Self::average(jets, phase_aware, normalize),
        }
    }

    /// All-zero jet of `length` coefficients.
    pub fn zeros(length: usize) -> Self {
        Self {
            data: Array2::zeros((2, length)),
        }
    }

    /// Wraps an existing `2 × length` magnitude/phase array.
    ///
    /// # Errors
    ///
    /// [`JetError::DimensionMismatch`] if `data` does not have two rows.
    pub fn from_array(data: Array2<f64>) -> Result<Self, JetError> {
        if data.nrows() != 2 {
            return Err(JetError::DimensionMismatch {
                expected: "2 x length array".to_string(),
                got: data.shape().to_vec(),
            });
        }
        Ok(Self { data })
    }

    /// Jet from complex coefficients, optionally normalised.
    ///
    /// # Errors
    ///
    /// [`JetError::DivideByZero`] when normalising an all-zero vector.
    pub fn from_complex(
        coefficients: ArrayView1<'_, Complex64>,
        normalize: bool,
    ) -> Result<Self, JetError> {
        let mut jet = Self::zeros(coefficients.len());
        jet.init_from_complex(coefficients, normalize)?;
        Ok(jet)
    }

    /// Jet at `position = (row, col)` of a `(wavelets, height, width)` stack.
    ///
    /// # Errors
    ///
    /// [`JetError::OutOfRange`] for a position outside the image, and
    /// [`JetError::DivideByZero`] when normalising an all-zero jet.
    pub fn from_trafo_image(
        trafo_image: ArrayView3<'_, Complex64>,
        position: [i32; 2],
        normalize: bool,
    ) -> Result<Self, JetError> {
        let mut jet = Self::zeros(trafo_image.len_of(Axis(0)));
        jet.extract(trafo_image, position, normalize)?;
        Ok(jet)
    }

    /// Averages a list of jets of equal length.
    ///
    /// With `phase_aware` the complex coefficients are averaged, so jets with
    /// opposite phases cancel. Otherwise magnitudes are averaged
    /// arithmetically and phases by their circular mean.
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | `jets` is empty | [`JetError::InvalidArgument`] |
    /// | jets differ in length | [`JetError::LengthMismatch`] |
    /// | normalising an all-zero average | [`JetError::DivideByZero`] |
    pub fn average(jets: &[Jet], phase_aware: bool, normalize: bool) -> Result<Self, JetError> {
        let length = check_lengths(jets)?;
        let mut average = Self::zeros(length);
        if phase_aware {
            let mut mean = Array1::<Complex64>::zeros(length);
            for jet in jets {
                mean += &jet.complex();
            }
            mean /= Complex64::new(jets.len() as f64, 0.0);
            average.init_from_complex(mean.view(), false)?;
        } else {
            let count = jets.len() as f64;
            for j in 0..length {
                average.data[[0, j]] = jets.iter().map(|jet| jet.data[[0, j]]).sum::<f64>() / count;
                let (mean_phase, _) = phase::circular_stats(jets.iter().map(|jet| jet.data[[1, j]]))
                    .unwrap_or((0.0, 0.0));
                average.data[[1, j]] = mean_phase;
            }
        }
        if normalize {
            average.normalize()?;
        }
        Ok(average)
    }

    /// Replaces the content with the given coefficients. The storage is
    /// reused when the length does not change.
    ///
    /// # Errors
    ///
    /// [`JetError::DivideByZero`] when normalising an all-zero vector.
    pub fn init_from_complex(
        &mut self,
        coefficients: ArrayView1<'_, Complex64>,
        normalize: bool,
    ) -> Result<(), JetError> {
        if self.len() != coefficients.len() {
            self.data = Array2::zeros((2, coefficients.len()));
        }
        let (abs, phase) = self.data.multi_slice_mut((s![0, ..], s![1, ..]));
        Zip::from(abs)
            .and(phase)
            .and(&coefficients)
            .for_each(|magnitude, angle, c| {
                *magnitude = c.norm();
                *angle = phase::wrap(c.arg());
            });
        if normalize {
            self.normalize()?;
        }
        Ok(())
    }

    /// Re-populates this jet from `trafo_image` at `position = (row, col)`.
    ///
    /// # Errors
    ///
    /// As [`Jet::from_trafo_image`].
    pub fn extract(
        &mut self,
        trafo_image: ArrayView3<'_, Complex64>,
        position: [i32; 2],
        normalize: bool,
    ) -> Result<(), JetError> {
        let (_, height, width) = trafo_image.dim();
        let out_of_range = || JetError::OutOfRange {
            position,
            height,
            width,
        };
        let row = usize::try_from(position[0]).map_err(|_| out_of_range())?;
        let col = usize::try_from(position[1]).map_err(|_| out_of_range())?;
        if row >= height || col >= width {
            return Err(out_of_range());
        }
        self.init_from_complex(trafo_image.slice(s![.., row, col]), normalize)
    }

    /// Scales the magnitudes to unit Euclidean norm and returns the norm
    /// they had before.
    ///
    /// # Errors
    ///
    /// [`JetError::DivideByZero`] if all magnitudes are zero.
    pub fn normalize(&mut self) -> Result<f64, JetError> {
        let norm = self.abs().dot(&self.abs()).sqrt();
        if norm == 0.0 {
            return Err(JetError::DivideByZero(
                "cannot normalize a jet with zero norm".to_string(),
            ));
        }
        self.data.row_mut(0).mapv_inplace(|a| a / norm);
        Ok(norm)
    }

    /// Number of coefficients.
    pub fn len(&self) -> usize {
        self.data.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Magnitudes.
    pub fn abs(&self) -> ArrayView1<'_, f64> {
        self.data.row(0)
    }

    /// Phases in `(-π, π]`.
    pub fn phase(&self) -> ArrayView1<'_, f64> {
        self.data.row(1)
    }

    /// Complex coefficients rebuilt from magnitude and phase.
    pub fn complex(&self) -> Array1<Complex64> {
        Zip::from(self.abs())
            .and(self.phase())
            .map_collect(|&abs, &phase| Complex64::from_polar(abs, phase))
    }

    /// The raw `2 × length` array.
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Elementwise `|a - b| <= atol + rtol · |b|` over magnitudes and phases.
    pub fn is_close(&self, other: &Jet, rtol: f64, atol: f64) -> bool {
        self.data.dim() == other.data.dim()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(&a, &b)| (a - b).abs() <= atol + rtol * b.abs())
    }

    /// Writes the jet as `Jet` into the current group of `store`.
    pub fn save<S: RecordStore + ?Sized>(&self, store: &mut S) -> Result<(), JetError> {
        store.set_array2("Jet", self.data.view())?;
        Ok(())
    }

    /// Reads a jet written by [`save`](Self::save).
    pub fn load<S: RecordStore + ?Sized>(store: &S) -> Result<Self, JetError> {
        Self::from_array(store.read_array2("Jet")?)
    }
}

/// Returns the common length of `jets`.
pub(crate) fn check_lengths(jets: &[Jet]) -> Result<usize, JetError> {
    let first = jets.first().ok_or_else(|| {
        JetError::InvalidArgument("at least one jet is required".to_string())
    })?;
    let length = first.len();
    if let Some(other) = jets.iter().find(|jet| jet.len() != length) {
        return Err(JetError::LengthMismatch {
            expected: length,
            got: other.len(),
        });
    }
    Ok(length)
}

fn complex_samples(samples: Samples<'_>) -> Result<ArrayViewD<'_, Complex64>, JetError> {
    samples.as_complex().ok_or(JetError::TypeMismatch {
        expected: "complex",
        found: "real",
    })
}

fn complex_vector(samples: Samples<'_>) -> Result<ArrayView1<'_, Complex64>, JetError> {
    let view = complex_samples(samples)?;
    let shape = view.shape().to_vec();
    view.into_dimensionality::<Ix1>()
        .map_err(|_| JetError::DimensionMismatch {
            expected: "1D coefficient vector".to_string(),
            got: shape,
        })
}

fn complex_stack(samples: Samples<'_>) -> Result<ArrayView3<'_, Complex64>, JetError> {
    let view = complex_samples(samples)?;
    let shape = view.shape().to_vec();
    view.into_dimensionality::<Ix3>()
        .map_err(|_| JetError::DimensionMismatch {
            expected: "3D trafo image (wavelets, height, width)".to_string(),
            got: shape,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use gabor_record::MemoryRecord;
    use ndarray::{Array3, array};
    use std::f64::consts::PI;

    fn sample_jet() -> Jet {
        Jet::from_array(array![[1.0, 2.0, 0.5], [0.1, -2.0, PI]]).unwrap()
    }

    #[test]
    fn zeros_has_requested_length() {
        let jet = Jet::zeros(40);
        assert_eq!(jet.len(), 40);
        assert_eq!(jet.data().dim(), (2, 40));
        assert!(jet.abs().iter().all(|&a| a == 0.0));
    }

    #[test]
    fn from_array_requires_two_rows() {
        let err = Jet::from_array(Array2::zeros((3, 4))).unwrap_err();
        assert!(matches!(err, JetError::DimensionMismatch { .. }));
    }

    #[test]
    fn complex_round_trip() {
        let jet = sample_jet();
        let rebuilt = Jet::from_complex(jet.complex().view(), false).unwrap();
        assert!(rebuilt.is_close(&jet, 1e-12, 1e-12));
    }

    #[test]
    fn phases_are_in_principal_range() {
        let coefficients = array![Complex64::new(-1.0, -0.0), Complex64::new(-1.0, 0.0)];
        let jet = Jet::from_complex(coefficients.view(), false).unwrap();
        for &phase in jet.phase() {
            assert!(phase > -PI && phase <= PI);
        }
    }

    #[test]
    fn normalize_returns_previous_norm() {
        let mut jet = sample_jet();
        let norm = jet.normalize().unwrap();
        assert_abs_diff_eq!(norm, (1.0f64 + 4.0 + 0.25).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(jet.abs().dot(&jet.abs()), 1.0, epsilon = 1e-8);
        assert_eq!(jet.phase(), sample_jet().phase());
    }

    #[test]
    fn normalize_zero_jet_fails() {
        let mut jet = Jet::zeros(5);
        assert!(matches!(jet.normalize(), Err(JetError::DivideByZero(_))));
    }

    #[test]
    fn extract_reuses_storage() {
        let stack = Array3::from_shape_fn((4, 3, 5), |(w, y, x)| {
            Complex64::new((w + 1) as f64, (y * 5 + x) as f64)
        });
        let mut jet = Jet::zeros(4);
        let ptr = jet.data().as_ptr();
        jet.extract(stack.view(), [2, 3], false).unwrap();
        assert_eq!(jet.data().as_ptr(), ptr);
        assert_eq!(jet.complex()[1].re.round(), 2.0);
    }

    #[test]
    fn extract_rejects_outside_positions() {
        let stack = Array3::<Complex64>::zeros((2, 3, 5));
        let mut jet = Jet::zeros(2);
        for position in [[-1, 0], [0, -1], [3, 0], [0, 5]] {
            assert!(matches!(
                jet.extract(stack.view(), position, false),
                Err(JetError::OutOfRange { .. })
            ));
        }
    }

    #[test]
    fn is_close_tolerates_small_differences() {
        let a = sample_jet();
        let mut data = a.data().clone();
        data[[0, 0]] += 1e-9;
        let b = Jet::from_array(data).unwrap();
        assert_ne!(a, b);
        assert!(a.is_close(&b, 1e-5, 1e-8));
        assert!(!a.is_close(&Jet::zeros(3), 1e-5, 1e-8));
        assert!(!a.is_close(&Jet::zeros(4), 1e-5, 1e-8));
    }

    #[test]
    fn average_rejects_unequal_lengths() {
        let jets = [Jet::zeros(3), Jet::zeros(4)];
        assert!(matches!(
            Jet::average(&jets, true, false),
            Err(JetError::LengthMismatch {
                expected: 3,
                got: 4
            })
        ));
    }

    #[test]
    fn record_round_trip() {
        let jet = sample_jet();
        let mut store = MemoryRecord::new();
        jet.save(&mut store).unwrap();
        assert_eq!(Jet::load(&store).unwrap(), jet);
    }
}
