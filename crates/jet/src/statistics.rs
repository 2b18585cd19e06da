//! Per-coefficient statistics over a population of Gabor jets.

use gabor_record::RecordStore;
use gabor_wavelet::Transform;
use ndarray::{Array1, ArrayView1};

use crate::disparity;
use crate::error::JetError;
use crate::jet::{Jet, check_lengths};
use crate::phase;

/// Lower bound for variances used as divisors.
const VARIANCE_FLOOR: f64 = 1e-12;

/// Mean and variance of magnitudes and phases of a set of jets.
///
/// Magnitudes use the sample mean and the `N − 1` sample variance. Phases
/// use circular statistics: the mean is `atan2(Σ sin φ, Σ cos φ)` and the
/// variance is `1 − R̄` with the mean resultant length `R̄`.
///
/// A [`Transform`] with the wavelet frequencies of the jets is needed for
/// [`disparity`](Self::disparity) and for phase-aware
/// [`log_likelihood`](Self::log_likelihood).
#[derive(Clone, Debug)]
pub struct JetStatistics {
    mean_abs: Array1<f64>,
    var_abs: Array1<f64>,
    mean_phase: Array1<f64>,
    var_phase: Array1<f64>,
    transform: Option<Transform>,
}

impl JetStatistics {
    /// Computes the statistics of `jets`.
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | fewer than two jets | [`JetError::InvalidArgument`] |
    /// | jets differ in length | [`JetError::LengthMismatch`] |
    pub fn new(jets: &[Jet], transform: Option<Transform>) -> Result<Self, JetError> {
        if jets.len() < 2 {
            return Err(JetError::InvalidArgument(format!(
                "jet statistics need at least 2 jets, got {}",
                jets.len()
            )));
        }
        let length = check_lengths(jets)?;
        let count = jets.len() as f64;

        let mut stats = Self {
            mean_abs: Array1::zeros(length),
            var_abs: Array1::zeros(length),
            mean_phase: Array1::zeros(length),
            var_phase: Array1::zeros(length),
            transform,
        };
        for j in 0..length {
            let mean = jets.iter().map(|jet| jet.abs()[j]).sum::<f64>() / count;
            let var = jets
                .iter()
                .map(|jet| (jet.abs()[j] - mean).powi(2))
                .sum::<f64>()
                / (count - 1.0);
            let (mean_phase, var_phase) =
                phase::circular_stats(jets.iter().map(|jet| jet.phase()[j])).unwrap_or((0.0, 1.0));
            stats.mean_abs[j] = mean;
            stats.var_abs[j] = var;
            stats.mean_phase[j] = mean_phase;
            stats.var_phase[j] = var_phase;
        }
        Ok(stats)
    }

    /// Number of coefficients per jet.
    pub fn len(&self) -> usize {
        self.mean_abs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean_abs.is_empty()
    }

    pub fn mean_abs(&self) -> ArrayView1<'_, f64> {
        self.mean_abs.view()
    }

    pub fn var_abs(&self) -> ArrayView1<'_, f64> {
        self.var_abs.view()
    }

    pub fn mean_phase(&self) -> ArrayView1<'_, f64> {
        self.mean_phase.view()
    }

    pub fn var_phase(&self) -> ArrayView1<'_, f64> {
        self.var_phase.view()
    }

    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    /// Replaces or clears the transform.
    pub fn set_transform(&mut self, transform: Option<Transform>) {
        self.transform = transform;
    }

    /// Estimates the displacement `(dy, dx)` that moves `jet` onto the mean
    /// phases. Coefficients are weighted by `mean_abs · abs / var_phase`.
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | no transform set | [`JetError::InvalidState`] |
    /// | jet length differs from the number of wavelets | [`JetError::LengthMismatch`] |
    pub fn disparity(&self, jet: &Jet) -> Result<[f64; 2], JetError> {
        let transform = self.transform.as_ref().ok_or_else(|| {
            JetError::InvalidState("jet statistics have no Gabor wavelet transform".to_string())
        })?;
        if jet.len() != transform.number_of_wavelets() {
            return Err(JetError::LengthMismatch {
                expected: transform.number_of_wavelets(),
                got: jet.len(),
            });
        }
        self.check_length(jet)?;

        let mut diffs = Vec::with_capacity(jet.len());
        let mut confs = Vec::with_capacity(jet.len());
        for j in 0..jet.len() {
            diffs.push(phase::wrap(self.mean_phase[j] - jet.phase()[j]));
            confs.push(self.mean_abs[j] * jet.abs()[j] / self.var_phase[j].max(VARIANCE_FLOOR));
        }
        Ok(disparity::estimate(
            transform.wavelet_frequencies(),
            transform.number_of_directions(),
            &diffs,
            &confs,
        ))
    }

    /// Negated mean squared z-score of `jet` under these statistics.
    ///
    /// The magnitude part is `Σ (a_j − mean_abs_j)² / var_abs_j`. With
    /// `use_phase`, the jet's phases are first shifted by its estimated
    /// disparity, corrected by the fractional part of `offset` (the sub-pixel
    /// location the jet should have been taken at), and
    /// `Σ wrap(φ_j + k_j·d − mean_phase_j)² / var_phase_j · a_j / var_abs_j`
    /// is added, so phases of weak coefficients count less. The sum is
    /// divided by the number of terms.
    ///
    /// # Errors
    ///
    /// [`JetError::LengthMismatch`] for a jet of a different length, and the
    /// errors of [`disparity`](Self::disparity) when `use_phase` is set.
    pub fn log_likelihood(
        &self,
        jet: &Jet,
        use_phase: bool,
        offset: [f64; 2],
    ) -> Result<f64, JetError> {
        self.check_length(jet)?;

        let q_abs: f64 = (0..jet.len())
            .map(|j| (jet.abs()[j] - self.mean_abs[j]).powi(2) / self.var_abs[j].max(VARIANCE_FLOOR))
            .sum();

        let (q_phase, factor) = if use_phase {
            let [dy, dx] = self.disparity(jet)?;
            let (dy, dx) = (dy - offset[0].fract(), dx - offset[1].fract());
            let frequencies = self
                .transform
                .as_ref()
                .map(Transform::wavelet_frequencies)
                .unwrap_or_default();
            let q: f64 = frequencies
                .iter()
                .enumerate()
                .map(|(j, &[ky, kx])| {
                    let diff = phase::wrap(jet.phase()[j] + ky * dy + kx * dx - self.mean_phase[j]);
                    diff * diff / self.var_phase[j].max(VARIANCE_FLOOR) * jet.abs()[j]
                        / self.var_abs[j].max(VARIANCE_FLOOR)
                })
                .sum();
            (q, 2.0)
        } else {
            (0.0, 1.0)
        };

        Ok(-(q_abs + q_phase) / (factor * jet.len() as f64))
    }

    /// [`log_likelihood`](Self::log_likelihood) without sub-pixel offset.
    pub fn score(&self, jet: &Jet, use_phase: bool) -> Result<f64, JetError> {
        self.log_likelihood(jet, use_phase, [0.0, 0.0])
    }

    /// Writes the four statistics arrays and, if requested and present, the
    /// transform as a `Transform` group.
    pub fn save<S: RecordStore + ?Sized>(
        &self,
        store: &mut S,
        save_transform: bool,
    ) -> Result<(), JetError> {
        store.set_array1("MeanAbs", self.mean_abs.view())?;
        store.set_array1("VarAbs", self.var_abs.view())?;
        store.set_array1("MeanPhase", self.mean_phase.view())?;
        store.set_array1("VarPhase", self.var_phase.view())?;
        if save_transform && let Some(transform) = &self.transform {
            store.create_group("Transform")?;
            store.cd("Transform")?;
            let saved = transform.save(store);
            store.cd("..")?;
            saved?;
        }
        Ok(())
    }

    /// Reads statistics written by [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Record errors, and [`JetError::LengthMismatch`] if the arrays differ
    /// in length.
    pub fn load<S: RecordStore + ?Sized>(store: &mut S) -> Result<Self, JetError> {
        let mean_abs = store.read_array1("MeanAbs")?;
        let var_abs = store.read_array1("VarAbs")?;
        let mean_phase = store.read_array1("MeanPhase")?;
        let var_phase = store.read_array1("VarPhase")?;
        for other in [&var_abs, &mean_phase, &var_phase] {
            if other.len() != mean_abs.len() {
                return Err(JetError::LengthMismatch {
                    expected: mean_abs.len(),
                    got: other.len(),
                });
            }
        }

        let transform = if store.has_group("Transform") {
            store.cd("Transform")?;
            let loaded = Transform::load(&*store);
            store.cd("..")?;
            Some(loaded?)
        } else {
            None
        };

        Ok(Self {
            mean_abs,
            var_abs,
            mean_phase,
            var_phase,
            transform,
        })
    }

    fn check_length(&self, jet: &Jet) -> Result<(), JetError> {
        if jet.len() != self.len() {
            return Err(JetError::LengthMismatch {
                expected: self.len(),
                got: jet.len(),
            });
        }
        Ok(())
    }
}

impl PartialEq for JetStatistics {
    fn eq(&self, other: &Self) -> bool {
        all_close(&self.mean_abs, &other.mean_abs)
            && all_close(&self.var_abs, &other.var_abs)
            && all_close(&self.mean_phase, &other.mean_phase)
            && all_close(&self.var_phase, &other.var_phase)
            && self.transform == other.transform
    }
}

fn all_close(a: &Array1<f64>, b: &Array1<f64>) -> bool {
    const RTOL: f64 = 1e-5;
    const ATOL: f64 = 1e-8;
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(&x, &y)| (x - y).abs() <= ATOL + RTOL * y.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::wrap;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;
    use std::f64::consts::PI;

    fn jet(abs: [f64; 2], phase: [f64; 2]) -> Jet {
        Jet::from_array(Array2::from(vec![abs, phase])).unwrap()
    }

    #[test]
    fn magnitude_statistics_use_sample_variance() {
        let jets = [jet([1.0, 2.0], [0.0; 2]), jet([3.0, 2.0], [0.0; 2])];
        let stats = JetStatistics::new(&jets, None).unwrap();
        assert_eq!(stats.mean_abs().to_vec(), vec![2.0, 2.0]);
        assert_eq!(stats.var_abs().to_vec(), vec![2.0, 0.0]);
    }

    #[test]
    fn phase_statistics_are_circular() {
        let jets = [
            jet([1.0; 2], [PI - 0.1, 0.5]),
            jet([1.0; 2], [-PI + 0.1, 0.5]),
        ];
        let stats = JetStatistics::new(&jets, None).unwrap();
        assert_abs_diff_eq!(stats.mean_phase()[0].abs(), PI, epsilon = 1e-12);
        assert!(stats.var_phase()[0] < 0.01);
        assert_abs_diff_eq!(stats.mean_phase()[1], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.var_phase()[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn needs_two_jets() {
        let one = [jet([1.0; 2], [0.0; 2])];
        assert!(matches!(
            JetStatistics::new(&one, None),
            Err(JetError::InvalidArgument(_))
        ));
        assert!(JetStatistics::new(&[], None).is_err());
    }

    #[test]
    fn unequal_lengths_rejected() {
        let jets = [Jet::zeros(2), Jet::zeros(3)];
        assert!(matches!(
            JetStatistics::new(&jets, None),
            Err(JetError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn magnitude_score_without_transform() {
        let jets = [jet([1.0, 2.0], [0.0; 2]), jet([3.0, 4.0], [0.0; 2])];
        let stats = JetStatistics::new(&jets, None).unwrap();
        // mean (2, 3), var (2, 2): q_abs = 1 / 2, averaged over 2 coefficients
        let probe = jet([3.0, 3.0], [0.0; 2]);
        assert_abs_diff_eq!(stats.score(&probe, false).unwrap(), -0.25, epsilon = 1e-12);
        assert!(matches!(
            stats.score(&probe, true),
            Err(JetError::InvalidState(_))
        ));
    }

    #[test]
    fn phase_terms_are_weighted_by_magnitude() {
        use gabor_wavelet::TransformConfig;

        let transform = Transform::new(
            TransformConfig::new()
                .with_number_of_scales(1)
                .with_number_of_directions(2),
        )
        .unwrap();
        let jets = [
            jet([1.0, 2.0], [0.1, -0.2]),
            jet([2.0, 1.0], [0.3, 0.4]),
            jet([1.5, 3.0], [-0.1, 0.1]),
        ];
        let stats = JetStatistics::new(&jets, Some(transform.clone())).unwrap();
        let probe = jet([1.2, 2.5], [0.5, -0.6]);

        let [dy, dx] = stats.disparity(&probe).unwrap();
        let mut q = 0.0;
        for (j, &[ky, kx]) in transform.wavelet_frequencies().iter().enumerate() {
            let a = probe.abs()[j];
            let diff = wrap(probe.phase()[j] + ky * dy + kx * dx - stats.mean_phase()[j]);
            q += (a - stats.mean_abs()[j]).powi(2) / stats.var_abs()[j];
            q += diff * diff / stats.var_phase()[j] * a / stats.var_abs()[j];
        }
        assert_abs_diff_eq!(stats.score(&probe, true).unwrap(), -q / 4.0, epsilon = 1e-9);
    }

    #[test]
    fn score_rejects_wrong_length() {
        let jets = [jet([1.0, 2.0], [0.0; 2]), jet([3.0, 4.0], [0.0; 2])];
        let stats = JetStatistics::new(&jets, None).unwrap();
        assert!(matches!(
            stats.score(&Jet::zeros(3), false),
            Err(JetError::LengthMismatch { .. })
        ));
    }
}
