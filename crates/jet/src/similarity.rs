//! Similarity functions between Gabor jets.

use std::fmt;

use gabor_record::RecordStore;
use gabor_wavelet::Transform;

use crate::disparity;
use crate::error::JetError;
use crate::jet::Jet;
use crate::phase;

/// The available jet similarity functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SimilarityKind {
    /// Normalised scalar product of the magnitudes.
    ScalarProduct,
    /// Mean Canberra similarity of the magnitudes.
    Canberra,
    /// Normalised scalar product of the complex coefficients.
    AbsPhase,
    /// Like [`AbsPhase`](Self::AbsPhase) after compensating the estimated
    /// disparity.
    Disparity,
    /// Mean cosine of the disparity-corrected phase differences.
    PhaseDiff,
    /// Average of [`PhaseDiff`](Self::PhaseDiff) and
    /// [`Canberra`](Self::Canberra).
    PhaseDiffPlusCanberra,
}

impl SimilarityKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::ScalarProduct,
        Self::Canberra,
        Self::AbsPhase,
        Self::Disparity,
        Self::PhaseDiff,
        Self::PhaseDiffPlusCanberra,
    ];

    /// Parses a kind from its stored name.
    ///
    /// # Errors
    ///
    /// Returns [`JetError::InvalidArgument`] for an unknown name.
    pub fn from_name(name: &str) -> Result<Self, JetError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| {
                JetError::InvalidArgument(format!(
                    "unknown similarity '{name}', expected one of: ScalarProduct, Canberra, \
                     AbsPhase, Disparity, PhaseDiff, PhaseDiffPlusCanberra"
                ))
            })
    }

    /// Returns the stored name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScalarProduct => "ScalarProduct",
            Self::Canberra => "Canberra",
            Self::AbsPhase => "AbsPhase",
            Self::Disparity => "Disparity",
            Self::PhaseDiff => "PhaseDiff",
            Self::PhaseDiffPlusCanberra => "PhaseDiffPlusCanberra",
        }
    }

    /// Whether the kind estimates a disparity and therefore needs the
    /// wavelet frequencies of a [`Transform`].
    pub fn uses_disparity(&self) -> bool {
        matches!(
            self,
            Self::Disparity | Self::PhaseDiff | Self::PhaseDiffPlusCanberra
        )
    }
}

impl fmt::Display for SimilarityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A jet similarity function.
///
/// Disparity-based kinds keep the disparity of the last comparison, which
/// can be queried with [`last_disparity`](Self::last_disparity).
///
/// # Example
///
/// ```
/// use gabor_jet::{Jet, Similarity, SimilarityKind};
/// use gabor_wavelet::Transform;
/// use ndarray::Array1;
/// use num_complex::Complex64;
///
/// let transform = Transform::default();
/// let coefficients = Array1::from_shape_fn(transform.number_of_wavelets(), |j| {
///     Complex64::from_polar(1.0 + j as f64 * 0.1, j as f64 * 0.3)
/// });
/// let jet = Jet::from_complex(coefficients.view(), true).unwrap();
///
/// let mut similarity = Similarity::new(SimilarityKind::Disparity, Some(transform)).unwrap();
/// let value = similarity.similarity(&jet, &jet).unwrap();
/// assert!((value - 1.0).abs() < 1e-10);
/// assert!(similarity.last_disparity()[0].abs() < 1e-10);
/// ```
#[derive(Clone, Debug)]
pub struct Similarity {
    kind: SimilarityKind,
    transform: Option<Transform>,
    last_disparity: [f64; 2],
}

impl Similarity {
    /// Creates a similarity function.
    ///
    /// The transform is only kept for disparity-based kinds.
    ///
    /// # Errors
    ///
    /// [`JetError::InvalidState`] if a disparity-based kind is requested
    /// without a transform.
    pub fn new(kind: SimilarityKind, transform: Option<Transform>) -> Result<Self, JetError> {
        let transform = if kind.uses_disparity() {
            Some(transform.ok_or_else(|| {
                JetError::InvalidState(format!(
                    "similarity '{kind}' requires a Gabor wavelet transform"
                ))
            })?)
        } else {
            None
        };
        Ok(Self {
            kind,
            transform,
            last_disparity: [f64::NAN; 2],
        })
    }

    pub fn kind(&self) -> SimilarityKind {
        self.kind
    }

    /// The transform used for disparity estimation, if any.
    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    /// Disparity of the last comparison; NaN before the first estimate and
    /// for kinds that do not estimate one.
    pub fn last_disparity(&self) -> [f64; 2] {
        self.last_disparity
    }

    /// Similarity of two jets, typically in `[-1, 1]` (1 for identical jets).
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | a jet is empty | [`JetError::InvalidArgument`] |
    /// | jets differ in length | [`JetError::LengthMismatch`] |
    /// | disparity kinds: jet length differs from the number of wavelets | [`JetError::LengthMismatch`] |
    pub fn similarity(&mut self, a: &Jet, b: &Jet) -> Result<f64, JetError> {
        check_pair(a, b)?;
        let length = a.len() as f64;
        let (abs_a, abs_b) = (a.abs(), b.abs());

        let value = match self.kind {
            SimilarityKind::ScalarProduct => normalized(abs_a.dot(&abs_b), a, b),
            SimilarityKind::Canberra => canberra_sum(a, b) / length,
            SimilarityKind::AbsPhase => {
                let sum: f64 = abs_a
                    .iter()
                    .zip(&abs_b)
                    .zip(a.phase().iter().zip(&b.phase()))
                    .map(|((&x, &y), (&p, &q))| x * y * (p - q).cos())
                    .sum();
                normalized(sum, a, b)
            }
            SimilarityKind::Disparity => {
                let cosines = self.corrected_cosines(a, b)?;
                let sum: f64 = cosines
                    .iter()
                    .zip(abs_a.iter().zip(&abs_b))
                    .map(|(&cos, (&x, &y))| x * y * cos)
                    .sum();
                normalized(sum, a, b)
            }
            SimilarityKind::PhaseDiff => self.corrected_cosines(a, b)?.iter().sum::<f64>() / length,
            SimilarityKind::PhaseDiffPlusCanberra => {
                let phase_sum: f64 = self.corrected_cosines(a, b)?.iter().sum();
                (phase_sum + canberra_sum(a, b)) / (2.0 * length)
            }
        };
        Ok(value)
    }

    /// Estimates the displacement `(dy, dx)` of `a` relative to `b` from
    /// their phase differences and stores it as the last disparity.
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | kind does not estimate disparities | [`JetError::InvalidState`] |
    /// | jets differ in length, or from the number of wavelets | [`JetError::LengthMismatch`] |
    pub fn disparity(&mut self, a: &Jet, b: &Jet) -> Result<[f64; 2], JetError> {
        check_pair(a, b)?;
        let transform = self.frequency_transform(a.len())?;
        let (diffs, confs): (Vec<f64>, Vec<f64>) = a
            .abs()
            .iter()
            .zip(a.phase())
            .zip(b.abs().iter().zip(b.phase()))
            .map(|((&abs_a, &phase_a), (&abs_b, &phase_b))| {
                (phase::wrap(phase_a - phase_b), abs_a * abs_b)
            })
            .unzip();
        let disparity = disparity::estimate(
            transform.wavelet_frequencies(),
            transform.number_of_directions(),
            &diffs,
            &confs,
        );
        self.last_disparity = disparity;
        Ok(disparity)
    }

    /// Returns a copy of `jet` whose phases are moved by the disparity
    /// between `jet` and `reference`, i.e. towards the phases of `reference`.
    ///
    /// # Errors
    ///
    /// As [`disparity`](Self::disparity).
    pub fn shift_phase(&mut self, jet: &Jet, reference: &Jet) -> Result<Jet, JetError> {
        let [dy, dx] = self.disparity(jet, reference)?;
        let frequencies = self
            .transform
            .as_ref()
            .map(Transform::wavelet_frequencies)
            .unwrap_or_default();
        let mut data = jet.data().clone();
        for (phase, &[ky, kx]) in data.row_mut(1).iter_mut().zip(frequencies) {
            *phase = phase::wrap(*phase - ky * dy - kx * dx);
        }
        Jet::from_array(data)
    }

    /// Writes `Type` and, for disparity kinds, a `Transform` group.
    pub fn save<S: RecordStore + ?Sized>(&self, store: &mut S) -> Result<(), JetError> {
        store.set_str("Type", self.kind.name())?;
        if let Some(transform) = &self.transform {
            store.create_group("Transform")?;
            store.cd("Transform")?;
            let saved = transform.save(store);
            store.cd("..")?;
            saved?;
        }
        Ok(())
    }

    /// Reads a similarity written by [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Record errors, [`JetError::InvalidArgument`] for an unknown `Type`.
    pub fn load<S: RecordStore + ?Sized>(store: &mut S) -> Result<Self, JetError> {
        let kind = SimilarityKind::from_name(&store.read_string("Type")?)?;
        let transform = if kind.uses_disparity() {
            store.cd("Transform")?;
            let loaded = Transform::load(&*store);
            store.cd("..")?;
            Some(loaded?)
        } else {
            None
        };
        Self::new(kind, transform)
    }

    /// Cosines of the disparity-corrected phase differences `Δ_j − k_j·d`.
    fn corrected_cosines(&mut self, a: &Jet, b: &Jet) -> Result<Vec<f64>, JetError> {
        let [dy, dx] = self.disparity(a, b)?;
        let frequencies = self
            .transform
            .as_ref()
            .map(Transform::wavelet_frequencies)
            .unwrap_or_default();
        Ok(a.phase()
            .iter()
            .zip(&b.phase())
            .zip(frequencies)
            .map(|((&p, &q), &[ky, kx])| (phase::wrap(p - q) - ky * dy - kx * dx).cos())
            .collect())
    }

    fn frequency_transform(&self, length: usize) -> Result<&Transform, JetError> {
        let transform = self.transform.as_ref().ok_or_else(|| {
            JetError::InvalidState(format!(
                "similarity '{}' does not estimate disparities",
                self.kind
            ))
        })?;
        if transform.number_of_wavelets() != length {
            return Err(JetError::LengthMismatch {
                expected: transform.number_of_wavelets(),
                got: length,
            });
        }
        Ok(transform)
    }
}

impl PartialEq for Similarity {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.transform == other.transform
    }
}

fn check_pair(a: &Jet, b: &Jet) -> Result<(), JetError> {
    if a.is_empty() || b.is_empty() {
        return Err(JetError::InvalidArgument(
            "cannot compare empty jets".to_string(),
        ));
    }
    if a.len() != b.len() {
        return Err(JetError::LengthMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }
    Ok(())
}

/// Divides by the product of the magnitude norms; 0 if either norm is 0.
fn normalized(sum: f64, a: &Jet, b: &Jet) -> f64 {
    let norm = (a.abs().dot(&a.abs()) * b.abs().dot(&b.abs())).sqrt();
    if norm > 0.0 { sum / norm } else { 0.0 }
}

fn canberra_sum(a: &Jet, b: &Jet) -> f64 {
    a.abs()
        .iter()
        .zip(&b.abs())
        .map(|(&x, &y)| {
            let total = x + y;
            if total > 0.0 { 1.0 - (x - y).abs() / total } else { 1.0 }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use gabor_record::MemoryRecord;
    use gabor_wavelet::TransformConfig;
    use ndarray::array;

    fn jet(abs: [f64; 3], phase: [f64; 3]) -> Jet {
        Jet::from_array(array![abs, phase]).unwrap()
    }

    #[test]
    fn names_round_trip() {
        for kind in SimilarityKind::ALL {
            assert_eq!(SimilarityKind::from_name(kind.name()).unwrap(), kind);
            assert_eq!(kind.to_string(), kind.name());
        }
    }

    #[test]
    fn unknown_name_rejected() {
        let err = SimilarityKind::from_name("Euclidean").unwrap_err();
        assert!(matches!(err, JetError::InvalidArgument(ref msg) if msg.contains("Euclidean")));
    }

    #[test]
    fn disparity_kinds_need_transform() {
        for kind in SimilarityKind::ALL {
            let result = Similarity::new(kind, None);
            assert_eq!(result.is_err(), kind.uses_disparity(), "{kind}");
        }
    }

    #[test]
    fn transform_dropped_for_plain_kinds() {
        let similarity =
            Similarity::new(SimilarityKind::Canberra, Some(Transform::default())).unwrap();
        assert!(similarity.transform().is_none());
    }

    #[test]
    fn scalar_product_is_normalised() {
        let mut sim = Similarity::new(SimilarityKind::ScalarProduct, None).unwrap();
        let a = jet([1.0, 0.0, 0.0], [0.0; 3]);
        let b = jet([1.0, 1.0, 0.0], [0.0; 3]);
        assert_abs_diff_eq!(sim.similarity(&a, &b).unwrap(), 0.5f64.sqrt(), epsilon = 1e-12);
        assert!(sim.last_disparity()[0].is_nan());
    }

    #[test]
    fn canberra_handles_zero_magnitudes() {
        let mut sim = Similarity::new(SimilarityKind::Canberra, None).unwrap();
        let a = jet([0.0, 1.0, 3.0], [0.0; 3]);
        let b = jet([0.0, 1.0, 1.0], [0.0; 3]);
        // terms: 1, 1, 1 - 2/4
        assert_abs_diff_eq!(sim.similarity(&a, &b).unwrap(), 2.5 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn abs_phase_uses_phase_difference() {
        let mut sim = Similarity::new(SimilarityKind::AbsPhase, None).unwrap();
        let a = jet([1.0, 1.0, 0.0], [0.0, 0.0, 0.0]);
        let b = jet([1.0, 1.0, 0.0], [std::f64::consts::PI, 0.0, 0.0]);
        assert_abs_diff_eq!(sim.similarity(&a, &b).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_norm_gives_zero() {
        let mut sim = Similarity::new(SimilarityKind::ScalarProduct, None).unwrap();
        let zero = Jet::zeros(3);
        let a = jet([1.0, 2.0, 3.0], [0.0; 3]);
        assert_eq!(sim.similarity(&zero, &a).unwrap(), 0.0);
    }

    #[test]
    fn empty_jets_rejected_by_every_kind() {
        let empty = Jet::zeros(0);
        for kind in SimilarityKind::ALL {
            let mut sim = Similarity::new(kind, Some(Transform::default())).unwrap();
            assert!(
                matches!(
                    sim.similarity(&empty, &empty),
                    Err(JetError::InvalidArgument(_))
                ),
                "{kind}"
            );
        }
    }

    #[test]
    fn length_mismatch_rejected() {
        let mut sim = Similarity::new(SimilarityKind::Canberra, None).unwrap();
        assert!(matches!(
            sim.similarity(&Jet::zeros(3), &Jet::zeros(4)),
            Err(JetError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn disparity_requires_matching_transform() {
        let mut sim = Similarity::new(SimilarityKind::PhaseDiff, Some(Transform::default())).unwrap();
        let a = jet([1.0; 3], [0.0; 3]);
        assert!(matches!(
            sim.disparity(&a, &a),
            Err(JetError::LengthMismatch {
                expected: 40,
                got: 3
            })
        ));

        let mut plain = Similarity::new(SimilarityKind::AbsPhase, None).unwrap();
        assert!(matches!(
            plain.disparity(&a, &a),
            Err(JetError::InvalidState(_))
        ));
    }

    #[test]
    fn record_round_trip() {
        let transform =
            Transform::new(TransformConfig::new().with_number_of_scales(3)).unwrap();
        for kind in SimilarityKind::ALL {
            let sim = Similarity::new(kind, Some(transform.clone())).unwrap();
            let mut store = MemoryRecord::new();
            sim.save(&mut store).unwrap();
            assert_eq!(store.has_group("Transform"), kind.uses_disparity());
            assert_eq!(Similarity::load(&mut store).unwrap(), sim);
        }
    }

    #[test]
    fn load_rejects_unknown_type() {
        let mut store = MemoryRecord::new();
        store.set_str("Type", "Cosine").unwrap();
        assert!(matches!(
            Similarity::load(&mut store),
            Err(JetError::InvalidArgument(_))
        ));
    }
}
