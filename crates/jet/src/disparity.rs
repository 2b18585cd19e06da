//! Coarse-to-fine least-squares disparity estimation from phase differences.

use std::f64::consts::TAU;

use tracing::trace;

/// Estimates the displacement `d = (dy, dx)` that best explains the phase
/// differences `Δ_j ≈ k_j · d`.
///
/// `frequencies` holds one `(ky, kx)` per coefficient in scale-major order
/// with `directions` entries per scale. Scales are visited from the lowest
/// frequency (last scale) to the highest. Each visited scale adds its
/// coefficients to the normal equations
///
/// ```text
/// Γ = Σ c_j k_j k_jᵀ        Φ = Σ c_j k_j (Δ_j − 2π n_j)
/// ```
///
/// where `n_j` is the number of whole cycles by which `Δ_j` is off from the
/// prediction of the current estimate. The estimate is then updated to
/// `Γ⁻¹ Φ`; while `Γ` is singular the previous estimate is kept.
pub(crate) fn estimate(
    frequencies: &[[f64; 2]],
    directions: usize,
    phase_differences: &[f64],
    confidences: &[f64],
) -> [f64; 2] {
    let mut disparity = [0.0; 2];
    let (mut g_yy, mut g_yx, mut g_xx) = (0.0, 0.0, 0.0);
    let (mut phi_y, mut phi_x) = (0.0, 0.0);

    let scales = frequencies
        .chunks(directions)
        .zip(phase_differences.chunks(directions))
        .zip(confidences.chunks(directions))
        .enumerate()
        .rev();
    for (scale, ((ks, diffs), confs)) in scales {
        for ((&[ky, kx], &diff), &conf) in ks.iter().zip(diffs).zip(confs) {
            g_yy += conf * ky * ky;
            g_yx += conf * ky * kx;
            g_xx += conf * kx * kx;

            let predicted = disparity[0] * ky + disparity[1] * kx;
            let cycles = ((diff - predicted) / TAU).round();
            let corrected = diff - cycles * TAU;
            phi_y += conf * corrected * ky;
            phi_x += conf * corrected * kx;
        }

        let det = g_xx * g_yy - g_yx * g_yx;
        let scale_norm = (g_xx + g_yy) * (g_xx + g_yy);
        if det.abs() <= 1e-12 * scale_norm || !det.is_normal() {
            trace!(scale, "singular normal equations, keeping estimate");
            continue;
        }
        disparity = [
            (g_xx * phi_y - g_yx * phi_x) / det,
            (g_yy * phi_x - g_yx * phi_y) / det,
        ];
        trace!(scale, dy = disparity[0], dx = disparity[1], "disparity update");
    }
    disparity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::wrap;
    use approx::assert_abs_diff_eq;
    use gabor_wavelet::Transform;

    fn phase_shifts(frequencies: &[[f64; 2]], d: [f64; 2]) -> Vec<f64> {
        frequencies
            .iter()
            .map(|&[ky, kx]| wrap(ky * d[0] + kx * d[1]))
            .collect()
    }

    #[test]
    fn recovers_small_shift() {
        let transform = Transform::default();
        let freqs = transform.wavelet_frequencies();
        let diffs = phase_shifts(freqs, [0.4, -0.7]);
        let d = estimate(freqs, 8, &diffs, &vec![1.0; freqs.len()]);
        assert_abs_diff_eq!(d[0], 0.4, epsilon = 1e-10);
        assert_abs_diff_eq!(d[1], -0.7, epsilon = 1e-10);
    }

    #[test]
    fn resolves_wrapped_phases_at_fine_scales() {
        let transform = Transform::default();
        let freqs = transform.wavelet_frequencies();
        let diffs = phase_shifts(freqs, [2.0, -1.5]);
        let d = estimate(freqs, 8, &diffs, &vec![1.0; freqs.len()]);
        assert_abs_diff_eq!(d[0], 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(d[1], -1.5, epsilon = 1e-10);
    }

    #[test]
    fn zero_confidence_keeps_zero_estimate() {
        let transform = Transform::default();
        let freqs = transform.wavelet_frequencies();
        let diffs = phase_shifts(freqs, [1.0, 1.0]);
        let d = estimate(freqs, 8, &diffs, &vec![0.0; freqs.len()]);
        assert_eq!(d, [0.0, 0.0]);
    }

    #[test]
    fn single_direction_is_singular() {
        let freqs = [[0.0, 1.0], [0.0, 0.5]];
        let d = estimate(&freqs, 1, &[0.3, 0.15], &[1.0, 1.0]);
        assert_eq!(d, [0.0, 0.0]);
    }
}
