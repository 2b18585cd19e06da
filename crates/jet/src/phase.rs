//! Phase wrapping and circular statistics.

use std::f64::consts::{PI, TAU};

/// Wraps an angle into `(-π, π]`.
pub fn wrap(phase: f64) -> f64 {
    let wrapped = (phase + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

/// Circular mean `atan2(Σ sin φ, Σ cos φ)` and circular variance `1 - R̄`
/// of a set of angles, where `R̄` is the mean resultant length.
///
/// Returns `None` for an empty input.
pub fn circular_stats<I>(phases: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    let (mut sin_sum, mut cos_sum, mut count) = (0.0, 0.0, 0usize);
    for phase in phases {
        sin_sum += phase.sin();
        cos_sum += phase.cos();
        count += 1;
    }
    if count == 0 {
        return None;
    }
    let resultant = sin_sum.hypot(cos_sum) / count as f64;
    Some((wrap(sin_sum.atan2(cos_sum)), 1.0 - resultant))
}
