use approx::assert_abs_diff_eq;
use gabor_wavelet::{Fft2d, Transform, TransformConfig, WaveletError};
use ndarray::{Array1, Array2, Array3};
use num_complex::Complex64;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn noise_image(height: usize, width: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Normal::new(0.0, 1.0).expect("valid normal params");
    Array2::from_shape_fn((height, width), |_| dist.sample(&mut rng))
}

fn small_transform() -> Transform {
    Transform::new(
        TransformConfig::new()
            .with_number_of_scales(2)
            .with_number_of_directions(4),
    )
    .unwrap()
}

fn assert_stacks_close(a: &Array3<Complex64>, b: &Array3<Complex64>, tol: f64) {
    assert_eq!(a.dim(), b.dim());
    for (x, y) in a.iter().zip(b.iter()) {
        assert_abs_diff_eq!(x.re, y.re, epsilon = tol);
        assert_abs_diff_eq!(x.im, y.im, epsilon = tol);
    }
}

// ---------------------------------------------------------------------------
// 1. frequency layout
// ---------------------------------------------------------------------------
#[test]
fn frequency_layout() {
    let transform = Transform::default();
    let d = transform.number_of_directions();
    let k_max = transform.k_max();
    let k_fac = transform.k_fac();
    let freqs = transform.wavelet_frequencies();

    assert_eq!(freqs.len(), 40);
    assert_abs_diff_eq!(freqs[0][0], 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(freqs[0][1], k_max, epsilon = 1e-12);
    assert_abs_diff_eq!(freqs[d / 2][0], k_max, epsilon = 1e-12);
    assert_abs_diff_eq!(freqs[d / 2][1], 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(freqs[2 * d][0], 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(freqs[2 * d][1], k_max * k_fac * k_fac, epsilon = 1e-12);
}

#[test]
fn frequencies_shrink_by_k_fac_per_scale() {
    let transform = Transform::default();
    let d = transform.number_of_directions();
    let freqs = transform.wavelet_frequencies();
    for scale in 1..transform.number_of_scales() {
        for dir in 0..d {
            let prev = freqs[(scale - 1) * d + dir];
            let curr = freqs[scale * d + dir];
            assert_abs_diff_eq!(curr[0], prev[0] * transform.k_fac(), epsilon = 1e-12);
            assert_abs_diff_eq!(curr[1], prev[1] * transform.k_fac(), epsilon = 1e-12);
        }
    }
}

// ---------------------------------------------------------------------------
// 2. wavelet generation
// ---------------------------------------------------------------------------
#[test]
fn generate_wavelets_is_idempotent() {
    let mut transform = Transform::default();
    transform.generate_wavelets(20, 16).unwrap();
    let first = transform.wavelets().to_vec();
    transform.generate_wavelets(20, 16).unwrap();
    assert_eq!(transform.wavelets().len(), transform.number_of_wavelets());
    for (a, b) in first.iter().zip(transform.wavelets()) {
        assert_eq!(a, b);
        assert_eq!(a.wavelet(), b.wavelet());
    }
}

#[test]
fn apply_generates_wavelets_for_image_size() {
    let mut transform = small_transform();
    transform.apply(&noise_image(10, 14, 1)).unwrap();
    assert_eq!(transform.resolution(), Some([10, 14]));
    transform.apply(&noise_image(6, 6, 2)).unwrap();
    assert_eq!(transform.resolution(), Some([6, 6]));
    assert_eq!(transform.wavelets().len(), 8);
}

#[test]
fn wavelets_follow_transform_frequencies() {
    let mut transform = small_transform();
    transform.generate_wavelets(8, 8).unwrap();
    for (wavelet, k) in transform
        .wavelets()
        .iter()
        .zip(transform.wavelet_frequencies())
    {
        assert_eq!(wavelet.frequency(), *k);
        assert_eq!(wavelet.sigma(), transform.sigma());
        assert_eq!(wavelet.dc_free(), transform.dc_free());
    }
}

// ---------------------------------------------------------------------------
// 3. impulse response
// ---------------------------------------------------------------------------
#[test]
fn impulse_response_is_shifted_spatial_wavelet() {
    let size = 32;
    let shift = 16;
    let mut image = Array2::zeros((size, size));
    image[[shift, shift]] = 1.0;

    let mut transform = Transform::default();
    let response = transform.apply(&image).unwrap();
    let fft = Fft2d::new(size, size);

    for (wavelet, plane) in transform.wavelets().iter().zip(response.outer_iter()) {
        let mut spatial = wavelet.wavelet().mapv(|v| Complex64::new(v, 0.0));
        fft.inverse(&mut spatial).unwrap();
        for ((y, x), value) in plane.indexed_iter() {
            let expected = spatial[[(y + size - shift) % size, (x + size - shift) % size]];
            assert_abs_diff_eq!(value.re, expected.re, epsilon = 1e-10);
            assert_abs_diff_eq!(value.im, expected.im, epsilon = 1e-10);
        }
    }
}

#[test]
fn plane_wave_excites_matching_direction() {
    // horizontal cosine at the finest frequency responds most to direction 0
    let (height, width) = (32, 32);
    let mut transform = Transform::default();
    let k = transform.k_max();
    let image = Array2::from_shape_fn((height, width), |(_, x)| (k * x as f64).cos());
    let response = transform.apply(&image).unwrap();

    let energy: Vec<f64> = response
        .outer_iter()
        .take(transform.number_of_directions())
        .map(|plane| plane.iter().map(|c| c.norm_sqr()).sum())
        .collect();
    let best = energy
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i);
    assert_eq!(best, Some(0));
}

// ---------------------------------------------------------------------------
// 4. input kinds and linearity
// ---------------------------------------------------------------------------
#[test]
fn real_and_complex_inputs_agree() {
    let image = noise_image(12, 18, 7);
    let complex = image.mapv(|v| Complex64::new(v, 0.0));
    let mut transform = small_transform();
    let from_real = transform.apply(&image).unwrap();
    let from_complex = transform.apply(complex.view()).unwrap();
    assert_stacks_close(&from_real, &from_complex, 1e-12);
}

#[test]
fn transform_is_linear() {
    let a = noise_image(16, 16, 11);
    let b = noise_image(16, 16, 12);
    let combined = &a + &(2.0 * &b);

    let mut transform = small_transform();
    let ta = transform.apply(&a).unwrap();
    let tb = transform.apply(&b).unwrap();
    let tc = transform.apply(&combined).unwrap();
    let expected = &ta + &tb.mapv(|c| c * 2.0);
    assert_stacks_close(&tc, &expected, 1e-10);
}

#[test]
fn apply_into_matches_apply() {
    let image = noise_image(9, 11, 3);
    let mut transform = small_transform();
    let expected = transform.apply(&image).unwrap();
    let mut output = Array3::from_elem((8, 9, 11), Complex64::new(5.0, 5.0));
    transform.apply_into(&image, &mut output).unwrap();
    assert_stacks_close(&output, &expected, 0.0);
}

// ---------------------------------------------------------------------------
// 5. errors
// ---------------------------------------------------------------------------
#[test]
fn apply_into_rejects_wrong_output_shape() {
    let image = noise_image(9, 11, 3);
    let mut transform = small_transform();
    let mut output = Array3::zeros((7, 9, 11));
    let err = transform.apply_into(&image, &mut output).unwrap_err();
    assert!(
        matches!(err, WaveletError::DimensionMismatch { ref got, .. } if got == &[7, 9, 11]),
        "unexpected error {err:?}"
    );
}

#[test]
fn apply_rejects_non_2d_input() {
    let mut transform = small_transform();
    let line = Array1::<f64>::zeros(16);
    assert!(matches!(
        transform.apply(&line),
        Err(WaveletError::DimensionMismatch { .. })
    ));
    let cube = Array3::<Complex64>::zeros((2, 4, 4));
    assert!(matches!(
        transform.apply(&cube),
        Err(WaveletError::DimensionMismatch { .. })
    ));
    assert!(transform.wavelets().is_empty());
}

#[test]
fn apply_rejects_empty_image() {
    let mut transform = small_transform();
    let empty = Array2::<f64>::zeros((0, 0));
    assert!(matches!(
        transform.apply(&empty),
        Err(WaveletError::InvalidArgument(_))
    ));
}
