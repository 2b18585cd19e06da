//! # gabor-wavelet
//!
//! Gabor wavelets and the Gabor wavelet transform of 2D images.
//!
//! ## Pipeline
//!
//! ```mermaid
//! graph LR
//!     A["TransformConfig::new()"] -->|"Transform::new(config)?"| B["Transform"]
//!     B -->|"generate_wavelets(h, w)?"| C["Vec&lt;Wavelet&gt;"]
//!     D["image (real or complex)"] -->|"transform.apply(&image)?"| E["Array3&lt;Complex64&gt;"]
//! ```
//!
//! The transform computes the FFT of the image once, multiplies it with each
//! frequency-domain [`Wavelet`] kernel and transforms every product back,
//! giving one complex response plane per wavelet.
//!
//! ## Quick Start
//!
//! ```
//! use gabor_wavelet::Transform;
//! use ndarray::Array2;
//!
//! let mut transform = Transform::default();
//! let image = Array2::from_shape_fn((32, 24), |(y, x)| ((y * x) % 7) as f64);
//! let trafo_image = transform.apply(&image).unwrap();
//! assert_eq!(trafo_image.dim(), (40, 32, 24));
//! ```

mod error;
mod fft;
mod samples;
mod transform;
mod wavelet;

pub use error::WaveletError;
pub use fft::Fft2d;
pub use samples::Samples;
pub use transform::{Transform, TransformConfig};
pub use wavelet::Wavelet;
