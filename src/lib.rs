//! # gabor
//!
//! Gabor wavelet image representations: the wavelet transform, Gabor jets
//! sampled at graph nodes, jet similarity functions with phase-based
//! disparity estimation, and statistics over jet populations.
//!
//! The numerical engine lives in the member crates and is re-exported here:
//!
//! | Crate | Contents |
//! |-------|----------|
//! | [`gabor_record`] | [`RecordStore`] boundary contract, [`MemoryRecord`] |
//! | [`gabor_wavelet`] | [`Wavelet`], [`Transform`], [`TransformConfig`], [`Fft2d`] |
//! | [`gabor_jet`] | [`Jet`], [`Graph`], [`Similarity`], [`JetStatistics`] |
//!
//! This crate adds a TOML [`config`] document and [`logging`] setup.
//!
//! ## Quick Start
//!
//! ```
//! use gabor::GaborConfig;
//! use ndarray::Array2;
//!
//! let config = GaborConfig::from_toml_str(
//!     r#"
//!     [transform]
//!     number_of_scales = 3
//!
//!     [similarity]
//!     kind = "Disparity"
//!
//!     [graph]
//!     first = [8, 8]
//!     last = [24, 24]
//!     step = [8, 8]
//!     "#,
//! )
//! .unwrap();
//!
//! let mut transform = config.build_transform().unwrap();
//! let mut similarity = config.build_similarity().unwrap();
//! let graph = config.build_graph().unwrap().unwrap();
//!
//! let image = Array2::from_shape_fn((32, 32), |(y, x)| ((y * 7 + x * 3) % 13) as f64);
//! let trafo_image = transform.apply(&image).unwrap();
//! let jets = graph.extract_jets(trafo_image.view(), true).unwrap();
//! assert_eq!(jets.len(), 9);
//! assert_eq!(jets[0].len(), 24);
//!
//! let value = similarity.similarity(&jets[4], &jets[4]).unwrap();
//! assert!((value - 1.0).abs() < 1e-10);
//! ```

pub mod config;
pub mod logging;

pub use config::GaborConfig;
pub use gabor_jet::{
    Graph, Jet, JetError, JetSource, JetStatistics, Similarity, SimilarityKind, load_jets,
    save_jets, wrap,
};
pub use gabor_record::{MemoryRecord, RecordError, RecordStore};
pub use gabor_wavelet::{Fft2d, Samples, Transform, TransformConfig, Wavelet, WaveletError};
