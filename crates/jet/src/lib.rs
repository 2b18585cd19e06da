//! # gabor-jet
//!
//! Gabor jets, node graphs, jet similarity functions and jet statistics on
//! top of [`gabor_wavelet`].
//!
//! ## Pipeline
//!
//! ```mermaid
//! graph LR
//!     A["image"] -->|"transform.apply(&image)?"| B["trafo image"]
//!     B -->|"graph.extract_jets(view, true)?"| C["Vec&lt;Jet&gt;"]
//!     C -->|"similarity.similarity(&a, &b)?"| D["f64"]
//!     C -->|"JetStatistics::new(&jets, transform)?"| E["JetStatistics"]
//! ```
//!
//! A [`Jet`] holds the magnitudes and phases of all wavelet responses at
//! one pixel. A [`Graph`] lists the pixels to sample. [`Similarity`]
//! compares two jets; the disparity-based kinds additionally estimate the
//! displacement between them. [`JetStatistics`] models a population of
//! jets and scores new jets against it.
//!
//! ## Quick Start
//!
//! ```
//! use gabor_jet::{Graph, Similarity, SimilarityKind};
//! use gabor_wavelet::Transform;
//! use ndarray::Array2;
//!
//! let mut transform = Transform::default();
//! let image = Array2::from_shape_fn((40, 40), |(y, x)| ((y * 3 + x * 5) % 11) as f64);
//! let trafo_image = transform.apply(&image).unwrap();
//!
//! let graph = Graph::grid([10, 10], [30, 30], [10, 10]).unwrap();
//! let jets = graph.extract_jets(trafo_image.view(), true).unwrap();
//! assert_eq!(jets.len(), 9);
//!
//! let mut similarity = Similarity::new(SimilarityKind::ScalarProduct, None).unwrap();
//! let value = similarity.similarity(&jets[4], &jets[4]).unwrap();
//! assert!((value - 1.0).abs() < 1e-10);
//! ```

mod disparity;
mod error;
mod graph;
mod jet;
mod jet_io;
mod phase;
mod similarity;
mod statistics;

pub use error::JetError;
pub use graph::Graph;
pub use jet::{Jet, JetSource};
pub use jet_io::{load_jets, save_jets};
pub use phase::wrap;
pub use similarity::{Similarity, SimilarityKind};
pub use statistics::JetStatistics;
