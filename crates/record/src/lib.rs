//! # gabor-record
//!
//! Structured record store used to persist wavelets, transforms, jets,
//! graphs, similarities and jet statistics.
//!
//! A store holds named scalars and fixed-shape arrays, organised in nested
//! groups. Navigation follows the usual "current group" model:
//!
//! ```text
//! /                      root group
//! ├─ NumberOfJets        Int
//! ├─ Jet_1/              group
//! │  └─ Jet              FloatArray [2, 40]
//! └─ Jet_2/
//!    └─ Jet
//! ```
//!
//! [`RecordStore`] is the boundary contract; [`MemoryRecord`] keeps the group
//! tree in memory and serialises it to JSON.
//!
//! ## Quick Start
//!
//! ```
//! use gabor_record::{MemoryRecord, RecordStore};
//!
//! let mut store = MemoryRecord::new();
//! store.set_f64("Sigma", 6.28).unwrap();
//! store.create_group("Transform").unwrap();
//! store.cd("Transform").unwrap();
//! store.set_i64("NumberOfScales", 5).unwrap();
//! store.cd("..").unwrap();
//!
//! let json = store.to_json().unwrap();
//! let restored = MemoryRecord::from_json(&json).unwrap();
//! assert!(restored.has_group("Transform"));
//! ```

mod error;
mod memory;
mod store;
mod value;

pub use error::RecordError;
pub use memory::{Group, MemoryRecord};
pub use store::RecordStore;
pub use value::Value;
