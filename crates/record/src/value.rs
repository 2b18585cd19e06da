//! Values that can be stored under a name in a record group.

use serde::{Deserialize, Serialize};

/// A named scalar or fixed-shape array.
///
/// Arrays are stored flat in row-major order together with their shape.
/// Complex arrays store `[re, im]` pairs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Value {
    /// Signed integer scalar.
    Int {
        /// The stored integer.
        value: i64,
    },
    /// Floating-point scalar.
    Float {
        /// The stored float.
        value: f64,
    },
    /// Boolean scalar.
    Bool {
        /// The stored flag.
        value: bool,
    },
    /// UTF-8 string.
    Str {
        /// The stored string.
        value: String,
    },
    /// Real-valued array.
    FloatArray {
        /// Extent of each axis.
        shape: Vec<usize>,
        /// Row-major elements.
        data: Vec<f64>,
    },
    /// Integer array.
    IntArray {
        /// Extent of each axis.
        shape: Vec<usize>,
        /// Row-major elements.
        data: Vec<i64>,
    },
    /// Complex-valued array.
    ComplexArray {
        /// Extent of each axis.
        shape: Vec<usize>,
        /// Row-major `[re, im]` elements.
        data: Vec<[f64; 2]>,
    },
}

impl Value {
    /// Short name of the value kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Int { .. } => "int",
            Self::Float { .. } => "float",
            Self::Bool { .. } => "bool",
            Self::Str { .. } => "string",
            Self::FloatArray { .. } => "float array",
            Self::IntArray { .. } => "int array",
            Self::ComplexArray { .. } => "complex array",
        }
    }

    /// Returns the shape for array values, `None` for scalars.
    pub fn shape(&self) -> Option<&[usize]> {
        match self {
            Self::FloatArray { shape, .. }
            | Self::IntArray { shape, .. }
            | Self::ComplexArray { shape, .. } => Some(shape),
            _ => None,
        }
    }
}
