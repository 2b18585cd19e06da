//! The structured record store contract.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use num_complex::Complex64;

use crate::error::RecordError;
use crate::value::Value;

/// Hierarchical store of named values with a current-group cursor.
///
/// Implementors provide the six primitive operations; the typed `set_*` and
/// `read_*` helpers are built on top of [`set`](Self::set) and
/// [`get`](Self::get).
pub trait RecordStore {
    /// Stores `value` under `name` in the current group, replacing any
    /// previous value.
    fn set(&mut self, name: &str, value: Value) -> Result<(), RecordError>;

    /// Returns a copy of the value stored under `name` in the current group.
    fn get(&self, name: &str) -> Result<Value, RecordError>;

    /// Returns `true` if the current group holds a value named `name`.
    fn contains(&self, name: &str) -> bool;

    /// Creates a child group of the current group. Existing groups are kept.
    fn create_group(&mut self, name: &str) -> Result<(), RecordError>;

    /// Returns `true` if the current group has a child group named `name`.
    fn has_group(&self, name: &str) -> bool;

    /// Changes the current group.
    ///
    /// `path` is a `/`-separated list of group names; `..` moves to the parent
    /// and a leading `/` starts from the root.
    fn cd(&mut self, path: &str) -> Result<(), RecordError>;

    fn set_i64(&mut self, name: &str, value: i64) -> Result<(), RecordError> {
        self.set(name, Value::Int { value })
    }

    fn set_f64(&mut self, name: &str, value: f64) -> Result<(), RecordError> {
        self.set(name, Value::Float { value })
    }

    fn set_bool(&mut self, name: &str, value: bool) -> Result<(), RecordError> {
        self.set(name, Value::Bool { value })
    }

    fn set_str(&mut self, name: &str, value: &str) -> Result<(), RecordError> {
        self.set(
            name,
            Value::Str {
                value: value.to_string(),
            },
        )
    }

    fn set_array1(&mut self, name: &str, array: ArrayView1<'_, f64>) -> Result<(), RecordError> {
        self.set(
            name,
            Value::FloatArray {
                shape: vec![array.len()],
                data: array.iter().copied().collect(),
            },
        )
    }

    fn set_array2(&mut self, name: &str, array: ArrayView2<'_, f64>) -> Result<(), RecordError> {
        self.set(
            name,
            Value::FloatArray {
                shape: array.shape().to_vec(),
                data: array.iter().copied().collect(),
            },
        )
    }

    fn set_int_array1(&mut self, name: &str, data: &[i64]) -> Result<(), RecordError> {
        self.set(
            name,
            Value::IntArray {
                shape: vec![data.len()],
                data: data.to_vec(),
            },
        )
    }

    fn set_int_array2(&mut self, name: &str, array: ArrayView2<'_, i64>) -> Result<(), RecordError> {
        self.set(
            name,
            Value::IntArray {
                shape: array.shape().to_vec(),
                data: array.iter().copied().collect(),
            },
        )
    }

    fn set_complex_array1(
        &mut self,
        name: &str,
        array: ArrayView1<'_, Complex64>,
    ) -> Result<(), RecordError> {
        self.set(
            name,
            Value::ComplexArray {
                shape: vec![array.len()],
                data: array.iter().map(|c| [c.re, c.im]).collect(),
            },
        )
    }

    fn read_i64(&self, name: &str) -> Result<i64, RecordError> {
        match self.get(name)? {
            Value::Int { value } => Ok(value),
            other => Err(type_mismatch(name, "int", &other)),
        }
    }

    /// Reads a float; integer values are widened.
    fn read_f64(&self, name: &str) -> Result<f64, RecordError> {
        match self.get(name)? {
            Value::Float { value } => Ok(value),
            Value::Int { value } => Ok(value as f64),
            other => Err(type_mismatch(name, "float", &other)),
        }
    }

    fn read_bool(&self, name: &str) -> Result<bool, RecordError> {
        match self.get(name)? {
            Value::Bool { value } => Ok(value),
            other => Err(type_mismatch(name, "bool", &other)),
        }
    }

    fn read_string(&self, name: &str) -> Result<String, RecordError> {
        match self.get(name)? {
            Value::Str { value } => Ok(value),
            other => Err(type_mismatch(name, "string", &other)),
        }
    }

    fn read_array1(&self, name: &str) -> Result<Array1<f64>, RecordError> {
        match self.get(name)? {
            Value::FloatArray { shape, data } => {
                check_rank(name, &shape, 1, data.len())?;
                Ok(Array1::from_vec(data))
            }
            other => Err(type_mismatch(name, "float array", &other)),
        }
    }

    fn read_array2(&self, name: &str) -> Result<Array2<f64>, RecordError> {
        match self.get(name)? {
            Value::FloatArray { shape, data } => {
                check_rank(name, &shape, 2, data.len())?;
                Array2::from_shape_vec((shape[0], shape[1]), data)
                    .map_err(|_| shape_mismatch(name, 2, shape))
            }
            other => Err(type_mismatch(name, "float array", &other)),
        }
    }

    fn read_int_array1(&self, name: &str) -> Result<Vec<i64>, RecordError> {
        match self.get(name)? {
            Value::IntArray { shape, data } => {
                check_rank(name, &shape, 1, data.len())?;
                Ok(data)
            }
            other => Err(type_mismatch(name, "int array", &other)),
        }
    }

    fn read_int_array2(&self, name: &str) -> Result<Array2<i64>, RecordError> {
        match self.get(name)? {
            Value::IntArray { shape, data } => {
                check_rank(name, &shape, 2, data.len())?;
                Array2::from_shape_vec((shape[0], shape[1]), data)
                    .map_err(|_| shape_mismatch(name, 2, shape))
            }
            other => Err(type_mismatch(name, "int array", &other)),
        }
    }

    fn read_complex_array1(&self, name: &str) -> Result<Array1<Complex64>, RecordError> {
        match self.get(name)? {
            Value::ComplexArray { shape, data } => {
                check_rank(name, &shape, 1, data.len())?;
                Ok(data.iter().map(|&[re, im]| Complex64::new(re, im)).collect())
            }
            other => Err(type_mismatch(name, "complex array", &other)),
        }
    }
}

fn type_mismatch(name: &str, expected: &'static str, found: &Value) -> RecordError {
    RecordError::TypeMismatch {
        name: name.to_string(),
        expected,
        found: found.kind_name(),
    }
}

fn shape_mismatch(name: &str, rank: usize, shape: Vec<usize>) -> RecordError {
    RecordError::ShapeMismatch {
        name: name.to_string(),
        rank,
        shape,
    }
}

/// Checks the declared rank and that the shape product matches the data length.
fn check_rank(name: &str, shape: &[usize], rank: usize, len: usize) -> Result<(), RecordError> {
    if shape.len() != rank || shape.iter().product::<usize>() != len {
        return Err(shape_mismatch(name, rank, shape.to_vec()));
    }
    Ok(())
}
