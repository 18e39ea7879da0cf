//! Tensor variables materialized from host arrays

use std::sync::Arc;

use ndarray::{Array2, ArrayView2};

use super::{Floatx, TensorError};

/// A read-only matrix materialized once and shared by reference
///
/// Cloning a variable shares the underlying storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    value: Arc<Array2<Floatx>>,
}

impl Variable {
    /// Take ownership of an existing matrix
    pub fn new(value: Array2<Floatx>) -> Self {
        tracing::debug!(rows = value.nrows(), cols = value.ncols(), "Materializing variable");
        Variable {
            value: Arc::new(value),
        }
    }

    /// Build a variable from nested host rows
    ///
    /// Every row must have the length of the first one, and every entry
    /// must be finite.
    pub fn from_rows(rows: &[Vec<Floatx>]) -> Result<Self, TensorError> {
        let ncols = rows.first().map_or(0, Vec::len);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != ncols {
                return Err(TensorError::RaggedArray {
                    row,
                    expected: ncols,
                    actual: values.len(),
                });
            }
            if let Some(col) = values.iter().position(|v| !v.is_finite()) {
                return Err(TensorError::NonFinite { row, col });
            }
        }

        let flat: Vec<Floatx> = rows.iter().flatten().copied().collect();
        let value = Array2::from_shape_vec((rows.len(), ncols), flat).map_err(|_| {
            TensorError::ShapeMismatch {
                op: "from_rows",
                lhs: vec![rows.len(), ncols],
                rhs: vec![rows.iter().map(Vec::len).sum()],
            }
        })?;
        Ok(Self::new(value))
    }

    /// Borrow the stored matrix
    pub fn view(&self) -> ArrayView2<'_, Floatx> {
        self.value.view()
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.value.dim()
    }

    /// Copy the value back out as nested host rows
    pub fn eval(&self) -> Vec<Vec<Floatx>> {
        self.value.rows().into_iter().map(|row| row.to_vec()).collect()
    }
}

impl From<Array2<Floatx>> for Variable {
    fn from(value: Array2<Floatx>) -> Self {
        Variable::new(value)
    }
}
