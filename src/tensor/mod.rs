//! Thin tensor-operation layer over `ndarray`
//!
//! Penalties only ever touch weights through the functions here, so the
//! shape errors they can raise are all defined in one place.

mod variable;

pub use variable::Variable;

use ndarray::{Array, Array1, Array2, ArrayBase, ArrayView2, Data, Dimension, Ix2};
use num_traits::ToPrimitive;

/// Element type of every tensor the penalties see
pub type Floatx = f32;

/// Errors raised by tensor operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TensorError {
    /// Operand shapes do not line up
    #[error("Incompatible shapes for {op}: {lhs:?} and {rhs:?}")]
    ShapeMismatch {
        /// Operation that failed
        op: &'static str,
        /// Left operand shape
        lhs: Vec<usize>,
        /// Right operand shape
        rhs: Vec<usize>,
    },

    /// Tensor has the wrong number of dimensions
    #[error("Expected a rank-{expected} tensor, got rank {actual}")]
    RankMismatch {
        /// Required rank
        expected: usize,
        /// Rank of the tensor given
        actual: usize,
    },

    /// Nested host array whose rows differ in length
    #[error("Ragged array: row {row} has {actual} entries, expected {expected}")]
    RaggedArray {
        /// Offending row index
        row: usize,
        /// Length of the first row
        expected: usize,
        /// Length of the offending row
        actual: usize,
    },

    /// Host entry that is NaN or infinite
    #[error("Non-finite value at row {row}, column {col}")]
    NonFinite {
        /// Row of the entry
        row: usize,
        /// Column of the entry
        col: usize,
    },

    /// An operation that needs at least one operand got none
    #[error("Expected at least one tensor for {0}")]
    EmptyInput(&'static str),

    /// Host value has no floatx representation
    #[error("Value is not representable as {0}")]
    NotRepresentable(&'static str),
}

/// Elementwise absolute value
pub fn abs<S, D>(x: &ArrayBase<S, D>) -> Array<Floatx, D>
where
    S: Data<Elem = Floatx>,
    D: Dimension,
{
    x.mapv(Floatx::abs)
}

/// Elementwise square
pub fn square<S, D>(x: &ArrayBase<S, D>) -> Array<Floatx, D>
where
    S: Data<Elem = Floatx>,
    D: Dimension,
{
    x.mapv(|v| v * v)
}

/// Multiply every element by a scalar
pub fn scale<S, D>(x: &ArrayBase<S, D>, factor: Floatx) -> Array<Floatx, D>
where
    S: Data<Elem = Floatx>,
    D: Dimension,
{
    x.mapv(|v| v * factor)
}

/// Elementwise sum of two tensors of identical shape
pub fn add<S1, S2, D>(
    lhs: &ArrayBase<S1, D>,
    rhs: &ArrayBase<S2, D>,
) -> Result<Array<Floatx, D>, TensorError>
where
    S1: Data<Elem = Floatx>,
    S2: Data<Elem = Floatx>,
    D: Dimension,
{
    if lhs.shape() != rhs.shape() {
        return Err(TensorError::ShapeMismatch {
            op: "add",
            lhs: lhs.shape().to_vec(),
            rhs: rhs.shape().to_vec(),
        });
    }
    let mut out = lhs.to_owned();
    out.zip_mut_with(rhs, |a, &b| *a += b);
    Ok(out)
}

/// Sum over all elements
pub fn sum<S, D>(x: &ArrayBase<S, D>) -> Floatx
where
    S: Data<Elem = Floatx>,
    D: Dimension,
{
    x.sum()
}

/// View an arbitrary-rank tensor as a matrix
pub fn to_matrix<S, D>(x: &ArrayBase<S, D>) -> Result<ArrayView2<'_, Floatx>, TensorError>
where
    S: Data<Elem = Floatx>,
    D: Dimension,
{
    x.view()
        .into_dimensionality::<Ix2>()
        .map_err(|_| TensorError::RankMismatch {
            expected: 2,
            actual: x.ndim(),
        })
}

/// Matrix transpose (a view, no copy)
pub fn transpose<'a>(m: ArrayView2<'a, Floatx>) -> ArrayView2<'a, Floatx> {
    m.reversed_axes()
}

/// Matrix product `lhs @ rhs`
pub fn matmul<S1, S2>(
    lhs: &ArrayBase<S1, Ix2>,
    rhs: &ArrayBase<S2, Ix2>,
) -> Result<Array2<Floatx>, TensorError>
where
    S1: Data<Elem = Floatx>,
    S2: Data<Elem = Floatx>,
{
    if lhs.ncols() != rhs.nrows() {
        return Err(TensorError::ShapeMismatch {
            op: "matmul",
            lhs: lhs.shape().to_vec(),
            rhs: rhs.shape().to_vec(),
        });
    }
    Ok(lhs.dot(rhs))
}

/// Main diagonal of a matrix: `min(rows, cols)` entries
pub fn diag_part<S>(m: &ArrayBase<S, Ix2>) -> Array1<Floatx>
where
    S: Data<Elem = Floatx>,
{
    m.diag().to_owned()
}

/// Convert a host number to floatx precision
pub fn cast_to_floatx<T: ToPrimitive>(value: T) -> Result<Floatx, TensorError> {
    value.to_f32().ok_or(TensorError::NotRepresentable("float32"))
}
