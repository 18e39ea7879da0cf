//! Class-average weighted L2 penalty

use ndarray::{Array2, ArrayViewD};
use serde::Deserialize;
use serde_json::Value;

use super::{bind, Config, FromConfig, Regularizer};
use crate::tensor::{self, Floatx, TensorError, Variable};
use crate::Result;

/// Penalizes squared weights against a per-class coefficient matrix
///
/// For a weight matrix `W` of shape `[in, out]` and a class-average matrix
/// `C` of shape `[in, classes]`:
///
/// `penalty(W) = sum(diag(lambda * (W²)ᵀ @ C))`
///
/// so output unit `j` is charged `lambda * Σᵢ W[i, j]² * C[i, j]`.
///
/// # Preconditions
///
/// - `W` is 2-D and its leading dimension equals the row count of `C`;
///   otherwise the penalty fails with a [`TensorError`].
/// - `out == classes`. The diagonal only covers `min(out, classes)` units,
///   so with any other shape some units or classes are silently left out.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassAverageRegularizer {
    lambda: Floatx,
    class_average: Variable,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassAverageParams {
    #[serde(alias = "lambd")]
    lambda: f64,
    #[serde(alias = "C_avg")]
    class_average: Vec<Vec<Floatx>>,
}

impl ClassAverageRegularizer {
    /// Registry name
    pub const CLASS_NAME: &'static str = "ClassAverageRegularizer";

    /// Name older saved models use for this regularizer
    pub const LEGACY_CLASS_NAME: &'static str = "Memoire_Regularizer";

    /// Create a regularizer; the coefficient matrix is materialized here, once
    ///
    /// Coefficients should be finite: JSON has no NaN or infinity, so
    /// [`config`](Regularizer::config) writes such entries as `null` and the
    /// exported config no longer loads.
    pub fn new(lambda: Floatx, class_average: Array2<Floatx>) -> Self {
        ClassAverageRegularizer {
            lambda,
            class_average: Variable::new(class_average),
        }
    }

    /// Create from nested host rows; ragged or non-finite rows are rejected
    pub fn from_rows(lambda: Floatx, rows: &[Vec<Floatx>]) -> Result<Self> {
        Ok(ClassAverageRegularizer {
            lambda,
            class_average: Variable::from_rows(rows)?,
        })
    }

    /// Create from per-channel coefficient matrices (e.g. red, green, blue)
    ///
    /// The class-average matrix is their elementwise mean. All channels must
    /// share one shape.
    pub fn from_channels(lambda: Floatx, channels: &[Array2<Floatx>]) -> Result<Self> {
        let (first, rest) = channels
            .split_first()
            .ok_or(TensorError::EmptyInput("from_channels"))?;

        let mut total = first.clone();
        for channel in rest {
            total = tensor::add(&total, channel)?;
        }
        let mean = tensor::scale(&total, 1.0 / channels.len() as Floatx);

        Ok(Self::new(lambda, mean))
    }

    /// Scale factor
    pub fn lambda(&self) -> Floatx {
        self.lambda
    }

    /// The materialized coefficient matrix
    pub fn class_average(&self) -> &Variable {
        &self.class_average
    }
}

impl Regularizer for ClassAverageRegularizer {
    fn class_name(&self) -> &str {
        Self::CLASS_NAME
    }

    fn penalty(&self, weights: ArrayViewD<'_, Floatx>) -> Result<Floatx> {
        let weights = tensor::to_matrix(&weights)?;
        let squared = tensor::square(&weights);
        let dot_product =
            tensor::matmul(&tensor::transpose(squared.view()), &self.class_average.view())?;
        let scaled = tensor::scale(&dot_product, self.lambda);
        let regularization = tensor::sum(&tensor::diag_part(&scaled));
        tracing::trace!(lambda = self.lambda, regularization, "Class-average penalty");
        Ok(regularization)
    }

    fn config(&self) -> Config {
        let rows = self
            .class_average
            .eval()
            .into_iter()
            .map(|row| row.into_iter().map(|v| Value::from(f64::from(v))).collect())
            .collect();

        let mut config = Config::new();
        config.insert("lambda".to_string(), Value::from(f64::from(self.lambda)));
        config.insert("class_average".to_string(), Value::Array(rows));
        config
    }
}

impl FromConfig for ClassAverageRegularizer {
    fn from_config(config: &Config) -> Result<Self> {
        let params: ClassAverageParams = bind(Self::CLASS_NAME, config)?;
        Self::from_rows(tensor::cast_to_floatx(params.lambda)?, &params.class_average)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RegularizerError;
    use ndarray::{arr1, arr2};
    use serde_json::json;

    #[test]
    fn test_identity_class_average() {
        let reg = ClassAverageRegularizer::new(2.0, Array2::eye(2));
        let w = arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn();
        // (W²)ᵀ @ I = (W²)ᵀ, diagonal = [1, 16]
        assert_eq!(reg.penalty(w.view()).unwrap(), 34.0);
    }

    #[test]
    fn test_general_class_average() {
        let reg = ClassAverageRegularizer::new(0.5, arr2(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]));
        let w = arr2(&[[1.0, 0.0], [1.0, 2.0], [0.0, 1.0]]).into_dyn();
        // unit 0: 1*1 + 1*3 + 0*5 = 4, unit 1: 0*2 + 4*4 + 1*6 = 22
        assert_eq!(reg.penalty(w.view()).unwrap(), 0.5 * 26.0);
    }

    #[test]
    fn test_fewer_outputs_than_classes() {
        let reg = ClassAverageRegularizer::new(1.0, arr2(&[[1.0, 1.0, 1.0], [1.0, 1.0, 1.0]]));
        let w = arr2(&[[2.0], [3.0]]).into_dyn();
        // only one output unit, so the diagonal has one entry: 4 + 9
        assert_eq!(reg.penalty(w.view()).unwrap(), 13.0);
    }

    #[test]
    fn test_shape_mismatch_is_tensor_error() {
        let reg = ClassAverageRegularizer::new(1.0, Array2::eye(3));
        let w = arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn();
        assert!(matches!(
            reg.penalty(w.view()),
            Err(RegularizerError::Tensor(TensorError::ShapeMismatch { op: "matmul", .. }))
        ));

        let v = arr1(&[1.0, 2.0, 3.0]).into_dyn();
        assert!(matches!(
            reg.penalty(v.view()),
            Err(RegularizerError::Tensor(TensorError::RankMismatch { expected: 2, actual: 1 }))
        ));
    }

    #[test]
    fn test_from_channels_is_mean() {
        let red = arr2(&[[3.0, 0.0], [0.0, 3.0]]);
        let green = arr2(&[[0.0, 3.0], [3.0, 0.0]]);
        let blue = arr2(&[[3.0, 3.0], [3.0, 3.0]]);
        let reg = ClassAverageRegularizer::from_channels(1.5, &[red, green, blue]).unwrap();
        assert_eq!(reg.class_average().shape(), (2, 2));
        assert!(reg.class_average().view().iter().all(|&v| (v - 2.0).abs() < 1e-6));
        assert_eq!(reg.lambda(), 1.5);

        let err = ClassAverageRegularizer::from_channels(1.0, &[Array2::eye(2), Array2::eye(3)])
            .unwrap_err();
        assert!(matches!(
            err,
            RegularizerError::Tensor(TensorError::ShapeMismatch { op: "add", .. })
        ));

        assert!(matches!(
            ClassAverageRegularizer::from_channels(1.0, &[]),
            Err(RegularizerError::Tensor(TensorError::EmptyInput(_)))
        ));
    }

    #[test]
    fn test_config_round_trip() {
        let reg = ClassAverageRegularizer::new(0.25, arr2(&[[0.5, 1.0], [1.5, 2.0]]));
        let config = reg.config();
        assert_eq!(
            Value::Object(config.clone()),
            json!({"lambda": 0.25, "class_average": [[0.5, 1.0], [1.5, 2.0]]})
        );

        let rebuilt = ClassAverageRegularizer::from_config(&config).unwrap();
        assert_eq!(rebuilt, reg);
    }

    #[test]
    fn test_from_config_accepts_legacy_keys() {
        let config = json!({"lambd": 2.0, "C_avg": [[1.0, 0.0], [0.0, 1.0]]})
            .as_object()
            .cloned()
            .unwrap();
        let reg = ClassAverageRegularizer::from_config(&config).unwrap();
        assert_eq!(reg.lambda(), 2.0);
        assert_eq!(reg.class_average().shape(), (2, 2));
    }

    #[test]
    fn test_from_config_errors() {
        let missing = json!({"lambda": 1.0}).as_object().cloned().unwrap();
        assert!(matches!(
            ClassAverageRegularizer::from_config(&missing),
            Err(RegularizerError::InvalidConfig { .. })
        ));

        let ragged = json!({"lambda": 1.0, "class_average": [[1.0, 2.0], [3.0]]})
            .as_object()
            .cloned()
            .unwrap();
        assert!(matches!(
            ClassAverageRegularizer::from_config(&ragged),
            Err(RegularizerError::Tensor(TensorError::RaggedArray { row: 1, .. }))
        ));

        assert!(matches!(
            ClassAverageRegularizer::from_rows(1.0, &[vec![1.0, f32::NAN]]),
            Err(RegularizerError::Tensor(TensorError::NonFinite { row: 0, col: 1 }))
        ));

        let extra = json!({"lambda": 1.0, "class_average": [[1.0]], "bias": 3})
            .as_object()
            .cloned()
            .unwrap();
        assert!(matches!(
            ClassAverageRegularizer::from_config(&extra),
            Err(RegularizerError::InvalidConfig { .. })
        ));
    }
}
