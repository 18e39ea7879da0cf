//! L1 and L2 weight penalties

use ndarray::ArrayViewD;
use serde::Deserialize;
use serde_json::Value;

use super::{bind, Config, FromConfig, Regularizer};
use crate::tensor::{self, Floatx};
use crate::{RegularizerError, Result};

/// Factor used by [`l1`], [`l2`] and [`l1_l2`] when none is given
pub const DEFAULT_FACTOR: Floatx = 0.01;

/// Weighted sum of the L1 and L2 norms of a tensor
///
/// `penalty(x) = l1 * sum(|x|) + l2 * sum(x²)`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct L1L2 {
    l1: Floatx,
    l2: Floatx,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct L1L2Params {
    #[serde(default)]
    l1: f64,
    #[serde(default)]
    l2: f64,
}

impl L1L2 {
    /// Registry name
    pub const CLASS_NAME: &'static str = "L1L2";

    /// Create a regularizer with the given factors
    pub fn new(l1: Floatx, l2: Floatx) -> Self {
        L1L2 { l1, l2 }
    }

    /// Build from host-precision factors, rejecting negative or non-finite ones
    pub fn try_new(l1: f64, l2: f64) -> Result<Self> {
        Ok(L1L2 {
            l1: checked_factor("l1", l1)?,
            l2: checked_factor("l2", l2)?,
        })
    }

    /// L1 factor
    pub fn l1_factor(&self) -> Floatx {
        self.l1
    }

    /// L2 factor
    pub fn l2_factor(&self) -> Floatx {
        self.l2
    }
}

fn checked_factor(name: &'static str, value: f64) -> Result<Floatx> {
    let factor = tensor::cast_to_floatx(value)?;
    // Finite f64s past f32::MAX cast to infinity
    if !factor.is_finite() || factor < 0.0 {
        return Err(RegularizerError::InvalidFactor { name, value });
    }
    Ok(factor)
}

impl Regularizer for L1L2 {
    fn class_name(&self) -> &str {
        Self::CLASS_NAME
    }

    fn penalty(&self, weights: ArrayViewD<'_, Floatx>) -> Result<Floatx> {
        let mut regularization = 0.0;
        // A zero factor skips its traversal entirely
        if self.l1 != 0.0 {
            regularization += self.l1 * tensor::sum(&tensor::abs(&weights));
        }
        if self.l2 != 0.0 {
            regularization += self.l2 * tensor::sum(&tensor::square(&weights));
        }
        tracing::trace!(l1 = self.l1, l2 = self.l2, regularization, "L1L2 penalty");
        Ok(regularization)
    }

    fn config(&self) -> Config {
        let mut config = Config::new();
        config.insert("l1".to_string(), Value::from(f64::from(self.l1)));
        config.insert("l2".to_string(), Value::from(f64::from(self.l2)));
        config
    }
}

impl FromConfig for L1L2 {
    fn from_config(config: &Config) -> Result<Self> {
        let params: L1L2Params = bind(Self::CLASS_NAME, config)?;
        L1L2::try_new(params.l1, params.l2)
    }
}

/// L1 penalty with factor `l` (default [`DEFAULT_FACTOR`])
pub fn l1(l: impl Into<Option<Floatx>>) -> L1L2 {
    L1L2::new(l.into().unwrap_or(DEFAULT_FACTOR), 0.0)
}

/// L2 penalty with factor `l` (default [`DEFAULT_FACTOR`])
pub fn l2(l: impl Into<Option<Floatx>>) -> L1L2 {
    L1L2::new(0.0, l.into().unwrap_or(DEFAULT_FACTOR))
}

/// Combined penalty; each missing factor defaults to [`DEFAULT_FACTOR`]
pub fn l1_l2(l1: impl Into<Option<Floatx>>, l2: impl Into<Option<Floatx>>) -> L1L2 {
    L1L2::new(
        l1.into().unwrap_or(DEFAULT_FACTOR),
        l2.into().unwrap_or(DEFAULT_FACTOR),
    )
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FactorParams {
    #[serde(default = "default_factor")]
    l: f64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PairParams {
    #[serde(default = "default_factor")]
    l1: f64,
    #[serde(default = "default_factor")]
    l2: f64,
}

fn default_factor() -> f64 {
    f64::from(DEFAULT_FACTOR)
}

/// Registry form of [`l1`]: config `{l}`
pub(crate) fn l1_from_config(config: &Config) -> Result<L1L2> {
    let FactorParams { l } = bind("l1", config)?;
    L1L2::try_new(l, 0.0)
}

/// Registry form of [`l2`]: config `{l}`
pub(crate) fn l2_from_config(config: &Config) -> Result<L1L2> {
    let FactorParams { l } = bind("l2", config)?;
    L1L2::try_new(0.0, l)
}

/// Registry form of [`l1_l2`]: config `{l1, l2}`
pub(crate) fn l1_l2_from_config(config: &Config) -> Result<L1L2> {
    let PairParams { l1, l2 } = bind("l1_l2", config)?;
    L1L2::try_new(l1, l2)
}
