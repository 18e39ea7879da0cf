//! Regularizer capability and the built-in penalties

mod class_average;
mod function;
mod l1_l2;

pub use class_average::ClassAverageRegularizer;
pub use function::FnRegularizer;
pub use l1_l2::{l1, l1_l2, l2, L1L2, DEFAULT_FACTOR};
pub(crate) use l1_l2::{l1_from_config, l1_l2_from_config, l2_from_config};

use std::fmt;
use std::sync::Arc;

use ndarray::ArrayViewD;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::tensor::Floatx;
use crate::{RegularizerError, Result};

/// Constructor parameters of a regularizer, keyed by name
pub type Config = serde_json::Map<String, Value>;

/// A penalty on a weight tensor, added to the training loss
pub trait Regularizer: fmt::Debug + Send + Sync {
    /// Name the registry knows this regularizer by
    fn class_name(&self) -> &str;

    /// Scalar penalty for `weights`
    fn penalty(&self, weights: ArrayViewD<'_, Floatx>) -> Result<Floatx>;

    /// Parameters needed to rebuild this regularizer
    fn config(&self) -> Config {
        Config::new()
    }
}

/// Reconstruction of a regularizer from its exported [`Config`]
pub trait FromConfig: Sized {
    /// Build an instance; unknown keys are an error
    fn from_config(config: &Config) -> Result<Self>;
}

impl<R: Regularizer + ?Sized> Regularizer for Arc<R> {
    fn class_name(&self) -> &str {
        (**self).class_name()
    }

    fn penalty(&self, weights: ArrayViewD<'_, Floatx>) -> Result<Floatx> {
        (**self).penalty(weights)
    }

    fn config(&self) -> Config {
        (**self).config()
    }
}

impl<R: Regularizer + ?Sized> Regularizer for Box<R> {
    fn class_name(&self) -> &str {
        (**self).class_name()
    }

    fn penalty(&self, weights: ArrayViewD<'_, Floatx>) -> Result<Floatx> {
        (**self).penalty(weights)
    }

    fn config(&self) -> Config {
        (**self).config()
    }
}

/// Bind a config mapping to a parameter struct
pub(crate) fn bind<P: DeserializeOwned>(class_name: &str, config: &Config) -> Result<P> {
    serde_json::from_value(Value::Object(config.clone())).map_err(|source| {
        RegularizerError::InvalidConfig {
            class_name: class_name.to_string(),
            source,
        }
    })
}

/// The base regularizer: always a zero penalty
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NoRegularizer;

impl NoRegularizer {
    /// Registry name
    pub const CLASS_NAME: &'static str = "Regularizer";
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NoParams {}

impl Regularizer for NoRegularizer {
    fn class_name(&self) -> &str {
        Self::CLASS_NAME
    }

    fn penalty(&self, _weights: ArrayViewD<'_, Floatx>) -> Result<Floatx> {
        Ok(0.0)
    }
}

/// Fail unless `config` is empty
pub(crate) fn expect_empty(class_name: &str, config: &Config) -> Result<()> {
    let NoParams {} = bind(class_name, config)?;
    Ok(())
}

impl FromConfig for NoRegularizer {
    fn from_config(config: &Config) -> Result<Self> {
        expect_empty(Self::CLASS_NAME, config)?;
        Ok(NoRegularizer)
    }
}
