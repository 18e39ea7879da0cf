//! Regularization settings for a layer's kernel, bias and activity

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use ndarray::ArrayViewD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::{self, Identifier, Registry};
use crate::regularizers::Regularizer;
use crate::tensor::Floatx;
use crate::{RegularizerError, Result};

/// Serializable regularizer identifiers of one layer
///
/// Each slot holds null, a registered name, or a
/// `{"class_name": ..., "config": {...}}` entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerRegularization {
    /// Penalty on the weight matrix
    #[serde(default)]
    pub kernel_regularizer: Option<Value>,
    /// Penalty on the bias vector
    #[serde(default)]
    pub bias_regularizer: Option<Value>,
    /// Penalty on the layer output
    #[serde(default)]
    pub activity_regularizer: Option<Value>,
}

impl LayerRegularization {
    /// Settings with only a kernel regularizer
    pub fn with_kernel(kernel: impl Into<Value>) -> Self {
        LayerRegularization {
            kernel_regularizer: Some(kernel.into()),
            ..Default::default()
        }
    }

    /// Check every slot is a shape `get` accepts, without building anything
    pub fn validate(&self) -> Result<()> {
        for value in self.slots().into_iter().flatten() {
            if let Identifier::Unrecognized(value) = Identifier::from(value.clone()) {
                return Err(RegularizerError::InvalidIdentifier(value.to_string()));
            }
        }
        Ok(())
    }

    /// Resolve all slots against the built-in registry
    pub fn resolve(&self) -> Result<ResolvedRegularization> {
        self.resolve_with(registry::builtins())
    }

    /// Resolve all slots against `registry`
    pub fn resolve_with(&self, registry: &Registry) -> Result<ResolvedRegularization> {
        let [kernel, bias, activity] = self.slots();
        Ok(ResolvedRegularization {
            kernel: registry.get(kernel.cloned())?,
            bias: registry.get(bias.cloned())?,
            activity: registry.get(activity.cloned())?,
        })
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let settings: LayerRegularization = serde_json::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    fn slots(&self) -> [Option<&Value>; 3] {
        [
            self.kernel_regularizer.as_ref(),
            self.bias_regularizer.as_ref(),
            self.activity_regularizer.as_ref(),
        ]
    }
}

/// Live regularizers of one layer
#[derive(Clone, Debug, Default)]
pub struct ResolvedRegularization {
    /// Penalty on the weight matrix
    pub kernel: Option<Arc<dyn Regularizer>>,
    /// Penalty on the bias vector
    pub bias: Option<Arc<dyn Regularizer>>,
    /// Penalty on the layer output
    pub activity: Option<Arc<dyn Regularizer>>,
}

impl ResolvedRegularization {
    /// Total penalty; a missing regularizer or tensor contributes nothing
    pub fn penalty<'a>(
        &self,
        kernel: Option<ArrayViewD<'a, Floatx>>,
        bias: Option<ArrayViewD<'a, Floatx>>,
        activations: Option<ArrayViewD<'a, Floatx>>,
    ) -> Result<Floatx> {
        let mut total = 0.0;
        for (regularizer, tensor) in [
            (&self.kernel, kernel),
            (&self.bias, bias),
            (&self.activity, activations),
        ] {
            if let (Some(regularizer), Some(tensor)) = (regularizer, tensor) {
                total += regularizer.penalty(tensor)?;
            }
        }
        Ok(total)
    }

    /// Export back to serializable settings
    pub fn to_settings(&self) -> Result<LayerRegularization> {
        let export = |slot: &Option<Arc<dyn Regularizer>>| -> Result<Option<Value>> {
            match slot {
                Some(regularizer) => {
                    let entry = registry::serialize(regularizer);
                    Ok(Some(serde_json::to_value(entry)?))
                }
                None => Ok(None),
            }
        };
        Ok(LayerRegularization {
            kernel_regularizer: export(&self.kernel)?,
            bias_regularizer: export(&self.bias)?,
            activity_regularizer: export(&self.activity)?,
        })
    }
}
