//! # nn-regularizers: weight penalties for neural network training
//!
//! Regularizers map a weight tensor to a scalar penalty that a training loop
//! adds to its loss. Gradients are left to whatever differentiation engine
//! drives the training; this crate only evaluates the penalty terms.
//!
//! ## Features
//!
//! - **L1 / L2**: [`L1L2`] plus the [`l1`], [`l2`] and [`l1_l2`] shorthands
//! - **Class averages**: [`ClassAverageRegularizer`] weights each output unit
//!   by a precomputed per-class coefficient matrix
//! - **Custom penalties**: any closure through [`FnRegularizer`]
//! - **Registry**: resolve regularizers by name or `{class_name, config}`
//!   entries, and export them back
//! - **Layer settings**: kernel/bias/activity regularizers loaded from JSON

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Tensor operations the penalties are built from
pub mod tensor;

/// Regularizer capability and the built-in penalties
pub mod regularizers;

/// Name and config based lookup of regularizers
pub mod registry;

/// Per-layer regularization settings
pub mod config;

pub use regularizers::{
    l1, l1_l2, l2, ClassAverageRegularizer, Config, FnRegularizer, FromConfig, L1L2,
    NoRegularizer, Regularizer,
};
pub use registry::{deserialize, get, serialize, Identifier, Registry, RegistryEntry};
pub use config::{LayerRegularization, ResolvedRegularization};
pub use tensor::{TensorError, Variable};

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum RegularizerError {
    /// `get` was handed something that names no regularizer
    #[error("Could not interpret regularizer identifier: {0}")]
    InvalidIdentifier(String),

    /// No factory is registered under this class name
    #[error("Unknown regularizer: {0}")]
    UnknownRegularizer(String),

    /// A config mapping did not bind to the constructor's parameters
    #[error("Invalid config for {class_name}: {source}")]
    InvalidConfig {
        /// Class whose config was rejected
        class_name: String,
        /// Binding failure (unknown key, wrong type, missing key)
        #[source]
        source: serde_json::Error,
    },

    /// A penalty factor outside the accepted range
    #[error("Invalid factor {name}={value}: must be finite and non-negative")]
    InvalidFactor {
        /// Parameter name
        name: &'static str,
        /// Rejected value
        value: f64,
    },

    /// Shape or rank error from the tensor layer
    #[error("Tensor error: {0}")]
    Tensor(#[from] TensorError),

    /// Settings file could not be read or written
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Settings file is not valid JSON for its type
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for the library
pub type Result<T> = std::result::Result<T, RegularizerError>;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        config::{LayerRegularization, ResolvedRegularization},
        registry::{deserialize, get, serialize, Identifier, Registry, RegistryEntry},
        regularizers::{
            l1, l1_l2, l2, ClassAverageRegularizer, Config, FnRegularizer, FromConfig, L1L2,
            NoRegularizer, Regularizer,
        },
        Result, RegularizerError,
    };
}
