//! Things `get` knows how to turn into a regularizer

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::regularizers::{Config, Regularizer};

/// Exchange format of a regularizer: `{"class_name": ..., "config": {...}}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Registered name of the regularizer
    pub class_name: String,
    /// Constructor parameters
    #[serde(default)]
    pub config: Config,
}

impl RegistryEntry {
    /// Entry with an empty config
    pub fn named(class_name: impl Into<String>) -> Self {
        RegistryEntry {
            class_name: class_name.into(),
            config: Config::new(),
        }
    }
}

/// Input accepted by [`Registry::get`](super::Registry::get)
#[derive(Clone, Debug)]
pub enum Identifier {
    /// No regularization
    None,
    /// A registered name, with default parameters
    Name(String),
    /// A full registry entry
    Entry(RegistryEntry),
    /// A ready regularizer, passed through untouched
    Callable(Arc<dyn Regularizer>),
    /// Anything else; rejected by `get`
    Unrecognized(Value),
}

impl Identifier {
    /// Wrap a regularizer instance
    pub fn callable<R: Regularizer + 'static>(regularizer: R) -> Self {
        Identifier::Callable(Arc::new(regularizer))
    }
}

impl From<Value> for Identifier {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Identifier::None,
            Value::String(name) => Identifier::Name(name),
            Value::Object(map) => {
                let value = Value::Object(map);
                match RegistryEntry::deserialize(&value) {
                    Ok(entry) => Identifier::Entry(entry),
                    Err(_) => Identifier::Unrecognized(value),
                }
            }
            other => Identifier::Unrecognized(other),
        }
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier::Name(name.to_string())
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Identifier::Name(name)
    }
}

impl From<RegistryEntry> for Identifier {
    fn from(entry: RegistryEntry) -> Self {
        Identifier::Entry(entry)
    }
}

impl From<Arc<dyn Regularizer>> for Identifier {
    fn from(regularizer: Arc<dyn Regularizer>) -> Self {
        Identifier::Callable(regularizer)
    }
}

impl<T: Into<Identifier>> From<Option<T>> for Identifier {
    fn from(value: Option<T>) -> Self {
        value.map_or(Identifier::None, Into::into)
    }
}
