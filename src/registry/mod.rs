//! Registry of regularizer factories
//!
//! A [`Registry`] maps class names to factories that rebuild a regularizer
//! from its [`Config`]. [`Registry::builtin`] holds the regularizers shipped
//! with this crate; callers layer their own names on top by passing a second
//! registry as `custom_objects`, which is searched first.

mod identifier;

pub use identifier::{Identifier, RegistryEntry};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::regularizers::{
    expect_empty, l1_from_config, l1_l2_from_config, l2_from_config, ClassAverageRegularizer,
    Config, FromConfig, L1L2, NoRegularizer, Regularizer,
};
use crate::{RegularizerError, Result};

/// Rebuilds a regularizer from its config
pub type Factory = Arc<dyn Fn(&Config) -> Result<Arc<dyn Regularizer>> + Send + Sync>;

static BUILTINS: Lazy<Registry> = Lazy::new(Registry::builtin);

/// Name → factory table
#[derive(Clone, Default)]
pub struct Registry {
    factories: HashMap<String, Factory>,
}

impl Registry {
    /// Empty registry, the default `custom_objects`
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every regularizer this crate provides
    pub fn builtin() -> Self {
        let mut registry = Registry::new();
        registry
            .register_type::<NoRegularizer>(NoRegularizer::CLASS_NAME)
            .register_type::<L1L2>(L1L2::CLASS_NAME)
            .register_type::<ClassAverageRegularizer>(ClassAverageRegularizer::CLASS_NAME)
            .register_type::<ClassAverageRegularizer>(ClassAverageRegularizer::LEGACY_CLASS_NAME)
            .register("l1", |config| Ok(Arc::new(l1_from_config(config)?) as Arc<dyn Regularizer>))
            .register("l2", |config| Ok(Arc::new(l2_from_config(config)?) as Arc<dyn Regularizer>))
            .register("l1_l2", |config| {
                Ok(Arc::new(l1_l2_from_config(config)?) as Arc<dyn Regularizer>)
            });
        registry
    }

    /// Register a factory under `name`, replacing any previous one
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&Config) -> Result<Arc<dyn Regularizer>> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            tracing::warn!(name = %name, "Replacing registered regularizer");
        }
        self.factories.insert(name, Arc::new(factory));
        self
    }

    /// Register a type that knows how to rebuild itself
    pub fn register_type<R>(&mut self, name: impl Into<String>) -> &mut Self
    where
        R: Regularizer + FromConfig + 'static,
    {
        self.register(name, |config| Ok(Arc::new(R::from_config(config)?) as Arc<dyn Regularizer>))
    }

    /// Register a fixed instance, handed out for an empty config
    ///
    /// This is how regularizers without a config (such as
    /// [`FnRegularizer`](crate::FnRegularizer)) are made resolvable.
    pub fn register_instance(&mut self, regularizer: Arc<dyn Regularizer>) -> &mut Self {
        let name = regularizer.class_name().to_string();
        let class_name = name.clone();
        self.register(name, move |config| {
            expect_empty(&class_name, config)?;
            Ok(Arc::clone(&regularizer))
        })
    }

    /// Whether `name` has a factory
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Rebuild the regularizer an entry describes
    ///
    /// `custom_objects` is searched before this registry.
    pub fn deserialize(
        &self,
        entry: &RegistryEntry,
        custom_objects: &Registry,
    ) -> Result<Arc<dyn Regularizer>> {
        let factory = custom_objects
            .factories
            .get(&entry.class_name)
            .or_else(|| self.factories.get(&entry.class_name))
            .ok_or_else(|| RegularizerError::UnknownRegularizer(entry.class_name.clone()))?;

        tracing::debug!(class_name = %entry.class_name, "Deserializing regularizer");
        factory(&entry.config)
    }

    /// Resolve an identifier: nothing, a name, an entry or a ready regularizer
    pub fn get(&self, identifier: impl Into<Identifier>) -> Result<Option<Arc<dyn Regularizer>>> {
        match identifier.into() {
            Identifier::None => Ok(None),
            Identifier::Name(name) => {
                self.deserialize(&RegistryEntry::named(name), &Registry::new()).map(Some)
            }
            Identifier::Entry(entry) => self.deserialize(&entry, &Registry::new()).map(Some),
            Identifier::Callable(regularizer) => Ok(Some(regularizer)),
            Identifier::Unrecognized(value) => {
                Err(RegularizerError::InvalidIdentifier(value.to_string()))
            }
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("names", &self.names()).finish()
    }
}

/// The shared built-in registry
pub fn builtins() -> &'static Registry {
    &BUILTINS
}

/// Export a regularizer as a registry entry
pub fn serialize<R: Regularizer + ?Sized>(regularizer: &R) -> RegistryEntry {
    RegistryEntry {
        class_name: regularizer.class_name().to_string(),
        config: regularizer.config(),
    }
}

/// Rebuild a regularizer, looking in `custom_objects` before the built-ins
pub fn deserialize(
    entry: &RegistryEntry,
    custom_objects: &Registry,
) -> Result<Arc<dyn Regularizer>> {
    builtins().deserialize(entry, custom_objects)
}

/// Resolve an identifier against the built-ins
pub fn get(identifier: impl Into<Identifier>) -> Result<Option<Arc<dyn Regularizer>>> {
    builtins().get(identifier)
}
