//! Named lookup of the commands a multi-command tool offers.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::engine::Program;
use crate::error::BoxError;

/// Errors raised while resolving a command.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No command is registered under the name.
    #[error("Unknown command: '{name}'")]
    Unknown {
        /// Requested name.
        name: String,
    },
    /// The command exists but could not be built.
    #[error("Cannot load command '{name}': {source}")]
    Construct {
        /// Requested name.
        name: String,
        /// Construction failure.
        #[source]
        source: BoxError,
    },
}

/// Source of commands for a [`ConsoleUtility`](crate::ConsoleUtility).
pub trait CommandRegistry {
    /// Registered command names, sorted.
    fn names(&self) -> Vec<String>;

    /// Builds the command registered as `name`.
    fn fetch(&self, name: &str) -> Result<Box<dyn Program>, RegistryError>;
}

type Factory = Box<dyn Fn() -> Result<Box<dyn Program>, BoxError>>;

/// In-memory registry of command factories.
///
/// Commands are built on every fetch so construction failures, such as an
/// unreadable settings file, surface only for the command being run.
#[derive(Default)]
pub struct StaticRegistry {
    factories: BTreeMap<String, Factory>,
}

impl StaticRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`, replacing any earlier entry.
    #[must_use]
    pub fn register<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Program>, BoxError> + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }
}

impl CommandRegistry for StaticRegistry {
    fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    fn fetch(&self, name: &str) -> Result<Box<dyn Program>, RegistryError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RegistryError::Unknown {
                name: name.to_owned(),
            })?;
        factory().map_err(|source| RegistryError::Construct {
            name: name.to_owned(),
            source,
        })
    }
}

impl fmt::Debug for StaticRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("StaticRegistry")
            .field("names", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
