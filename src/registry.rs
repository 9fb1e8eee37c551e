//! Runner Registry
//!
//! Hosts look runners up by type id. Each runner type is registered
//! explicitly with a [`Registration`]:
//!
//! ```text
//! ┌───────────────────────────────┐
//! │ Registry                      │
//! │  "redis" ──> Registration     │──create("redis", {...})──> Box<dyn QueryRunner>
//! │              name, enabled,   │
//! │              schema, factory  │──capabilities()──────────> [Capability]
//! └───────────────────────────────┘
//! ```

use crate::connection::{configuration_schema, ConnectionConfig};
use crate::runner::{QueryRunner, StoreRunner};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Type id of the built-in store runner.
pub const REDIS_RUNNER: &str = "redis";

/// Builds a runner from the host's configuration object.
pub type RunnerFactory = fn(serde_json::Value) -> serde_json::Result<Box<dyn QueryRunner>>;

/// Errors raised when creating a runner.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown query runner type '{0}'")]
    UnknownRunner(String),

    /// The runner is registered but its `enabled` check failed
    #[error("query runner '{0}' is not enabled")]
    Disabled(String),

    #[error("invalid configuration for '{runner_type}': {source}")]
    InvalidConfig {
        runner_type: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything the registry knows about one runner type.
#[derive(Clone)]
pub struct Registration {
    pub runner_type: &'static str,
    /// Display name
    pub name: &'static str,
    pub enabled: fn() -> bool,
    pub configuration_schema: fn() -> serde_json::Value,
    pub factory: RunnerFactory,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("runner_type", &self.runner_type)
            .field("name", &self.name)
            .finish()
    }
}

impl Registration {
    /// The built-in Redis runner.
    pub fn redis() -> Self {
        Self {
            runner_type: REDIS_RUNNER,
            name: "Redis",
            enabled: || true,
            configuration_schema,
            factory: create_store_runner,
        }
    }
}

fn create_store_runner(value: serde_json::Value) -> serde_json::Result<Box<dyn QueryRunner>> {
    let config = ConnectionConfig::from_json(value)?;
    Ok(Box::new(StoreRunner::new(config)))
}

/// What a host shows for an available runner type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capability {
    #[serde(rename = "type")]
    pub runner_type: String,
    pub name: String,
    pub configuration_schema: serde_json::Value,
}

/// Runner types by id.
#[derive(Debug, Default)]
pub struct Registry {
    runners: BTreeMap<&'static str, Registration>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in runners.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Registration::redis());
        registry
    }

    /// Adds a runner type, replacing any earlier registration under the
    /// same id.
    pub fn register(&mut self, registration: Registration) {
        let runner_type = registration.runner_type;
        if self.runners.insert(runner_type, registration).is_some() {
            warn!(runner_type, "Replacing existing query runner registration");
        } else {
            debug!(runner_type, "Registered query runner");
        }
    }

    pub fn get(&self, runner_type: &str) -> Option<&Registration> {
        self.runners.get(runner_type)
    }

    /// Enabled runner types, ordered by id.
    pub fn capabilities(&self) -> Vec<Capability> {
        self.runners
            .values()
            .filter(|registration| (registration.enabled)())
            .map(|registration| Capability {
                runner_type: registration.runner_type.to_string(),
                name: registration.name.to_string(),
                configuration_schema: (registration.configuration_schema)(),
            })
            .collect()
    }

    /// Builds a runner of type `runner_type` from a JSON configuration
    /// object.
    pub fn create(
        &self,
        runner_type: &str,
        config: serde_json::Value,
    ) -> Result<Box<dyn QueryRunner>, RegistryError> {
        let registration = self
            .get(runner_type)
            .ok_or_else(|| RegistryError::UnknownRunner(runner_type.to_string()))?;

        if !(registration.enabled)() {
            return Err(RegistryError::Disabled(runner_type.to_string()));
        }

        (registration.factory)(config).map_err(|source| RegistryError::InvalidConfig {
            runner_type: runner_type.to_string(),
            source,
        })
    }
}
