//! Configuration management infrastructure
//!
//! - Application settings: figment (defaults, YAML files, `NEAR_FEES_*` env)
//! - Named value lookup for credentials: environment, then secret store

pub mod loader;
pub mod providers;

pub use loader::{ConfigError, ConfigLoader};
pub use providers::{EnvProvider, LayeredProvider, SecretsFileProvider, StaticProvider};
