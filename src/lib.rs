//! near-fees - NEAR Intents fee reports from Snowflake
//!
//! Runs the NEAR Intents fee dashboard queries against Snowflake using
//! key-pair (JWT) authentication and renders them as tables, KPIs or JSON.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and the port traits
//! - **Service Layer** (`services`): credential resolution, query execution, reports
//! - **Infrastructure Layer** (`infrastructure`): configuration, key decoding,
//!   logging and the Snowflake SQL API driver
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use near_fees::infrastructure::config::EnvProvider;
//! use near_fees::services::CredentialResolver;
//!
//! let resolver = CredentialResolver::new(EnvProvider, ".");
//! let params = resolver.resolve()?;
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{CredentialError, WarehouseError, WarehouseResult};
pub use domain::models::{
    AppConfig, Authenticator, CanonicalKey, ConnectionParams, KeySource, QueryResult,
    QuerySource, ResolvedCredential,
};
pub use domain::ports::{ConfigProvider, WarehouseDriver, WarehouseSession};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{CredentialResolver, QueryService, ReportKind, ReportService};
