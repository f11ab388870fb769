//! Port trait definitions (Hexagonal Architecture)
//!
//! - ConfigProvider: named configuration lookup (environment, secret store)
//! - WarehouseDriver / WarehouseSession: SQL execution against the warehouse
//!
//! These traits let the resolver and query service run against in-memory
//! implementations in tests.

pub mod config_provider;
pub mod warehouse;

pub use config_provider::{keys, ConfigProvider};
pub use warehouse::{WarehouseDriver, WarehouseSession};
