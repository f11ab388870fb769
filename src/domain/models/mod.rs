//! Domain models

pub mod config;
pub mod credential;
pub mod query;

pub use config::{AppConfig, CacheConfig, LoggingConfig, WarehouseConfig};
pub use credential::{
    Authenticator, CanonicalKey, ConnectionParams, KeySource, ResolvedCredential,
};
pub use query::{ColumnType, QueryResult, QuerySource, RawColumn, RawResultSet};
