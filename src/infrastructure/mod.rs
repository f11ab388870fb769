//! Infrastructure layer module
//!
//! Adapters behind the domain ports:
//! - Configuration loading and credential lookup providers
//! - Private key normalization and decoding
//! - Logging infrastructure
//! - Snowflake SQL API driver

pub mod config;
pub mod credentials;
pub mod logging;
pub mod snowflake;
