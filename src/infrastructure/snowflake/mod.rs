//! Snowflake SQL API driver
//!
//! - Key-pair JWT signing (RS256, SPKI fingerprint issuer)
//! - Statement execution with multi-partition result fetch
//! - Status mapping into [`WarehouseError`](crate::domain::errors::WarehouseError)

pub mod account;
pub mod client;
pub mod jwt;
pub mod types;

pub use client::{SqlApiDriver, SqlApiSession};
pub use jwt::{KeyPairClaims, KeyPairSigner};
