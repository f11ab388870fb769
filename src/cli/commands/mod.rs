//! CLI command implementations.

pub mod check;
pub mod query;
pub mod report;
