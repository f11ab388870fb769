use async_trait::async_trait;

use crate::domain::errors::WarehouseResult;
use crate::domain::models::{ConnectionParams, RawResultSet};

/// Opens warehouse sessions from a resolved parameter set.
#[async_trait]
pub trait WarehouseDriver: Send + Sync {
    /// Authenticate and open a session.
    async fn connect(&self, params: &ConnectionParams) -> WarehouseResult<Box<dyn WarehouseSession>>;
}

/// An authenticated warehouse session.
#[async_trait]
pub trait WarehouseSession: Send + Sync {
    /// Execute one SQL statement and return every row.
    async fn execute(&self, sql: &str) -> WarehouseResult<RawResultSet>;

    /// Release the session. The default does nothing.
    async fn close(&self) -> WarehouseResult<()> {
        Ok(())
    }
}
