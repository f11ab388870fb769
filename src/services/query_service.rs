//! Query execution with a short-lived result memo.
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{CredentialError, WarehouseError, WarehouseResult};
use crate::domain::models::{CacheConfig, ConnectionParams, QueryResult, QuerySource};
use crate::domain::ports::{ConfigProvider, WarehouseDriver};

use super::credential_resolver::CredentialResolver;
use super::result_normalizer::normalize;

/// Runs SQL against the warehouse and returns normalized results.
///
/// Identical SQL text within the memo TTL is answered from memory. Each
/// warehouse round trip resolves credentials afresh, opens a session,
/// executes and closes it.
pub struct QueryService<P> {
    resolver: CredentialResolver<P>,
    driver: Arc<dyn WarehouseDriver>,
    memo: Cache<String, Arc<QueryResult>>,
}

impl<P: ConfigProvider> QueryService<P> {
    pub fn new(
        resolver: CredentialResolver<P>,
        driver: Arc<dyn WarehouseDriver>,
        cache: &CacheConfig,
    ) -> Self {
        let memo = Cache::builder()
            .max_capacity(cache.max_entries)
            .time_to_live(Duration::from_secs(cache.ttl_secs))
            .build();

        Self {
            resolver,
            driver,
            memo,
        }
    }

    pub fn resolver(&self) -> &CredentialResolver<P> {
        &self.resolver
    }

    /// Run a query from inline text or a SQL file.
    pub async fn run(&self, source: QuerySource) -> WarehouseResult<Arc<QueryResult>> {
        let sql = match source {
            QuerySource::Text(sql) => sql,
            QuerySource::File(path) => tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| {
                    WarehouseError::Io(format!("failed to read SQL file {}: {e}", path.display()))
                })?
                .trim()
                .to_string(),
        };
        self.run_sql(sql).await
    }

    /// Run SQL text, answering from the memo when possible.
    #[instrument(skip(self, sql), fields(sql_len = sql.len()))]
    pub async fn run_sql(&self, sql: String) -> WarehouseResult<Arc<QueryResult>> {
        if let Some(hit) = self.memo.get(&sql).await {
            debug!(rows = hit.len(), "query memo hit");
            return Ok(hit);
        }

        let result = Arc::new(self.execute_uncached(&sql).await?);
        self.memo.insert(sql, Arc::clone(&result)).await;
        Ok(result)
    }

    /// Run SQL text against the warehouse, bypassing the memo.
    pub async fn execute_uncached(&self, sql: &str) -> WarehouseResult<QueryResult> {
        let params = self.connection_params()?;
        let session = self.driver.connect(&params).await?;

        let outcome = session.execute(sql).await;
        if let Err(err) = session.close().await {
            warn!(error = %err, "failed to close warehouse session");
        }

        let result = normalize(outcome?);
        info!(rows = result.len(), columns = result.columns.len(), "query complete");
        Ok(result)
    }

    /// Drop every memoized result.
    pub fn clear_memo(&self) {
        self.memo.invalidate_all();
    }

    /// Key-pair parameters, or token parameters when no key is configured
    /// and `SNOWFLAKE_TOKEN` is set.
    fn connection_params(&self) -> WarehouseResult<ConnectionParams> {
        match self.resolver.resolve() {
            Err(CredentialError::CredentialNotFound) => match self.resolver.resolve_token()? {
                Some(params) => {
                    info!("no private key configured, using SNOWFLAKE_TOKEN");
                    Ok(params)
                }
                None => Err(CredentialError::CredentialNotFound.into()),
            },
            other => Ok(other?),
        }
    }
}
