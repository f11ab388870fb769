//! Snowflake SQL API v2 client
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client as ReqwestClient, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use zeroize::Zeroizing;

use crate::domain::errors::{WarehouseError, WarehouseResult};
use crate::domain::models::{
    Authenticator, CanonicalKey, ConnectionParams, RawColumn, RawResultSet, ResolvedCredential,
    WarehouseConfig,
};
use crate::domain::ports::{WarehouseDriver, WarehouseSession};
use crate::infrastructure::credentials::decode_key_material;
use crate::infrastructure::logging::SecretScrubber;

use super::account;
use super::jwt::KeyPairSigner;
use super::types::{PartitionResponse, StatementRequest, StatementResponse};

const STATEMENTS_PATH: &str = "/api/v2/statements";
const TOKEN_TYPE_HEADER: &str = "X-Snowflake-Authorization-Token-Type";

/// Warehouse driver speaking the Snowflake SQL API over HTTPS.
///
/// `connect` signs a key-pair JWT (or takes a bearer token as-is) and hands
/// back a session that reuses the pooled HTTP client.
pub struct SqlApiDriver {
    http_client: ReqwestClient,
    config: WarehouseConfig,
}

impl SqlApiDriver {
    pub fn new(config: &WarehouseConfig) -> WarehouseResult<Self> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("near-fees/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(4)
            .build()?;

        Ok(Self {
            http_client,
            config: config.clone(),
        })
    }

    fn base_url(&self, params: &ConnectionParams) -> String {
        self.config
            .base_url
            .as_deref()
            .map_or_else(|| account::base_url(&params.account), |url| url.trim_end_matches('/').to_string())
    }

    async fn authorization(&self, params: &ConnectionParams) -> WarehouseResult<SessionAuth> {
        match (&params.authenticator, &params.credential) {
            (_, ResolvedCredential::Token(token)) => Ok(SessionAuth {
                token: token.clone(),
                token_type: "OAUTH",
            }),
            (Authenticator::SnowflakeJwt, ResolvedCredential::KeyBytes(key)) => {
                self.sign(params, key, "private_key")
            }
            (Authenticator::SnowflakeJwt, ResolvedCredential::KeyFile { path, passphrase }) => {
                let bytes = Zeroizing::new(tokio::fs::read(path).await.map_err(|e| {
                    WarehouseError::Io(format!("failed to read key file {}: {e}", path.display()))
                })?);
                let source_name = path.display().to_string();
                let key = decode_key_material(
                    &bytes,
                    passphrase.as_ref().map(|p| p.as_str()),
                    &source_name,
                )?;
                self.sign(params, &key, &source_name)
            }
            (other, _) => Err(WarehouseError::Authentication(format!(
                "authenticator {other} cannot be used with key-pair credentials"
            ))),
        }
    }

    fn sign(
        &self,
        params: &ConnectionParams,
        key: &CanonicalKey,
        source_name: &str,
    ) -> WarehouseResult<SessionAuth> {
        let signer = KeyPairSigner::from_canonical(key, source_name)?;
        let token = signer.issue(
            &params.account,
            &params.user,
            Utc::now(),
            Duration::from_secs(self.config.jwt_lifetime_secs),
        )?;
        debug!(fingerprint = signer.fingerprint(), "issued key-pair JWT");
        Ok(SessionAuth {
            token: Zeroizing::new(token),
            token_type: "KEYPAIR_JWT",
        })
    }
}

#[async_trait]
impl WarehouseDriver for SqlApiDriver {
    #[instrument(skip(self, params), fields(account = %params.account, user = %params.user, credential = params.credential.label()))]
    async fn connect(&self, params: &ConnectionParams) -> WarehouseResult<Box<dyn WarehouseSession>> {
        let auth = self.authorization(params).await?;
        let base_url = self.base_url(params);
        debug!(%base_url, "opened SQL API session");

        Ok(Box::new(SqlApiSession {
            http_client: self.http_client.clone(),
            base_url,
            auth,
            warehouse: params.warehouse.clone(),
            database: params.database.clone(),
            schema: params.schema.clone(),
            statement_timeout_secs: self.config.statement_timeout_secs,
        }))
    }
}

struct SessionAuth {
    token: Zeroizing<String>,
    token_type: &'static str,
}

/// Session bound to one warehouse, database and credential.
pub struct SqlApiSession {
    http_client: ReqwestClient,
    base_url: String,
    auth: SessionAuth,
    warehouse: String,
    database: String,
    schema: Option<String>,
    statement_timeout_secs: u64,
}

impl SqlApiSession {
    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(header::AUTHORIZATION, format!("Bearer {}", self.auth.token.as_str()))
            .header(TOKEN_TYPE_HEADER, self.auth.token_type)
            .header(header::ACCEPT, "application/json")
    }

    async fn fetch_partition(&self, handle: &str, partition: usize) -> WarehouseResult<PartitionResponse> {
        let response = self
            .authorized(
                self.http_client
                    .get(format!("{}{STATEMENTS_PATH}/{handle}", self.base_url))
                    .query(&[("partition", partition)]),
            )
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(serde_json::from_str(&response.text().await?)?)
    }
}

#[async_trait]
impl WarehouseSession for SqlApiSession {
    #[instrument(skip(self, sql), fields(warehouse = %self.warehouse, database = %self.database))]
    async fn execute(&self, sql: &str) -> WarehouseResult<RawResultSet> {
        let request = StatementRequest {
            statement: sql,
            warehouse: &self.warehouse,
            database: &self.database,
            schema: self.schema.as_deref(),
            timeout: self.statement_timeout_secs,
        };

        let response = self
            .authorized(
                self.http_client
                    .post(format!("{}{STATEMENTS_PATH}", self.base_url))
                    .json(&request),
            )
            .send()
            .await?;

        let response = check_status(response).await?;
        let body: StatementResponse = serde_json::from_str(&response.text().await?)?;

        let Some(meta) = body.result_set_meta_data else {
            debug!("statement returned no result set");
            return Ok(RawResultSet::default());
        };

        let columns: Vec<RawColumn> = meta.row_type.iter().map(RawColumn::from).collect();
        let mut rows = body.data;

        if meta.partition_info.len() > 1 {
            let handle = body.statement_handle.ok_or_else(|| {
                WarehouseError::InvalidResponse(
                    "partitioned result without a statement handle".to_string(),
                )
            })?;
            for partition in 1..meta.partition_info.len() {
                debug!(partition, "fetching result partition");
                rows.extend(self.fetch_partition(&handle, partition).await?.data);
            }
        }

        if let Some(expected) = meta.num_rows {
            if expected != rows.len() as u64 {
                warn!(expected, received = rows.len(), "row count differs from result metadata");
            }
        }

        debug!(rows = rows.len(), columns = columns.len(), "statement complete");
        Ok(RawResultSet { columns, rows })
    }
}

/// Map non-success statuses to typed errors. 202 means the statement is
/// still running after the server-side wait.
async fn check_status(response: Response) -> WarehouseResult<Response> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let parsed: StatementResponse = serde_json::from_str(&body).unwrap_or_default();
    let message = SecretScrubber::global()
        .scrub_message(parsed.message.as_deref().unwrap_or(body.trim()));

    match status {
        StatusCode::ACCEPTED => Err(WarehouseError::StatementPending {
            handle: parsed.statement_handle.unwrap_or_default(),
        }),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            warn!(%status, %message, "warehouse rejected credentials");
            Err(WarehouseError::Authentication(message))
        }
        _ => {
            warn!(%status, %message, "warehouse API error");
            Err(WarehouseError::Api { status, message })
        }
    }
}
