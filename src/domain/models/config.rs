use serde::{Deserialize, Serialize};

/// Main configuration structure for near-fees
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    /// Base directory for relative key paths, conventional key files and the
    /// secret store
    #[serde(default = "default_base_dir")]
    pub base_dir: String,

    /// Secret store file, relative to `base_dir` unless absolute
    #[serde(default = "default_secrets_file")]
    pub secrets_file: String,

    /// Warehouse client configuration
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    /// Query memo configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_base_dir() -> String {
    ".".to_string()
}

fn default_secrets_file() -> String {
    ".near-fees/secrets.yaml".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            secrets_file: default_secrets_file(),
            warehouse: WarehouseConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Snowflake SQL API client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WarehouseConfig {
    /// Override for the SQL API base URL (derived from the account if unset)
    #[serde(default)]
    pub base_url: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Server-side statement timeout in seconds (0 = account default)
    #[serde(default = "default_statement_timeout_secs")]
    pub statement_timeout_secs: u64,

    /// Lifetime of key-pair JWTs in seconds (Snowflake caps this at one hour)
    #[serde(default = "default_jwt_lifetime_secs")]
    pub jwt_lifetime_secs: u64,
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_statement_timeout_secs() -> u64 {
    60
}

const fn default_jwt_lifetime_secs() -> u64 {
    3540
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            statement_timeout_secs: default_statement_timeout_secs(),
            jwt_lifetime_secs: default_jwt_lifetime_secs(),
        }
    }
}

/// Query result memo configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// How long an identical query reuses its previous result
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Maximum number of memoized results
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

const fn default_ttl_secs() -> u64 {
    300
}

const fn default_max_entries() -> u64 {
    64
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Rotation for file output: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
