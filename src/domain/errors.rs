//! Domain errors for credential resolution and warehouse access.

use reqwest::StatusCode;
use thiserror::Error;

/// Configuration names accepted as a source of key material, in the order
/// they are listed to the user when nothing usable is found.
pub const SUPPORTED_KEY_OPTIONS: [&str; 3] = [
    "SNOWFLAKE_PRIVATE_KEY_B64 (base64 encoded private key)",
    "SNOWFLAKE_PRIVATE_KEY_FILE (path to private key file)",
    "PRIVATE_KEY_PEM (raw PEM content)",
];

fn format_key_options() -> String {
    SUPPORTED_KEY_OPTIONS
        .iter()
        .enumerate()
        .map(|(i, option)| format!("{}. {option}", i + 1))
        .collect::<Vec<_>>()
        .join(", or\n")
}

/// Errors raised while turning configuration into connection parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Required settings are absent. `missing` keeps the lookup order.
    #[error("Missing required configuration: {}", .missing.join(", "))]
    Configuration { missing: Vec<&'static str> },

    /// Key material was present but could not be decoded.
    #[error("Failed to decode private key from {source_name}: {reason}")]
    KeyDecode {
        source_name: String,
        reason: String,
    },

    /// The key is encrypted and no passphrase is configured.
    #[error(
        "Encrypted private key detected in {source_name} but SNOWFLAKE_PRIVATE_KEY_PWD is not set"
    )]
    EncryptedKeyWithoutPassword { source_name: String },

    /// Neither in-environment key material nor a key file was found.
    #[error("No authentication method available. Provide either:\n{}", format_key_options())]
    CredentialNotFound,
}

impl CredentialError {
    /// Short, stable name of the variant for user-facing output.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "ConfigurationError",
            Self::KeyDecode { .. } => "KeyDecodeError",
            Self::EncryptedKeyWithoutPassword { .. } => "EncryptedKeyWithoutPasswordError",
            Self::CredentialNotFound => "CredentialNotFoundError",
        }
    }

    pub(crate) fn key_decode(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::KeyDecode {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised by a warehouse driver or session.
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTTP 401 / 403 from the warehouse
    #[error("Authentication rejected by warehouse: {0}")]
    Authentication(String),

    #[error("Warehouse API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    /// The statement did not finish within the server-side wait window.
    #[error("Statement {handle} is still running")]
    StatementPending { handle: String },

    #[error("Invalid warehouse response: {0}")]
    InvalidResponse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl WarehouseError {
    /// Short, stable name of the variant for user-facing output.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Credential(err) => err.kind(),
            Self::Network(_) => "NetworkError",
            Self::Authentication(_) => "AuthenticationError",
            Self::Api { .. } => "WarehouseApiError",
            Self::StatementPending { .. } => "StatementPendingError",
            Self::InvalidResponse(_) => "InvalidResponseError",
            Self::Io(_) => "IoError",
        }
    }
}

impl From<serde_json::Error> for WarehouseError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

pub type WarehouseResult<T> = Result<T, WarehouseError>;
