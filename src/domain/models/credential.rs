//! Credential and connection parameter models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use zeroize::Zeroizing;

/// Canonical private key bytes: unencrypted PKCS#8 DER.
///
/// Every accepted textual encoding converges on this form before it is
/// handed to a warehouse driver. The buffer is wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct CanonicalKey(Zeroizing<Vec<u8>>);

impl CanonicalKey {
    pub fn new(der: Vec<u8>) -> Self {
        Self(Zeroizing::new(der))
    }

    pub fn as_der(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonicalKey([{} bytes redacted])", self.0.len())
    }
}

/// The credential a warehouse session authenticates with.
///
/// The resolver produces either `KeyBytes` or `KeyFile`, never both.
/// `Token` only comes from the REST fallback path.
#[derive(Clone, PartialEq, Eq)]
pub enum ResolvedCredential {
    /// Key decoded from configuration, already decrypted.
    KeyBytes(CanonicalKey),

    /// Key left on disk for the driver to read.
    KeyFile {
        path: PathBuf,
        passphrase: Option<Zeroizing<String>>,
    },

    /// Bearer token for the REST fallback path.
    Token(Zeroizing<String>),
}

impl ResolvedCredential {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::KeyBytes(_) => "private_key",
            Self::KeyFile { .. } => "private_key_file",
            Self::Token(_) => "token",
        }
    }
}

impl fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyBytes(key) => f.debug_tuple("KeyBytes").field(key).finish(),
            Self::KeyFile { path, passphrase } => f
                .debug_struct("KeyFile")
                .field("path", path)
                .field("passphrase", &passphrase.as_ref().map(|_| "[REDACTED]"))
                .finish(),
            Self::Token(_) => f.write_str("Token([REDACTED])"),
        }
    }
}

/// Authentication mode requested from the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Authenticator {
    /// Key-pair authentication with a signed JWT
    #[default]
    SnowflakeJwt,
    /// OAuth / programmatic access token
    OAuth,
    /// Any other authenticator name, passed through verbatim
    Other(String),
}

impl Authenticator {
    /// Parse a configured authenticator name. Matching is case-insensitive.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "SNOWFLAKE_JWT" => Self::SnowflakeJwt,
            "OAUTH" => Self::OAuth,
            _ => Self::Other(value.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::SnowflakeJwt => "SNOWFLAKE_JWT",
            Self::OAuth => "OAUTH",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter set handed to a warehouse driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub account: String,
    pub user: String,
    pub authenticator: Authenticator,
    pub credential: ResolvedCredential,
    pub warehouse: String,
    pub database: String,
    pub schema: Option<String>,
}

/// Which key source the current configuration points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum KeySource {
    Base64Env,
    PemEnv,
    LegacyPemEnv,
    File(PathBuf),
    None,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64Env => f.write_str("SNOWFLAKE_PRIVATE_KEY_B64 (base64 PEM in env)"),
            Self::PemEnv => f.write_str("PRIVATE_KEY_PEM (raw PEM in env)"),
            Self::LegacyPemEnv => f.write_str("SNOWFLAKE_PRIVATE_KEY (raw PEM in env)"),
            Self::File(path) => write!(f, "key file at: {}", path.display()),
            Self::None => f.write_str("no key configured"),
        }
    }
}
