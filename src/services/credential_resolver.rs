//! Turns configuration into warehouse connection parameters.
//!
//! Key material precedence:
//! 1. `SNOWFLAKE_PRIVATE_KEY_B64`
//! 2. `PRIVATE_KEY_PEM` (normalized)
//! 3. `SNOWFLAKE_PRIVATE_KEY` (escaped newlines only)
//! 4. a key file: `SNOWFLAKE_PRIVATE_KEY_FILE`, then `rsa_key.p8`, then
//!    `rsa_key_nopass.p8` in the base directory
//!
//! A source that is configured but fails to decode is an error; resolution
//! never falls through to a lower-precedence source on failure.

use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};
use zeroize::Zeroizing;

use crate::domain::errors::CredentialError;
use crate::domain::models::{
    Authenticator, CanonicalKey, ConnectionParams, KeySource, ResolvedCredential,
};
use crate::domain::ports::{keys, ConfigProvider};
use crate::infrastructure::credentials::{
    decode_base64, decode_key_material, decode_pem, normalize_pem, unescape_newlines,
};

/// Conventional key file names probed in the base directory, in order.
pub const CONVENTIONAL_KEY_FILES: [&str; 2] = ["rsa_key.p8", "rsa_key_nopass.p8"];

/// Resolves credentials from an injected [`ConfigProvider`].
///
/// Every call reads the provider afresh; nothing is cached.
#[derive(Debug, Clone)]
pub struct CredentialResolver<P> {
    provider: P,
    base_dir: PathBuf,
}

impl<P: ConfigProvider> CredentialResolver<P> {
    /// `base_dir` anchors relative key file paths and the conventional key
    /// file probe.
    pub fn new(provider: P, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            base_dir: base_dir.into(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Configured key passphrase, whitespace preserved.
    pub fn passphrase(&self) -> Option<Zeroizing<String>> {
        self.provider.get_raw(keys::PRIVATE_KEY_PWD).map(Zeroizing::new)
    }

    /// Decode in-environment key material, if any is configured.
    ///
    /// Returns `Ok(None)` when none of the three key variables is set.
    #[instrument(skip(self))]
    pub fn resolve_key_bytes(&self) -> Result<Option<CanonicalKey>, CredentialError> {
        let passphrase = self.passphrase();
        let passphrase = passphrase.as_ref().map(|p| p.as_str());

        if let Some(encoded) = self.provider.get_raw(keys::PRIVATE_KEY_B64) {
            debug!(source = keys::PRIVATE_KEY_B64, "decoding base64 key material");
            let bytes = Zeroizing::new(decode_base64(&encoded, keys::PRIVATE_KEY_B64)?);
            return decode_key_material(&bytes, passphrase, keys::PRIVATE_KEY_B64).map(Some);
        }

        if let Some(raw) = self.provider.get_raw(keys::PRIVATE_KEY_PEM) {
            debug!(source = keys::PRIVATE_KEY_PEM, "decoding PEM key material");
            let pem = Zeroizing::new(normalize_pem(&raw));
            return decode_pem(&pem, passphrase, keys::PRIVATE_KEY_PEM).map(Some);
        }

        if let Some(raw) = self.provider.get_raw(keys::PRIVATE_KEY) {
            debug!(source = keys::PRIVATE_KEY, "decoding legacy PEM key material");
            let pem = Zeroizing::new(unescape_newlines(&raw));
            return decode_pem(&pem, passphrase, keys::PRIVATE_KEY).map(Some);
        }

        Ok(None)
    }

    /// Locate a key file on disk. Existence is the only check made here.
    pub fn resolve_key_path(&self) -> Option<PathBuf> {
        if let Some(configured) = self.provider.get_non_blank(keys::PRIVATE_KEY_FILE) {
            let configured = PathBuf::from(configured);
            let candidate = if configured.is_absolute() {
                configured
            } else {
                self.base_dir.join(configured)
            };
            if candidate.is_file() {
                return Some(candidate);
            }
            warn!(
                path = %candidate.display(),
                "SNOWFLAKE_PRIVATE_KEY_FILE does not exist, probing conventional key files"
            );
        }

        CONVENTIONAL_KEY_FILES
            .iter()
            .map(|name| self.base_dir.join(name))
            .find(|path| path.is_file())
    }

    /// Key bytes if configured, otherwise a key file path.
    pub fn resolve_credential(&self) -> Result<ResolvedCredential, CredentialError> {
        if let Some(key) = self.resolve_key_bytes()? {
            return Ok(ResolvedCredential::KeyBytes(key));
        }

        match self.resolve_key_path() {
            Some(path) => {
                debug!(path = %path.display(), "using key file");
                Ok(ResolvedCredential::KeyFile {
                    path,
                    passphrase: self.passphrase(),
                })
            }
            None => Err(CredentialError::CredentialNotFound),
        }
    }

    /// Assemble key-pair connection parameters.
    ///
    /// Required settings are checked before any key material is read.
    #[instrument(skip(self), err)]
    pub fn resolve(&self) -> Result<ConnectionParams, CredentialError> {
        let [user, account, warehouse, database] =
            self.require([keys::USER, keys::ACCOUNT, keys::WAREHOUSE, keys::DATABASE])?;

        let credential = self.resolve_credential()?;
        debug!(credential = credential.label(), "credential resolved");

        Ok(ConnectionParams {
            account,
            user,
            authenticator: self.authenticator(),
            credential,
            warehouse,
            database,
            schema: self.provider.get_non_blank(keys::SCHEMA),
        })
    }

    /// Assemble token connection parameters from `SNOWFLAKE_TOKEN`.
    ///
    /// Returns `Ok(None)` when no token is configured. The user is optional
    /// here because the token already identifies it.
    pub fn resolve_token(&self) -> Result<Option<ConnectionParams>, CredentialError> {
        let Some(token) = self.provider.get_non_blank(keys::TOKEN) else {
            return Ok(None);
        };
        let [account, warehouse, database] =
            self.require([keys::ACCOUNT, keys::WAREHOUSE, keys::DATABASE])?;

        Ok(Some(ConnectionParams {
            account,
            user: self.provider.get_non_blank(keys::USER).unwrap_or_default(),
            authenticator: Authenticator::OAuth,
            credential: ResolvedCredential::Token(Zeroizing::new(token)),
            warehouse,
            database,
            schema: self.provider.get_non_blank(keys::SCHEMA),
        }))
    }

    /// Which key source the configuration points at, by the same precedence
    /// as [`CredentialResolver::resolve_credential`]. Nothing is decoded.
    pub fn describe_key_source(&self) -> KeySource {
        if self.provider.get_raw(keys::PRIVATE_KEY_B64).is_some() {
            KeySource::Base64Env
        } else if self.provider.get_raw(keys::PRIVATE_KEY_PEM).is_some() {
            KeySource::PemEnv
        } else if self.provider.get_raw(keys::PRIVATE_KEY).is_some() {
            KeySource::LegacyPemEnv
        } else {
            self.resolve_key_path().map_or(KeySource::None, KeySource::File)
        }
    }

    /// `SNOWFLAKE_AUTHENTICATOR`, defaulting to key-pair JWT.
    pub fn authenticator(&self) -> Authenticator {
        self.provider
            .get_non_blank(keys::AUTHENTICATOR)
            .map_or_else(Authenticator::default, |name| Authenticator::parse(&name))
    }

    /// Values for every name in `names`, or a `Configuration` error listing
    /// the missing ones in the same order.
    fn require<const N: usize>(
        &self,
        names: [&'static str; N],
    ) -> Result<[String; N], CredentialError> {
        let values = names.map(|name| self.provider.get_non_blank(name));
        let missing: Vec<&'static str> = names
            .iter()
            .zip(&values)
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(CredentialError::Configuration { missing });
        }
        Ok(values.map(Option::unwrap_or_default))
    }
}
