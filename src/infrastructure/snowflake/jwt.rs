//! Key-pair JWT issuance for Snowflake.
//!
//! The token is signed with RS256. `sub` is `ACCOUNT.USER` and `iss` appends
//! the public key fingerprint: `ACCOUNT.USER.SHA256:<base64 sha256 of SPKI>`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey};
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::domain::errors::CredentialError;
use crate::domain::models::CanonicalKey;

use super::account::jwt_identifier;

/// Claims carried by a Snowflake key-pair JWT
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyPairClaims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing key plus the public key fingerprint Snowflake matches against
/// `RSA_PUBLIC_KEY_FP`.
pub struct KeyPairSigner {
    encoding_key: EncodingKey,
    fingerprint: String,
}

impl KeyPairSigner {
    /// Build a signer from canonical PKCS#8 DER. Only RSA keys are accepted.
    pub fn from_canonical(key: &CanonicalKey, source_name: &str) -> Result<Self, CredentialError> {
        let private_key = RsaPrivateKey::from_pkcs8_der(key.as_der()).map_err(|e| {
            CredentialError::key_decode(
                source_name,
                format!("key-pair authentication requires an RSA key: {e}"),
            )
        })?;

        let public_der = private_key
            .to_public_key()
            .to_public_key_der()
            .map_err(|e| CredentialError::key_decode(source_name, e))?;
        let fingerprint = format!(
            "SHA256:{}",
            STANDARD.encode(Sha256::digest(public_der.as_bytes()))
        );

        let pkcs1 = private_key
            .to_pkcs1_der()
            .map_err(|e| CredentialError::key_decode(source_name, e))?;
        let encoding_key = EncodingKey::from_rsa_der(pkcs1.as_bytes());

        Ok(Self {
            encoding_key,
            fingerprint,
        })
    }

    /// `SHA256:<base64>` fingerprint of the public key
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn claims(
        &self,
        account: &str,
        user: &str,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> KeyPairClaims {
        let subject = format!("{}.{}", jwt_identifier(account), user.trim().to_ascii_uppercase());
        let iat = issued_at.timestamp();
        let lifetime = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
        KeyPairClaims {
            iss: format!("{subject}.{}", self.fingerprint),
            sub: subject,
            iat,
            exp: iat.saturating_add(lifetime),
        }
    }

    /// Issue a signed token.
    pub fn issue(
        &self,
        account: &str,
        user: &str,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Result<String, CredentialError> {
        let claims = self.claims(account, user, issued_at, lifetime);
        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| CredentialError::key_decode("JWT signing", e))
    }
}
