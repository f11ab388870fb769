//! Implementation of the `near-fees check` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::cli::context::AppContext;
use crate::cli::error_kind;
use crate::cli::output::{create_spinner_with_message, output, CommandOutput, ProgressBarExt, TableFormatter};
use crate::domain::errors::CredentialError;
use crate::domain::models::{CanonicalKey, KeySource};
use crate::domain::ports::{keys, ConfigProvider};
use crate::infrastructure::credentials::decode_key_material;
use crate::infrastructure::logging::SecretScrubber;
use crate::infrastructure::snowflake::KeyPairSigner;
use crate::services::CredentialResolver;

/// Session identity query run by the connection test
pub const SESSION_INFO_SQL: &str = "SELECT CURRENT_VERSION() AS version, CURRENT_USER() AS user, \
     CURRENT_ROLE() AS role, CURRENT_ACCOUNT() AS account, CURRENT_WAREHOUSE() AS warehouse";

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Only inspect configuration and key material; do not connect
    #[arg(long)]
    pub offline: bool,
}

/// Returned after a failed check has already been reported.
#[derive(Debug, Error)]
#[error("connectivity check failed")]
pub struct CheckFailed;

#[derive(Debug, Serialize)]
pub struct EnvSummary {
    pub account: Option<String>,
    pub user: Option<String>,
    pub warehouse: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub authenticator: String,
    pub passphrase_set: bool,
    pub key_source: KeySource,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum KeyCheck {
    Ok {
        der_length: usize,
        /// `SHA256:` fingerprint to compare with the user's RSA_PUBLIC_KEY_FP
        fingerprint: Option<String>,
    },
    Skipped {
        reason: String,
    },
    Failed {
        kind: String,
        error: String,
    },
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub version: Value,
    pub user: Value,
    pub role: Value,
    pub account: Value,
    pub warehouse: Value,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectionCheck {
    Ok { session: Option<SessionInfo> },
    Skipped,
    Failed { kind: String, error: String },
}

#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub environment: EnvSummary,
    pub key: KeyCheck,
    pub connection: ConnectionCheck,
}

impl CheckOutput {
    pub const fn passed(&self) -> bool {
        !matches!(self.key, KeyCheck::Failed { .. })
            && !matches!(self.connection, ConnectionCheck::Failed { .. })
    }
}

impl CommandOutput for CheckOutput {
    fn to_human(&self) -> String {
        let formatter = TableFormatter::new();
        let env = &self.environment;
        let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "(not set)".to_string());

        let mut lines = vec![
            console::style("Snowflake configuration").bold().to_string(),
            formatter.format_pairs([
                ("SNOWFLAKE_ACCOUNT", show(&env.account)),
                ("SNOWFLAKE_USER", show(&env.user)),
                ("SNOWFLAKE_WAREHOUSE", show(&env.warehouse)),
                ("SNOWFLAKE_DATABASE", show(&env.database)),
                ("SNOWFLAKE_SCHEMA", show(&env.schema)),
                ("Authenticator", env.authenticator.clone()),
                ("Key password set", env.passphrase_set.to_string()),
                ("Key source", env.key_source.to_string()),
            ]),
        ];

        lines.push(match &self.key {
            KeyCheck::Ok {
                der_length,
                fingerprint,
            } => {
                let mut text = format!("Key parse check: OK\n  DER length: {der_length} bytes");
                if let Some(fingerprint) = fingerprint {
                    text.push_str(&format!("\n  Public key fingerprint: {fingerprint}"));
                }
                text
            }
            KeyCheck::Skipped { reason } => format!("Key parse check: skipped ({reason})"),
            KeyCheck::Failed { kind, error } => format!("Key parse check: FAILED\n  {kind}: {error}"),
        });

        match &self.connection {
            ConnectionCheck::Ok { session } => {
                lines.push("Connection: OK".to_string());
                if let Some(info) = session {
                    lines.push(formatter.format_pairs([
                        ("version", cell(&info.version)),
                        ("user", cell(&info.user)),
                        ("role", cell(&info.role)),
                        ("account", cell(&info.account)),
                        ("warehouse", cell(&info.warehouse)),
                    ]));
                }
            }
            ConnectionCheck::Skipped => lines.push("Connection: skipped (--offline)".to_string()),
            ConnectionCheck::Failed { kind, error } => {
                lines.push(format!("Connection: FAILED\n  {kind}: {error}"));
            }
        }

        lines.join("\n")
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: CheckArgs, context: &AppContext, json_mode: bool) -> Result<()> {
    let resolver = context.resolver()?;
    let environment = summarize_env(&resolver);
    let key = check_key(&resolver, &environment.key_source).await;

    let connection = if args.offline {
        ConnectionCheck::Skipped
    } else {
        let spinner = create_spinner_with_message("Connecting to Snowflake...", json_mode);
        let outcome = match context.query_service() {
            Ok(service) => service
                .execute_uncached(SESSION_INFO_SQL)
                .await
                .map_err(anyhow::Error::from),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(result) => {
                spinner.finish_success("Connected");
                let session = result.rows.first().map(|row| {
                    let at = |idx: usize| row.get(idx).cloned().unwrap_or(Value::Null);
                    SessionInfo {
                        version: at(0),
                        user: at(1),
                        role: at(2),
                        account: at(3),
                        warehouse: at(4),
                    }
                });
                ConnectionCheck::Ok { session }
            }
            Err(err) => {
                spinner.finish_error("Connection failed");
                ConnectionCheck::Failed {
                    kind: error_kind(&err).to_string(),
                    error: SecretScrubber::global().scrub_message(&format!("{err:#}")),
                }
            }
        }
    };

    let report = CheckOutput {
        environment,
        key,
        connection,
    };
    output(&report, json_mode);

    if report.passed() {
        Ok(())
    } else {
        Err(CheckFailed.into())
    }
}

fn summarize_env<P: ConfigProvider>(resolver: &CredentialResolver<P>) -> EnvSummary {
    let provider = resolver.provider();
    EnvSummary {
        account: provider.get_non_blank(keys::ACCOUNT),
        user: provider.get_non_blank(keys::USER),
        warehouse: provider.get_non_blank(keys::WAREHOUSE),
        database: provider.get_non_blank(keys::DATABASE),
        schema: provider.get_non_blank(keys::SCHEMA),
        authenticator: resolver.authenticator().to_string(),
        passphrase_set: resolver.passphrase().is_some(),
        key_source: resolver.describe_key_source(),
    }
}

/// Decode whichever key the configuration points at.
async fn check_key<P: ConfigProvider>(resolver: &CredentialResolver<P>, source: &KeySource) -> KeyCheck {
    let decoded: Result<CanonicalKey, CredentialError> = match source {
        KeySource::None => {
            return KeyCheck::Skipped {
                reason: "no key configured".to_string(),
            }
        }
        KeySource::File(path) => match tokio::fs::read(path).await {
            Ok(bytes) => {
                let passphrase = resolver.passphrase();
                decode_key_material(
                    &bytes,
                    passphrase.as_ref().map(|p| p.as_str()),
                    &path.display().to_string(),
                )
            }
            Err(err) => Err(CredentialError::KeyDecode {
                source_name: path.display().to_string(),
                reason: err.to_string(),
            }),
        },
        _ => resolver
            .resolve_key_bytes()
            .and_then(|key| key.ok_or(CredentialError::CredentialNotFound)),
    };

    match decoded {
        Ok(key) => KeyCheck::Ok {
            der_length: key.len(),
            fingerprint: KeyPairSigner::from_canonical(&key, "check")
                .ok()
                .map(|signer| signer.fingerprint().to_string()),
        },
        Err(err) => KeyCheck::Failed {
            kind: err.kind().to_string(),
            error: SecretScrubber::global().scrub_message(&err.to_string()),
        },
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::StaticProvider;
    use tempfile::TempDir;

    const NOPASS_PEM: &str = include_str!("../../../tests/fixtures/rsa_key_nopass.p8");
    const ENCRYPTED_PEM: &str = include_str!("../../../tests/fixtures/rsa_key.p8");

    #[tokio::test]
    async fn test_key_check_reports_der_length() {
        let dir = TempDir::new().unwrap();
        let resolver = CredentialResolver::new(
            StaticProvider::new().with(keys::PRIVATE_KEY_PEM, NOPASS_PEM),
            dir.path(),
        );
        let source = resolver.describe_key_source();

        match check_key(&resolver, &source).await {
            KeyCheck::Ok {
                der_length,
                fingerprint,
            } => {
                assert!(der_length > 1000);
                assert!(fingerprint.unwrap().starts_with("SHA256:"));
            }
            other => panic!("unexpected key check: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_key_check_reads_key_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("rsa_key.p8"), ENCRYPTED_PEM).unwrap();
        let resolver = CredentialResolver::new(StaticProvider::new(), dir.path());
        let source = resolver.describe_key_source();

        match check_key(&resolver, &source).await {
            KeyCheck::Failed { kind, .. } => assert_eq!(kind, "EncryptedKeyWithoutPasswordError"),
            other => panic!("unexpected key check: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_key_check_skipped_without_key() {
        let dir = TempDir::new().unwrap();
        let resolver = CredentialResolver::new(StaticProvider::new(), dir.path());
        assert!(matches!(
            check_key(&resolver, &KeySource::None).await,
            KeyCheck::Skipped { .. }
        ));
    }

    #[test]
    fn test_env_summary_never_includes_passphrase() {
        let dir = TempDir::new().unwrap();
        let resolver = CredentialResolver::new(
            StaticProvider::new()
                .with(keys::ACCOUNT, "acct")
                .with(keys::PRIVATE_KEY_PWD, "hunter2"),
            dir.path(),
        );
        let summary = summarize_env(&resolver);
        let json = serde_json::to_string(&summary).unwrap();

        assert_eq!(summary.account.as_deref(), Some("acct"));
        assert!(summary.passphrase_set);
        assert!(!json.contains("hunter2"));
        assert_eq!(summary.authenticator, "SNOWFLAKE_JWT");
    }
}
