use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::models::config::AppConfig;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Base directory cannot be empty")]
    EmptyBaseDir,

    #[error("Invalid request_timeout_secs: {0}. Must be at least 1")]
    InvalidRequestTimeout(u64),

    #[error("Invalid jwt_lifetime_secs: {0}. Must be between 60 and 3600")]
    InvalidJwtLifetime(u64),

    #[error("Invalid cache max_entries: {0}. Must be at least 1")]
    InvalidCacheCapacity(u64),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .near-fees/config.yaml (project config)
    /// 3. .near-fees/local.yaml (project local overrides, optional)
    /// 4. Environment variables (NEAR_FEES_* prefix, highest priority)
    pub fn load() -> Result<AppConfig> {
        let config: AppConfig = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(".near-fees/config.yaml"))
            .merge(Yaml::file(".near-fees/local.yaml"))
            .merge(Env::prefixed("NEAR_FEES_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring
    /// `NEAR_FEES_*` environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<AppConfig> {
        let config: AppConfig = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("NEAR_FEES_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
        if config.base_dir.trim().is_empty() {
            return Err(ConfigError::EmptyBaseDir);
        }

        if config.warehouse.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidRequestTimeout(
                config.warehouse.request_timeout_secs,
            ));
        }

        if !(60..=3600).contains(&config.warehouse.jwt_lifetime_secs) {
            return Err(ConfigError::InvalidJwtLifetime(
                config.warehouse.jwt_lifetime_secs,
            ));
        }

        if config.cache.max_entries == 0 {
            return Err(ConfigError::InvalidCacheCapacity(config.cache.max_entries));
        }

        if let Some(url) = &config.warehouse.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::ValidationFailed(format!(
                    "warehouse.base_url must be an http(s) URL, got '{url}'"
                )));
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }

    /// Base directory as a path, made absolute against the working directory
    pub fn base_dir(config: &AppConfig) -> Result<PathBuf> {
        let base = PathBuf::from(&config.base_dir);
        if base.is_absolute() {
            return Ok(base);
        }
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        Ok(cwd.join(base))
    }

    /// Secret store path, relative to the base directory unless absolute
    pub fn secrets_path(config: &AppConfig) -> Result<PathBuf> {
        let secrets = PathBuf::from(&config.secrets_file);
        if secrets.is_absolute() {
            return Ok(secrets);
        }
        Ok(Self::base_dir(config)?.join(secrets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.base_dir, ".");
        assert_eq!(config.cache.ttl_secs, 300);
        assert_eq!(config.warehouse.request_timeout_secs, 30);
        assert_eq!(config.logging.level, "warn");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
base_dir: /srv/near-fees
warehouse:
  base_url: http://localhost:8080
  request_timeout_secs: 10
cache:
  ttl_secs: 60
logging:
  level: debug
  format: json
";

        let config: AppConfig = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.base_dir, "/srv/near-fees");
        assert_eq!(config.warehouse.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.warehouse.request_timeout_secs, 10);
        assert_eq!(config.warehouse.jwt_lifetime_secs, 3540);
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.cache.max_entries, 64);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = AppConfig::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));
    }

    #[test]
    fn test_validate_invalid_rotation() {
        let mut config = AppConfig::default();
        config.logging.rotation = "weekly".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidRotation(_)
        ));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = AppConfig::default();
        config.warehouse.request_timeout_secs = 0;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidRequestTimeout(0)
        ));
    }

    #[test]
    fn test_validate_jwt_lifetime_bounds() {
        let mut config = AppConfig::default();
        config.warehouse.jwt_lifetime_secs = 7200;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidJwtLifetime(7200)
        ));

        config.warehouse.jwt_lifetime_secs = 3600;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_base_dir() {
        let config = AppConfig {
            base_dir: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptyBaseDir
        ));
    }

    #[test]
    fn test_validate_base_url_scheme() {
        let mut config = AppConfig::default();
        config.warehouse.base_url = Some("ftp://example.com".to_string());
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::ValidationFailed(_)
        ));
    }

    #[test]
    fn test_env_override() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "cache:\n  ttl_secs: 120\nlogging:\n  level: info").unwrap();
        file.flush().unwrap();

        temp_env::with_vars(
            [
                ("NEAR_FEES_CACHE__TTL_SECS", Some("15")),
                ("NEAR_FEES_LOGGING__LEVEL", None),
            ],
            || {
                let config = ConfigLoader::load_from_file(file.path()).unwrap();
                assert_eq!(config.cache.ttl_secs, 15, "Env should win over file");
                assert_eq!(config.logging.level, "info", "File should win over defaults");
            },
        );
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(base_file, "base_dir: /base\nlogging:\n  level: info\n  format: json").unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "base_dir: /override\nlogging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: AppConfig = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.base_dir, "/override", "Override should win");
        assert_eq!(config.logging.level, "debug", "Override should win for nested fields");
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
    }

    #[test]
    fn test_secrets_path_resolution() {
        let config = AppConfig {
            base_dir: "/srv/app".to_string(),
            ..Default::default()
        };
        assert_eq!(
            ConfigLoader::secrets_path(&config).unwrap(),
            PathBuf::from("/srv/app/.near-fees/secrets.yaml")
        );

        let config = AppConfig {
            secrets_file: "/etc/near-fees/secrets.yaml".to_string(),
            ..Default::default()
        };
        assert_eq!(
            ConfigLoader::secrets_path(&config).unwrap(),
            PathBuf::from("/etc/near-fees/secrets.yaml")
        );
    }
}
