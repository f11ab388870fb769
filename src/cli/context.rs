//! Wiring shared by every command: configuration, credential lookup and the
//! warehouse driver.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::domain::models::AppConfig;
use crate::infrastructure::config::{ConfigLoader, LayeredProvider};
use crate::infrastructure::snowflake::SqlApiDriver;
use crate::services::{CredentialResolver, QueryService};

/// Loaded application configuration plus resolved paths.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub base_dir: PathBuf,
    pub secrets_path: PathBuf,
}

impl AppContext {
    /// Load from `config_path` if given, otherwise from the standard
    /// `.near-fees/` layers.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        Self::from_config(config)
    }

    pub fn from_config(config: AppConfig) -> Result<Self> {
        let base_dir = ConfigLoader::base_dir(&config)?;
        let secrets_path = ConfigLoader::secrets_path(&config)?;
        debug!(base_dir = %base_dir.display(), secrets = %secrets_path.display(), "context loaded");
        Ok(Self {
            config,
            base_dir,
            secrets_path,
        })
    }

    /// Credential resolver over the environment and the secret store.
    pub fn resolver(&self) -> Result<CredentialResolver<LayeredProvider>> {
        let provider = LayeredProvider::standard(&self.secrets_path)?;
        Ok(CredentialResolver::new(provider, &self.base_dir))
    }

    /// Query service backed by the Snowflake SQL API.
    pub fn query_service(&self) -> Result<Arc<QueryService<LayeredProvider>>> {
        let driver = SqlApiDriver::new(&self.config.warehouse)
            .context("Failed to build warehouse HTTP client")?;
        Ok(Arc::new(QueryService::new(
            self.resolver()?,
            Arc::new(driver),
            &self.config.cache,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_follow_base_dir() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            base_dir: dir.path().display().to_string(),
            ..Default::default()
        };
        let context = AppContext::from_config(config).unwrap();

        assert_eq!(context.base_dir, dir.path());
        assert_eq!(context.secrets_path, dir.path().join(".near-fees/secrets.yaml"));
        assert_eq!(context.resolver().unwrap().base_dir(), dir.path());
    }
}
