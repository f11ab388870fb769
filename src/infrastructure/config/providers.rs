//! [`ConfigProvider`] implementations.
//!
//! Lookup order for the application is environment first, then the secret
//! store file; see [`LayeredProvider::standard`].

use anyhow::{Context, Result};
use figment::providers::{Format, Yaml};
use figment::Figment;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, warn};

use crate::domain::ports::ConfigProvider;

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvProvider;

impl ConfigProvider for EnvProvider {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Flat YAML secret store (`NAME: value` per line).
///
/// Scalar values are stringified; nested tables are ignored.
#[derive(Debug, Clone, Default)]
pub struct SecretsFileProvider {
    values: BTreeMap<String, String>,
}

impl SecretsFileProvider {
    /// Load a secret store. A missing file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "secret store not found, skipping");
            return Ok(Self::default());
        }

        let raw: BTreeMap<String, serde_yaml::Value> = Figment::from(Yaml::file(path))
            .extract()
            .with_context(|| format!("Failed to load secret store from {}", path.display()))?;

        let values = raw
            .into_iter()
            .filter_map(|(name, value)| match scalar_to_string(&value) {
                Some(text) => Some((name, text)),
                None => {
                    warn!(name = %name, "ignoring non-scalar secret store entry");
                    None
                }
            })
            .collect::<BTreeMap<_, _>>();

        debug!(path = %path.display(), entries = values.len(), "secret store loaded");
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl ConfigProvider for SecretsFileProvider {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// In-memory values, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    values: HashMap<String, String>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticProvider {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ConfigProvider for StaticProvider {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// Ordered providers; the first non-blank value wins.
#[derive(Default)]
pub struct LayeredProvider {
    layers: Vec<Box<dyn ConfigProvider>>,
}

impl LayeredProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment first, then the secret store at `secrets_path`.
    pub fn standard(secrets_path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new()
            .layer(EnvProvider)
            .layer(SecretsFileProvider::load(secrets_path)?))
    }

    #[must_use]
    pub fn layer(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.layers.push(Box::new(provider));
        self
    }
}

impl ConfigProvider for LayeredProvider {
    fn get(&self, name: &str) -> Option<String> {
        self.layers
            .iter()
            .filter_map(|layer| layer.get(name))
            .find(|value| !value.trim().is_empty())
    }
}
