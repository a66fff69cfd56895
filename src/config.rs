use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub catalog: CatalogProperties,
    pub server: ServerConfig,
    #[serde(default)]
    pub sources: BTreeMap<String, DataSourceConfiguration>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Properties of the Catalog resource, applied once when it is created.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogProperties {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Public base URL of the value API, used for the secondary distribution.
    pub external_url: String,
    /// Description document of the value API, if published.
    #[serde(default)]
    pub api_description: Option<String>,
}

/// One configured remote service.
#[derive(Debug, Deserialize, Clone)]
pub struct DataSourceConfiguration {
    /// Display name; filled from the table key when omitted.
    #[serde(default)]
    pub item_name: String,
    pub url: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Restricts dispatch to the connector with this name.
    #[serde(default)]
    pub connector: Option<String>,
    #[serde(default = "default_service_type", rename = "type")]
    pub service_type: String,
    #[serde(default = "default_supports_first_last")]
    pub supports_first_last: bool,
    #[serde(default)]
    pub allowed_offerings: Option<Vec<String>>,
    /// Decoded service snapshot replayed by the snapshot client.
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
    #[serde(default)]
    pub job: DataSourceJobConfiguration,
}

fn default_service_type() -> String {
    "SOS".to_string()
}
fn default_supports_first_last() -> bool {
    true
}

impl DataSourceConfiguration {
    pub fn new(item_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            item_name: item_name.into(),
            url: url.into(),
            version: None,
            connector: None,
            service_type: default_service_type(),
            supports_first_last: default_supports_first_last(),
            allowed_offerings: None,
            snapshot: None,
            job: DataSourceJobConfiguration::default(),
        }
    }

    /// Whether the offering passes the configured allow-list.
    pub fn is_offering_allowed(&self, offering: &str) -> bool {
        match &self.allowed_offerings {
            Some(allowed) => allowed.iter().any(|o| o == offering),
            None => true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataSourceJobConfiguration {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default)]
    pub triggered_at_startup: bool,
}

impl Default for DataSourceJobConfiguration {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 3600,
            triggered_at_startup: false,
        }
    }
}

fn default_enabled() -> bool {
    true
}
fn default_interval_secs() -> u64 {
    3600
}

impl Config {
    /// Enabled sources in name order.
    pub fn enabled_sources(&self) -> Vec<DataSourceConfiguration> {
        self.sources
            .values()
            .filter(|s| s.job.enabled)
            .cloned()
            .collect()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let mut config: Config =
        toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if url::Url::parse(&config.server.external_url).is_err() {
        anyhow::bail!(
            "server.external_url must be an absolute URL, got '{}'",
            config.server.external_url
        );
    }
    if !config.server.external_url.ends_with('/') {
        config.server.external_url.push('/');
    }

    for (key, source) in config.sources.iter_mut() {
        if source.item_name.is_empty() {
            source.item_name = key.clone();
        }
        if url::Url::parse(&source.url).is_err() {
            anyhow::bail!(
                "sources.{}.url must be an absolute URL, got '{}'",
                key,
                source.url
            );
        }
        if source.job.interval_secs == 0 {
            anyhow::bail!("sources.{}.job.interval_secs must be > 0", key);
        }
    }

    Ok(config)
}
