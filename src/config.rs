//! User configuration management
//!
//! Configuration is stored in TOML format at `~/.mrfeature/config.toml`.
//! Every field has a default, so a missing file is equivalent to an empty one.
//!
//! # Examples
//!
//! ```no_run
//! use mrfeature::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::load()?;
//! println!("Release index: {}", config.index.url);
//!
//! config.set("network.retries", "5")?;
//! config.save()?;
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "MRFEATURE_CONFIG_DIR";

/// Environment variable overriding `index.url`
pub const INDEX_URL_ENV: &str = "MRFEATURE_INDEX_URL";

/// User configuration file (`~/.mrfeature/config.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Release index settings
    #[serde(default)]
    pub index: IndexConfig,

    /// HTTP transport settings
    #[serde(default)]
    pub network: NetworkConfig,

    /// Dependency resolver settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Externally distributed package settings
    #[serde(default)]
    pub repackage: RepackageConfig,

    /// Local paths
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Endpoint returning the list of releases and their assets
    #[serde(default = "default_index_url")]
    pub url: String,

    /// Namespace prefix of every artifact published in the index
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_index_url() -> String {
    "https://api.github.com/repos/MixedRealityToolkit/MixedRealityToolkit-Unity/releases"
        .to_string()
}

fn default_namespace() -> String {
    "org.mixedrealitytoolkit".to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: default_index_url(),
            namespace: default_namespace(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds (0 = no timeout)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Extra attempts after a failed request
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Base delay between attempts; attempt N waits N times this long
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// User-Agent header (the GitHub API rejects requests without one)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    format!("mrfeature/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            retries: default_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            user_agent: default_user_agent(),
        }
    }
}

/// Dependency resolver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Maximum dependency depth; deeper branches are dropped (default: 64)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    64
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepackageConfig {
    /// Source archive location for the graphics tools package; `{version}` is substituted
    #[serde(default = "default_graphics_tools_url")]
    pub graphics_tools_url: String,
}

fn default_graphics_tools_url() -> String {
    "https://github.com/microsoft/MixedReality-GraphicsTools-Unity/archive/refs/tags/v{version}.tar.gz"
        .to_string()
}

impl Default for RepackageConfig {
    fn default() -> Self {
        Self {
            graphics_tools_url: default_graphics_tools_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Scratch space for metadata downloads and repackaging (`~` is expanded)
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
}

fn default_cache_dir() -> String {
    "~/.mrfeature/cache".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
        }
    }
}

impl PathsConfig {
    /// Cache directory with `~` and environment variables expanded
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.cache_dir).map_err(|e| {
            Error::Other(format!(
                "Could not expand cache directory '{}': {}",
                self.cache_dir, e
            ))
        })?;
        Ok(PathBuf::from(expanded.as_ref()))
    }
}

/// Keys accepted by [`Config::set`]
pub const SETTABLE_KEYS: &[&str] = &[
    "index.url",
    "index.namespace",
    "network.timeout_seconds",
    "network.retries",
    "network.retry_backoff_ms",
    "network.user_agent",
    "resolver.max_depth",
    "repackage.graphics_tools_url",
    "paths.cache_dir",
];

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Other(format!("{} expects a non-negative integer, got '{}'", key, value)))
}

impl Config {
    /// Get the default config file path
    ///
    /// Uses MRFEATURE_CONFIG_DIR if set, otherwise ~/.mrfeature/config.toml
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(config_dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(config_dir).join("config.toml"));
        }

        let home = dirs::home_dir()
            .ok_or_else(|| Error::Other("Could not find home directory".to_string()))?;

        Ok(home.join(".mrfeature").join("config.toml"))
    }

    /// Load config from file, or fall back to defaults if it doesn't exist
    ///
    /// Environment variable overrides:
    /// - `MRFEATURE_INDEX_URL`: overrides `index.url`
    /// - `MRFEATURE_CONFIG_DIR`: overrides the config directory location
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;

        if let Ok(url) = std::env::var(INDEX_URL_ENV) {
            if !url.is_empty() {
                config.index.url = url;
            }
        }

        Ok(config)
    }

    /// Load the config file as written, without environment overrides
    pub fn load_file() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Update one setting by its dotted key, e.g. `network.retries`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "index.url" => self.index.url = value.to_string(),
            "index.namespace" => self.index.namespace = value.to_string(),
            "network.timeout_seconds" => self.network.timeout_seconds = parse_number(key, value)?,
            "network.retries" => self.network.retries = parse_number(key, value)?,
            "network.retry_backoff_ms" => self.network.retry_backoff_ms = parse_number(key, value)?,
            "network.user_agent" => self.network.user_agent = value.to_string(),
            "resolver.max_depth" => self.resolver.max_depth = parse_number(key, value)?,
            "repackage.graphics_tools_url" => {
                if !value.contains("{version}") {
                    return Err(Error::Other(format!(
                        "repackage.graphics_tools_url must contain '{{version}}', got '{}'",
                        value
                    )));
                }
                self.repackage.graphics_tools_url = value.to_string();
            }
            "paths.cache_dir" => self.paths.cache_dir = value.to_string(),
            _ => {
                return Err(Error::Other(format!(
                    "Unknown configuration key '{}'\n\nAvailable keys:\n  {}",
                    key,
                    SETTABLE_KEYS.join("\n  ")
                )))
            }
        }
        Ok(())
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }
}
