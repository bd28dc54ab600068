//! Client configuration.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::client::Origin;
use crate::error::ConfigError;

/// Default user agent sent with every request.
pub const USER_AGENT: &str = concat!("jsonpedia/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the JSONpedia service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Service host name
    #[serde(default = "default_host")]
    pub host: String,
    /// Service port; omitted from URLs when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// User agent header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_user_agent() -> String {
    USER_AGENT.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::base_default()
    }
}

impl ClientConfig {
    fn base_default() -> Self {
        Self {
            host: default_host(),
            port: None,
            user_agent: default_user_agent(),
        }
    }

    pub fn origin(&self) -> Origin {
        Origin::new(self.host.clone(), self.port)
    }

    /// Default config file location (`<config dir>/jsonpedia/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("jsonpedia").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// Reads `path` when given, otherwise the default location if it exists,
    /// otherwise starts from defaults. Environment overrides apply last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => {
                    tracing::debug!("Loading config from: {}", path.display());
                    Self::load_from_path(&path)?
                }
                None => Self::default(),
            },
        };
        let config = config.with_env_overrides()?;
        if config.is_default() {
            tracing::debug!("Using default client configuration");
        }
        Ok(config)
    }

    /// Load configuration from a TOML or JSON file, chosen by extension.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        read_by_extension(path)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `JSONPEDIA_HOST`: service host name
    /// - `JSONPEDIA_PORT`: service port (empty string clears it)
    /// - `JSONPEDIA_USER_AGENT`: user agent header
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("JSONPEDIA_HOST").filter(|h| !h.is_empty()) {
            self.host = host;
        }
        if let Some(port) = lookup("JSONPEDIA_PORT") {
            self.port = if port.trim().is_empty() {
                None
            } else {
                Some(port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "JSONPEDIA_PORT".to_string(),
                    value: port.clone(),
                })?)
            };
        }
        if let Some(agent) = lookup("JSONPEDIA_USER_AGENT").filter(|a| !a.is_empty()) {
            self.user_agent = agent;
        }
        Ok(self)
    }

    /// Check if the config equals the default.
    pub fn is_default(&self) -> bool {
        *self == Self::base_default()
    }
}

/// Read a `.toml` or `.json` file; any other extension is rejected.
pub(crate) fn read_by_extension<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let format = path.extension().and_then(|e| e.to_str());
    if !matches!(format, Some("toml" | "json")) {
        return Err(ConfigError::UnsupportedFormat {
            path: path.display().to_string(),
        });
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    match format {
        Some("json") => Ok(serde_json::from_str(&contents)?),
        _ => Ok(toml::from_str(&contents)?),
    }
}
