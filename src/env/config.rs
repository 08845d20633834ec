//! env::config
//!
//! Optional configuration file.
//!
//! # Locations
//!
//! Searched in order, first existing file wins:
//! 1. `$HUBGATE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/hubgate/config.toml`
//! 3. `~/.hubgate/config.toml`
//!
//! A missing file is not an error; defaults are used. A file that exists but
//! cannot be read or parsed is.
//!
//! # Example
//!
//! ```toml
//! [github]
//! host = "github.example.com"
//! repository = "acme/widgets"
//!
//! [http]
//! timeout_secs = 20
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::sources::LookupSource;
use super::{HOST_VAR, REPOSITORY_VAR, TOKEN_VAR};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_VAR: &str = "HUBGATE_CONFIG";

/// Default transport timeout for remote calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default User-Agent sent to the remote API.
pub const DEFAULT_USER_AGENT: &str = "hubgate";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Lowest-precedence GitHub settings.
    pub github: Option<GitHubSection>,

    /// Transport settings.
    pub http: Option<HttpSection>,
}

/// `[github]` table.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubSection {
    pub token: Option<String>,
    pub host: Option<String>,
    pub repository: Option<String>,
}

impl std::fmt::Debug for GitHubSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubSection")
            .field("has_token", &self.token.is_some())
            .field("host", &self.host)
            .field("repository", &self.repository)
            .finish()
    }
}

/// `[http]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSection {
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

/// Effective transport settings after defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// A config file together with where it came from.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: FileConfig,
    pub path: Option<PathBuf>,
}

impl FileConfig {
    /// Load from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation.
    pub fn load() -> Result<LoadedConfig, ConfigError> {
        match Self::locate() {
            Some(path) => {
                let config = Self::load_from(&path)?;
                Ok(LoadedConfig {
                    config,
                    path: Some(path),
                })
            }
            None => Ok(LoadedConfig::default()),
        }
    }

    /// Find the first existing config file.
    fn locate() -> Option<PathBuf> {
        // 1. Check $HUBGATE_CONFIG
        if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/hubgate/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("hubgate/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.hubgate/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".hubgate/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Read, parse and validate a config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(http) = &self.http {
            if http.timeout_secs == Some(0) {
                return Err(ConfigError::InvalidValue(
                    "http.timeout_secs must be greater than 0".into(),
                ));
            }
            if let Some(agent) = &http.user_agent {
                if agent.trim().is_empty() {
                    return Err(ConfigError::InvalidValue(
                        "http.user_agent must not be empty".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Transport settings with defaults applied.
    pub fn http_settings(&self) -> HttpSettings {
        let defaults = HttpSettings::default();
        let Some(http) = &self.http else {
            return defaults;
        };
        HttpSettings {
            timeout: http
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            user_agent: http.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }

    /// The `[github]` table as a lookup tier, if present.
    pub fn lookup_source(&self) -> Option<ConfigFileSource> {
        self.github.clone().map(|github| ConfigFileSource { github })
    }
}

/// Lookup tier backed by the `[github]` table of the config file.
///
/// Only answers the primary names; aliases are an environment concern.
#[derive(Debug, Clone)]
pub struct ConfigFileSource {
    github: GitHubSection,
}

impl LookupSource for ConfigFileSource {
    fn label(&self) -> &'static str {
        "config-file"
    }

    fn lookup(&self, name: &str) -> Option<String> {
        match name {
            TOKEN_VAR => self.github.token.clone(),
            HOST_VAR => self.github.host.clone(),
            REPOSITORY_VAR => self.github.repository.clone(),
            _ => None,
        }
    }
}
