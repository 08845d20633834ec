//! env
//!
//! Environment resolution: credential, host, and default repository.
//!
//! # Precedence
//!
//! Every name is looked up across an explicit, ordered list of
//! [`LookupSource`]s; the first non-empty value wins. The standard chain is:
//! 1. [`OverrideSource`] (CLI flags, tests)
//! 2. [`ProcessEnvSource`]
//! 3. [`ConfigFileSource`] (the `[github]` table, when a file exists)
//!
//! Names are tried primary-first: `GITHUB_TOKEN` is searched in every tier
//! before the `GITHUB_PERSONAL_ACCESS_TOKEN` alias is.
//!
//! # Security
//!
//! The token is never logged or included in `Debug` output. The only
//! diagnostic is a redacted preview, see [`redact_token`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use hubgate::env::{OverrideSource, Resolver};
//!
//! let resolver = Resolver::new(vec![Arc::new(
//!     OverrideSource::new()
//!         .with("GITHUB_TOKEN", "ghp_1234567890")
//!         .with("GITHUB_REPOSITORY", "acme/widgets"),
//! )]);
//!
//! let env = resolver.resolve().unwrap();
//! assert_eq!(env.host(), "github.com");
//! assert_eq!(env.default_repository(), Some("acme/widgets"));
//! assert!(!env.is_enterprise());
//! ```

pub mod config;
mod sources;

use std::sync::Arc;

use thiserror::Error;

pub use config::{ConfigError, ConfigFileSource, FileConfig, HttpSettings, LoadedConfig};
pub use sources::{LookupSource, OverrideSource, ProcessEnvSource};

/// Primary token name.
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";
/// Token alias, checked when the primary name yields nothing.
pub const TOKEN_ALIAS_VAR: &str = "GITHUB_PERSONAL_ACCESS_TOKEN";
/// Primary host name.
pub const HOST_VAR: &str = "GITHUB_HOST";
/// Host alias.
pub const HOST_ALIAS_VAR: &str = "GH_HOST";
/// Default repository, `owner/name`.
pub const REPOSITORY_VAR: &str = "GITHUB_REPOSITORY";
/// Public host used when none is configured.
pub const DEFAULT_HOST: &str = "github.com";

/// Errors from environment resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    /// No non-empty token under any accepted name.
    #[error("no token found in {TOKEN_VAR} or {TOKEN_ALIAS_VAR}")]
    Unconfigured,
}

/// Resolved configuration for one gateway call.
///
/// Immutable once resolved; a new one is built for every call.
#[derive(Clone, PartialEq, Eq)]
pub struct Environment {
    token: String,
    host: String,
    default_repository: Option<String>,
}

impl Environment {
    /// Build an environment directly. An empty host falls back to
    /// [`DEFAULT_HOST`] and an empty repository to `None`.
    pub fn new(
        token: impl Into<String>,
        host: impl Into<String>,
        default_repository: Option<String>,
    ) -> Self {
        let host = host.into();
        Self {
            token: token.into(),
            host: if host.trim().is_empty() {
                DEFAULT_HOST.to_string()
            } else {
                host
            },
            default_repository: default_repository.filter(|r| !r.trim().is_empty()),
        }
    }

    /// The raw credential. Do not log it.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn default_repository(&self) -> Option<&str> {
        self.default_repository.as_deref()
    }

    /// Whether the host names a self-hosted instance.
    pub fn is_enterprise(&self) -> bool {
        is_enterprise_host(&self.host)
    }

    /// Redacted token preview, safe to log.
    pub fn token_preview(&self) -> String {
        redact_token(&self.token)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("token", &self.token_preview())
            .field("host", &self.host)
            .field("default_repository", &self.default_repository)
            .finish()
    }
}

/// Whether `host` names a self-hosted instance rather than the public one.
///
/// Empty, `github.com` and `https://github.com` are public; anything else is
/// enterprise.
///
/// ```
/// use hubgate::env::is_enterprise_host;
///
/// assert!(!is_enterprise_host("github.com"));
/// assert!(!is_enterprise_host("https://github.com"));
/// assert!(!is_enterprise_host(""));
/// assert!(is_enterprise_host("github.acme.internal"));
/// ```
pub fn is_enterprise_host(host: &str) -> bool {
    !host.is_empty() && host != DEFAULT_HOST && host != "https://github.com"
}

/// Redacted preview of a credential: first 4 + `...` + last 4 characters for
/// tokens longer than 8 characters, `****` otherwise.
///
/// ```
/// use hubgate::env::redact_token;
///
/// assert_eq!(redact_token("ghp_abcdefghijkl"), "ghp_...ijkl");
/// assert_eq!(redact_token("short"), "****");
/// ```
pub fn redact_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "****".to_string()
    }
}

/// Ordered lookup chain producing an [`Environment`].
#[derive(Clone)]
pub struct Resolver {
    sources: Vec<Arc<dyn LookupSource>>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<&str> = self.sources.iter().map(|s| s.label()).collect();
        f.debug_struct("Resolver").field("sources", &labels).finish()
    }
}

impl Resolver {
    /// Create a resolver over an explicit list of sources, highest
    /// precedence first.
    pub fn new(sources: Vec<Arc<dyn LookupSource>>) -> Self {
        Self { sources }
    }

    /// The standard chain: overrides, process environment, then the config
    /// file tier when one was loaded.
    pub fn standard(overrides: OverrideSource, file: Option<ConfigFileSource>) -> Self {
        let mut sources: Vec<Arc<dyn LookupSource>> =
            vec![Arc::new(overrides), Arc::new(ProcessEnvSource)];
        if let Some(file) = file {
            sources.push(Arc::new(file));
        }
        Self::new(sources)
    }

    /// Labels of the configured tiers, in precedence order.
    pub fn source_labels(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.label()).collect()
    }

    /// First non-empty value for any of `names`, trying each name across all
    /// tiers before moving to the next name.
    fn first_non_empty(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| {
            self.sources.iter().find_map(|source| {
                source
                    .lookup(name)
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            })
        })
    }

    /// Resolve the environment for one call.
    ///
    /// Emits one `info` event with the host, default repository and a
    /// redacted token preview.
    ///
    /// # Errors
    ///
    /// [`EnvError::Unconfigured`] if no token is found.
    pub fn resolve(&self) -> Result<Environment, EnvError> {
        let Some(token) = self.first_non_empty(&[TOKEN_VAR, TOKEN_ALIAS_VAR]) else {
            tracing::warn!(
                sources = ?self.source_labels(),
                "GitHub token not found in {} or {}",
                TOKEN_VAR,
                TOKEN_ALIAS_VAR
            );
            return Err(EnvError::Unconfigured);
        };

        let host = self
            .first_non_empty(&[HOST_VAR, HOST_ALIAS_VAR])
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let repository = self.first_non_empty(&[REPOSITORY_VAR]);

        let env = Environment::new(token, host, repository);
        tracing::info!(
            host = %env.host(),
            token = %env.token_preview(),
            default_repository = env.default_repository().unwrap_or(""),
            "GitHub configuration resolved"
        );
        Ok(env)
    }
}
