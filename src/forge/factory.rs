//! forge::factory
//!
//! Client selection and creation.
//!
//! # Design
//!
//! The gateway never constructs a client directly; it asks a
//! [`ClientFactory`] for a fresh handle on every call. Production uses
//! [`GitHubClientFactory`]; tests substitute
//! [`MockClientFactory`](super::mock::MockClientFactory), which also counts
//! how often it was asked.
//!
//! # Endpoint Selection
//!
//! The host decides the API base:
//! - `github.com` (bare or `https://`-prefixed) or empty → `https://api.github.com`
//! - anything else → GitHub Enterprise at `<host>/api/v3`
//!
//! # Example
//!
//! ```
//! use hubgate::forge::api_base_for;
//!
//! assert_eq!(api_base_for("github.com"), "https://api.github.com");
//! assert_eq!(api_base_for("ghe.acme.io"), "https://ghe.acme.io/api/v3");
//! assert_eq!(api_base_for("http://10.0.0.5:8080/"), "http://10.0.0.5:8080/api/v3");
//! assert_eq!(api_base_for("https://ghe.acme.io/api/v3"), "https://ghe.acme.io/api/v3");
//! ```

use super::github::{GitHubClient, PUBLIC_API_BASE};
use super::traits::{Forge, ForgeError};
use crate::env::{is_enterprise_host, Environment, HttpSettings};

/// Produces one authenticated handle per gateway call.
///
/// Implementations must not cache handles; every call gets its own.
pub trait ClientFactory: Send + Sync {
    /// Create a handle bound to `env`.
    ///
    /// # Errors
    ///
    /// `ForgeError::Connection` (or any other `ForgeError`) when no handle
    /// can be built. The gateway reports this as the remote being
    /// unavailable.
    fn create(&self, env: &Environment) -> Result<Box<dyn Forge>, ForgeError>;
}

/// Factory for real GitHub clients.
#[derive(Debug, Clone, Default)]
pub struct GitHubClientFactory {
    http: HttpSettings,
}

impl GitHubClientFactory {
    /// Create a factory using the given transport settings.
    pub fn new(http: HttpSettings) -> Self {
        Self { http }
    }

    /// Transport settings applied to every client.
    pub fn http(&self) -> &HttpSettings {
        &self.http
    }
}

impl ClientFactory for GitHubClientFactory {
    fn create(&self, env: &Environment) -> Result<Box<dyn Forge>, ForgeError> {
        let api_base = api_base_for(env.host());
        tracing::debug!(
            host = env.host(),
            api_base = %api_base,
            enterprise = env.is_enterprise(),
            "creating GitHub client"
        );
        let client = GitHubClient::new(env.token(), api_base, &self.http)?;
        Ok(Box::new(client))
    }
}

/// API base URL for a configured host.
///
/// Public hosts map to `https://api.github.com`. Enterprise hosts keep an
/// explicit scheme (default `https`), lose trailing slashes, and get
/// `/api/v3` appended unless they already contain `/api/`.
pub fn api_base_for(host: &str) -> String {
    if !is_enterprise_host(host) {
        return PUBLIC_API_BASE.to_string();
    }

    let host = host.trim().trim_end_matches('/');
    let with_scheme = if host.starts_with("https://") || host.starts_with("http://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    };

    if with_scheme.contains("/api/") {
        with_scheme
    } else {
        format!("{}/api/v3", with_scheme)
    }
}
