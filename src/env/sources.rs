//! env::sources
//!
//! Lookup tiers consulted by the [`Resolver`](super::Resolver).
//!
//! # Design
//!
//! Each tier answers "what is the value of this name?" and nothing else.
//! Precedence is decided by the order the resolver is given, so tests can
//! inject an [`OverrideSource`] in front of the process environment without
//! touching real process state.

use std::collections::HashMap;

/// A single configuration lookup tier.
///
/// Implementations must be read-only after construction; the resolver may be
/// shared across concurrently running gateway calls.
pub trait LookupSource: Send + Sync {
    /// Short label used in diagnostics (never includes values).
    fn label(&self) -> &'static str;

    /// Look up a value by name.
    ///
    /// Returns `None` when the name is unset. Empty strings are returned
    /// as-is; the resolver treats them as absent.
    fn lookup(&self, name: &str) -> Option<String>;
}

/// In-process override values, checked before the process environment.
///
/// # Example
///
/// ```
/// use hubgate::env::{LookupSource, OverrideSource};
///
/// let source = OverrideSource::new().with("GITHUB_REPOSITORY", "acme/widgets");
/// assert_eq!(source.lookup("GITHUB_REPOSITORY").as_deref(), Some("acme/widgets"));
/// assert!(source.lookup("GITHUB_HOST").is_none());
/// ```
#[derive(Clone, Default)]
pub struct OverrideSource {
    values: HashMap<String, String>,
}

impl OverrideSource {
    /// Create an empty override tier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Add a value only when one is given.
    pub fn with_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }

    /// Number of override entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no overrides are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// Values may be secrets, so only the names are shown.
impl std::fmt::Debug for OverrideSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.values.keys().collect();
        names.sort();
        f.debug_struct("OverrideSource")
            .field("names", &names)
            .finish()
    }
}

impl LookupSource for OverrideSource {
    fn label(&self) -> &'static str {
        "override"
    }

    fn lookup(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// The ambient process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvSource;

impl LookupSource for ProcessEnvSource {
    fn label(&self) -> &'static str {
        "process-env"
    }

    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}
