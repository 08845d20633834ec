//! forge
//!
//! Abstraction over the remote hosting API.
//!
//! # Architecture
//!
//! The `Forge` trait defines one method per remote endpoint. The gateway
//! obtains a handle through a [`ClientFactory`] on every call and never
//! imports a concrete implementation.
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait, `ForgeError`, paging types
//! - `types`: Plain records for each resource kind
//! - [`github`]: GitHub REST v3 implementation
//! - [`mock`]: Mock implementation for deterministic testing
//! - `factory`: Endpoint selection and handle creation
//!
//! # Example
//!
//! ```no_run
//! use hubgate::env::{Environment, HttpSettings};
//! use hubgate::forge::{ClientFactory, GitHubClientFactory, RepoRef};
//!
//! # async fn demo() -> Result<(), hubgate::forge::ForgeError> {
//! let env = Environment::new("ghp_xxx", "github.com", None);
//! let forge = GitHubClientFactory::new(HttpSettings::default()).create(&env)?;
//! let repo = forge.get_repository(&RepoRef::new("octocat", "hello-world")).await?;
//! println!("default branch: {}", repo.default_branch);
//! # Ok(())
//! # }
//! ```

mod factory;
pub mod github;
pub mod mock;
mod traits;
mod types;

pub use factory::{api_base_for, ClientFactory, GitHubClientFactory};
pub use traits::*;
pub use types::*;
