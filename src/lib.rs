//! hubgate - GitHub operations as tools for automated agents
//!
//! hubgate exposes a fixed catalogue of GitHub operations (repositories,
//! issues, pull requests, branches, commits, file contents and code search)
//! behind one uniform contract: every call takes named JSON arguments and
//! returns a JSON [`envelope::Envelope`], success or error, and never panics
//! across the boundary.
//!
//! # Architecture
//!
//! The codebase is layered:
//!
//! - [`cli`] - Binary surface: `tools`, `call`, and the stdio `serve` loop
//! - [`tools`] - Static registry of tool names, schemas and operations
//! - [`gateway`] - Validates arguments, resolves the target, runs the remote
//!   calls and shapes the payload
//! - [`env`] - Credential, host and default repository resolution
//! - [`forge`] - Remote API abstraction with GitHub and mock implementations
//! - [`envelope`] - The result contract shared by every operation
//!
//! # Invariants
//!
//! 1. Every call re-reads its configuration; nothing is cached between calls
//! 2. Argument errors are reported before any remote handle is created
//! 3. The credential never appears in logs or `Debug` output
//! 4. List results never exceed the requested limit

pub mod cli;
pub mod env;
pub mod envelope;
pub mod forge;
pub mod gateway;
pub mod tools;
