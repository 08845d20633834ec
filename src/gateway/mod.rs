//! gateway
//!
//! The operation gateway: one entry point per tool, each returning an
//! [`Envelope`].
//!
//! # Call Skeleton
//!
//! Every operation runs the same steps, in order:
//! 1. Validate arguments ([`ToolArgs`]); no factory call on failure
//! 2. Resolve the environment ([`Resolver`])
//! 3. Create a handle through the [`ClientFactory`]
//! 4. Resolve the target repository (explicit argument, then default)
//! 5. Perform the remote calls, paging through [`paging`]
//! 6. Build the payload with a fixed key set
//!
//! Failures at any step become an error envelope. A panic inside an
//! operation is caught in [`Gateway::call`] and reported as `internal`.
//!
//! # Modules
//!
//! - [`args`]: typed argument access
//! - [`error`]: `GatewayError` and remote error classification
//! - [`paging`]: client-side limit and filter policy
//! - `repositories`, `issues`, `pulls`, `branches`, `commits`, `contents`:
//!   the operations, grouped by resource
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use hubgate::env::{OverrideSource, Resolver};
//! use hubgate::envelope::ErrorKind;
//! use hubgate::forge::mock::{self, MockClientFactory, MockForge};
//! use hubgate::gateway::Gateway;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let forge = MockForge::new().with_repository(mock::repository("acme/widgets"));
//! let resolver = Resolver::new(vec![Arc::new(
//!     OverrideSource::new().with("GITHUB_TOKEN", "ghp_1234567890"),
//! )]);
//! let gateway = Gateway::new(resolver, MockClientFactory::new(forge));
//!
//! let ok = gateway
//!     .call("get_repository", json!({"repository": "acme/widgets"}))
//!     .await;
//! assert!(ok.is_success());
//!
//! let missing = gateway.call("get_issue", json!({})).await;
//! assert_eq!(missing.error_kind(), Some(ErrorKind::InvalidArgument));
//! # }
//! ```

pub mod args;
mod branches;
mod commits;
mod contents;
pub mod error;
mod issues;
pub mod paging;
mod pulls;
mod repositories;

pub use args::ToolArgs;
pub use error::{classify, GatewayError};

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde_json::Value;

use crate::env::{Environment, Resolver, REPOSITORY_VAR};
use crate::envelope::{Envelope, ErrorKind, Payload};
use crate::forge::{ClientFactory, Forge, GitHubClientFactory, RepoRef};
use crate::tools;

/// Every operation the gateway exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListRepositories,
    GetRepository,
    SearchRepositories,
    ListIssues,
    GetIssue,
    CreateIssue,
    AddIssueComment,
    SearchIssues,
    ListPullRequests,
    GetPullRequest,
    AddPullRequestComment,
    MergePullRequest,
    ListBranches,
    CreateBranch,
    GetCommit,
    ListCommits,
    FindCommitsByMessage,
    GetFileContents,
    ListDirectoryContents,
    CreateOrUpdateFile,
    SearchCode,
}

/// Stateless operation dispatcher.
///
/// Holds only read-only lookup sources and a factory, so one instance can be
/// shared behind an `Arc` and called concurrently.
pub struct Gateway<F: ClientFactory = GitHubClientFactory> {
    resolver: Resolver,
    factory: F,
}

impl<F: ClientFactory> Gateway<F> {
    pub fn new(resolver: Resolver, factory: F) -> Self {
        Self { resolver, factory }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Run the tool named `tool` with JSON `arguments`.
    ///
    /// Never fails and never panics: every outcome is an [`Envelope`].
    pub async fn call(&self, tool: &str, arguments: Value) -> Envelope {
        let Some(entry) = tools::find(tool) else {
            tracing::warn!(tool, "unknown tool");
            return Envelope::error(
                ErrorKind::InvalidArgument,
                format!("Unknown tool: {}", tool),
            );
        };

        let outcome = AssertUnwindSafe(async {
            let args = ToolArgs::from_value(arguments)?;
            self.execute(entry.operation, &args).await
        })
        .catch_unwind()
        .await;

        match outcome {
            Ok(Ok(payload)) => {
                tracing::debug!(tool, "operation succeeded");
                Envelope::success(payload)
            }
            Ok(Err(err)) => {
                tracing::warn!(tool, kind = %err.kind(), error = %err, "operation failed");
                err.into()
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(tool, panic = %message, "operation panicked");
                GatewayError::Internal(message).into()
            }
        }
    }

    /// Run `operation` with already-wrapped arguments.
    pub async fn execute(
        &self,
        operation: Operation,
        args: &ToolArgs,
    ) -> Result<Payload, GatewayError> {
        match operation {
            Operation::ListRepositories => self.list_repositories(args).await,
            Operation::GetRepository => self.get_repository(args).await,
            Operation::SearchRepositories => self.search_repositories(args).await,
            Operation::ListIssues => self.list_issues(args).await,
            Operation::GetIssue => self.get_issue(args).await,
            Operation::CreateIssue => self.create_issue(args).await,
            Operation::AddIssueComment => self.add_issue_comment(args).await,
            Operation::SearchIssues => self.search_issues(args).await,
            Operation::ListPullRequests => self.list_pull_requests(args).await,
            Operation::GetPullRequest => self.get_pull_request(args).await,
            Operation::AddPullRequestComment => self.add_pull_request_comment(args).await,
            Operation::MergePullRequest => self.merge_pull_request(args).await,
            Operation::ListBranches => self.list_branches(args).await,
            Operation::CreateBranch => self.create_branch(args).await,
            Operation::GetCommit => self.get_commit(args).await,
            Operation::ListCommits => self.list_commits(args).await,
            Operation::FindCommitsByMessage => self.find_commits_by_message(args).await,
            Operation::GetFileContents => self.get_file_contents(args).await,
            Operation::ListDirectoryContents => self.list_directory_contents(args).await,
            Operation::CreateOrUpdateFile => self.create_or_update_file(args).await,
            Operation::SearchCode => self.search_code(args).await,
        }
    }

    /// Steps 2 and 3: environment, then handle.
    fn open_session(&self) -> Result<Session, GatewayError> {
        let env = self.resolver.resolve()?;
        let forge = self
            .factory
            .create(&env)
            .map_err(GatewayError::RemoteUnavailable)?;
        Ok(Session { env, forge })
    }
}

/// Resolved environment plus a live handle, scoped to one call.
pub(crate) struct Session {
    env: Environment,
    forge: Box<dyn Forge>,
}

impl Session {
    pub(crate) fn forge(&self) -> &dyn Forge {
        self.forge.as_ref()
    }

    /// Step 4: the explicit argument wins, then the configured default.
    pub(crate) fn repository(&self, explicit: Option<RepoRef>) -> Result<RepoRef, GatewayError> {
        if let Some(repo) = explicit {
            return Ok(repo);
        }
        match self.env.default_repository() {
            Some(default) => RepoRef::parse(default).ok_or_else(|| {
                GatewayError::invalid_argument(format!(
                    "Default repository '{}' from {} must be in 'owner/name' form",
                    default, REPOSITORY_VAR
                ))
            }),
            None => Err(GatewayError::invalid_argument(format!(
                "Repository name is required: pass 'repository' or set {}",
                REPOSITORY_VAR
            ))),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "operation panicked".to_string()
    }
}
