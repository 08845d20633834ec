//! forge::traits
//!
//! Forge trait definition for talking to the remote hosting API.
//!
//! # Design
//!
//! The `Forge` trait is async because every operation is network I/O. One
//! method per remote endpoint; no method combines calls. Composition
//! (merge guard, branch creation, paging up to a limit) is the gateway's job,
//! so a mock only has to answer single requests.
//!
//! Listing methods take a [`PageRequest`] and return one page as a
//! [`Listing`]. The `total` field is only set when the remote reports a
//! total for free (the search endpoints).
//!
//! # Example
//!
//! ```
//! use hubgate::forge::mock::MockForge;
//! use hubgate::forge::{Forge, PageRequest, RepoRef, StateFilter};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let forge = MockForge::new();
//! let repo = RepoRef::new("acme", "widgets");
//!
//! let page = forge
//!     .list_issues(&repo, StateFilter::Open, PageRequest::first(30))
//!     .await
//!     .unwrap();
//! assert!(page.items.is_empty());
//! assert!(page.total.is_none());
//! # });
//! ```

use async_trait::async_trait;
use thiserror::Error;

use super::types::{
    Branch, CodeHit, Comment, Commit, CommitFilter, Contents, FileCommit, FileWrite, GitRef,
    Issue, MergeOutcome, MergeRequest, NewIssue, PullRequest, PullRequestFile, RepoRef,
    Repository, StateFilter,
};

/// Largest page size the remote accepts.
pub const MAX_PER_PAGE: u32 = 100;

/// Errors from forge operations.
///
/// These map to the common failure modes of a REST hosting API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForgeError {
    /// Credential refused (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network, timeout or connection error during a request.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The client could not be built.
    #[error("connection setup failed: {0}")]
    Connection(String),

    /// A response arrived but could not be understood.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// One page of a listing request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// The first page with the given size, clamped to `1..=MAX_PER_PAGE`.
    pub fn first(per_page: u32) -> Self {
        Self {
            page: 1,
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// The page after this one.
    pub fn next(self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            per_page: self.per_page,
        }
    }

    /// Number of items before this page.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.per_page as usize
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    /// Total matches across all pages, when the remote reports it.
    pub total: Option<u64>,
}

impl<T> Listing<T> {
    /// A page without a reported total.
    pub fn page(items: Vec<T>) -> Self {
        Self { items, total: None }
    }

    /// A page with a reported total.
    pub fn with_total(items: Vec<T>, total: u64) -> Self {
        Self {
            items,
            total: Some(total),
        }
    }
}

/// A search request. `q` is the full query including qualifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub q: String,
    /// Sort field; `None` keeps the remote's best-match order.
    pub sort: Option<&'static str>,
    pub order: Option<&'static str>,
}

impl SearchQuery {
    /// Best-match order.
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            sort: None,
            order: None,
        }
    }

    /// Sort descending by `field`.
    pub fn sorted_desc(q: impl Into<String>, field: &'static str) -> Self {
        Self {
            q: q.into(),
            sort: Some(field),
            order: Some("desc"),
        }
    }
}

/// The Forge trait for interacting with the remote hosting API.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a handle is owned by one gateway
/// call, but calls run on a multi-threaded runtime.
///
/// # Error Handling
///
/// All methods return `Result<T, ForgeError>`. A missing resource is always
/// `NotFound`, never an empty success.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Get the forge name (e.g., "github", "mock").
    fn name(&self) -> &'static str;

    // Repositories

    /// Repositories of the authenticated user.
    async fn current_user_repositories(
        &self,
        page: PageRequest,
    ) -> Result<Listing<Repository>, ForgeError>;

    async fn get_repository(&self, repo: &RepoRef) -> Result<Repository, ForgeError>;

    async fn search_repositories(
        &self,
        query: &SearchQuery,
        page: PageRequest,
    ) -> Result<Listing<Repository>, ForgeError>;

    // Issues

    /// List issues. The remote mixes pull requests into this listing; they
    /// come back with `is_pull_request` set.
    async fn list_issues(
        &self,
        repo: &RepoRef,
        state: StateFilter,
        page: PageRequest,
    ) -> Result<Listing<Issue>, ForgeError>;

    async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<Issue, ForgeError>;

    /// Comments on an issue or pull request.
    async fn list_issue_comments(
        &self,
        repo: &RepoRef,
        number: u64,
        page: PageRequest,
    ) -> Result<Listing<Comment>, ForgeError>;

    async fn create_issue(&self, repo: &RepoRef, issue: NewIssue) -> Result<Issue, ForgeError>;

    /// Add a comment to an issue or pull request.
    async fn add_issue_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<Comment, ForgeError>;

    async fn search_issues(
        &self,
        query: &SearchQuery,
        page: PageRequest,
    ) -> Result<Listing<Issue>, ForgeError>;

    // Pull requests

    async fn list_pull_requests(
        &self,
        repo: &RepoRef,
        state: StateFilter,
        page: PageRequest,
    ) -> Result<Listing<PullRequest>, ForgeError>;

    async fn get_pull_request(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<PullRequest, ForgeError>;

    async fn list_pull_request_files(
        &self,
        repo: &RepoRef,
        number: u64,
        page: PageRequest,
    ) -> Result<Listing<PullRequestFile>, ForgeError>;

    /// Merge unconditionally. Callers check the merged state first.
    async fn merge_pull_request(
        &self,
        repo: &RepoRef,
        number: u64,
        request: MergeRequest,
    ) -> Result<MergeOutcome, ForgeError>;

    // Branches and refs

    async fn list_branches(
        &self,
        repo: &RepoRef,
        page: PageRequest,
    ) -> Result<Listing<Branch>, ForgeError>;

    async fn get_branch(&self, repo: &RepoRef, name: &str) -> Result<Branch, ForgeError>;

    /// Head sha of `refs/heads/<branch>`.
    async fn resolve_branch_ref(&self, repo: &RepoRef, branch: &str)
        -> Result<String, ForgeError>;

    /// Create a fully qualified ref (e.g. `refs/heads/feature`).
    async fn create_ref(
        &self,
        repo: &RepoRef,
        name: &str,
        sha: &str,
    ) -> Result<GitRef, ForgeError>;

    // Commits

    async fn get_commit(&self, repo: &RepoRef, sha: &str) -> Result<Commit, ForgeError>;

    async fn list_commits(
        &self,
        repo: &RepoRef,
        filter: &CommitFilter,
        page: PageRequest,
    ) -> Result<Listing<Commit>, ForgeError>;

    // Contents

    /// File or directory at `path`. The empty path is the repository root.
    async fn get_contents(
        &self,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Contents, ForgeError>;

    async fn put_file(&self, repo: &RepoRef, write: FileWrite) -> Result<FileCommit, ForgeError>;

    async fn search_code(
        &self,
        query: &SearchQuery,
        page: PageRequest,
    ) -> Result<Listing<CodeHit>, ForgeError>;
}
