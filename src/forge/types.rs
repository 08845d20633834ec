//! forge::types
//!
//! Plain records for every resource kind the gateway exposes.
//!
//! # Design
//!
//! One struct per resource, with an explicit field list. The GitHub wire
//! formats live in [`super::github`] and convert into these via `From`; the
//! gateway serializes these into envelope payloads, so field names here are
//! part of the caller-facing contract and must stay stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Target repository reference (`owner/name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Create a reference from its parts.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `owner/name`.
    ///
    /// Also accepts remote URLs:
    /// - `https://<host>/owner/name(.git)`
    /// - `git@<host>:owner/name(.git)`
    ///
    /// # Returns
    ///
    /// `None` if either part is empty or extra path segments remain.
    ///
    /// # Example
    ///
    /// ```
    /// use hubgate::forge::RepoRef;
    ///
    /// let repo = RepoRef::parse("acme/widgets").unwrap();
    /// assert_eq!(repo.owner, "acme");
    /// assert_eq!(repo.name, "widgets");
    ///
    /// let repo = RepoRef::parse("git@github.com:acme/widgets.git").unwrap();
    /// assert_eq!(repo.to_string(), "acme/widgets");
    ///
    /// assert!(RepoRef::parse("widgets").is_none());
    /// ```
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();

        // SSH format: git@host:owner/repo.git
        let path = if let Some(rest) = input.strip_prefix("git@") {
            rest.split_once(':')?.1
        // HTTPS format: https://host/owner/repo.git
        } else if let Some(rest) = input
            .strip_prefix("https://")
            .or_else(|| input.strip_prefix("http://"))
        {
            rest.split_once('/')?.1
        } else {
            input
        };

        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        let (owner, name) = path.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }

    /// `owner/name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Repository summary and details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub url: String,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub open_issues: u64,
    pub private: bool,
    pub language: Option<String>,
    pub license: Option<String>,
    pub default_branch: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Issue state filter for listing and searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateFilter {
    #[default]
    Open,
    Closed,
    All,
}

impl StateFilter {
    /// Parse `open`, `closed` or `all`, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "open" => Some(StateFilter::Open),
            "closed" => Some(StateFilter::Closed),
            "all" => Some(StateFilter::All),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StateFilter::Open => "open",
            StateFilter::Closed => "closed",
            StateFilter::All => "all",
        }
    }
}

impl std::fmt::Display for StateFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An issue (listing, detail or search hit).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub url: String,
    pub user: Option<String>,
    pub assignee: Option<String>,
    pub labels: Vec<String>,
    /// `owner/name`, known for search hits.
    pub repository: Option<String>,
    pub comments_count: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Set for pull requests returned by the issue endpoints.
    #[serde(skip)]
    pub is_pull_request: bool,
}

/// Input for creating an issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewIssue {
    pub title: String,
    pub body: Option<String>,
    pub labels: Vec<String>,
}

/// A comment on an issue or pull request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: u64,
    pub user: Option<String>,
    pub body: String,
    pub url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A pull request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub url: String,
    pub user: Option<String>,
    pub base_branch: String,
    pub head_branch: String,
    pub is_merged: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
}

/// A file changed by a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestFile {
    pub filename: String,
    pub status: String,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
}

/// Merge method for merging a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMethod {
    /// Create a merge commit
    #[default]
    Merge,
    /// Squash all commits and merge
    Squash,
    /// Rebase commits onto base branch
    Rebase,
}

impl MergeMethod {
    /// Parse `merge`, `squash` or `rebase`, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "merge" => Some(MergeMethod::Merge),
            "squash" => Some(MergeMethod::Squash),
            "rebase" => Some(MergeMethod::Rebase),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MergeMethod::Merge => "merge",
            MergeMethod::Squash => "squash",
            MergeMethod::Rebase => "rebase",
        }
    }
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for merging a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeRequest {
    pub method: MergeMethod,
    pub commit_message: Option<String>,
}

/// Result of a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub merged: bool,
    pub sha: Option<String>,
    pub message: String,
}

/// A branch as listed by the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub name: String,
    pub sha: String,
    pub protected: bool,
}

/// A newly created git reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitRef {
    /// Fully qualified, e.g. `refs/heads/feature`.
    pub name: String,
    pub sha: String,
    pub url: String,
}

/// Author or committer identity on a commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    pub name: String,
    pub email: String,
    pub date: Option<DateTime<Utc>>,
}

/// A parent link on a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitParent {
    pub sha: String,
    pub url: String,
}

/// A file touched by a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitFile {
    pub filename: String,
    pub status: String,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
    pub patch: Option<String>,
}

/// Line statistics for a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommitStats {
    pub additions: u64,
    pub deletions: u64,
    pub total: u64,
}

/// A commit. Listings leave `files` empty and `stats` unset; single-commit
/// fetches populate both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Commit {
    pub sha: String,
    pub message: String,
    pub url: String,
    pub author: Person,
    pub committer: Person,
    pub parents: Vec<CommitParent>,
    pub files: Vec<CommitFile>,
    pub stats: Option<CommitStats>,
}

/// Filters for listing commits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitFilter {
    /// Branch, tag or sha to start from.
    pub branch: Option<String>,
    pub author: Option<String>,
    pub path: Option<String>,
}

/// A file with decoded content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContent {
    pub name: String,
    pub path: String,
    pub sha: String,
    pub size: u64,
    pub url: Option<String>,
    pub download_url: Option<String>,
    pub content: String,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub sha: String,
    pub size: u64,
    /// `file`, `dir`, `symlink` or `submodule`.
    pub kind: String,
    pub url: Option<String>,
    pub download_url: Option<String>,
}

impl DirectoryEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == "dir"
    }
}

/// Contents at a path: either one file or a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contents {
    File(FileContent),
    Directory(Vec<DirectoryEntry>),
}

/// Input for creating or updating a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileWrite {
    pub path: String,
    /// Plain text; encoding for the wire is the client's concern.
    pub content: String,
    pub message: String,
    pub branch: Option<String>,
    /// Current blob sha. Present means update, absent means create.
    pub sha: Option<String>,
}

/// Commit produced by a file write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRef {
    pub sha: String,
    pub url: Option<String>,
    pub message: String,
}

/// Result of a file write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCommit {
    pub path: String,
    pub name: String,
    pub sha: String,
    pub url: Option<String>,
    pub commit: CommitRef,
}

/// A code search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeHit {
    pub name: String,
    pub path: String,
    pub sha: String,
    pub repository: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    mod repo_ref {
        use super::*;

        #[test]
        fn parses_short_form() {
            assert_eq!(
                RepoRef::parse("acme/widgets"),
                Some(RepoRef::new("acme", "widgets"))
            );
        }

        #[test]
        fn parses_remote_urls() {
            let expected = Some(RepoRef::new("acme", "widgets"));
            assert_eq!(RepoRef::parse("git@github.com:acme/widgets.git"), expected);
            assert_eq!(RepoRef::parse("https://github.com/acme/widgets"), expected);
            assert_eq!(
                RepoRef::parse("https://ghe.acme.io/acme/widgets.git"),
                expected
            );
            assert_eq!(RepoRef::parse("http://github.com/acme/widgets/"), expected);
        }

        #[test]
        fn keeps_dots_and_hyphens() {
            assert_eq!(
                RepoRef::parse("my-org/repo.name"),
                Some(RepoRef::new("my-org", "repo.name"))
            );
        }

        #[test]
        fn rejects_malformed() {
            assert!(RepoRef::parse("").is_none());
            assert!(RepoRef::parse("widgets").is_none());
            assert!(RepoRef::parse("/widgets").is_none());
            assert!(RepoRef::parse("acme/").is_none());
            assert!(RepoRef::parse("acme/widgets/extra").is_none());
            assert!(RepoRef::parse("https://github.com/").is_none());
        }

        #[test]
        fn display_is_full_name() {
            let repo = RepoRef::new("acme", "widgets");
            assert_eq!(repo.to_string(), "acme/widgets");
            assert_eq!(repo.full_name(), "acme/widgets");
        }
    }

    #[test]
    fn state_filter_parse() {
        assert_eq!(StateFilter::parse("OPEN"), Some(StateFilter::Open));
        assert_eq!(StateFilter::parse("closed"), Some(StateFilter::Closed));
        assert_eq!(StateFilter::parse("all"), Some(StateFilter::All));
        assert_eq!(StateFilter::parse("merged"), None);
        assert_eq!(StateFilter::default(), StateFilter::Open);
    }

    #[test]
    fn merge_method_parse_and_default() {
        assert_eq!(MergeMethod::parse("Squash"), Some(MergeMethod::Squash));
        assert_eq!(MergeMethod::parse("rebase"), Some(MergeMethod::Rebase));
        assert_eq!(MergeMethod::parse("fast-forward"), None);
        assert_eq!(MergeMethod::default(), MergeMethod::Merge);
        assert_eq!(format!("{}", MergeMethod::Merge), "merge");
    }
}
