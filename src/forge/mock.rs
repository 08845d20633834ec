//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! `MockForge` answers every `Forge` method from in-memory fixtures that
//! describe a single repository (plus the result sets used by the search
//! endpoints). It records each call for later verification and can be
//! configured to fail, or panic, in a named method.
//!
//! Filtering that GitHub performs server side (commit author/path, search
//! qualifiers) is not emulated; the arguments are recorded instead so tests
//! can assert on what was asked.
//!
//! `MockClientFactory` hands out clones of one `MockForge` and counts how
//! many handles were requested.
//!
//! # Example
//!
//! ```
//! use hubgate::forge::mock::{self, MockForge, MockOperation};
//! use hubgate::forge::{Forge, RepoRef};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let forge = MockForge::new().with_pull_requests(vec![mock::pull_request(7, "Add widget", true)]);
//! let repo = RepoRef::new("acme", "widgets");
//!
//! let pr = forge.get_pull_request(&repo, 7).await.unwrap();
//! assert!(pr.is_merged);
//!
//! let ops = forge.operations();
//! assert!(matches!(&ops[0], MockOperation::GetPullRequest { number: 7, .. }));
//! # });
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::factory::ClientFactory;
use super::traits::{Forge, ForgeError, Listing, PageRequest, SearchQuery};
use super::types::{
    Branch, CodeHit, Comment, Commit, CommitFilter, CommitRef, Contents, DirectoryEntry,
    FileCommit, FileContent, FileWrite, GitRef, Issue, MergeMethod, MergeOutcome, MergeRequest,
    NewIssue, Person, PullRequest, PullRequestFile, RepoRef, Repository, StateFilter,
};
use crate::env::Environment;

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockForge {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockForgeInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockForgeInner {
    repository: Repository,
    /// Repositories of the "authenticated user"; also the repository search set.
    user_repositories: Vec<Repository>,
    /// Issues and pull requests as the issue endpoints see them; also the
    /// issue search set.
    issues: Vec<Issue>,
    comments: HashMap<u64, Vec<Comment>>,
    pulls: Vec<PullRequest>,
    pull_files: HashMap<u64, Vec<PullRequestFile>>,
    branches: Vec<Branch>,
    /// Newest first, like the remote.
    commits: Vec<Commit>,
    files: BTreeMap<String, FileContent>,
    code_hits: Vec<CodeHit>,
    /// Counter for generated shas.
    next_object: u64,
    fail_on: Vec<FailOn>,
    panic_on: Option<&'static str>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail the named `Forge` method (e.g. `"get_issue"`) with the error.
    Method(&'static str, ForgeError),
    /// Fail every method with the error.
    Every(ForgeError),
}

impl FailOn {
    fn matching(&self, method: &str) -> Option<ForgeError> {
        match self {
            FailOn::Method(name, err) if *name == method => Some(err.clone()),
            FailOn::Every(err) => Some(err.clone()),
            _ => None,
        }
    }
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOperation {
    CurrentUserRepositories {
        page: PageRequest,
    },
    GetRepository {
        repo: String,
    },
    SearchRepositories {
        query: SearchQuery,
        page: PageRequest,
    },
    ListIssues {
        repo: String,
        state: StateFilter,
        page: PageRequest,
    },
    GetIssue {
        repo: String,
        number: u64,
    },
    ListIssueComments {
        repo: String,
        number: u64,
    },
    CreateIssue {
        repo: String,
        title: String,
        labels: Vec<String>,
    },
    AddIssueComment {
        repo: String,
        number: u64,
        body: String,
    },
    SearchIssues {
        query: SearchQuery,
        page: PageRequest,
    },
    ListPullRequests {
        repo: String,
        state: StateFilter,
        page: PageRequest,
    },
    GetPullRequest {
        repo: String,
        number: u64,
    },
    ListPullRequestFiles {
        repo: String,
        number: u64,
    },
    MergePullRequest {
        repo: String,
        number: u64,
        method: MergeMethod,
        commit_message: Option<String>,
    },
    ListBranches {
        repo: String,
        page: PageRequest,
    },
    GetBranch {
        repo: String,
        name: String,
    },
    ResolveBranchRef {
        repo: String,
        branch: String,
    },
    CreateRef {
        repo: String,
        name: String,
        sha: String,
    },
    GetCommit {
        repo: String,
        sha: String,
    },
    ListCommits {
        repo: String,
        filter: CommitFilter,
        page: PageRequest,
    },
    GetContents {
        repo: String,
        path: String,
        git_ref: Option<String>,
    },
    PutFile {
        repo: String,
        path: String,
        branch: Option<String>,
        sha: Option<String>,
    },
    SearchCode {
        query: SearchQuery,
        page: PageRequest,
    },
}

impl MockOperation {
    /// Name of the `Forge` method this records.
    pub fn method(&self) -> &'static str {
        match self {
            MockOperation::CurrentUserRepositories { .. } => "current_user_repositories",
            MockOperation::GetRepository { .. } => "get_repository",
            MockOperation::SearchRepositories { .. } => "search_repositories",
            MockOperation::ListIssues { .. } => "list_issues",
            MockOperation::GetIssue { .. } => "get_issue",
            MockOperation::ListIssueComments { .. } => "list_issue_comments",
            MockOperation::CreateIssue { .. } => "create_issue",
            MockOperation::AddIssueComment { .. } => "add_issue_comment",
            MockOperation::SearchIssues { .. } => "search_issues",
            MockOperation::ListPullRequests { .. } => "list_pull_requests",
            MockOperation::GetPullRequest { .. } => "get_pull_request",
            MockOperation::ListPullRequestFiles { .. } => "list_pull_request_files",
            MockOperation::MergePullRequest { .. } => "merge_pull_request",
            MockOperation::ListBranches { .. } => "list_branches",
            MockOperation::GetBranch { .. } => "get_branch",
            MockOperation::ResolveBranchRef { .. } => "resolve_branch_ref",
            MockOperation::CreateRef { .. } => "create_ref",
            MockOperation::GetCommit { .. } => "get_commit",
            MockOperation::ListCommits { .. } => "list_commits",
            MockOperation::GetContents { .. } => "get_contents",
            MockOperation::PutFile { .. } => "put_file",
            MockOperation::SearchCode { .. } => "search_code",
        }
    }

    /// Target repository (`owner/name`), for repository-scoped calls.
    pub fn repository(&self) -> Option<&str> {
        match self {
            MockOperation::GetRepository { repo }
            | MockOperation::ListIssues { repo, .. }
            | MockOperation::GetIssue { repo, .. }
            | MockOperation::ListIssueComments { repo, .. }
            | MockOperation::CreateIssue { repo, .. }
            | MockOperation::AddIssueComment { repo, .. }
            | MockOperation::ListPullRequests { repo, .. }
            | MockOperation::GetPullRequest { repo, .. }
            | MockOperation::ListPullRequestFiles { repo, .. }
            | MockOperation::MergePullRequest { repo, .. }
            | MockOperation::ListBranches { repo, .. }
            | MockOperation::GetBranch { repo, .. }
            | MockOperation::ResolveBranchRef { repo, .. }
            | MockOperation::CreateRef { repo, .. }
            | MockOperation::GetCommit { repo, .. }
            | MockOperation::ListCommits { repo, .. }
            | MockOperation::GetContents { repo, .. }
            | MockOperation::PutFile { repo, .. } => Some(repo),
            MockOperation::CurrentUserRepositories { .. }
            | MockOperation::SearchRepositories { .. }
            | MockOperation::SearchIssues { .. }
            | MockOperation::SearchCode { .. } => None,
        }
    }
}

impl MockForge {
    /// Create a mock forge with an empty `mock/repo` repository.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockForgeInner {
                repository: repository("mock/repo"),
                user_repositories: Vec::new(),
                issues: Vec::new(),
                comments: HashMap::new(),
                pulls: Vec::new(),
                pull_files: HashMap::new(),
                branches: Vec::new(),
                commits: Vec::new(),
                files: BTreeMap::new(),
                code_hits: Vec::new(),
                next_object: 1,
                fail_on: Vec::new(),
                panic_on: None,
                operations: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockForgeInner> {
        // A panic configured via `panic_on` must not wedge later calls.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn configure(self, f: impl FnOnce(&mut MockForgeInner)) -> Self {
        f(&mut self.state());
        self
    }

    /// Details returned by `get_repository`.
    pub fn with_repository(self, repo: Repository) -> Self {
        self.configure(|s| s.repository = repo)
    }

    /// Repositories for the user listing and repository search.
    pub fn with_user_repositories(self, repos: Vec<Repository>) -> Self {
        self.configure(|s| s.user_repositories = repos)
    }

    /// Issues (and PR-flagged issues) for listing, fetching and search.
    pub fn with_issues(self, issues: Vec<Issue>) -> Self {
        self.configure(|s| s.issues = issues)
    }

    /// Comments on issue or PR `number`.
    pub fn with_comments(self, number: u64, comments: Vec<Comment>) -> Self {
        self.configure(|s| {
            s.comments.insert(number, comments);
        })
    }

    pub fn with_pull_requests(self, pulls: Vec<PullRequest>) -> Self {
        self.configure(|s| s.pulls = pulls)
    }

    pub fn with_pull_request_files(self, number: u64, files: Vec<PullRequestFile>) -> Self {
        self.configure(|s| {
            s.pull_files.insert(number, files);
        })
    }

    pub fn with_branches(self, branches: Vec<Branch>) -> Self {
        self.configure(|s| s.branches = branches)
    }

    /// Commits, newest first.
    pub fn with_commits(self, commits: Vec<Commit>) -> Self {
        self.configure(|s| s.commits = commits)
    }

    /// A file at `path` with the given text.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.configure(|s| {
            let sha = s.next_sha();
            let file = file(path, content, sha);
            s.files.insert(file.path.clone(), file);
        })
    }

    pub fn with_code_hits(self, hits: Vec<CodeHit>) -> Self {
        self.configure(|s| s.code_hits = hits)
    }

    /// Configure the mock to fail.
    ///
    /// # Example
    ///
    /// ```
    /// use hubgate::forge::mock::{FailOn, MockForge};
    /// use hubgate::forge::ForgeError;
    ///
    /// let forge = MockForge::new()
    ///     .fail_on(FailOn::Method("list_issues", ForgeError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.configure(|s| s.fail_on.push(fail_on))
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.state().fail_on.clear();
    }

    /// Panic when the named method is called.
    pub fn panic_on(self, method: &'static str) -> Self {
        self.configure(|s| s.panic_on = Some(method))
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    /// Recorded calls of one method.
    pub fn calls_to(&self, method: &str) -> usize {
        self.state()
            .operations
            .iter()
            .filter(|op| op.method() == method)
            .count()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.state().operations.clear();
    }

    /// Current file at `path` (for test verification).
    pub fn file(&self, path: &str) -> Option<FileContent> {
        self.state().files.get(path).cloned()
    }

    /// Current branch names in order (for test verification).
    pub fn branch_names(&self) -> Vec<String> {
        self.state().branches.iter().map(|b| b.name.clone()).collect()
    }

    /// Current PR by number (for test verification).
    pub fn pull_request(&self, number: u64) -> Option<PullRequest> {
        self.state().pulls.iter().find(|p| p.number == number).cloned()
    }

    /// Record the call, then apply any configured panic or failure.
    fn begin(&self, op: MockOperation) -> Result<(), ForgeError> {
        let method = op.method();
        let (should_panic, failure) = {
            let mut state = self.state();
            state.operations.push(op);
            (
                state.panic_on == Some(method),
                state.fail_on.iter().find_map(|f| f.matching(method)),
            )
        };

        if should_panic {
            panic!("mock forge configured to panic in {}", method);
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new()
    }
}

impl MockForgeInner {
    fn next_sha(&mut self) -> String {
        let sha = format!("{:040x}", self.next_object);
        self.next_object += 1;
        sha
    }

    fn next_issue_number(&self) -> u64 {
        self.issues
            .iter()
            .map(|i| i.number)
            .chain(self.pulls.iter().map(|p| p.number))
            .max()
            .unwrap_or(0)
            + 1
    }
}

fn page_of<T: Clone>(items: &[T], page: PageRequest) -> Vec<T> {
    items
        .iter()
        .skip(page.offset())
        .take(page.per_page as usize)
        .cloned()
        .collect()
}

fn matches_state(state: &str, filter: StateFilter) -> bool {
    match filter {
        StateFilter::All => true,
        StateFilter::Open => state == "open",
        StateFilter::Closed => state == "closed",
    }
}

fn not_found() -> ForgeError {
    ForgeError::NotFound("Not Found".into())
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn current_user_repositories(
        &self,
        page: PageRequest,
    ) -> Result<Listing<Repository>, ForgeError> {
        self.begin(MockOperation::CurrentUserRepositories { page })?;
        Ok(Listing::page(page_of(&self.state().user_repositories, page)))
    }

    async fn get_repository(&self, repo: &RepoRef) -> Result<Repository, ForgeError> {
        self.begin(MockOperation::GetRepository {
            repo: repo.full_name(),
        })?;
        Ok(self.state().repository.clone())
    }

    async fn search_repositories(
        &self,
        query: &SearchQuery,
        page: PageRequest,
    ) -> Result<Listing<Repository>, ForgeError> {
        self.begin(MockOperation::SearchRepositories {
            query: query.clone(),
            page,
        })?;
        let state = self.state();
        let repos = &state.user_repositories;
        Ok(Listing::with_total(page_of(repos, page), repos.len() as u64))
    }

    async fn list_issues(
        &self,
        repo: &RepoRef,
        state: StateFilter,
        page: PageRequest,
    ) -> Result<Listing<Issue>, ForgeError> {
        self.begin(MockOperation::ListIssues {
            repo: repo.full_name(),
            state,
            page,
        })?;
        let matching: Vec<Issue> = self
            .state()
            .issues
            .iter()
            .filter(|i| matches_state(&i.state, state))
            .cloned()
            .collect();
        Ok(Listing::page(page_of(&matching, page)))
    }

    async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<Issue, ForgeError> {
        self.begin(MockOperation::GetIssue {
            repo: repo.full_name(),
            number,
        })?;
        self.state()
            .issues
            .iter()
            .find(|i| i.number == number)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn list_issue_comments(
        &self,
        repo: &RepoRef,
        number: u64,
        page: PageRequest,
    ) -> Result<Listing<Comment>, ForgeError> {
        self.begin(MockOperation::ListIssueComments {
            repo: repo.full_name(),
            number,
        })?;
        let state = self.state();
        let comments = state.comments.get(&number).map(Vec::as_slice).unwrap_or(&[]);
        Ok(Listing::page(page_of(comments, page)))
    }

    async fn create_issue(&self, repo: &RepoRef, new: NewIssue) -> Result<Issue, ForgeError> {
        self.begin(MockOperation::CreateIssue {
            repo: repo.full_name(),
            title: new.title.clone(),
            labels: new.labels.clone(),
        })?;

        let mut state = self.state();
        let number = state.next_issue_number();
        let mut created = issue(number, &new.title);
        created.body = new.body;
        created.labels = new.labels;
        created.url = format!("https://github.com/{}/issues/{}", repo, number);
        state.issues.push(created.clone());
        Ok(created)
    }

    async fn add_issue_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<Comment, ForgeError> {
        self.begin(MockOperation::AddIssueComment {
            repo: repo.full_name(),
            number,
            body: body.to_string(),
        })?;

        let mut state = self.state();
        let exists = state.issues.iter().any(|i| i.number == number)
            || state.pulls.iter().any(|p| p.number == number);
        if !exists {
            return Err(not_found());
        }

        let id = state.comments.values().map(Vec::len).sum::<usize>() as u64 + 1;
        let created = Comment {
            id,
            user: Some("mock-user".into()),
            body: body.to_string(),
            url: format!(
                "https://github.com/{}/issues/{}#issuecomment-{}",
                repo, number, id
            ),
            created_at: None,
            updated_at: None,
        };
        state.comments.entry(number).or_default().push(created.clone());
        Ok(created)
    }

    async fn search_issues(
        &self,
        query: &SearchQuery,
        page: PageRequest,
    ) -> Result<Listing<Issue>, ForgeError> {
        self.begin(MockOperation::SearchIssues {
            query: query.clone(),
            page,
        })?;
        let state = self.state();
        let issues = &state.issues;
        Ok(Listing::with_total(page_of(issues, page), issues.len() as u64))
    }

    async fn list_pull_requests(
        &self,
        repo: &RepoRef,
        state: StateFilter,
        page: PageRequest,
    ) -> Result<Listing<PullRequest>, ForgeError> {
        self.begin(MockOperation::ListPullRequests {
            repo: repo.full_name(),
            state,
            page,
        })?;
        let matching: Vec<PullRequest> = self
            .state()
            .pulls
            .iter()
            .filter(|p| matches_state(&p.state, state))
            .cloned()
            .collect();
        Ok(Listing::page(page_of(&matching, page)))
    }

    async fn get_pull_request(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<PullRequest, ForgeError> {
        self.begin(MockOperation::GetPullRequest {
            repo: repo.full_name(),
            number,
        })?;
        self.pull_request(number).ok_or_else(not_found)
    }

    async fn list_pull_request_files(
        &self,
        repo: &RepoRef,
        number: u64,
        page: PageRequest,
    ) -> Result<Listing<PullRequestFile>, ForgeError> {
        self.begin(MockOperation::ListPullRequestFiles {
            repo: repo.full_name(),
            number,
        })?;
        let state = self.state();
        let files = state.pull_files.get(&number).map(Vec::as_slice).unwrap_or(&[]);
        Ok(Listing::page(page_of(files, page)))
    }

    async fn merge_pull_request(
        &self,
        repo: &RepoRef,
        number: u64,
        request: MergeRequest,
    ) -> Result<MergeOutcome, ForgeError> {
        self.begin(MockOperation::MergePullRequest {
            repo: repo.full_name(),
            number,
            method: request.method,
            commit_message: request.commit_message.clone(),
        })?;

        let mut state = self.state();
        let sha = state.next_sha();
        let pr = state
            .pulls
            .iter_mut()
            .find(|p| p.number == number)
            .ok_or_else(not_found)?;

        if pr.is_merged || pr.state != "open" {
            return Err(ForgeError::ApiError {
                status: 405,
                message: "Pull Request is not mergeable".into(),
            });
        }

        pr.is_merged = true;
        pr.state = "closed".into();
        Ok(MergeOutcome {
            merged: true,
            sha: Some(sha),
            message: "Pull Request successfully merged".into(),
        })
    }

    async fn list_branches(
        &self,
        repo: &RepoRef,
        page: PageRequest,
    ) -> Result<Listing<Branch>, ForgeError> {
        self.begin(MockOperation::ListBranches {
            repo: repo.full_name(),
            page,
        })?;
        Ok(Listing::page(page_of(&self.state().branches, page)))
    }

    async fn get_branch(&self, repo: &RepoRef, name: &str) -> Result<Branch, ForgeError> {
        self.begin(MockOperation::GetBranch {
            repo: repo.full_name(),
            name: name.to_string(),
        })?;
        self.state()
            .branches
            .iter()
            .find(|b| b.name == name)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound("Branch not found".into()))
    }

    async fn resolve_branch_ref(
        &self,
        repo: &RepoRef,
        branch: &str,
    ) -> Result<String, ForgeError> {
        self.begin(MockOperation::ResolveBranchRef {
            repo: repo.full_name(),
            branch: branch.to_string(),
        })?;
        self.state()
            .branches
            .iter()
            .find(|b| b.name == branch)
            .map(|b| b.sha.clone())
            .ok_or_else(not_found)
    }

    async fn create_ref(
        &self,
        repo: &RepoRef,
        name: &str,
        sha: &str,
    ) -> Result<GitRef, ForgeError> {
        self.begin(MockOperation::CreateRef {
            repo: repo.full_name(),
            name: name.to_string(),
            sha: sha.to_string(),
        })?;

        let short = name.strip_prefix("refs/heads/").unwrap_or(name);
        let mut state = self.state();
        if state.branches.iter().any(|b| b.name == short) {
            return Err(ForgeError::ApiError {
                status: 422,
                message: "Reference already exists".into(),
            });
        }
        state.branches.push(branch(short, sha));
        Ok(GitRef {
            name: name.to_string(),
            sha: sha.to_string(),
            url: format!("https://api.github.com/repos/{}/git/{}", repo, name),
        })
    }

    async fn get_commit(&self, repo: &RepoRef, sha: &str) -> Result<Commit, ForgeError> {
        self.begin(MockOperation::GetCommit {
            repo: repo.full_name(),
            sha: sha.to_string(),
        })?;
        self.state()
            .commits
            .iter()
            .find(|c| c.sha == sha || (sha.len() >= 7 && c.sha.starts_with(sha)))
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("No commit found for SHA: {}", sha)))
    }

    async fn list_commits(
        &self,
        repo: &RepoRef,
        filter: &CommitFilter,
        page: PageRequest,
    ) -> Result<Listing<Commit>, ForgeError> {
        self.begin(MockOperation::ListCommits {
            repo: repo.full_name(),
            filter: filter.clone(),
            page,
        })?;
        Ok(Listing::page(page_of(&self.state().commits, page)))
    }

    async fn get_contents(
        &self,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Contents, ForgeError> {
        self.begin(MockOperation::GetContents {
            repo: repo.full_name(),
            path: path.to_string(),
            git_ref: git_ref.map(str::to_string),
        })?;

        let path = path.trim_matches('/');
        let state = self.state();
        if let Some(found) = state.files.get(path) {
            return Ok(Contents::File(found.clone()));
        }

        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path)
        };
        let mut entries = Vec::new();
        let mut seen_dirs = BTreeSet::new();
        for (file_path, found) in &state.files {
            let Some(rest) = file_path.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                None => entries.push(DirectoryEntry {
                    name: found.name.clone(),
                    path: found.path.clone(),
                    sha: found.sha.clone(),
                    size: found.size,
                    kind: "file".into(),
                    url: found.url.clone(),
                    download_url: found.download_url.clone(),
                }),
                Some((dir, _)) => {
                    if seen_dirs.insert(dir.to_string()) {
                        entries.push(DirectoryEntry {
                            name: dir.to_string(),
                            path: format!("{}{}", prefix, dir),
                            sha: String::new(),
                            size: 0,
                            kind: "dir".into(),
                            url: None,
                            download_url: None,
                        });
                    }
                }
            }
        }

        if entries.is_empty() && !path.is_empty() {
            return Err(not_found());
        }
        Ok(Contents::Directory(entries))
    }

    async fn put_file(&self, repo: &RepoRef, write: FileWrite) -> Result<FileCommit, ForgeError> {
        self.begin(MockOperation::PutFile {
            repo: repo.full_name(),
            path: write.path.clone(),
            branch: write.branch.clone(),
            sha: write.sha.clone(),
        })?;

        let path = write.path.trim_matches('/').to_string();
        let mut state = self.state();
        match (state.files.get(&path), write.sha.as_deref()) {
            (Some(existing), Some(sha)) if existing.sha != sha => {
                return Err(ForgeError::ApiError {
                    status: 409,
                    message: format!("{} does not match {}", path, sha),
                });
            }
            (Some(_), None) => {
                return Err(ForgeError::ApiError {
                    status: 422,
                    message: "Invalid request. \"sha\" wasn't supplied.".into(),
                });
            }
            (None, Some(sha)) => {
                return Err(ForgeError::ApiError {
                    status: 409,
                    message: format!("{} does not match {}", path, sha),
                });
            }
            _ => {}
        }

        let blob_sha = state.next_sha();
        let commit_sha = state.next_sha();
        let written = file(&path, &write.content, blob_sha);
        state.files.insert(path, written.clone());
        Ok(FileCommit {
            path: written.path,
            name: written.name,
            sha: written.sha,
            url: written.url,
            commit: CommitRef {
                url: Some(format!("https://github.com/{}/commit/{}", repo, commit_sha)),
                sha: commit_sha,
                message: write.message,
            },
        })
    }

    async fn search_code(
        &self,
        query: &SearchQuery,
        page: PageRequest,
    ) -> Result<Listing<CodeHit>, ForgeError> {
        self.begin(MockOperation::SearchCode {
            query: query.clone(),
            page,
        })?;
        let state = self.state();
        let hits = &state.code_hits;
        Ok(Listing::with_total(page_of(hits, page), hits.len() as u64))
    }
}

/// Factory handing out clones of one [`MockForge`], counting each request.
#[derive(Debug, Clone)]
pub struct MockClientFactory {
    forge: MockForge,
    calls: Arc<AtomicUsize>,
    hosts: Arc<Mutex<Vec<String>>>,
    failure: Option<ForgeError>,
}

impl MockClientFactory {
    pub fn new(forge: MockForge) -> Self {
        Self {
            forge,
            calls: Arc::new(AtomicUsize::new(0)),
            hosts: Arc::new(Mutex::new(Vec::new())),
            failure: None,
        }
    }

    /// A factory whose every `create` fails with `error`.
    pub fn failing(error: ForgeError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new(MockForge::new())
        }
    }

    /// Number of handles requested so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Hosts of the environments handles were requested for.
    pub fn hosts(&self) -> Vec<String> {
        self.hosts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The shared forge behind every handle.
    pub fn forge(&self) -> &MockForge {
        &self.forge
    }
}

impl ClientFactory for MockClientFactory {
    fn create(&self, env: &Environment) -> Result<Box<dyn Forge>, ForgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.hosts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(env.host().to_string());

        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(Box::new(self.forge.clone())),
        }
    }
}

// --------------------------------------------------------------------------
// Fixture builders
// --------------------------------------------------------------------------

/// A repository record for `owner/name` with default branch `main`.
pub fn repository(full_name: &str) -> Repository {
    let name = full_name
        .rsplit_once('/')
        .map(|(_, n)| n)
        .unwrap_or(full_name);
    Repository {
        name: name.to_string(),
        full_name: full_name.to_string(),
        description: None,
        url: format!("https://github.com/{}", full_name),
        stars: 0,
        forks: 0,
        watchers: 0,
        open_issues: 0,
        private: false,
        language: None,
        license: None,
        default_branch: "main".into(),
        created_at: None,
        updated_at: None,
    }
}

/// An open issue.
pub fn issue(number: u64, title: &str) -> Issue {
    Issue {
        number,
        title: title.to_string(),
        body: None,
        state: "open".into(),
        url: format!("https://github.com/mock/repo/issues/{}", number),
        user: Some("mock-user".into()),
        assignee: None,
        labels: Vec::new(),
        repository: None,
        comments_count: 0,
        created_at: None,
        updated_at: None,
        closed_at: None,
        is_pull_request: false,
    }
}

/// A pull request; merged ones are closed.
pub fn pull_request(number: u64, title: &str, merged: bool) -> PullRequest {
    PullRequest {
        number,
        title: title.to_string(),
        body: None,
        state: if merged { "closed" } else { "open" }.into(),
        url: format!("https://github.com/mock/repo/pull/{}", number),
        user: Some("mock-user".into()),
        base_branch: "main".into(),
        head_branch: format!("feature/{}", number),
        is_merged: merged,
        created_at: None,
        updated_at: None,
        closed_at: None,
        merged_at: None,
    }
}

/// An unprotected branch.
pub fn branch(name: &str, sha: &str) -> Branch {
    Branch {
        name: name.to_string(),
        sha: sha.to_string(),
        protected: false,
    }
}

/// A commit with a fixed author.
pub fn commit(sha: &str, message: &str) -> Commit {
    let person = Person {
        name: "Mock Author".into(),
        email: "mock@example.com".into(),
        date: None,
    };
    Commit {
        sha: sha.to_string(),
        message: message.to_string(),
        url: format!("https://github.com/mock/repo/commit/{}", sha),
        author: person.clone(),
        committer: person,
        parents: Vec::new(),
        files: Vec::new(),
        stats: None,
    }
}

fn file(path: &str, content: &str, sha: String) -> FileContent {
    let path = path.trim_matches('/');
    let name = path.rsplit('/').next().unwrap_or(path);
    FileContent {
        name: name.to_string(),
        path: path.to_string(),
        sha,
        size: content.len() as u64,
        url: Some(format!("https://github.com/mock/repo/blob/main/{}", path)),
        download_url: None,
        content: content.to_string(),
    }
}
