//! forge::github
//!
//! GitHub forge implementation using the REST v3 API.
//!
//! # Design
//!
//! `GitHubClient` implements the `Forge` trait with one HTTP request per
//! method. The bearer token, accept header, user agent and API version are
//! installed as default headers when the client is built, so a token that
//! cannot be sent fails at construction rather than on the first call.
//!
//! Wire formats are private structs in this module and convert into the
//! records of [`super::types`] via `From`.
//!
//! # Rate Limiting
//!
//! GitHub has rate limits. This implementation:
//! - Returns `ForgeError::RateLimited` when limits are hit
//! - Does not retry; the gateway reports the failure to the caller
//!
//! # Example
//!
//! ```no_run
//! use hubgate::env::HttpSettings;
//! use hubgate::forge::github::{GitHubClient, PUBLIC_API_BASE};
//! use hubgate::forge::{Forge, RepoRef};
//!
//! # async fn demo() -> Result<(), hubgate::forge::ForgeError> {
//! let client = GitHubClient::new("ghp_xxx", PUBLIC_API_BASE, &HttpSettings::default())?;
//! let repo = client.get_repository(&RepoRef::new("octocat", "hello-world")).await?;
//! println!("{} has {} stars", repo.full_name, repo.stars);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::traits::{Forge, ForgeError, Listing, PageRequest, SearchQuery};
use super::types::{
    Branch, CodeHit, Comment, Commit, CommitFile, CommitFilter, CommitParent, CommitRef,
    CommitStats, Contents, DirectoryEntry, FileCommit, FileContent, FileWrite, GitRef, Issue,
    MergeOutcome, MergeRequest, NewIssue, Person, PullRequest, PullRequestFile, RepoRef,
    Repository, StateFilter,
};
use crate::env::HttpSettings;

/// GitHub.com API base URL.
pub const PUBLIC_API_BASE: &str = "https://api.github.com";

/// REST API version pinned on every request.
const API_VERSION: &str = "2022-11-28";

/// GitHub REST client bound to one credential.
pub struct GitHubClient {
    /// HTTP client with auth and accept headers installed
    client: Client,
    /// API base URL (differs for GitHub Enterprise)
    api_base: String,
}

// The token lives in the client's default headers; only show the base.
impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubClient {
    /// Build a client for `api_base` authenticated with `token`.
    ///
    /// # Errors
    ///
    /// `ForgeError::Connection` if the token or user agent is not a valid
    /// header value, or the HTTP client cannot be constructed.
    pub fn new(
        token: &str,
        api_base: impl Into<String>,
        http: &HttpSettings,
    ) -> Result<Self, ForgeError> {
        let headers = Self::headers(token, &http.user_agent)?;
        let client = Client::builder()
            .default_headers(headers)
            .timeout(http.timeout)
            .build()
            .map_err(|e| ForgeError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    /// API base this client talks to.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build common headers for API requests.
    fn headers(token: &str, user_agent: &str) -> Result<HeaderMap, ForgeError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ForgeError::Connection("token is not a valid header value".into()))?;
        auth.set_sensitive(true);

        let agent = HeaderValue::from_str(user_agent).map_err(|_| {
            ForgeError::Connection(format!("invalid user agent '{}'", user_agent))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, agent);
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, repo: &RepoRef, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, repo.owner, repo.name, path
        )
    }

    /// Build URL for a top-level endpoint.
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    /// GET a JSON resource.
    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ForgeError> {
        tracing::debug!(method = "GET", url, "GitHub request");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;
        self.handle_response(response).await
    }

    /// Send a JSON body and decode the JSON reply.
    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: &B,
    ) -> Result<T, ForgeError> {
        tracing::debug!(method = %method, url, "GitHub request");
        let response = self
            .client
            .request(method, url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        self.handle_response(response).await
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| ForgeError::Decode(e.to_string()))
        } else {
            self.handle_error_response(response, status).await
        }
    }

    /// Handle an error response from the API.
    async fn handle_error_response<T>(
        &self,
        response: Response,
        status: StatusCode,
    ) -> Result<T, ForgeError> {
        // Read headers before the body consumes the response.
        let headers = response.headers();
        let rate_limit_exhausted = headers
            .get("X-RateLimit-Remaining")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == "0")
            .unwrap_or(false);
        let required_permissions = headers
            .get("X-Accepted-GitHub-Permissions")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let required_scopes = headers
            .get("X-Accepted-OAuth-Scopes")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        };

        tracing::debug!(status = status.as_u16(), message = %message, "GitHub error response");

        Err(match status {
            StatusCode::UNAUTHORIZED => ForgeError::AuthFailed(format!(
                "credential refused by the remote: {}",
                message
            )),
            StatusCode::FORBIDDEN if rate_limit_exhausted => ForgeError::RateLimited,
            StatusCode::FORBIDDEN => {
                let mut err_msg = format!("Permission denied: {}", message);

                // GitHub Apps report fine-grained permissions, classic tokens report scopes.
                if let Some(perms) = required_permissions.filter(|p| !p.is_empty()) {
                    err_msg.push_str(&format!(" [required: {}]", perms));
                } else if let Some(scopes) = required_scopes.filter(|s| !s.is_empty()) {
                    err_msg.push_str(&format!(" [required scopes: {}]", scopes));
                }

                ForgeError::AuthFailed(err_msg)
            }
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
            _ if status.is_server_error() => ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => ForgeError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn search<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &SearchQuery,
        page: PageRequest,
    ) -> Result<SearchPage<T>, ForgeError> {
        let mut params = vec![("q", query.q.clone())];
        if let Some(sort) = query.sort {
            params.push(("sort", sort.to_string()));
        }
        if let Some(order) = query.order {
            params.push(("order", order.to_string()));
        }
        params.extend(page_params(page));
        self.get(&self.url(endpoint), &params).await
    }
}

/// Map a reqwest send failure.
fn transport_error(err: reqwest::Error) -> ForgeError {
    if err.is_timeout() {
        ForgeError::NetworkError(format!("request timed out: {}", err))
    } else {
        ForgeError::NetworkError(err.to_string())
    }
}

fn page_params(page: PageRequest) -> [(&'static str, String); 2] {
    [
        ("per_page", page.per_page.to_string()),
        ("page", page.page.to_string()),
    ]
}

/// Percent-encode each segment of a slash-separated path.
fn encode_path(path: &str) -> String {
    path.trim_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Decode a contents-API payload. The remote wraps base64 at 60 columns.
fn decode_content(encoded: &str) -> Result<String, ForgeError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ForgeError::Decode(format!("invalid base64 content: {}", e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// `owner/name` from an API URL such as `https://api.github.com/repos/o/n`.
fn full_name_from_api_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/repos/")?;
    RepoRef::parse(rest).map(|r| r.full_name())
}

#[async_trait]
impl Forge for GitHubClient {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn current_user_repositories(
        &self,
        page: PageRequest,
    ) -> Result<Listing<Repository>, ForgeError> {
        let repos: Vec<GitHubRepository> =
            self.get(&self.url("user/repos"), &page_params(page)).await?;
        Ok(Listing::page(repos.into_iter().map(Into::into).collect()))
    }

    async fn get_repository(&self, repo: &RepoRef) -> Result<Repository, ForgeError> {
        let url = format!("{}/repos/{}/{}", self.api_base, repo.owner, repo.name);
        let gh: GitHubRepository = self.get(&url, &[]).await?;
        Ok(gh.into())
    }

    async fn search_repositories(
        &self,
        query: &SearchQuery,
        page: PageRequest,
    ) -> Result<Listing<Repository>, ForgeError> {
        let found: SearchPage<GitHubRepository> =
            self.search("search/repositories", query, page).await?;
        Ok(found.into_listing())
    }

    async fn list_issues(
        &self,
        repo: &RepoRef,
        state: StateFilter,
        page: PageRequest,
    ) -> Result<Listing<Issue>, ForgeError> {
        let mut params = vec![("state", state.to_string())];
        params.extend(page_params(page));
        let issues: Vec<GitHubIssue> = self.get(&self.repo_url(repo, "issues"), &params).await?;
        Ok(Listing::page(issues.into_iter().map(Into::into).collect()))
    }

    async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<Issue, ForgeError> {
        let gh: GitHubIssue = self
            .get(&self.repo_url(repo, &format!("issues/{}", number)), &[])
            .await?;
        Ok(gh.into())
    }

    async fn list_issue_comments(
        &self,
        repo: &RepoRef,
        number: u64,
        page: PageRequest,
    ) -> Result<Listing<Comment>, ForgeError> {
        let url = self.repo_url(repo, &format!("issues/{}/comments", number));
        let comments: Vec<GitHubComment> = self.get(&url, &page_params(page)).await?;
        Ok(Listing::page(comments.into_iter().map(Into::into).collect()))
    }

    async fn create_issue(&self, repo: &RepoRef, issue: NewIssue) -> Result<Issue, ForgeError> {
        let body = CreateIssueBody {
            title: &issue.title,
            body: issue.body.as_deref(),
            labels: &issue.labels,
        };
        let gh: GitHubIssue = self
            .send_json(Method::POST, &self.repo_url(repo, "issues"), &body)
            .await?;
        Ok(gh.into())
    }

    async fn add_issue_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> Result<Comment, ForgeError> {
        let url = self.repo_url(repo, &format!("issues/{}/comments", number));
        let gh: GitHubComment = self
            .send_json(Method::POST, &url, &CommentBody { body })
            .await?;
        Ok(gh.into())
    }

    async fn search_issues(
        &self,
        query: &SearchQuery,
        page: PageRequest,
    ) -> Result<Listing<Issue>, ForgeError> {
        let found: SearchPage<GitHubIssue> = self.search("search/issues", query, page).await?;
        Ok(found.into_listing())
    }

    async fn list_pull_requests(
        &self,
        repo: &RepoRef,
        state: StateFilter,
        page: PageRequest,
    ) -> Result<Listing<PullRequest>, ForgeError> {
        let mut params = vec![("state", state.to_string())];
        params.extend(page_params(page));
        let pulls: Vec<GitHubPullRequest> =
            self.get(&self.repo_url(repo, "pulls"), &params).await?;
        Ok(Listing::page(pulls.into_iter().map(Into::into).collect()))
    }

    async fn get_pull_request(
        &self,
        repo: &RepoRef,
        number: u64,
    ) -> Result<PullRequest, ForgeError> {
        let gh: GitHubPullRequest = self
            .get(&self.repo_url(repo, &format!("pulls/{}", number)), &[])
            .await?;
        Ok(gh.into())
    }

    async fn list_pull_request_files(
        &self,
        repo: &RepoRef,
        number: u64,
        page: PageRequest,
    ) -> Result<Listing<PullRequestFile>, ForgeError> {
        let url = self.repo_url(repo, &format!("pulls/{}/files", number));
        let files: Vec<GitHubChangedFile> = self.get(&url, &page_params(page)).await?;
        Ok(Listing::page(files.into_iter().map(Into::into).collect()))
    }

    async fn merge_pull_request(
        &self,
        repo: &RepoRef,
        number: u64,
        request: MergeRequest,
    ) -> Result<MergeOutcome, ForgeError> {
        let url = self.repo_url(repo, &format!("pulls/{}/merge", number));
        let body = MergePrBody {
            merge_method: request.method.as_str(),
            commit_message: request.commit_message.as_deref(),
        };
        let gh: GitHubMergeResult = self.send_json(Method::PUT, &url, &body).await?;
        Ok(MergeOutcome {
            merged: gh.merged,
            sha: gh.sha,
            message: gh.message,
        })
    }

    async fn list_branches(
        &self,
        repo: &RepoRef,
        page: PageRequest,
    ) -> Result<Listing<Branch>, ForgeError> {
        let branches: Vec<GitHubBranch> = self
            .get(&self.repo_url(repo, "branches"), &page_params(page))
            .await?;
        Ok(Listing::page(branches.into_iter().map(Into::into).collect()))
    }

    async fn get_branch(&self, repo: &RepoRef, name: &str) -> Result<Branch, ForgeError> {
        let url = self.repo_url(repo, &format!("branches/{}", encode_path(name)));
        let gh: GitHubBranch = self.get(&url, &[]).await?;
        Ok(gh.into())
    }

    async fn resolve_branch_ref(
        &self,
        repo: &RepoRef,
        branch: &str,
    ) -> Result<String, ForgeError> {
        let url = self.repo_url(repo, &format!("git/ref/heads/{}", encode_path(branch)));
        let gh: GitHubRef = self.get(&url, &[]).await?;
        Ok(gh.object.sha)
    }

    async fn create_ref(
        &self,
        repo: &RepoRef,
        name: &str,
        sha: &str,
    ) -> Result<GitRef, ForgeError> {
        let body = CreateRefBody { ref_name: name, sha };
        let gh: GitHubRef = self
            .send_json(Method::POST, &self.repo_url(repo, "git/refs"), &body)
            .await?;
        Ok(GitRef {
            name: gh.ref_name,
            sha: gh.object.sha,
            url: gh.url,
        })
    }

    async fn get_commit(&self, repo: &RepoRef, sha: &str) -> Result<Commit, ForgeError> {
        let url = self.repo_url(repo, &format!("commits/{}", urlencoding::encode(sha)));
        let gh: GitHubCommit = self.get(&url, &[]).await?;
        Ok(gh.into())
    }

    async fn list_commits(
        &self,
        repo: &RepoRef,
        filter: &CommitFilter,
        page: PageRequest,
    ) -> Result<Listing<Commit>, ForgeError> {
        let mut params = Vec::new();
        if let Some(branch) = &filter.branch {
            params.push(("sha", branch.clone()));
        }
        if let Some(author) = &filter.author {
            params.push(("author", author.clone()));
        }
        if let Some(path) = &filter.path {
            params.push(("path", path.clone()));
        }
        params.extend(page_params(page));
        let commits: Vec<GitHubCommit> =
            self.get(&self.repo_url(repo, "commits"), &params).await?;
        Ok(Listing::page(commits.into_iter().map(Into::into).collect()))
    }

    async fn get_contents(
        &self,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Contents, ForgeError> {
        let url = if path.trim_matches('/').is_empty() {
            self.repo_url(repo, "contents")
        } else {
            self.repo_url(repo, &format!("contents/{}", encode_path(path)))
        };
        let params: Vec<(&str, String)> = git_ref
            .map(|r| vec![("ref", r.to_string())])
            .unwrap_or_default();

        match self.get::<GitHubContents>(&url, &params).await? {
            GitHubContents::Directory(items) => Ok(Contents::Directory(
                items.into_iter().map(Into::into).collect(),
            )),
            GitHubContents::Item(item) => Ok(Contents::File(item.try_into()?)),
        }
    }

    async fn put_file(&self, repo: &RepoRef, write: FileWrite) -> Result<FileCommit, ForgeError> {
        let url = self.repo_url(repo, &format!("contents/{}", encode_path(&write.path)));
        let body = PutFileBody {
            message: &write.message,
            content: STANDARD.encode(write.content.as_bytes()),
            branch: write.branch.as_deref(),
            sha: write.sha.as_deref(),
        };
        let gh: GitHubFileCommit = self.send_json(Method::PUT, &url, &body).await?;

        let content = gh.content.ok_or_else(|| {
            ForgeError::Decode("file write response has no content record".into())
        })?;
        Ok(FileCommit {
            path: content.path,
            name: content.name,
            sha: content.sha,
            url: content.html_url,
            commit: CommitRef {
                sha: gh.commit.sha,
                url: gh.commit.html_url,
                message: gh.commit.message,
            },
        })
    }

    async fn search_code(
        &self,
        query: &SearchQuery,
        page: PageRequest,
    ) -> Result<Listing<CodeHit>, ForgeError> {
        let found: SearchPage<GitHubCodeItem> = self.search("search/code", query, page).await?;
        Ok(found.into_listing())
    }
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for creating an issue.
#[derive(Serialize)]
struct CreateIssueBody<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    labels: &'a [String],
}

/// Request body for adding a comment.
#[derive(Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

/// Request body for merging a PR.
#[derive(Serialize)]
struct MergePrBody<'a> {
    merge_method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    commit_message: Option<&'a str>,
}

/// Request body for creating a ref.
#[derive(Serialize)]
struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    ref_name: &'a str,
    sha: &'a str,
}

/// Request body for creating or updating a file.
#[derive(Serialize)]
struct PutFileBody<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

/// Search endpoints wrap items with a total.
#[derive(Deserialize)]
struct SearchPage<T> {
    total_count: u64,
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

impl<T> SearchPage<T> {
    fn into_listing<U: From<T>>(self) -> Listing<U> {
        Listing::with_total(
            self.items.into_iter().map(Into::into).collect(),
            self.total_count,
        )
    }
}

#[derive(Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Deserialize)]
struct GitHubLicense {
    name: String,
}

#[derive(Deserialize)]
struct GitHubRepository {
    name: String,
    full_name: String,
    description: Option<String>,
    html_url: String,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    watchers_count: u64,
    #[serde(default)]
    open_issues_count: u64,
    #[serde(default)]
    private: bool,
    language: Option<String>,
    license: Option<GitHubLicense>,
    #[serde(default)]
    default_branch: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<GitHubRepository> for Repository {
    fn from(gh: GitHubRepository) -> Self {
        Repository {
            name: gh.name,
            full_name: gh.full_name,
            description: gh.description,
            url: gh.html_url,
            stars: gh.stargazers_count,
            forks: gh.forks_count,
            watchers: gh.watchers_count,
            open_issues: gh.open_issues_count,
            private: gh.private,
            language: gh.language,
            license: gh.license.map(|l| l.name),
            default_branch: gh.default_branch,
            created_at: gh.created_at,
            updated_at: gh.updated_at,
        }
    }
}

#[derive(Deserialize)]
struct GitHubLabel {
    name: String,
}

#[derive(Deserialize)]
struct GitHubIssue {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    html_url: String,
    user: Option<GitHubUser>,
    assignee: Option<GitHubUser>,
    #[serde(default)]
    labels: Vec<GitHubLabel>,
    #[serde(default)]
    comments: u64,
    repository_url: Option<String>,
    /// Present only on pull requests.
    pull_request: Option<serde_json::Value>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
}

impl From<GitHubIssue> for Issue {
    fn from(gh: GitHubIssue) -> Self {
        Issue {
            number: gh.number,
            title: gh.title,
            body: gh.body,
            state: gh.state,
            url: gh.html_url,
            user: gh.user.map(|u| u.login),
            assignee: gh.assignee.map(|u| u.login),
            labels: gh.labels.into_iter().map(|l| l.name).collect(),
            repository: gh.repository_url.as_deref().and_then(full_name_from_api_url),
            comments_count: gh.comments,
            created_at: gh.created_at,
            updated_at: gh.updated_at,
            closed_at: gh.closed_at,
            is_pull_request: gh.pull_request.is_some(),
        }
    }
}

#[derive(Deserialize)]
struct GitHubComment {
    id: u64,
    user: Option<GitHubUser>,
    body: Option<String>,
    html_url: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<GitHubComment> for Comment {
    fn from(gh: GitHubComment) -> Self {
        Comment {
            id: gh.id,
            user: gh.user.map(|u| u.login),
            body: gh.body.unwrap_or_default(),
            url: gh.html_url,
            created_at: gh.created_at,
            updated_at: gh.updated_at,
        }
    }
}

/// GitHub ref (head/base) format.
#[derive(Deserialize)]
struct GitHubPrRef {
    #[serde(rename = "ref")]
    ref_name: String,
}

/// GitHub PR format. The list endpoint omits `merged`; `merged_at` is
/// present on both.
#[derive(Deserialize)]
struct GitHubPullRequest {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    html_url: String,
    user: Option<GitHubUser>,
    base: GitHubPrRef,
    head: GitHubPrRef,
    merged: Option<bool>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    merged_at: Option<DateTime<Utc>>,
}

impl From<GitHubPullRequest> for PullRequest {
    fn from(pr: GitHubPullRequest) -> Self {
        PullRequest {
            is_merged: pr.merged.unwrap_or(pr.merged_at.is_some()),
            number: pr.number,
            title: pr.title,
            body: pr.body,
            state: pr.state,
            url: pr.html_url,
            user: pr.user.map(|u| u.login),
            base_branch: pr.base.ref_name,
            head_branch: pr.head.ref_name,
            created_at: pr.created_at,
            updated_at: pr.updated_at,
            closed_at: pr.closed_at,
            merged_at: pr.merged_at,
        }
    }
}

/// Changed file on a PR.
#[derive(Deserialize)]
struct GitHubChangedFile {
    filename: String,
    status: String,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    #[serde(default)]
    changes: u64,
    patch: Option<String>,
}

impl From<GitHubChangedFile> for PullRequestFile {
    fn from(gh: GitHubChangedFile) -> Self {
        PullRequestFile {
            filename: gh.filename,
            status: gh.status,
            additions: gh.additions,
            deletions: gh.deletions,
            changes: gh.changes,
        }
    }
}

impl From<GitHubChangedFile> for CommitFile {
    fn from(gh: GitHubChangedFile) -> Self {
        CommitFile {
            filename: gh.filename,
            status: gh.status,
            additions: gh.additions,
            deletions: gh.deletions,
            changes: gh.changes,
            patch: gh.patch,
        }
    }
}

#[derive(Deserialize)]
struct GitHubMergeResult {
    sha: Option<String>,
    merged: bool,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct GitHubShaPointer {
    sha: String,
}

#[derive(Deserialize)]
struct GitHubBranch {
    name: String,
    commit: GitHubShaPointer,
    #[serde(default)]
    protected: bool,
}

impl From<GitHubBranch> for Branch {
    fn from(gh: GitHubBranch) -> Self {
        Branch {
            name: gh.name,
            sha: gh.commit.sha,
            protected: gh.protected,
        }
    }
}

#[derive(Deserialize)]
struct GitHubRef {
    #[serde(rename = "ref")]
    ref_name: String,
    url: String,
    object: GitHubShaPointer,
}

#[derive(Deserialize)]
struct GitHubGitPerson {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    date: Option<DateTime<Utc>>,
}

impl From<Option<GitHubGitPerson>> for Person {
    fn from(gh: Option<GitHubGitPerson>) -> Self {
        match gh {
            Some(p) => Person {
                name: p.name,
                email: p.email,
                date: p.date,
            },
            None => Person {
                name: String::new(),
                email: String::new(),
                date: None,
            },
        }
    }
}

#[derive(Deserialize)]
struct GitHubCommitDetail {
    message: String,
    author: Option<GitHubGitPerson>,
    committer: Option<GitHubGitPerson>,
}

#[derive(Deserialize)]
struct GitHubParent {
    sha: String,
    html_url: Option<String>,
    #[serde(default)]
    url: String,
}

#[derive(Deserialize)]
struct GitHubStats {
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    #[serde(default)]
    total: u64,
}

/// Commit format; `files` and `stats` only on single-commit fetches.
#[derive(Deserialize)]
struct GitHubCommit {
    sha: String,
    html_url: String,
    commit: GitHubCommitDetail,
    #[serde(default)]
    parents: Vec<GitHubParent>,
    #[serde(default)]
    files: Vec<GitHubChangedFile>,
    stats: Option<GitHubStats>,
}

impl From<GitHubCommit> for Commit {
    fn from(gh: GitHubCommit) -> Self {
        Commit {
            sha: gh.sha,
            message: gh.commit.message,
            url: gh.html_url,
            author: gh.commit.author.into(),
            committer: gh.commit.committer.into(),
            parents: gh
                .parents
                .into_iter()
                .map(|p| CommitParent {
                    url: p.html_url.unwrap_or(p.url),
                    sha: p.sha,
                })
                .collect(),
            files: gh.files.into_iter().map(Into::into).collect(),
            stats: gh.stats.map(|s| CommitStats {
                additions: s.additions,
                deletions: s.deletions,
                total: s.total,
            }),
        }
    }
}

/// One contents-API record.
#[derive(Deserialize)]
struct GitHubContentItem {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    path: String,
    sha: String,
    #[serde(default)]
    size: u64,
    html_url: Option<String>,
    download_url: Option<String>,
    content: Option<String>,
    encoding: Option<String>,
}

/// The contents endpoint returns an array for directories.
#[derive(Deserialize)]
#[serde(untagged)]
enum GitHubContents {
    Directory(Vec<GitHubContentItem>),
    Item(GitHubContentItem),
}

impl From<GitHubContentItem> for DirectoryEntry {
    fn from(gh: GitHubContentItem) -> Self {
        DirectoryEntry {
            name: gh.name,
            path: gh.path,
            sha: gh.sha,
            size: gh.size,
            kind: gh.kind,
            url: gh.html_url,
            download_url: gh.download_url,
        }
    }
}

impl TryFrom<GitHubContentItem> for FileContent {
    type Error = ForgeError;

    fn try_from(gh: GitHubContentItem) -> Result<Self, Self::Error> {
        // Files over 1 MB come back with encoding "none" and no inline content.
        let content = match (gh.encoding.as_deref(), gh.content.as_deref()) {
            (Some("base64"), Some(encoded)) => decode_content(encoded)?,
            (_, Some(raw)) => raw.to_string(),
            (_, None) => String::new(),
        };
        Ok(FileContent {
            name: gh.name,
            path: gh.path,
            sha: gh.sha,
            size: gh.size,
            url: gh.html_url,
            download_url: gh.download_url,
            content,
        })
    }
}

#[derive(Deserialize)]
struct GitHubGitCommitRef {
    sha: String,
    html_url: Option<String>,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct GitHubFileCommit {
    content: Option<GitHubContentItem>,
    commit: GitHubGitCommitRef,
}

#[derive(Deserialize)]
struct GitHubRepoName {
    full_name: String,
}

#[derive(Deserialize)]
struct GitHubCodeItem {
    name: String,
    path: String,
    sha: String,
    html_url: String,
    repository: GitHubRepoName,
}

impl From<GitHubCodeItem> for CodeHit {
    fn from(gh: GitHubCodeItem) -> Self {
        CodeHit {
            name: gh.name,
            path: gh.path,
            sha: gh.sha,
            repository: gh.repository.full_name,
            url: gh.html_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_token_with_newline() {
        let err = GitHubClient::new("ghp_bad\ntoken", PUBLIC_API_BASE, &HttpSettings::default())
            .unwrap_err();
        assert!(matches!(err, ForgeError::Connection(_)));
        assert!(!err.to_string().contains("ghp_bad"));
    }

    #[test]
    fn new_trims_trailing_slash() {
        let client = GitHubClient::new(
            "ghp_ok",
            "https://ghe.acme.io/api/v3/",
            &HttpSettings::default(),
        )
        .unwrap();
        assert_eq!(client.api_base(), "https://ghe.acme.io/api/v3");
        assert_eq!(client.name(), "github");
    }

    #[test]
    fn debug_hides_token() {
        let client =
            GitHubClient::new("ghp_secret_value_123", PUBLIC_API_BASE, &HttpSettings::default())
                .unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("ghp_secret_value_123"));
        assert!(debug.contains("api.github.com"));
    }

    #[test]
    fn encode_path_keeps_separators() {
        assert_eq!(encode_path("src/main.rs"), "src/main.rs");
        assert_eq!(encode_path("/docs/my file.md/"), "docs/my%20file.md");
        assert_eq!(encode_path("feature/a#1"), "feature/a%231");
    }

    #[test]
    fn decode_content_ignores_line_wrapping() {
        // "hello world\n" wrapped like the contents API does
        assert_eq!(decode_content("aGVsbG8g\nd29ybGQK\n").unwrap(), "hello world\n");
    }

    #[test]
    fn decode_content_rejects_garbage() {
        assert!(matches!(
            decode_content("!!not base64!!"),
            Err(ForgeError::Decode(_))
        ));
    }

    #[test]
    fn full_name_from_api_url_extracts_repo() {
        assert_eq!(
            full_name_from_api_url("https://api.github.com/repos/acme/widgets").as_deref(),
            Some("acme/widgets")
        );
        assert!(full_name_from_api_url("https://api.github.com/users/acme").is_none());
    }

    #[test]
    fn pull_request_merged_falls_back_to_merged_at() {
        let listed: GitHubPullRequest = serde_json::from_value(serde_json::json!({
            "number": 7,
            "title": "Add widget",
            "body": null,
            "state": "closed",
            "html_url": "https://github.com/acme/widgets/pull/7",
            "user": {"login": "octocat"},
            "base": {"ref": "main"},
            "head": {"ref": "feature/widget"},
            "merged_at": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        let pr: PullRequest = listed.into();
        assert!(pr.is_merged);
        assert_eq!(pr.head_branch, "feature/widget");
        assert_eq!(pr.user.as_deref(), Some("octocat"));
    }

    #[test]
    fn issue_marks_pull_requests() {
        let gh: GitHubIssue = serde_json::from_value(serde_json::json!({
            "number": 3,
            "title": "t",
            "state": "open",
            "html_url": "https://github.com/acme/widgets/pull/3",
            "labels": [{"name": "bug"}],
            "repository_url": "https://api.github.com/repos/acme/widgets",
            "pull_request": {"url": "https://api.github.com/repos/acme/widgets/pulls/3"}
        }))
        .unwrap();
        let issue: Issue = gh.into();
        assert!(issue.is_pull_request);
        assert_eq!(issue.labels, vec!["bug".to_string()]);
        assert_eq!(issue.repository.as_deref(), Some("acme/widgets"));
    }

    #[test]
    fn contents_untagged_distinguishes_directory() {
        let dir: GitHubContents = serde_json::from_value(serde_json::json!([
            {"type": "dir", "name": "src", "path": "src", "sha": "a1", "size": 0}
        ]))
        .unwrap();
        assert!(matches!(dir, GitHubContents::Directory(ref items) if items.len() == 1));

        let file: GitHubContents = serde_json::from_value(serde_json::json!({
            "type": "file", "name": "README.md", "path": "README.md", "sha": "b2",
            "size": 12, "encoding": "base64", "content": "aGVsbG8gd29ybGQK"
        }))
        .unwrap();
        let GitHubContents::Item(item) = file else {
            panic!("expected a single item");
        };
        let content: FileContent = item.try_into().unwrap();
        assert_eq!(content.content, "hello world\n");
    }
}
