//! File, directory and code search operations.

use super::error::RemoteContext;
use super::paging::{self, collect_limited};
use super::{Gateway, GatewayError, ToolArgs};
use crate::envelope::Payload;
use crate::forge::{ClientFactory, Contents, FileWrite, SearchQuery};

/// Normalize a user-supplied path: no leading or trailing slashes.
fn repo_path(raw: &str) -> &str {
    raw.trim().trim_matches('/')
}

impl<F: ClientFactory> Gateway<F> {
    pub(crate) async fn get_file_contents(&self, args: &ToolArgs) -> Result<Payload, GatewayError> {
        let raw_path = args.required_str("path")?;
        let path = repo_path(&raw_path);
        let git_ref = args.optional_str("ref")?;
        let explicit = args.repository("repository")?;

        let session = self.open_session()?;
        let repo = session.repository(explicit)?;
        let contents = session
            .forge()
            .get_contents(&repo, path, git_ref.as_deref())
            .await
            .during(|| format!("get file '{}' in {}", path, repo))?;

        match contents {
            Contents::File(file) => Ok(Payload::new()
                .field("repository", repo.full_name())?
                .field("ref", &git_ref)?
                .field("file", &file)?),
            Contents::Directory(_) => Err(GatewayError::invalid_argument(format!(
                "'{}' is a directory; use list_directory_contents",
                path
            ))),
        }
    }

    pub(crate) async fn list_directory_contents(
        &self,
        args: &ToolArgs,
    ) -> Result<Payload, GatewayError> {
        let raw_path = args.optional_str("path")?.unwrap_or_default();
        let path = repo_path(&raw_path);
        let git_ref = args.optional_str("ref")?;
        let explicit = args.repository("repository")?;

        let session = self.open_session()?;
        let repo = session.repository(explicit)?;
        let contents = session
            .forge()
            .get_contents(&repo, path, git_ref.as_deref())
            .await
            .during(|| format!("list directory '{}' in {}", path, repo))?;

        match contents {
            Contents::Directory(entries) => Ok(Payload::new()
                .field("repository", repo.full_name())?
                .field("path", path)?
                .field("ref", &git_ref)?
                .field("contents", &entries)?
                .field("total_count", entries.len())?),
            Contents::File(_) => Err(GatewayError::invalid_argument(format!(
                "'{}' is a file; use get_file_contents",
                path
            ))),
        }
    }

    pub(crate) async fn create_or_update_file(
        &self,
        args: &ToolArgs,
    ) -> Result<Payload, GatewayError> {
        let raw_path = args.required_str("path")?;
        let content = args.required_text("content")?;
        let message = args.required_str("message")?;
        let branch = args.optional_str("branch")?;
        let sha = args.optional_str("sha")?;
        let explicit = args.repository("repository")?;

        let path = repo_path(&raw_path).to_string();
        let operation = if sha.is_some() { "update" } else { "create" };

        let session = self.open_session()?;
        let repo = session.repository(explicit)?;
        let written = session
            .forge()
            .put_file(
                &repo,
                FileWrite {
                    path: path.clone(),
                    content,
                    message,
                    branch,
                    sha,
                },
            )
            .await
            .during(|| format!("{} file '{}' in {}", operation, path, repo))?;

        tracing::info!(repository = %repo, %path, operation, commit = %written.commit.sha, "wrote file");
        Ok(Payload::new()
            .field("operation", operation)?
            .field("repository", repo.full_name())?
            .field("file", &written)?)
    }

    /// Global search; `repository` narrows it but never defaults.
    pub(crate) async fn search_code(&self, args: &ToolArgs) -> Result<Payload, GatewayError> {
        let query = args.required_str("query")?;
        let filter = args.repository("repository")?;
        let extension = args.optional_str("extension")?;
        let limit = paging::search_limit(args.limit(paging::SEARCH_CODE_LIMIT)?);

        let mut composed = query;
        if let Some(repo) = &filter {
            composed.push_str(&format!(" repo:{}", repo));
        }
        if let Some(ext) = &extension {
            composed.push_str(&format!(" extension:{}", ext.trim().trim_start_matches('.')));
        }

        let session = self.open_session()?;
        let forge = session.forge();
        let search = SearchQuery::new(composed.as_str());
        let search = &search;
        let found = collect_limited(limit, move |page| forge.search_code(search, page))
            .await
            .during(|| format!("search code for '{}'", composed))?;

        Ok(Payload::new()
            .field("query", &composed)?
            .field("items", &found.items)?
            .field("count", found.items.len())?
            .field("total_count", found.total_count)?)
    }
}
