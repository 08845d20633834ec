//! Commit operations.

use super::error::RemoteContext;
use super::paging::{self, collect_limited, collect_matching};
use super::{Gateway, GatewayError, ToolArgs};
use crate::envelope::Payload;
use crate::forge::{ClientFactory, Commit, CommitFilter};

/// Case-insensitive substring match on the full commit message.
fn message_contains(commit: &Commit, needle_lower: &str) -> bool {
    commit.message.to_lowercase().contains(needle_lower)
}

impl<F: ClientFactory> Gateway<F> {
    pub(crate) async fn get_commit(&self, args: &ToolArgs) -> Result<Payload, GatewayError> {
        let sha = args.required_str("sha")?;
        let explicit = args.repository("repository")?;

        let session = self.open_session()?;
        let repo = session.repository(explicit)?;
        let commit = session
            .forge()
            .get_commit(&repo, &sha)
            .await
            .during(|| format!("get commit {} in {}", sha, repo))?;

        Ok(Payload::new().field("commit", &commit)?)
    }

    pub(crate) async fn list_commits(&self, args: &ToolArgs) -> Result<Payload, GatewayError> {
        let explicit = args.repository("repository")?;
        let filter = CommitFilter {
            branch: args.optional_str("branch")?,
            author: args.optional_str("author")?,
            path: args.optional_str("path")?,
        };
        let limit = args.limit(paging::LIST_COMMITS_LIMIT)?;

        let session = self.open_session()?;
        let repo = session.repository(explicit)?;
        let forge = session.forge();
        let target = &repo;
        let filter_ref = &filter;
        let listed = collect_limited(limit, move |page| {
            forge.list_commits(target, filter_ref, page)
        })
        .await
        .during(|| format!("list commits in {}", repo))?;

        let mut payload = Payload::new()
            .field("repository", repo.full_name())?
            .field("commits", &listed.items)?
            .field("total_count", listed.total_count)?;
        if let Some(branch) = &filter.branch {
            payload = payload.field("branch", branch)?;
        }
        if let Some(author) = &filter.author {
            payload = payload.field("author", author)?;
        }
        if let Some(path) = &filter.path {
            payload = payload.field("path", path)?;
        }
        Ok(payload)
    }

    /// Scan history newest first until `limit` matches or the history ends.
    pub(crate) async fn find_commits_by_message(
        &self,
        args: &ToolArgs,
    ) -> Result<Payload, GatewayError> {
        let text = args.required_str("text")?;
        let explicit = args.repository("repository")?;
        let branch = args.optional_str("branch")?;
        let limit = args.limit(paging::FIND_COMMITS_LIMIT)?;

        let session = self.open_session()?;
        let repo = session.repository(explicit)?;
        let forge = session.forge();
        let filter = CommitFilter {
            branch: branch.clone(),
            ..CommitFilter::default()
        };
        let target = &repo;
        let filter_ref = &filter;
        let needle = text.to_lowercase();
        let found = collect_matching(
            limit,
            move |page| forge.list_commits(target, filter_ref, page),
            |commit: &Commit| message_contains(commit, &needle),
        )
        .await
        .during(|| format!("search commit messages in {}", repo))?;

        let mut payload = Payload::new()
            .field("repository", repo.full_name())?
            .field("search_text", &text)?
            .field("commits", &found.items)?
            .field("total_count", found.total_count)?;
        if let Some(branch) = &branch {
            payload = payload.field("branch", branch)?;
        }
        Ok(payload)
    }
}
