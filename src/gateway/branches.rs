//! Branch operations.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::RemoteContext;
use super::paging::{self, collect_matching};
use super::{Gateway, GatewayError, ToolArgs};
use crate::envelope::Payload;
use crate::forge::{Branch, ClientFactory, Commit, ForgeError};

/// A listed branch, marked against the repository default.
#[derive(Debug, Serialize)]
struct BranchEntry {
    name: String,
    sha: String,
    protected: bool,
    is_default: bool,
    /// Absent when the head commit cannot be found.
    #[serde(skip_serializing_if = "Option::is_none")]
    latest_commit: Option<LatestCommit>,
}

/// Summary of a branch head.
#[derive(Debug, Serialize)]
struct LatestCommit {
    message: String,
    author: String,
    date: Option<DateTime<Utc>>,
}

impl From<Commit> for LatestCommit {
    fn from(commit: Commit) -> Self {
        LatestCommit {
            message: commit.message,
            author: commit.author.name,
            date: commit.author.date,
        }
    }
}

impl<F: ClientFactory> Gateway<F> {
    pub(crate) async fn list_branches(&self, args: &ToolArgs) -> Result<Payload, GatewayError> {
        let explicit = args.repository("repository")?;
        let prefix = args.optional_str("filter")?;
        let limit = args.limit(paging::LIST_BRANCHES_LIMIT)?;

        let session = self.open_session()?;
        let repo = session.repository(explicit)?;
        let forge = session.forge();

        let default_branch = forge
            .get_repository(&repo)
            .await
            .during(|| format!("get repository {}", repo))?
            .default_branch;

        let target = &repo;
        let prefix_ref = prefix.as_deref();
        let listed = collect_matching(
            limit,
            move |page| forge.list_branches(target, page),
            |branch: &Branch| prefix_ref.map_or(true, |p| branch.name.starts_with(p)),
        )
        .await
        .during(|| format!("list branches in {}", repo))?;

        // One commit lookup per kept branch.
        let mut branches = Vec::with_capacity(listed.items.len());
        for b in listed.items {
            let latest_commit = match forge.get_commit(&repo, &b.sha).await {
                Ok(commit) => Some(LatestCommit::from(commit)),
                Err(ForgeError::NotFound(_)) => None,
                Err(source) => {
                    return Err(GatewayError::Remote {
                        action: format!("get head commit of branch '{}' in {}", b.name, repo),
                        source,
                    })
                }
            };
            branches.push(BranchEntry {
                is_default: b.name == default_branch,
                name: b.name,
                sha: b.sha,
                protected: b.protected,
                latest_commit,
            });
        }

        Ok(Payload::new()
            .field("repository", repo.full_name())?
            .field("default_branch", &default_branch)?
            .field("filter", &prefix)?
            .field("branches", &branches)?
            .field("total_count", listed.total_count)?)
    }

    pub(crate) async fn create_branch(&self, args: &ToolArgs) -> Result<Payload, GatewayError> {
        let name = args.required_str("branch_name")?;
        let from_ref = args.optional_str("from_ref")?;
        let explicit = args.repository("repository")?;

        let session = self.open_session()?;
        let repo = session.repository(explicit)?;
        let forge = session.forge();

        match forge.get_branch(&repo, &name).await {
            Ok(_) => {
                return Err(GatewayError::InvalidState(format!(
                    "Branch '{}' already exists",
                    name
                )))
            }
            Err(ForgeError::NotFound(_)) => {}
            Err(err) => return Err(err).during(|| format!("check branch '{}' in {}", name, repo)),
        }

        let sha = match &from_ref {
            Some(reference) => {
                let resolved = match forge.resolve_branch_ref(&repo, reference).await {
                    Ok(sha) => Ok(sha),
                    // Not a branch; try it as a commit.
                    Err(ForgeError::NotFound(_)) => forge
                        .get_commit(&repo, reference)
                        .await
                        .map(|commit| commit.sha),
                    Err(err) => Err(err),
                };
                match resolved {
                    Ok(sha) => sha,
                    Err(ForgeError::NotFound(_)) => {
                        return Err(GatewayError::invalid_argument(format!(
                            "Invalid reference: '{}' is neither a branch nor a commit in {}",
                            reference, repo
                        )))
                    }
                    Err(err) => {
                        return Err(err).during(|| format!("resolve '{}' in {}", reference, repo))
                    }
                }
            }
            None => {
                let default_branch = forge
                    .get_repository(&repo)
                    .await
                    .during(|| format!("get repository {}", repo))?
                    .default_branch;
                forge
                    .resolve_branch_ref(&repo, &default_branch)
                    .await
                    .during(|| format!("resolve default branch '{}' in {}", default_branch, repo))?
            }
        };

        let created = forge
            .create_ref(&repo, &format!("refs/heads/{}", name), &sha)
            .await
            .during(|| format!("create branch '{}' in {}", name, repo))?;

        tracing::info!(repository = %repo, branch = %name, %sha, "created branch");
        Ok(Payload::new()
            .field("repository", repo.full_name())?
            .field("from_ref", &from_ref)?
            .field(
                "branch",
                serde_json::json!({
                    "name": name,
                    "sha": created.sha,
                    "ref": created.name,
                    "url": created.url,
                }),
            )?)
    }
}
