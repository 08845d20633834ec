//! Pull request operations.

use serde::Serialize;

use super::error::RemoteContext;
use super::issues::state_arg;
use super::paging::{self, collect_limited};
use super::{Gateway, GatewayError, ToolArgs};
use crate::envelope::Payload;
use crate::forge::{ClientFactory, Comment, MergeMethod, MergeRequest, PullRequest, PullRequestFile};

#[derive(Serialize)]
struct PullRequestDetail<'a> {
    #[serde(flatten)]
    pull_request: &'a PullRequest,
    comments: &'a [Comment],
    files: &'a [PullRequestFile],
}

fn merge_method_arg(args: &ToolArgs) -> Result<MergeMethod, GatewayError> {
    match args.optional_str("merge_method")? {
        None => Ok(MergeMethod::default()),
        Some(raw) => MergeMethod::parse(&raw).ok_or_else(|| {
            GatewayError::invalid_argument(format!(
                "merge_method must be one of merge, squash, rebase; got '{}'",
                raw
            ))
        }),
    }
}

impl<F: ClientFactory> Gateway<F> {
    pub(crate) async fn list_pull_requests(
        &self,
        args: &ToolArgs,
    ) -> Result<Payload, GatewayError> {
        let explicit = args.repository("repository")?;
        let state = state_arg(args)?;
        let limit = args.limit(paging::LIST_PULL_REQUESTS_LIMIT)?;

        let session = self.open_session()?;
        let repo = session.repository(explicit)?;
        let forge = session.forge();
        let target = &repo;
        let listed = collect_limited(limit, move |page| {
            forge.list_pull_requests(target, state, page)
        })
        .await
        .during(|| format!("list pull requests in {}", repo))?;

        Ok(Payload::new()
            .field("repository", repo.full_name())?
            .field("state", state)?
            .field("pull_requests", &listed.items)?
            .field("total_count", listed.total_count)?)
    }

    pub(crate) async fn get_pull_request(&self, args: &ToolArgs) -> Result<Payload, GatewayError> {
        let number = args.required_number("pr_number")?;
        let explicit = args.repository("repository")?;

        let session = self.open_session()?;
        let repo = session.repository(explicit)?;
        let forge = session.forge();
        let pull_request = forge
            .get_pull_request(&repo, number)
            .await
            .during(|| format!("get pull request #{} in {}", number, repo))?;

        let target = &repo;
        let comments = collect_limited(paging::ALL, move |page| {
            forge.list_issue_comments(target, number, page)
        })
        .await
        .during(|| format!("list comments on pull request #{} in {}", number, repo))?;
        let files = collect_limited(paging::ALL, move |page| {
            forge.list_pull_request_files(target, number, page)
        })
        .await
        .during(|| format!("list files of pull request #{} in {}", number, repo))?;

        Ok(Payload::new().field(
            "pull_request",
            PullRequestDetail {
                pull_request: &pull_request,
                comments: &comments.items,
                files: &files.items,
            },
        )?)
    }

    /// Pull request comments live on the issue with the same number.
    pub(crate) async fn add_pull_request_comment(
        &self,
        args: &ToolArgs,
    ) -> Result<Payload, GatewayError> {
        let number = args.required_number("pr_number")?;
        let body = args.required_str("body")?;
        let explicit = args.repository("repository")?;

        let session = self.open_session()?;
        let repo = session.repository(explicit)?;
        let comment = session
            .forge()
            .add_issue_comment(&repo, number, &body)
            .await
            .during(|| format!("comment on pull request #{} in {}", number, repo))?;

        Ok(Payload::new()
            .field("pull_request_number", number)?
            .field("repository", repo.full_name())?
            .field("comment", &comment)?)
    }

    pub(crate) async fn merge_pull_request(
        &self,
        args: &ToolArgs,
    ) -> Result<Payload, GatewayError> {
        let number = args.required_number("pr_number")?;
        let method = merge_method_arg(args)?;
        let commit_message = args.optional_str("commit_message")?;
        let explicit = args.repository("repository")?;

        let session = self.open_session()?;
        let repo = session.repository(explicit)?;
        let forge = session.forge();

        let current = forge
            .get_pull_request(&repo, number)
            .await
            .during(|| format!("get pull request #{} in {}", number, repo))?;
        if current.is_merged {
            return Err(GatewayError::InvalidState(format!(
                "Pull request #{} is already merged",
                number
            )));
        }

        let outcome = forge
            .merge_pull_request(
                &repo,
                number,
                MergeRequest {
                    method,
                    commit_message,
                },
            )
            .await
            .during(|| format!("merge pull request #{} in {}", number, repo))?;

        tracing::info!(repository = %repo, number, %method, merged = outcome.merged, "merge requested");
        Ok(Payload::new()
            .field("merged", outcome.merged)?
            .field("method", method.as_str())?
            .field("sha", &outcome.sha)?
            .field("message", &outcome.message)?
            .field("pull_request_number", number)?
            .field("repository", repo.full_name())?)
    }
}
