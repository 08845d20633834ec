//! Issue operations.

use serde::Serialize;

use super::error::RemoteContext;
use super::paging::{self, collect_limited, collect_matching};
use super::{Gateway, GatewayError, ToolArgs};
use crate::envelope::Payload;
use crate::forge::{ClientFactory, Comment, Issue, NewIssue, SearchQuery, StateFilter};

/// An issue with its full comment thread.
#[derive(Serialize)]
struct IssueDetail<'a> {
    #[serde(flatten)]
    issue: &'a Issue,
    comments: &'a [Comment],
}

/// Parse the optional `state` argument.
pub(super) fn state_arg(args: &ToolArgs) -> Result<StateFilter, GatewayError> {
    match args.optional_str("state")? {
        None => Ok(StateFilter::default()),
        Some(raw) => StateFilter::parse(&raw).ok_or_else(|| {
            GatewayError::invalid_argument(format!(
                "state must be one of open, closed, all; got '{}'",
                raw
            ))
        }),
    }
}

impl<F: ClientFactory> Gateway<F> {
    pub(crate) async fn list_issues(&self, args: &ToolArgs) -> Result<Payload, GatewayError> {
        let explicit = args.repository("repository")?;
        let state = state_arg(args)?;
        let limit = args.limit(paging::LIST_ISSUES_LIMIT)?;

        let session = self.open_session()?;
        let repo = session.repository(explicit)?;
        let forge = session.forge();
        let target = &repo;
        // The issues endpoint mixes in pull requests.
        let listed = collect_matching(
            limit,
            move |page| forge.list_issues(target, state, page),
            |issue: &Issue| !issue.is_pull_request,
        )
        .await
        .during(|| format!("list issues in {}", repo))?;

        Ok(Payload::new()
            .field("repository", repo.full_name())?
            .field("state", state)?
            .field("issues", &listed.items)?
            .field("total_count", listed.total_count)?)
    }

    pub(crate) async fn get_issue(&self, args: &ToolArgs) -> Result<Payload, GatewayError> {
        let number = args.required_number("issue_number")?;
        let explicit = args.repository("repository")?;

        let session = self.open_session()?;
        let repo = session.repository(explicit)?;
        let forge = session.forge();
        let issue = forge
            .get_issue(&repo, number)
            .await
            .during(|| format!("get issue #{} in {}", number, repo))?;

        let target = &repo;
        let comments = collect_limited(paging::ALL, move |page| {
            forge.list_issue_comments(target, number, page)
        })
        .await
        .during(|| format!("list comments on issue #{} in {}", number, repo))?;

        Ok(Payload::new().field(
            "issue",
            IssueDetail {
                issue: &issue,
                comments: &comments.items,
            },
        )?)
    }

    pub(crate) async fn create_issue(&self, args: &ToolArgs) -> Result<Payload, GatewayError> {
        let title = args.required_str("title")?;
        let body = args.optional_str("body")?;
        let labels = args.list("labels")?;
        let explicit = args.repository("repository")?;

        let session = self.open_session()?;
        let repo = session.repository(explicit)?;
        let created = session
            .forge()
            .create_issue(&repo, NewIssue { title, body, labels })
            .await
            .during(|| format!("create issue in {}", repo))?;

        tracing::info!(repository = %repo, number = created.number, "created issue");
        Ok(Payload::new()
            .field("number", created.number)?
            .field("url", &created.url)?
            .field("issue", &created)?)
    }

    pub(crate) async fn add_issue_comment(&self, args: &ToolArgs) -> Result<Payload, GatewayError> {
        let number = args.required_number("issue_number")?;
        let body = args.required_str("body")?;
        let explicit = args.repository("repository")?;

        let session = self.open_session()?;
        let repo = session.repository(explicit)?;
        let comment = session
            .forge()
            .add_issue_comment(&repo, number, &body)
            .await
            .during(|| format!("comment on issue #{} in {}", number, repo))?;

        Ok(Payload::new()
            .field("issue_number", number)?
            .field("repository", repo.full_name())?
            .field("comment", &comment)?)
    }

    pub(crate) async fn search_issues(&self, args: &ToolArgs) -> Result<Payload, GatewayError> {
        let query = args.required_str("query")?;
        let filter = args.repository("repository")?;
        let state = match args.optional_str("state")? {
            Some(_) => Some(state_arg(args)?),
            None => None,
        };
        let limit = paging::search_limit(args.limit(paging::SEARCH_ISSUES_LIMIT)?);

        let mut composed = query;
        if let Some(repo) = &filter {
            composed.push_str(&format!(" repo:{}", repo));
        }
        match state {
            Some(StateFilter::Open) => composed.push_str(" is:open"),
            Some(StateFilter::Closed) => composed.push_str(" is:closed"),
            Some(StateFilter::All) | None => {}
        }

        let session = self.open_session()?;
        let forge = session.forge();
        let search = SearchQuery::sorted_desc(composed.as_str(), "created");
        let search = &search;
        let found = collect_limited(limit, move |page| forge.search_issues(search, page))
            .await
            .during(|| format!("search issues for '{}'", composed))?;

        Ok(Payload::new()
            .field("query", &composed)?
            .field("issues", &found.items)?
            .field("total_count", found.total_count)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn state_defaults_to_open() {
        let args = ToolArgs::from_value(json!({})).unwrap();
        assert_eq!(state_arg(&args).unwrap(), StateFilter::Open);
    }

    #[test]
    fn state_rejects_unknown_values() {
        let args = ToolArgs::from_value(json!({"state": "merged"})).unwrap();
        let err = state_arg(&args).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidArgument(_)));
        assert!(err.to_string().contains("merged"));
    }

    #[test]
    fn issue_detail_flattens_comments_in() {
        let issue = crate::forge::mock::issue(3, "Crash on start");
        let detail = IssueDetail {
            issue: &issue,
            comments: &[],
        };
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["number"], 3);
        assert_eq!(value["comments"], json!([]));
        assert!(value.get("is_pull_request").is_none());
    }
}
