//! Repository operations.

use super::error::RemoteContext;
use super::paging::{self, collect_limited};
use super::{Gateway, GatewayError, ToolArgs};
use crate::envelope::Payload;
use crate::forge::{ClientFactory, SearchQuery};

impl<F: ClientFactory> Gateway<F> {
    pub(crate) async fn list_repositories(&self, args: &ToolArgs) -> Result<Payload, GatewayError> {
        let limit = args.limit(paging::LIST_REPOSITORIES_LIMIT)?;

        let session = self.open_session()?;
        let forge = session.forge();
        let listed = collect_limited(limit, move |page| forge.current_user_repositories(page))
            .await
            .during(|| "list repositories".to_string())?;

        Ok(Payload::new()
            .field("repositories", &listed.items)?
            .field("total_count", listed.total_count)?)
    }

    pub(crate) async fn get_repository(&self, args: &ToolArgs) -> Result<Payload, GatewayError> {
        let explicit = args.repository("repository")?;

        let session = self.open_session()?;
        let repo = session.repository(explicit)?;
        let details = session
            .forge()
            .get_repository(&repo)
            .await
            .during(|| format!("get repository {}", repo))?;

        Ok(Payload::new().field("repository", &details)?)
    }

    pub(crate) async fn search_repositories(
        &self,
        args: &ToolArgs,
    ) -> Result<Payload, GatewayError> {
        let query = args.required_str("query")?;
        let limit = paging::search_limit(args.limit(paging::SEARCH_REPOSITORIES_LIMIT)?);

        let session = self.open_session()?;
        let forge = session.forge();
        let search = SearchQuery::sorted_desc(query.as_str(), "stars");
        let search = &search;
        let found = collect_limited(limit, move |page| forge.search_repositories(search, page))
            .await
            .during(|| format!("search repositories for '{}'", query))?;

        Ok(Payload::new()
            .field("query", &query)?
            .field("repositories", &found.items)?
            .field("total_count", found.total_count)?)
    }
}
