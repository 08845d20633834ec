//! gateway::paging
//!
//! Client-side limit and filter policy shared by every listing operation.
//!
//! # Policy
//!
//! - Pages are requested at `min(limit, 100)` items.
//! - Collection stops once `limit` items are kept or the source runs dry;
//!   the result never exceeds `limit` even if the remote sent more.
//! - Search limits are clamped to the remote's search window, so a large
//!   limit never asks for a page the remote refuses.
//! - `total_count` is the remote's reported total when there is one and no
//!   client-side filter is active. Otherwise it is the exact number of
//!   matching items when the whole source was read, and unknown if not.

use std::future::Future;

use crate::forge::{ForgeError, Listing, PageRequest, MAX_PER_PAGE};

pub const LIST_REPOSITORIES_LIMIT: usize = 30;
pub const SEARCH_REPOSITORIES_LIMIT: usize = 10;
pub const LIST_ISSUES_LIMIT: usize = 30;
pub const SEARCH_ISSUES_LIMIT: usize = 10;
pub const LIST_PULL_REQUESTS_LIMIT: usize = 30;
pub const LIST_BRANCHES_LIMIT: usize = 100;
pub const LIST_COMMITS_LIMIT: usize = 30;
pub const FIND_COMMITS_LIMIT: usize = 20;
pub const SEARCH_CODE_LIMIT: usize = 20;

/// Unbounded collection, for sub-resources fetched in full.
pub const ALL: usize = usize::MAX;

/// The remote serves at most this many results for one search; pages past
/// it are refused.
pub const SEARCH_WINDOW: usize = 1000;

/// A search limit clamped to [`SEARCH_WINDOW`].
pub fn search_limit(limit: usize) -> usize {
    limit.min(SEARCH_WINDOW)
}

/// Items kept under a limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected<T> {
    pub items: Vec<T>,
    pub total_count: Option<u64>,
}

/// Collect up to `limit` items.
pub async fn collect_limited<T, F, Fut>(limit: usize, fetch: F) -> Result<Collected<T>, ForgeError>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Listing<T>, ForgeError>>,
{
    collect(limit, fetch, |_: &T| true, false).await
}

/// Collect up to `limit` items that satisfy `keep`, in source order.
pub async fn collect_matching<T, F, Fut, P>(
    limit: usize,
    fetch: F,
    keep: P,
) -> Result<Collected<T>, ForgeError>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Listing<T>, ForgeError>>,
    P: FnMut(&T) -> bool,
{
    collect(limit, fetch, keep, true).await
}

async fn collect<T, F, Fut, P>(
    limit: usize,
    mut fetch: F,
    mut keep: P,
    filtered: bool,
) -> Result<Collected<T>, ForgeError>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Listing<T>, ForgeError>>,
    P: FnMut(&T) -> bool,
{
    let limit = limit.max(1);
    let per_page = limit.min(MAX_PER_PAGE as usize) as u32;
    let mut page = PageRequest::first(per_page);

    let mut items = Vec::with_capacity(limit.min(MAX_PER_PAGE as usize));
    let mut matched: u64 = 0;
    let mut remote_total = None;
    let mut exhausted = false;

    loop {
        let listing = fetch(page).await?;
        if remote_total.is_none() {
            remote_total = listing.total;
        }

        let fetched = listing.items.len();
        for item in listing.items {
            if !keep(&item) {
                continue;
            }
            matched += 1;
            if items.len() < limit {
                items.push(item);
            }
        }

        // A short page is the last one.
        if fetched < page.per_page as usize {
            exhausted = true;
            break;
        }
        if items.len() >= limit {
            break;
        }
        page = page.next();
    }

    let total_count = match remote_total {
        Some(total) if !filtered => Some(total),
        _ if exhausted => Some(matched),
        _ => None,
    };

    Ok(Collected { items, total_count })
}
