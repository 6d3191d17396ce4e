//! Paginated retrieval of one full relationship list.
//!
//! Pages are requested strictly sequentially: each continuation cursor is
//! only known once the previous page has resolved. A fixed delay between
//! pages keeps the session under the remote rate limiter's radar.

use crate::bridge::{BridgeHandle, PageQuery};
use crate::error::{IgfError, Result};
use crate::model::{Collection, FetchProgress, ListKind};
use std::time::Duration;
use tracing::debug;

/// Default pause between page requests.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);

/// Tuning knobs for the fetch loop.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Pause between consecutive page requests.
    pub page_delay: Duration,
    /// Abort after this many pages without reaching the end of the list.
    /// `0` disables the cap, trusting the server to terminate pagination.
    pub max_pages: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_delay: DEFAULT_PAGE_DELAY,
            max_pages: 0,
        }
    }
}

/// Fetch every page of `kind` for `user_id` into one collection.
///
/// Entities accumulate in page-arrival order. After each page an advisory
/// [`FetchProgress`] is handed to `on_progress`. Any failed page aborts the
/// whole fetch; no partial collection is returned.
///
/// # Errors
///
/// Propagates the first page failure, or [`IgfError::CollectionTooLarge`]
/// when the safety cap is hit before the server ends the collection.
pub async fn fetch_all(
    bridge: &BridgeHandle,
    user_id: &str,
    kind: ListKind,
    options: &FetchOptions,
    mut on_progress: impl FnMut(FetchProgress),
) -> Result<Collection> {
    let mut accounts = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = bridge
            .fetch_page(PageQuery {
                kind,
                user_id: user_id.to_string(),
                max_id: cursor.take(),
            })
            .await?;

        pages += 1;
        accounts.extend(page.users);
        // An empty cursor string means the same as an absent one.
        cursor = page.next_max_id.filter(|c| !c.is_empty());

        debug!(%kind, pages, fetched = accounts.len(), more = cursor.is_some(), "page received");
        on_progress(FetchProgress {
            kind,
            pages,
            fetched: accounts.len(),
        });

        if cursor.is_none() {
            break;
        }
        if options.max_pages != 0 && pages >= options.max_pages {
            return Err(IgfError::CollectionTooLarge { kind, pages });
        }
        tokio::time::sleep(options.page_delay).await;
    }

    Ok(Collection::new(user_id.to_string(), kind, accounts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::{ScriptedTransport, page};
    use crate::bridge::ApiBridge;
    use std::sync::Arc;

    fn immediate() -> FetchOptions {
        FetchOptions {
            page_delay: Duration::ZERO,
            max_pages: 0,
        }
    }

    #[tokio::test]
    async fn concatenates_pages_in_arrival_order() {
        let transport = ScriptedTransport::new(vec![
            Ok(page(&["A", "B"], Some("X"))),
            Ok(page(&["C"], None)),
        ]);
        let handle = ApiBridge::spawn(Arc::new(transport));

        let collection = fetch_all(&handle, "42", ListKind::Followers, &immediate(), |_| {})
            .await
            .unwrap();

        let pks: Vec<&str> = collection.accounts.iter().map(|a| a.pk.as_str()).collect();
        assert_eq!(pks, vec!["A", "B", "C"]);
        assert_eq!(collection.owner_id, "42");
        assert_eq!(collection.kind, ListKind::Followers);
    }

    #[tokio::test]
    async fn single_page_without_cursor_terminates() {
        let transport = ScriptedTransport::new(vec![Ok(page(&["A"], None))]);
        let handle = ApiBridge::spawn(Arc::new(transport));

        let collection = fetch_all(&handle, "42", ListKind::Following, &immediate(), |_| {})
            .await
            .unwrap();
        assert_eq!(collection.len(), 1);
    }

    #[tokio::test]
    async fn empty_cursor_string_ends_the_collection() {
        let transport = ScriptedTransport::new(vec![Ok(page(&["A"], Some("")))]);
        let handle = ApiBridge::spawn(Arc::new(transport));

        let collection = fetch_all(&handle, "42", ListKind::Followers, &immediate(), |_| {})
            .await
            .unwrap();
        assert_eq!(collection.len(), 1);
    }

    #[tokio::test]
    async fn mid_pagination_failure_discards_everything() {
        let transport = ScriptedTransport::new(vec![
            Ok(page(&["A", "B"], Some("X"))),
            Err(IgfError::HttpStatus {
                kind: ListKind::Followers,
                status: 429,
            }),
        ]);
        let handle = ApiBridge::spawn(Arc::new(transport));

        let err = fetch_all(&handle, "42", ListKind::Followers, &immediate(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, IgfError::HttpStatus { status: 429, .. }));
    }

    #[tokio::test]
    async fn progress_reports_running_totals() {
        let transport = ScriptedTransport::new(vec![
            Ok(page(&["A", "B"], Some("X"))),
            Ok(page(&["C"], None)),
        ]);
        let handle = ApiBridge::spawn(Arc::new(transport));

        let mut seen = Vec::new();
        fetch_all(&handle, "42", ListKind::Followers, &immediate(), |p| {
            seen.push((p.pages, p.fetched));
        })
        .await
        .unwrap();

        assert_eq!(seen, vec![(1, 2), (2, 3)]);
    }

    #[tokio::test]
    async fn page_cap_aborts_instead_of_truncating() {
        let transport = ScriptedTransport::new(vec![
            Ok(page(&["A"], Some("1"))),
            Ok(page(&["B"], Some("2"))),
            Ok(page(&["C"], Some("3"))),
        ]);
        let handle = ApiBridge::spawn(Arc::new(transport));

        let options = FetchOptions {
            page_delay: Duration::ZERO,
            max_pages: 2,
        };
        let err = fetch_all(&handle, "42", ListKind::Following, &options, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IgfError::CollectionTooLarge { pages: 2, .. }
        ));
    }
}
