//! Request bridge to the friendships API.
//!
//! Only the bridge task holds the authenticated HTTP client and session
//! headers, so every page fetch is one request/reply round trip through it:
//! callers send a [`PageQuery`] plus a `oneshot` reply slot over an `mpsc`
//! channel and await the slot. Each dispatch is serviced on its own task,
//! so concurrent requests are tracked independently and a reply channel
//! stays open until its network call resolves.

use crate::error::{IgfError, Result};
use crate::model::{ListKind, RelationshipPage};
use crate::session::CookieJar;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, COOKIE};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// App id header Instagram's own web client sends.
const IG_APP_ID: &str = "936619743392459";

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://www.instagram.com";

const REQUEST_CHANNEL_CAPACITY: usize = 16;

/// One page request: which list, whose, and where to resume.
#[derive(Debug, Clone)]
pub struct PageQuery {
    pub kind: ListKind,
    pub user_id: String,
    /// Continuation cursor from the previous page; `None` on the first call.
    pub max_id: Option<String>,
}

/// Something that can answer a single page request.
///
/// The production implementation is [`HttpTransport`]; tests substitute
/// scripted transports to drive the fetch loop without a network.
#[async_trait]
pub trait PageTransport: Send + Sync {
    async fn fetch(&self, query: &PageQuery) -> Result<RelationshipPage>;
}

/// HTTP transport that rides the exported browser session.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    cookie_header: String,
    page_size: u32,
}

impl HttpTransport {
    /// Build a transport from the session cookie jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(jar: &CookieJar, base_url: impl Into<String>, page_size: u32) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            cookie_header: jar.header(),
            page_size,
        })
    }

    fn endpoint(&self, query: &PageQuery) -> String {
        format!(
            "{}/api/v1/friendships/{}/{}/",
            self.base_url,
            query.user_id,
            query.kind.as_path()
        )
    }
}

#[async_trait]
impl PageTransport for HttpTransport {
    async fn fetch(&self, query: &PageQuery) -> Result<RelationshipPage> {
        let mut request = self
            .client
            .get(self.endpoint(query))
            .query(&[("count", self.page_size.to_string())])
            .header("x-ig-app-id", IG_APP_ID)
            .header("x-requested-with", "XMLHttpRequest")
            .header(ACCEPT, "application/json")
            .header(COOKIE, &self.cookie_header);

        if let Some(max_id) = &query.max_id {
            request = request.query(&[("max_id", max_id)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IgfError::page_fetch(query.kind, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IgfError::HttpStatus {
                kind: query.kind,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| IgfError::page_fetch(query.kind, e.to_string()))?;

        // Missing optional fields are tolerated by the page model; only a
        // body that is not the page shape at all fails here.
        serde_json::from_str(&body).map_err(|e| IgfError::malformed(e.to_string()))
    }
}

struct BridgeRequest {
    query: PageQuery,
    reply: oneshot::Sender<Result<RelationshipPage>>,
}

/// Cheap cloneable handle for dispatching page requests to the bridge.
#[derive(Clone)]
pub struct BridgeHandle {
    tx: mpsc::Sender<BridgeRequest>,
}

impl BridgeHandle {
    /// One page-request round trip through the bridge.
    ///
    /// # Errors
    ///
    /// Returns [`IgfError::BridgeClosed`] if the bridge task is gone, or the
    /// transport's error for the request itself.
    pub async fn fetch_page(&self, query: PageQuery) -> Result<RelationshipPage> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(BridgeRequest {
                query,
                reply: reply_tx,
            })
            .await
            .map_err(|_| IgfError::BridgeClosed)?;
        reply_rx.await.map_err(|_| IgfError::BridgeClosed)?
    }
}

/// The bridge task owning the transport.
pub struct ApiBridge;

impl ApiBridge {
    /// Spawn the bridge loop onto the current runtime.
    ///
    /// The loop runs until every handle is dropped.
    #[must_use]
    pub fn spawn(transport: Arc<dyn PageTransport>) -> BridgeHandle {
        let (tx, rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
        tokio::spawn(run_bridge_loop(transport, rx));
        BridgeHandle { tx }
    }
}

async fn run_bridge_loop(
    transport: Arc<dyn PageTransport>,
    mut rx: mpsc::Receiver<BridgeRequest>,
) {
    while let Some(request) = rx.recv().await {
        let transport = Arc::clone(&transport);
        tokio::spawn(async move {
            let BridgeRequest { query, reply } = request;
            debug!(kind = %query.kind, max_id = ?query.max_id, "dispatching page request");
            let result = transport.fetch(&query).await;
            if reply.send(result).is_err() {
                debug!("page request abandoned before the response arrived");
            }
        });
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{PageQuery, PageTransport};
    use crate::error::{IgfError, Result};
    use async_trait::async_trait;
    use crate::model::{Account, RelationshipPage};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    pub fn account(pk: &str) -> Account {
        Account {
            pk: pk.to_string(),
            username: format!("user{pk}"),
            full_name: None,
            profile_pic_url: None,
            is_verified: None,
        }
    }

    pub fn page(pks: &[&str], next_max_id: Option<&str>) -> RelationshipPage {
        RelationshipPage {
            users: pks.iter().map(|pk| account(pk)).collect(),
            next_max_id: next_max_id.map(str::to_string),
            status: Some("ok".to_string()),
        }
    }

    /// Transport that replays a scripted sequence of page results.
    pub struct ScriptedTransport {
        script: Mutex<VecDeque<Result<RelationshipPage>>>,
    }

    impl ScriptedTransport {
        pub fn new(script: Vec<Result<RelationshipPage>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
            }
        }
    }

    #[async_trait]
    impl PageTransport for ScriptedTransport {
        async fn fetch(&self, query: &PageQuery) -> Result<RelationshipPage> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(IgfError::page_fetch(query.kind, "script exhausted")))
        }
    }

    /// Transport that echoes the request cursor back as the only account,
    /// for checking that concurrent dispatches are not conflated.
    pub struct EchoTransport;

    #[async_trait]
    impl PageTransport for EchoTransport {
        async fn fetch(&self, query: &PageQuery) -> Result<RelationshipPage> {
            let marker = query.max_id.clone().unwrap_or_else(|| "first".to_string());
            Ok(page(&[marker.as_str()], None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{EchoTransport, ScriptedTransport, page};
    use super::*;

    fn query(max_id: Option<&str>) -> PageQuery {
        PageQuery {
            kind: ListKind::Followers,
            user_id: "42".to_string(),
            max_id: max_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn round_trip_through_the_bridge() {
        let transport = ScriptedTransport::new(vec![Ok(page(&["1", "2"], Some("X")))]);
        let handle = ApiBridge::spawn(Arc::new(transport));

        let result = handle.fetch_page(query(None)).await.unwrap();
        assert_eq!(result.users.len(), 2);
        assert_eq!(result.next_max_id.as_deref(), Some("X"));
    }

    #[tokio::test]
    async fn transport_error_reaches_the_caller() {
        let transport = ScriptedTransport::new(vec![Err(IgfError::HttpStatus {
            kind: ListKind::Followers,
            status: 429,
        })]);
        let handle = ApiBridge::spawn(Arc::new(transport));

        let err = handle.fetch_page(query(None)).await.unwrap_err();
        assert!(matches!(err, IgfError::HttpStatus { status: 429, .. }));
    }

    #[tokio::test]
    async fn concurrent_dispatches_are_not_conflated() {
        let handle = ApiBridge::spawn(Arc::new(EchoTransport));

        let a = handle.fetch_page(query(Some("cursor-a")));
        let b = handle.fetch_page(query(Some("cursor-b")));
        let (a, b) = tokio::join!(a, b);

        assert_eq!(a.unwrap().users[0].pk, "cursor-a");
        assert_eq!(b.unwrap().users[0].pk, "cursor-b");
    }

    #[tokio::test]
    async fn closed_bridge_surfaces_as_bridge_error() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = BridgeHandle { tx };

        let err = handle.fetch_page(query(None)).await.unwrap_err();
        assert!(matches!(err, IgfError::BridgeClosed));
    }

    #[test]
    fn endpoint_includes_user_and_kind() {
        let transport =
            HttpTransport::new(&CookieJar::parse("ds_user_id=42"), DEFAULT_BASE_URL, 50)
                .unwrap();
        let url = transport.endpoint(&query(None));
        assert_eq!(
            url,
            "https://www.instagram.com/api/v1/friendships/42/followers/"
        );
    }
}
