//! One full analysis run: both relationship lists, reconciled.

use crate::bridge::BridgeHandle;
use crate::error::{IgfError, Result};
use crate::fetch::{FetchOptions, fetch_all};
use crate::model::{AnalysisSnapshot, FetchProgress, ListKind};
use crate::reconcile::reconcile;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;

/// Drives the followers/following fetches and the reconciliation.
///
/// At most one run may be in flight at a time; a second concurrent call is
/// rejected with [`IgfError::AnalysisInProgress`] rather than queued or
/// cancelled into.
pub struct Analyzer {
    bridge: BridgeHandle,
    options: FetchOptions,
    in_flight: Mutex<()>,
}

impl Analyzer {
    #[must_use]
    pub fn new(bridge: BridgeHandle, options: FetchOptions) -> Self {
        Self {
            bridge,
            options,
            in_flight: Mutex::new(()),
        }
    }

    /// Run one analysis for `user_id`.
    ///
    /// Followers are fetched first, then following, each to completion; the
    /// two loops share no state. A failure in either fetch aborts the run
    /// and discards everything accumulated so far.
    ///
    /// # Errors
    ///
    /// Propagates the first fetch failure, or returns
    /// [`IgfError::AnalysisInProgress`] if a run is already active.
    pub async fn run(
        &self,
        user_id: &str,
        mut on_progress: impl FnMut(FetchProgress),
    ) -> Result<AnalysisSnapshot> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| IgfError::AnalysisInProgress)?;

        let followers = fetch_all(
            &self.bridge,
            user_id,
            ListKind::Followers,
            &self.options,
            &mut on_progress,
        )
        .await?;
        let following = fetch_all(
            &self.bridge,
            user_id,
            ListKind::Following,
            &self.options,
            &mut on_progress,
        )
        .await?;

        let not_following_back = reconcile(&followers, &following);
        info!(
            followers = followers.len(),
            following = following.len(),
            not_following_back = not_following_back.len(),
            "analysis complete"
        );

        Ok(AnalysisSnapshot {
            generated_at: Utc::now(),
            user_id: user_id.to_string(),
            followers_count: followers.len(),
            following_count: following.len(),
            not_following_back,
        })
    }
}
