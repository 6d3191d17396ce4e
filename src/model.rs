//! Data models for Instagram relationship data.
//!
//! These structures mirror the wire format of the friendships API, with
//! permissive deserialization: absent optional fields become empty/`None`
//! instead of failing the whole payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An Instagram account as returned by the friendships endpoints.
///
/// `pk` is the stable identity key. Two `Account` values with the same `pk`
/// are the same entity even when the display fields drift, so equality and
/// hashing are defined on `pk` alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub pk: String,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
    #[serde(default)]
    pub is_verified: Option<bool>,
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.pk == other.pk
    }
}

impl Eq for Account {}

impl std::hash::Hash for Account {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.pk.hash(state);
    }
}

impl Account {
    /// Profile URL for this account.
    #[must_use]
    pub fn profile_url(&self) -> String {
        format!("https://www.instagram.com/{}/", self.username)
    }
}

/// One page of a paginated relationship list.
///
/// An absent `next_max_id` signals the end of the collection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelationshipPage {
    #[serde(default)]
    pub users: Vec<Account>,
    #[serde(default)]
    pub next_max_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Which relationship direction a collection tracks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    /// Accounts that follow the subject.
    Followers,
    /// Accounts the subject follows.
    Following,
}

impl ListKind {
    /// Path segment used by the friendships endpoint.
    #[must_use]
    pub const fn as_path(self) -> &'static str {
        match self {
            Self::Followers => "followers",
            Self::Following => "following",
        }
    }
}

impl std::fmt::Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_path())
    }
}

/// A fully materialized relationship list for one account and kind.
///
/// Accounts are kept in page-arrival order; no deduplication is applied
/// beyond what the identity key provides on lookup.
#[derive(Debug, Clone)]
pub struct Collection {
    pub owner_id: String,
    pub kind: ListKind,
    pub accounts: Vec<Account>,
}

impl Collection {
    #[must_use]
    pub const fn new(owner_id: String, kind: ListKind, accounts: Vec<Account>) -> Self {
        Self {
            owner_id,
            kind,
            accounts,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// Advisory progress update emitted after each fetched page.
///
/// Telemetry only; not part of the fetch correctness contract.
#[derive(Debug, Clone, Copy)]
pub struct FetchProgress {
    pub kind: ListKind,
    /// Pages fetched so far in this run.
    pub pages: usize,
    /// Accounts accumulated so far in this run.
    pub fetched: usize,
}

/// The outcome of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub generated_at: DateTime<Utc>,
    pub user_id: String,
    pub followers_count: usize,
    pub following_count: usize,
    /// Accounts in `following` whose identity is absent from `followers`,
    /// in following's original order.
    pub not_following_back: Vec<Account>,
}

/// The session identity of the authenticated Instagram user.
///
/// Discovered passively from the browser session; never created by igf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: String,
}
