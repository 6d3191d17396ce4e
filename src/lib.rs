//! igf - Instagram follow-back checker
//!
//! This library provides the core functionality for fetching the followers
//! and following lists of an authenticated Instagram session and computing
//! who doesn't follow back.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface definitions
//! - [`error`] - Custom error types with rich context
//! - [`model`] - Data models for relationship data
//! - [`session`] - Session discovery from exported browser cookies
//! - [`bridge`] - Request bridge owning the authenticated HTTP transport
//! - [`fetch`] - Cursor-driven pagination of one relationship list
//! - [`reconcile`] - Set difference of the two lists by identity
//! - [`sink`] - Result persistence and presentation
//! - [`storage`] - `SQLite` key/value storage layer

pub mod analyze;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod model;
pub mod reconcile;
pub mod session;
pub mod sink;
pub mod storage;

pub use analyze::Analyzer;
pub use bridge::{ApiBridge, BridgeHandle, HttpTransport, PageQuery, PageTransport};
pub use cli::*;
pub use error::{IgfError, Result, ResultExt};
pub use fetch::{FetchOptions, fetch_all};
pub use model::*;
pub use reconcile::reconcile;
pub use session::{CookieJar, SessionResolver};
pub use sink::ResultSink;
pub use storage::Storage;

use chrono::{DateTime, Datelike, Utc};

/// Default database filename
pub const DEFAULT_DB_NAME: &str = "igf.db";

/// Default cookie export filename
pub const DEFAULT_COOKIES_NAME: &str = "cookies.txt";

/// Get the default data directory for igf
#[must_use]
pub fn default_data_dir() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("igf")
}

/// Get the default database path
#[must_use]
pub fn default_db_path() -> std::path::PathBuf {
    default_data_dir().join(DEFAULT_DB_NAME)
}

/// Get the default cookie export path
#[must_use]
pub fn default_cookies_path() -> std::path::PathBuf {
    default_data_dir().join(DEFAULT_COOKIES_NAME)
}

/// Format an unsigned integer with thousands separators.
#[must_use]
pub fn format_number_u64(value: u64) -> String {
    let mut out = String::with_capacity(24);

    for (idx, ch) in value.to_string().chars().rev().enumerate() {
        if idx > 0 && idx % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out.chars().rev().collect()
}

/// Format a usize with thousands separators.
#[must_use]
pub fn format_number_usize(value: usize) -> String {
    format_number_u64(u64::try_from(value).unwrap_or(u64::MAX))
}

/// Format a datetime as a human-friendly relative string.
///
/// Uses smart thresholds for readability:
/// - < 1 minute: "just now"
/// - < 1 hour: "Nm ago"
/// - < 24 hours: "Nh ago"
/// - < 7 days: "Nd ago"
/// - Same calendar year: "Mon D"
/// - Different year: "Mon D, YYYY"
#[must_use]
pub fn format_relative_date(dt: DateTime<Utc>) -> String {
    format_relative_date_with_base(dt, Utc::now())
}

/// Format a datetime relative to a fixed base time (useful for tests).
#[must_use]
pub fn format_relative_date_with_base(dt: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(dt);

    // Handle future dates (shouldn't happen, but be safe)
    if duration.num_seconds() < 0 {
        return dt.format("%b %d, %Y").to_string();
    }

    let seconds = duration.num_seconds();
    let minutes = duration.num_minutes();
    let hours = duration.num_hours();
    let days = duration.num_days();

    if seconds < 60 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else if dt.year() == now.year() {
        // Same calendar year: "Jan 15"
        dt.format("%b %d").to_string()
    } else {
        // Different year: "Jan 15, 2023"
        dt.format("%b %d, %Y").to_string()
    }
}

/// Format a long identifier as a short token (e.g., 1234...6789).
#[must_use]
pub fn format_short_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= 10 {
        return id.to_string();
    }
    let start: String = chars.iter().take(4).collect();
    let end: String = chars.iter().rev().take(4).rev().collect();
    format!("{start}...{end}")
}
