//! Session discovery from an exported browser cookie jar.
//!
//! igf never authenticates on its own. The authenticated Instagram session is
//! read passively from cookies the user exports from their browser, exactly
//! as the site itself exposes them: `ds_user_id` carries the session user id,
//! and the full jar rides along as the `Cookie` header on API requests.

use crate::error::{IgfError, Result};
use crate::model::SessionIdentity;
use crate::storage::Storage;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Cookie that carries the session-scoped user id.
pub const SESSION_COOKIE: &str = "ds_user_id";

/// How long to wait before the second presence check.
const DEFAULT_RECHECK_DELAY: Duration = Duration::from_secs(1);

/// An ordered set of cookies parsed from an export.
///
/// Accepts both Netscape `cookies.txt` exports (tab-separated, as written by
/// curl and most browser extensions) and a raw `Cookie:` header string.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<(String, String)>,
}

impl CookieJar {
    /// Parse cookies from export text, auto-detecting the format.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        if text.contains('\t') {
            Self::parse_netscape(text)
        } else {
            Self::parse_header(text)
        }
    }

    /// Load and parse a cookie file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| IgfError::CookieSource {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    fn parse_netscape(text: &str) -> Self {
        let mut cookies = Vec::new();
        for line in text.lines() {
            // curl marks HttpOnly cookies with a pseudo-comment prefix.
            let line = line.strip_prefix("#HttpOnly_").unwrap_or(line).trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 7 {
                continue;
            }
            cookies.push((fields[5].to_string(), fields[6].to_string()));
        }
        Self { cookies }
    }

    fn parse_header(text: &str) -> Self {
        let cookies = text
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some((name.to_string(), value.trim().to_string()))
            })
            .collect();
        Self { cookies }
    }

    /// Look up a cookie by name. The last occurrence wins.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Render the jar as a `Cookie` header value.
    #[must_use]
    pub fn header(&self) -> String {
        self.cookies
            .iter()
            .map(|(n, v)| format!("{n}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// Discovers the session identity and publishes it to shared storage.
pub struct SessionResolver<'a> {
    storage: &'a Storage,
    source: PathBuf,
    recheck_delay: Duration,
}

impl<'a> SessionResolver<'a> {
    #[must_use]
    pub fn new(storage: &'a Storage, source: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            source: source.into(),
            recheck_delay: DEFAULT_RECHECK_DELAY,
        }
    }

    /// Override the delay before the second presence check.
    #[must_use]
    pub const fn with_recheck_delay(mut self, delay: Duration) -> Self {
        self.recheck_delay = delay;
        self
    }

    /// Resolve the session identity from the cookie source.
    ///
    /// An absent identity is an expected outcome, not an error: the user may
    /// not be logged in, or the export may not have landed yet. The presence
    /// check runs once immediately and once more after a short delay to
    /// accommodate a cookie file that is still being written.
    ///
    /// On success the user id is also published to storage so other surfaces
    /// can pick it up without re-resolving; a failed publish is logged and
    /// swallowed because the in-memory identity is still usable.
    pub async fn resolve(&self) -> Option<SessionIdentity> {
        if let Some(identity) = self.probe() {
            return Some(identity);
        }
        tokio::time::sleep(self.recheck_delay).await;
        self.probe()
    }

    fn probe(&self) -> Option<SessionIdentity> {
        let jar = match CookieJar::load(&self.source) {
            Ok(jar) => jar,
            Err(e) => {
                debug!("Cookie source not readable: {e}");
                return None;
            }
        };

        let user_id = jar.get(SESSION_COOKIE)?.to_string();
        if user_id.is_empty() {
            return None;
        }

        if let Err(e) = self.storage.set_user_id(&user_id) {
            warn!("Failed to publish session user id to storage: {e}");
        }

        Some(SessionIdentity { user_id })
    }
}
