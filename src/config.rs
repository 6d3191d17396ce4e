//! Configuration system for igf.
//!
//! Provides layered configuration from multiple sources:
//!
//! 1. **Compiled defaults** - Sensible defaults built into the binary
//! 2. **User config file** - `~/.config/igf/config.toml`
//! 3. **Environment variables** - `IGF_*` prefix
//! 4. **CLI arguments** - Highest priority, always wins
//!
//! # Example Configuration File
//!
//! ```toml
//! [paths]
//! db = "~/.local/share/igf/igf.db"
//! cookies = "~/.local/share/igf/cookies.txt"
//!
//! [api]
//! page_size = 50
//! page_delay_ms = 500
//! max_pages = 0
//!
//! [output]
//! format = "text"
//! colors = true
//! ```

use crate::fetch::FetchOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Main configuration structure for igf.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path-related configuration.
    pub paths: PathsConfig,
    /// Friendships API behavior configuration.
    pub api: ApiConfig,
    /// Output formatting configuration.
    pub output: OutputConfig,
}

/// Path configuration for the database and cookie source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Path to the `SQLite` database file.
    /// Environment variable: `IGF_DB`
    pub db: Option<PathBuf>,

    /// Path to the exported browser cookie file.
    /// Environment variable: `IGF_COOKIES`
    pub cookies: Option<PathBuf>,
}

/// Friendships API behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API host to request against.
    pub base_url: String,

    /// Entities requested per page.
    pub page_size: u32,

    /// Pause between page requests, in milliseconds.
    /// Environment variable: `IGF_PAGE_DELAY_MS`
    pub page_delay_ms: u64,

    /// Safety cap on pages per list (0 = unlimited).
    /// Environment variable: `IGF_MAX_PAGES`
    pub max_pages: usize,
}

/// Output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format: text, json, json-pretty, compact, csv.
    pub format: String,

    /// Enable colored output.
    pub colors: bool,

    /// Suppress non-essential output (progress bars, etc.).
    pub quiet: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: crate::bridge::DEFAULT_BASE_URL.to_string(),
            page_size: 50,
            page_delay_ms: 500,
            max_pages: 0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            colors: true,
            quiet: false,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. User config file (~/.config/igf/config.toml)
    /// 3. Compiled defaults
    pub fn load() -> Self {
        let mut config = Self::default();

        // Load from user config file
        if let Some(user_config) = Self::load_user_config() {
            config.merge(user_config);
        }

        // Override from environment variables
        config.apply_env_overrides();

        debug!("Configuration loaded: {:?}", config);
        config
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &PathBuf) -> Option<Self> {
        if !path.exists() {
            debug!("Config file not found: {}", path.display());
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    info!("Loaded config from: {}", path.display());
                    Some(config)
                }
                Err(e) => {
                    warn!("Failed to parse config file {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read config file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Load the user configuration file from the standard location.
    fn load_user_config() -> Option<Self> {
        let config_path = Self::user_config_path()?;
        Self::load_from_file(&config_path)
    }

    /// Get the path to the user configuration file.
    #[must_use]
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("igf").join("config.toml"))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // Path overrides
        if let Ok(db) = std::env::var("IGF_DB") {
            self.paths.db = Some(PathBuf::from(db));
        }
        if let Ok(cookies) = std::env::var("IGF_COOKIES") {
            self.paths.cookies = Some(PathBuf::from(cookies));
        }

        // API overrides
        if let Ok(base_url) = std::env::var("IGF_BASE_URL") {
            self.api.base_url = base_url;
        }
        if let Ok(delay) = std::env::var("IGF_PAGE_DELAY_MS") {
            if let Ok(n) = delay.parse() {
                self.api.page_delay_ms = n;
            }
        }
        if let Ok(max_pages) = std::env::var("IGF_MAX_PAGES") {
            if let Ok(n) = max_pages.parse() {
                self.api.max_pages = n;
            }
        }

        // Output overrides
        if let Ok(format) = std::env::var("IGF_FORMAT") {
            self.output.format = format;
        }
        if std::env::var("IGF_NO_COLOR").is_ok() || std::env::var("NO_COLOR").is_ok() {
            self.output.colors = false;
        }
        if std::env::var("IGF_QUIET").is_ok() {
            self.output.quiet = true;
        }
    }

    /// Merge another config into this one (other takes precedence).
    fn merge(&mut self, other: Self) {
        // Paths
        if other.paths.db.is_some() {
            self.paths.db = other.paths.db;
        }
        if other.paths.cookies.is_some() {
            self.paths.cookies = other.paths.cookies;
        }

        // API (always override if present in other)
        self.api.base_url = other.api.base_url;
        self.api.page_size = other.api.page_size;
        self.api.page_delay_ms = other.api.page_delay_ms;
        self.api.max_pages = other.api.max_pages;

        // Output
        self.output.format = other.output.format;
        self.output.colors = other.output.colors;
        self.output.quiet = other.output.quiet;
    }

    /// Get the database path, using defaults if not configured.
    pub fn db_path(&self) -> PathBuf {
        self.paths.db.clone().unwrap_or_else(crate::default_db_path)
    }

    /// Get the cookie source path, using defaults if not configured.
    pub fn cookies_path(&self) -> PathBuf {
        self.paths
            .cookies
            .clone()
            .unwrap_or_else(crate::default_cookies_path)
    }

    /// Fetch-loop options derived from the API section.
    #[must_use]
    pub const fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            page_delay: Duration::from_millis(self.api.page_delay_ms),
            max_pages: self.api.max_pages,
        }
    }

    /// Save the current configuration to the user config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined,
    /// the parent directory cannot be created, or the file cannot be written.
    pub fn save(&self) -> std::io::Result<()> {
        let config_path = Self::user_config_path().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            )
        })?;

        // Create parent directory if needed
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        std::fs::write(&config_path, content)?;
        info!("Saved config to: {}", config_path.display());
        Ok(())
    }

    /// Generate a default configuration file content.
    #[must_use]
    pub fn default_config_content() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.page_size, 50);
        assert_eq!(config.api.page_delay_ms, 500);
        assert_eq!(config.api.max_pages, 0);
        assert!(config.output.colors);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.api.page_delay_ms, parsed.api.page_delay_ms);
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        let mut other = Config::default();
        other.api.page_delay_ms = 1500;
        other.paths.db = Some(PathBuf::from("/custom/path"));

        base.merge(other);

        assert_eq!(base.api.page_delay_ms, 1500);
        assert_eq!(base.paths.db, Some(PathBuf::from("/custom/path")));
    }

    #[test]
    fn test_fetch_options_conversion() {
        let mut config = Config::default();
        config.api.page_delay_ms = 250;
        config.api.max_pages = 10;

        let options = config.fetch_options();
        assert_eq!(options.page_delay, Duration::from_millis(250));
        assert_eq!(options.max_pages, 10);
    }

    #[test]
    fn test_default_config_content() {
        let content = Config::default_config_content();
        assert!(content.contains("[paths]"));
        assert!(content.contains("[api]"));
        assert!(content.contains("[output]"));
    }
}
