//! Configuration file parser for ~/.config/reelfeed/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos. Out-of-range numbers are clamped with a warning;
//! unparseable names (feed kind, category, base URL) are errors.
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::cache::CachePolicy;
use crate::controller::ControllerOptions;
use crate::feed::{Category, FeedKind};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Settings read from `config.toml`. Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the media backend (`/reels`, `/memes`, `/profileget`).
    pub api_base_url: String,

    /// "reels" (videos) or "memes" (images).
    pub feed_kind: String,

    /// Category selected at startup.
    pub default_category: String,

    /// Age in seconds after which a cached listing is refreshed in the
    /// background.
    pub stale_after_secs: u64,

    /// Age in seconds after which a cached listing is discarded.
    pub evict_after_secs: u64,

    pub max_cached_categories: usize,

    /// Fraction of an item that must be on screen for it to become active.
    pub visibility_threshold: f32,

    pub request_timeout_secs: u64,

    /// Columns in the grid view.
    pub grid_columns: usize,

    /// Start every rendered video silently instead of only the active one.
    pub preload_playback: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:4000".to_string(),
            feed_kind: "reels".to_string(),
            default_category: "All".to_string(),
            stale_after_secs: 300,
            evict_after_secs: 600,
            max_cached_categories: 32,
            visibility_threshold: 0.5,
            request_timeout_secs: 30,
            grid_columns: 3,
            preload_playback: true,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 10] = [
        "api_base_url",
        "feed_kind",
        "default_category",
        "stale_after_secs",
        "evict_after_secs",
        "max_cached_categories",
        "visibility_threshold",
        "request_timeout_secs",
        "grid_columns",
        "preload_playback",
    ];

    /// Read and parse the config file at `path`.
    ///
    /// A missing or blank file yields the defaults. Files over 1 MB are
    /// rejected without being read in full.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut content = String::new();
        file.take(Self::MAX_FILE_SIZE + 1)
            .read_to_string(&mut content)?;
        if content.len() as u64 > Self::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge(format!(
                "{} exceeds {} bytes",
                path.display(),
                Self::MAX_FILE_SIZE
            )));
        }

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Blank config file, using defaults");
            return Ok(Self::default());
        }

        let config = Self::parse(&content)?;
        tracing::info!(
            path = %path.display(),
            base_url = %config.api_base_url,
            kind = %config.feed_kind,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse and normalize TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        // Typos otherwise vanish silently under serde(default)
        if let Ok(table) = content.parse::<toml::Table>() {
            table
                .keys()
                .filter(|key| !Self::KNOWN_KEYS.contains(&key.as_str()))
                .for_each(|key| tracing::warn!(key = %key, "Ignoring unknown config key"));
        }

        let mut config: Config = toml::from_str(content)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Clamp numeric settings into their usable ranges.
    fn normalize(&mut self) {
        if self.stale_after_secs == 0 {
            tracing::warn!("stale_after_secs must be positive, using 1");
            self.stale_after_secs = 1;
        }
        if self.evict_after_secs < self.stale_after_secs {
            tracing::warn!(
                evict = self.evict_after_secs,
                stale = self.stale_after_secs,
                "evict_after_secs below stale_after_secs, raising it"
            );
            self.evict_after_secs = self.stale_after_secs;
        }
        if self.max_cached_categories == 0 {
            tracing::warn!("max_cached_categories must be positive, using 1");
            self.max_cached_categories = 1;
        }
        let threshold = if self.visibility_threshold.is_nan() {
            0.5
        } else {
            self.visibility_threshold.clamp(0.01, 1.0)
        };
        if threshold != self.visibility_threshold {
            tracing::warn!(
                value = self.visibility_threshold,
                using = threshold,
                "visibility_threshold out of range"
            );
            self.visibility_threshold = threshold;
        }
        self.request_timeout_secs = self.request_timeout_secs.clamp(1, 300);
        self.grid_columns = self.grid_columns.clamp(1, 8);
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.feed_kind()?;
        self.default_category()?;
        match url::Url::parse(&self.api_base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
            Ok(url) => Err(ConfigError::Invalid {
                key: "api_base_url",
                reason: format!("unsupported scheme {}", url.scheme()),
            }),
            Err(e) => Err(ConfigError::Invalid {
                key: "api_base_url",
                reason: e.to_string(),
            }),
        }
    }

    pub fn feed_kind(&self) -> Result<FeedKind, ConfigError> {
        self.feed_kind
            .parse::<FeedKind>()
            .map_err(|reason| ConfigError::Invalid {
                key: "feed_kind",
                reason,
            })
    }

    pub fn default_category(&self) -> Result<Category, ConfigError> {
        self.default_category
            .parse::<Category>()
            .map_err(|e| ConfigError::Invalid {
                key: "default_category",
                reason: e.to_string(),
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            stale_after: Duration::from_secs(self.stale_after_secs),
            evict_after: Duration::from_secs(self.evict_after_secs),
            max_categories: self.max_cached_categories,
        }
    }

    pub fn controller_options(&self) -> Result<ControllerOptions, ConfigError> {
        Ok(ControllerOptions {
            kind: self.feed_kind()?,
            cache: self.cache_policy(),
            visibility_threshold: self.visibility_threshold,
            preload: self.preload_playback,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
