//! Scrape settings.
//!
//! Sources, lowest to highest precedence: built-in defaults, a TOML or JSON
//! settings file, `TOURPULSE_*` environment variables, then CLI flags (applied
//! by the command layer).

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::browser::BrowserEngineConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Wait and settle budgets, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    /// Wait for the listing page body after navigation.
    #[serde(default = "default_page_load_ms")]
    pub page_load_ms: u64,
    /// Settle after the listing page body appears.
    #[serde(default = "default_page_settle_ms")]
    pub page_settle_ms: u64,
    /// Wait for a listing row to appear.
    #[serde(default = "default_element_wait_ms")]
    pub element_wait_ms: u64,
    /// Interval between polls of a bounded wait.
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
    /// Settle after a detail page opens.
    #[serde(default = "default_detail_settle_ms")]
    pub detail_settle_ms: u64,
    /// Settle before extracting reviews on the detail page.
    #[serde(default = "default_review_settle_ms")]
    pub review_settle_ms: u64,
    /// Wait for a clickable reviews tab or "load more" control.
    #[serde(default = "default_control_wait_ms")]
    pub control_wait_ms: u64,
    #[serde(default = "default_tab_settle_ms")]
    pub tab_settle_ms: u64,
    #[serde(default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,
    #[serde(default = "default_load_more_settle_ms")]
    pub load_more_settle_ms: u64,
    /// Pause granted to a human solving a challenge in an interactive session.
    #[serde(default = "default_captcha_pause_ms")]
    pub captcha_pause_ms: u64,
    /// Delay before retrying a failed detail navigation.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_page_load_ms() -> u64 {
    20_000
}

fn default_page_settle_ms() -> u64 {
    10_000
}

fn default_element_wait_ms() -> u64 {
    20_000
}

fn default_poll_ms() -> u64 {
    500
}

fn default_detail_settle_ms() -> u64 {
    10_000
}

fn default_review_settle_ms() -> u64 {
    7_000
}

fn default_control_wait_ms() -> u64 {
    5_000
}

fn default_tab_settle_ms() -> u64 {
    5_000
}

fn default_scroll_settle_ms() -> u64 {
    3_000
}

fn default_load_more_settle_ms() -> u64 {
    5_000
}

fn default_captcha_pause_ms() -> u64 {
    30_000
}

fn default_retry_delay_ms() -> u64 {
    3_000
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            page_load_ms: default_page_load_ms(),
            page_settle_ms: default_page_settle_ms(),
            element_wait_ms: default_element_wait_ms(),
            poll_ms: default_poll_ms(),
            detail_settle_ms: default_detail_settle_ms(),
            review_settle_ms: default_review_settle_ms(),
            control_wait_ms: default_control_wait_ms(),
            tab_settle_ms: default_tab_settle_ms(),
            scroll_settle_ms: default_scroll_settle_ms(),
            load_more_settle_ms: default_load_more_settle_ms(),
            captcha_pause_ms: default_captcha_pause_ms(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Timings {
    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }

    pub fn element_wait(&self) -> Duration {
        Duration::from_millis(self.element_wait_ms)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }

    pub fn detail_settle(&self) -> Duration {
        Duration::from_millis(self.detail_settle_ms)
    }

    pub fn review_settle(&self) -> Duration {
        Duration::from_millis(self.review_settle_ms)
    }

    pub fn control_wait(&self) -> Duration {
        Duration::from_millis(self.control_wait_ms)
    }

    pub fn tab_settle(&self) -> Duration {
        Duration::from_millis(self.tab_settle_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn load_more_settle(&self) -> Duration {
        Duration::from_millis(self.load_more_settle_ms)
    }

    pub fn captcha_pause(&self) -> Duration {
        Duration::from_millis(self.captcha_pause_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// All budgets zeroed, for saved pages where nothing loads lazily.
    pub fn instant() -> Self {
        Self {
            page_load_ms: 0,
            page_settle_ms: 0,
            element_wait_ms: 0,
            poll_ms: 1,
            detail_settle_ms: 0,
            review_settle_ms: 0,
            control_wait_ms: 0,
            tab_settle_ms: 0,
            scroll_settle_ms: 0,
            load_more_settle_ms: 0,
            captcha_pause_ms: 0,
            retry_delay_ms: 0,
        }
    }
}

/// Harvesting limits, run defaults and timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeSettings {
    /// Listing rows to visit.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    /// Pause between rows, in seconds.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: f64,
    /// Visit detail pages when a row shows too few reviews.
    #[serde(default = "default_true")]
    pub harvest_details: bool,
    /// Excerpts kept per hotel (N).
    #[serde(default = "default_target_reviews")]
    pub target_reviews: usize,
    /// Excerpts must be strictly longer than this many characters.
    #[serde(default = "default_min_excerpt_len")]
    pub min_excerpt_len: usize,
    /// Highlights must be strictly shorter than this many characters.
    #[serde(default = "default_max_highlight_len")]
    pub max_highlight_len: usize,
    #[serde(default = "default_max_highlights")]
    pub max_highlights: usize,
    #[serde(default = "default_detail_attempts")]
    pub detail_attempts: usize,
    #[serde(default = "default_load_more_attempts")]
    pub load_more_attempts: usize,
    #[serde(default = "default_scroll_passes")]
    pub scroll_passes: usize,
    #[serde(default)]
    pub timings: Timings,
    #[serde(default)]
    pub browser: BrowserEngineConfig,
}

fn default_max_rows() -> usize {
    50
}

fn default_delay_secs() -> f64 {
    3.0
}

fn default_true() -> bool {
    true
}

fn default_target_reviews() -> usize {
    5
}

fn default_min_excerpt_len() -> usize {
    20
}

fn default_max_highlight_len() -> usize {
    50
}

fn default_max_highlights() -> usize {
    5
}

fn default_detail_attempts() -> usize {
    3
}

fn default_load_more_attempts() -> usize {
    5
}

fn default_scroll_passes() -> usize {
    5
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            delay_secs: default_delay_secs(),
            harvest_details: default_true(),
            target_reviews: default_target_reviews(),
            min_excerpt_len: default_min_excerpt_len(),
            max_highlight_len: default_max_highlight_len(),
            max_highlights: default_max_highlights(),
            detail_attempts: default_detail_attempts(),
            load_more_attempts: default_load_more_attempts(),
            scroll_passes: default_scroll_passes(),
            timings: Timings::default(),
            browser: BrowserEngineConfig::default(),
        }
    }
}

impl ScrapeSettings {
    /// Load settings from a file; the format follows the extension (TOML unless `.json`).
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        match ext {
            "json" => serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            }),
            _ => toml::from_str(&contents).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Apply `TOURPULSE_*` environment overrides (and the browser's own).
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(rows) = env_parse("TOURPULSE_MAX_ROWS") {
            self.max_rows = rows;
        }
        if let Some(delay) = env_parse("TOURPULSE_DELAY") {
            self.delay_secs = delay;
        }
        if let Some(target) = env_parse("TOURPULSE_TARGET_REVIEWS") {
            self.target_reviews = target;
        }
        if let Ok(value) = env::var("TOURPULSE_HARVEST_DETAILS") {
            match value.to_lowercase().as_str() {
                "0" | "false" | "no" => self.harvest_details = false,
                "1" | "true" | "yes" => self.harvest_details = true,
                _ => warn!("Ignoring TOURPULSE_HARVEST_DETAILS={}", value),
            }
        }
        self.browser = self.browser.with_env_overrides();
        self
    }

    /// Inter-row pause; negative or non-finite values mean no pause.
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_secs).unwrap_or(Duration::ZERO)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let value = env::var(name).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring unparseable {}={}", name, value);
            None
        }
    }
}
