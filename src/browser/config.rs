//! Browser engine configuration.

use std::env;

use serde::{Deserialize, Serialize};

/// Chromium launch/connect configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserEngineConfig {
    /// Run in headless mode (default: true).
    /// Headless sessions cannot solve challenges, so they are non-interactive.
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    #[serde(default)]
    pub proxy: Option<String>,

    /// CDP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Window size passed to Chrome.
    #[serde(default = "default_window_size")]
    pub window_size: (u32, u32),

    /// User agent override applied to every opened page.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools WebSocket URL (e.g., "ws://localhost:9222/devtools/browser/...").
    /// If set, connects to an existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,
}

pub fn default_headless() -> bool {
    true
}

pub fn default_timeout() -> u64 {
    30
}

fn default_window_size() -> (u32, u32) {
    (1920, 1080)
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36".to_string()
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            proxy: None,
            timeout: default_timeout(),
            window_size: default_window_size(),
            user_agent: default_user_agent(),
            chrome_args: Vec::new(),
            remote_url: None,
        }
    }
}

impl BrowserEngineConfig {
    /// Apply environment variable overrides.
    pub fn with_env_overrides(mut self) -> Self {
        // BROWSER_URL - connect to a running browser
        if let Ok(url) = env::var("BROWSER_URL") {
            if !url.is_empty() {
                self.remote_url = Some(url);
            }
        }

        // SOCKS_PROXY - proxy for browser traffic
        if let Ok(proxy) = env::var("SOCKS_PROXY") {
            if !proxy.is_empty() {
                self.proxy = Some(proxy);
            }
        }

        // TOURPULSE_HEADLESS=0 - show the browser window
        if let Ok(value) = env::var("TOURPULSE_HEADLESS") {
            match value.to_lowercase().as_str() {
                "0" | "false" | "no" => self.headless = false,
                "1" | "true" | "yes" => self.headless = true,
                _ => {}
            }
        }

        self
    }
}
