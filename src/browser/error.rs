//! Page controller error types.

use std::time::Duration;

use thiserror::Error;

use super::ContextId;

pub type BrowserResult<T> = Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("No active browsing context")]
    NoActiveContext,
    #[error("Unknown browsing context: {0}")]
    UnknownContext(ContextId),
    #[error("Element handle is stale")]
    StaleElement,
    #[error("Unsupported locator: {0}")]
    UnsupportedLocator(String),
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl BrowserError {
    pub fn navigation(url: impl Into<String>, reason: impl ToString) -> Self {
        BrowserError::Navigation {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(feature = "browser")]
impl From<chromiumoxide::error::CdpError> for BrowserError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        BrowserError::Protocol(err.to_string())
    }
}
