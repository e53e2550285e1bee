//! Page controller capability and its backends.
//!
//! The extraction pipeline never talks to a browser directly. Everything it
//! needs (scoped element lookup, text and attribute reads, clicks, browsing
//! context management) goes through [`PageController`]. Two backends exist:
//!
//! - [`ChromiumController`] drives a real Chromium over CDP (feature `browser`).
//! - [`SnapshotController`] replays saved HTML pages without a browser.

#[cfg(feature = "browser")]
mod chromium;
mod config;
mod error;
#[cfg(test)]
mod faulty;
mod snapshot;
mod xpath;

use std::fmt;

use async_trait::async_trait;

#[cfg(feature = "browser")]
pub use chromium::{ChromiumController, ChromiumElement};
pub use config::BrowserEngineConfig;
pub use error::{BrowserError, BrowserResult};
#[cfg(test)]
pub(crate) use faulty::FaultyController;
pub use snapshot::{SnapshotController, SnapshotElement, SnapshotSite};

/// One way of addressing DOM content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// CSS selector.
    Css(String),
    /// Value of the `id` attribute.
    Id(String),
    /// Single class name.
    Class(String),
    /// Path expression (XPath subset).
    Path(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn class(name: impl Into<String>) -> Self {
        Locator::Class(name.into())
    }

    pub fn path(expr: impl Into<String>) -> Self {
        Locator::Path(expr.into())
    }

    /// CSS form of this locator, if it has one.
    pub fn to_css(&self) -> Option<String> {
        match self {
            Locator::Css(selector) => Some(selector.clone()),
            Locator::Id(id) => Some(format!("[id=\"{}\"]", escape_attr(id))),
            Locator::Class(name) => Some(format!("[class~=\"{}\"]", escape_attr(name))),
            Locator::Path(_) => None,
        }
    }
}

fn escape_attr(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css:{}", s),
            Locator::Id(s) => write!(f, "id:{}", s),
            Locator::Class(s) => write!(f, "class:{}", s),
            Locator::Path(s) => write!(f, "path:{}", s),
        }
    }
}

/// Where a lookup starts: the whole page of the current context, or below an element.
#[derive(Debug)]
pub enum Scope<'a, E> {
    Page,
    Element(&'a E),
}

impl<E> Clone for Scope<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Scope<'_, E> {}

/// Handle to a browsing context (a tab).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Browser capability consumed by the extraction pipeline.
///
/// Element handles are only valid inside the context they were found in.
/// Lookups that match nothing return an empty vector, not an error.
#[async_trait(?Send)]
pub trait PageController {
    type Element: Clone + fmt::Debug;

    /// Load `url` in the current context, creating one if none is open.
    async fn navigate(&mut self, url: &str) -> BrowserResult<()>;

    async fn find_all(
        &mut self,
        scope: Scope<'_, Self::Element>,
        locator: &Locator,
    ) -> BrowserResult<Vec<Self::Element>>;

    async fn text(&mut self, element: &Self::Element) -> BrowserResult<String>;

    async fn attribute(
        &mut self,
        element: &Self::Element,
        name: &str,
    ) -> BrowserResult<Option<String>>;

    async fn is_displayed(&mut self, element: &Self::Element) -> BrowserResult<bool>;

    async fn click(&mut self, element: &Self::Element) -> BrowserResult<()>;

    fn current_context(&self) -> Option<ContextId>;

    /// Open `url` in a new context. The current context does not change.
    async fn open_context(&mut self, url: &str) -> BrowserResult<ContextId>;

    async fn switch_to(&mut self, context: ContextId) -> BrowserResult<()>;

    /// Close a context. Closing the current one leaves no current context.
    async fn close_context(&mut self, context: ContextId) -> BrowserResult<()>;

    async fn scroll_to_bottom(&mut self) -> BrowserResult<()>;

    /// Full source of the current page, for challenge detection.
    async fn page_text(&mut self) -> BrowserResult<String>;

    /// Forget every element handle handed out so far; using one afterwards
    /// is a stale-element error.
    fn release_handles(&mut self) {}
}
