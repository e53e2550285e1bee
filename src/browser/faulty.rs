//! Snapshot controller with injectable faults, for failure-path tests.

use async_trait::async_trait;

use super::{
    BrowserError, BrowserResult, ContextId, Locator, PageController, Scope, SnapshotController,
    SnapshotElement,
};

/// Wraps a [`SnapshotController`] and fails selected calls.
pub(crate) struct FaultyController {
    pub inner: SnapshotController,
    /// Reading `id` of the element whose id equals this value fails.
    pub unreadable_id: Option<String>,
    /// Switching into this context fails.
    pub unreachable_context: Option<ContextId>,
    /// Calls to [`PageController::release_handles`].
    pub releases: usize,
}

impl FaultyController {
    pub fn new(inner: SnapshotController) -> Self {
        Self {
            inner,
            unreadable_id: None,
            unreachable_context: None,
            releases: 0,
        }
    }
}

#[async_trait(?Send)]
impl PageController for FaultyController {
    type Element = SnapshotElement;

    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        self.inner.navigate(url).await
    }

    async fn find_all(
        &mut self,
        scope: Scope<'_, SnapshotElement>,
        locator: &Locator,
    ) -> BrowserResult<Vec<SnapshotElement>> {
        self.inner.find_all(scope, locator).await
    }

    async fn text(&mut self, element: &SnapshotElement) -> BrowserResult<String> {
        self.inner.text(element).await
    }

    async fn attribute(
        &mut self,
        element: &SnapshotElement,
        name: &str,
    ) -> BrowserResult<Option<String>> {
        let value = self.inner.attribute(element, name).await?;
        if name == "id" && value.is_some() && value == self.unreadable_id {
            return Err(BrowserError::StaleElement);
        }
        Ok(value)
    }

    async fn is_displayed(&mut self, element: &SnapshotElement) -> BrowserResult<bool> {
        self.inner.is_displayed(element).await
    }

    async fn click(&mut self, element: &SnapshotElement) -> BrowserResult<()> {
        self.inner.click(element).await
    }

    fn current_context(&self) -> Option<ContextId> {
        self.inner.current_context()
    }

    async fn open_context(&mut self, url: &str) -> BrowserResult<ContextId> {
        self.inner.open_context(url).await
    }

    async fn switch_to(&mut self, context: ContextId) -> BrowserResult<()> {
        if self.unreachable_context == Some(context) {
            return Err(BrowserError::Protocol(format!("{} did not respond", context)));
        }
        self.inner.switch_to(context).await
    }

    async fn close_context(&mut self, context: ContextId) -> BrowserResult<()> {
        self.inner.close_context(context).await
    }

    async fn scroll_to_bottom(&mut self) -> BrowserResult<()> {
        self.inner.scroll_to_bottom().await
    }

    async fn page_text(&mut self) -> BrowserResult<String> {
        self.inner.page_text().await
    }

    fn release_handles(&mut self) {
        self.releases += 1;
        self.inner.release_handles();
    }
}
