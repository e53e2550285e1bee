//! Scoped acquisition of the detail browsing context.

use tracing::{debug, error, warn};

use crate::browser::{BrowserError, BrowserResult, ContextId, PageController};

/// A detail page opened next to the listing.
///
/// Must be handed back through [`DetailContext::release`] on every path;
/// release closes the detail context and switches back to the listing.
#[derive(Debug)]
#[must_use = "a detail context must be released"]
pub(crate) struct DetailContext {
    origin: ContextId,
    detail: ContextId,
}

impl DetailContext {
    /// Open `url` in a new context and make it current.
    pub async fn open<P>(page: &mut P, url: &str) -> BrowserResult<Self>
    where
        P: PageController + ?Sized,
    {
        let origin = page
            .current_context()
            .ok_or(BrowserError::NoActiveContext)?;
        let detail = page.open_context(url).await?;
        let context = Self { origin, detail };

        if let Err(e) = page.switch_to(detail).await {
            if let Err(release_err) = context.release(page).await {
                debug!("Release after failed switch also failed: {}", release_err);
            }
            return Err(e);
        }

        debug!("Opened {} from {} for {}", detail, origin, url);
        Ok(context)
    }

    /// Close the detail context and return to the listing context.
    ///
    /// A failed close still attempts the switch; only a failed switch is an error.
    pub async fn release<P>(self, page: &mut P) -> BrowserResult<()>
    where
        P: PageController + ?Sized,
    {
        if let Err(e) = page.close_context(self.detail).await {
            warn!(
                "Failed to close {}: {}; forcing return to {}",
                self.detail, e, self.origin
            );
        }

        page.switch_to(self.origin).await.map_err(|e| {
            error!("Cannot return to listing context {}: {}", self.origin, e);
            e
        })
    }
}
