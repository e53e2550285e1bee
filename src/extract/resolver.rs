//! Multi-candidate element resolution.
//!
//! Page markup drifts, so every piece of content is addressed by an ordered
//! list of candidate locators. The first candidate with a non-empty match set
//! wins. A failing candidate is logged and treated as "no match".

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::browser::{Locator, PageController, Scope};

/// First non-empty match set among `candidates`, or an empty vector.
pub async fn resolve<P>(
    page: &mut P,
    scope: Scope<'_, P::Element>,
    candidates: &[Locator],
) -> Vec<P::Element>
where
    P: PageController + ?Sized,
{
    for locator in candidates {
        match page.find_all(scope, locator).await {
            Ok(found) if !found.is_empty() => {
                debug!("{} matched {} element(s)", locator, found.len());
                return found;
            }
            Ok(_) => debug!("{} matched nothing", locator),
            Err(e) => debug!("{} failed: {}", locator, e),
        }
    }
    Vec::new()
}

/// First element of the first non-empty match set.
pub async fn resolve_first<P>(
    page: &mut P,
    scope: Scope<'_, P::Element>,
    candidates: &[Locator],
) -> Option<P::Element>
where
    P: PageController + ?Sized,
{
    resolve(page, scope, candidates).await.into_iter().next()
}

/// Trimmed text of the first match, or an empty string.
pub async fn resolve_text<P>(
    page: &mut P,
    scope: Scope<'_, P::Element>,
    candidates: &[Locator],
) -> String
where
    P: PageController + ?Sized,
{
    match resolve_first(page, scope, candidates).await {
        Some(element) => element_text(page, &element).await,
        None => String::new(),
    }
}

/// Attribute of the first match, or an empty string.
pub async fn resolve_attribute<P>(
    page: &mut P,
    scope: Scope<'_, P::Element>,
    candidates: &[Locator],
    name: &str,
) -> String
where
    P: PageController + ?Sized,
{
    let Some(element) = resolve_first(page, scope, candidates).await else {
        return String::new();
    };
    match page.attribute(&element, name).await {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            debug!("Reading attribute {} failed: {}", name, e);
            String::new()
        }
    }
}

/// Trimmed text of an element; read failures yield an empty string.
pub async fn element_text<P>(page: &mut P, element: &P::Element) -> String
where
    P: PageController + ?Sized,
{
    match page.text(element).await {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            debug!("Reading text failed: {}", e);
            String::new()
        }
    }
}

/// Poll [`resolve`] until it matches or `timeout` elapses.
pub async fn wait_for_any<P>(
    page: &mut P,
    scope: Scope<'_, P::Element>,
    candidates: &[Locator],
    timeout: Duration,
    poll: Duration,
) -> Vec<P::Element>
where
    P: PageController + ?Sized,
{
    let deadline = Instant::now() + timeout;
    loop {
        let found = resolve(page, scope, candidates).await;
        if !found.is_empty() {
            return found;
        }
        let now = Instant::now();
        if now >= deadline {
            debug!("No candidate matched within {:?}", timeout);
            return found;
        }
        tokio::time::sleep(poll.min(deadline - now)).await;
    }
}

/// Poll until some candidate yields a displayed element, trying candidates in order.
pub async fn wait_for_displayed<P>(
    page: &mut P,
    scope: Scope<'_, P::Element>,
    candidates: &[Locator],
    timeout: Duration,
    poll: Duration,
) -> Option<P::Element>
where
    P: PageController + ?Sized,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(element) = first_displayed(page, scope, candidates).await {
            return Some(element);
        }
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        tokio::time::sleep(poll.min(deadline - now)).await;
    }
}

/// First displayed element, checking candidates in priority order.
pub async fn first_displayed<P>(
    page: &mut P,
    scope: Scope<'_, P::Element>,
    candidates: &[Locator],
) -> Option<P::Element>
where
    P: PageController + ?Sized,
{
    for locator in candidates {
        let found = match page.find_all(scope, locator).await {
            Ok(found) => found,
            Err(e) => {
                debug!("{} failed: {}", locator, e);
                continue;
            }
        };
        for element in found {
            if page.is_displayed(&element).await.unwrap_or(false) {
                return Some(element);
            }
        }
    }
    None
}

/// Wait until the current page has a `body`.
pub async fn wait_until_ready<P>(page: &mut P, timeout: Duration, poll: Duration) -> bool
where
    P: PageController + ?Sized,
{
    let body = [Locator::css("body")];
    !wait_for_any(page, Scope::Page, &body, timeout, poll)
        .await
        .is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{SnapshotController, SnapshotSite};

    const PAGE: &str = r#"
        <html><body>
          <div id="card">
            <span class="review-text">  second choice  </span>
            <span class="review-text">another</span>
            <a class="more" style="display:none" href="/p2">hidden</a>
            <a class="more-visible" href="/p2">more</a>
            <i id="stars" data-content="****"></i>
          </div>
        </body></html>
    "#;

    async fn loaded() -> SnapshotController {
        let mut page = SnapshotController::new(SnapshotSite::new().with_page("https://t.test/", PAGE));
        page.navigate("https://t.test/").await.unwrap();
        page
    }

    #[tokio::test]
    async fn first_non_empty_candidate_wins() {
        let mut page = loaded().await;
        let candidates = [
            Locator::css(".userReviewCard__text"),
            Locator::path("//div[@class='unsupported']"),
            Locator::class("review-text"),
            Locator::css("span"),
        ];
        let found = resolve(&mut page, Scope::Page, &candidates).await;
        assert_eq!(found.len(), 2);
        assert_eq!(
            resolve_text(&mut page, Scope::Page, &candidates).await,
            "second choice"
        );
    }

    #[tokio::test]
    async fn all_empty_yields_empty_values() {
        let mut page = loaded().await;
        let candidates = [Locator::id("nothing"), Locator::css(".absent")];
        assert!(resolve(&mut page, Scope::Page, &candidates).await.is_empty());
        assert_eq!(resolve_text(&mut page, Scope::Page, &candidates).await, "");
        assert_eq!(
            resolve_attribute(&mut page, Scope::Page, &candidates, "href").await,
            ""
        );
    }

    #[tokio::test]
    async fn attribute_of_first_match() {
        let mut page = loaded().await;
        let value =
            resolve_attribute(&mut page, Scope::Page, &[Locator::id("stars")], "data-content")
                .await;
        assert_eq!(value, "****");
    }

    #[tokio::test]
    async fn displayed_lookup_skips_hidden_matches() {
        let mut page = loaded().await;
        let candidates = [Locator::class("more"), Locator::class("more-visible")];
        let element = first_displayed(&mut page, Scope::Page, &candidates)
            .await
            .unwrap();
        assert_eq!(element_text(&mut page, &element).await, "more");
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_gives_up_at_the_deadline() {
        let mut page = loaded().await;
        let start = Instant::now();
        let found = wait_for_any(
            &mut page,
            Scope::Page,
            &[Locator::id("never")],
            Duration::from_secs(20),
            Duration::from_millis(500),
        )
        .await;
        assert!(found.is_empty());
        assert_eq!(start.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn ready_page_returns_immediately() {
        let mut page = loaded().await;
        let start = Instant::now();
        assert!(
            wait_until_ready(&mut page, Duration::from_secs(20), Duration::from_millis(500)).await
        );
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
