//! Review harvesting for one listing row.
//!
//! Per row: collect inline excerpts and highlights from the row itself; if
//! short of the target and detail harvesting is enabled, open the hotel's
//! review or detail page in a second context (bounded attempts), check for a
//! challenge page, open the reviews tab, scroll, extract reviews and page
//! through "load more" (bounded); always return to the listing context;
//! finally truncate and backfill to exactly the target count.

mod detail;

use std::fmt;

use tracing::{debug, error, info, warn};
use url::Url;

use crate::browser::{BrowserResult, PageController, Scope};
use crate::config::ScrapeSettings;
use crate::extract::{
    element_text, first_displayed, resolve, resolve_first, resolve_text, selectors,
    wait_for_displayed, wait_until_ready,
};
use crate::features::sentiment_score;
use crate::models::{placeholder_text, ReviewRecord, ANONYMOUS};

use detail::DetailContext;

/// Identity of the hotel whose reviews are being harvested.
#[derive(Debug, Clone, Copy)]
pub struct HotelRef<'a> {
    pub name: &'a str,
    pub id: &'a str,
}

/// Why a row's harvest ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    /// A challenge page blocked a non-interactive session.
    Captcha,
    /// The listing context could not be restored after a detail visit.
    NavigationFault,
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Captcha => f.write_str("captcha"),
            Self::NavigationFault => f.write_str("navigation fault"),
        }
    }
}

/// Finalized harvest of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestOutcome {
    /// Exactly the target count; shortfalls are placeholder markers.
    pub excerpts: Vec<String>,
    pub highlights: Vec<String>,
    /// Hotel-level sentiment over the valid excerpts.
    pub sentiment: f64,
    pub degradation: Option<Degradation>,
}

/// How a detail page visit ended.
enum DetailVisit {
    Completed,
    Blocked,
}

/// Accepted excerpts of the row in progress.
struct Collected {
    excerpts: Vec<String>,
}

impl Collected {
    fn len(&self) -> usize {
        self.excerpts.len()
    }
}

/// Drives the per-row review state machine.
pub struct ReviewHarvester<'a> {
    settings: &'a ScrapeSettings,
    /// Listing URL; relative detail links are resolved against it.
    base_url: &'a str,
    harvest_details: bool,
    interactive: bool,
}

impl<'a> ReviewHarvester<'a> {
    pub fn new(
        settings: &'a ScrapeSettings,
        base_url: &'a str,
        harvest_details: bool,
        interactive: bool,
    ) -> Self {
        Self {
            settings,
            base_url,
            harvest_details,
            interactive,
        }
    }

    /// Harvest reviews for the row at `row`, appending records to `reviews`.
    pub async fn harvest<P>(
        &self,
        page: &mut P,
        row: &P::Element,
        hotel: HotelRef<'_>,
        reviews: &mut Vec<ReviewRecord>,
    ) -> HarvestOutcome
    where
        P: PageController + ?Sized,
    {
        let target = self.settings.target_reviews;
        let mut collected = Collected {
            excerpts: Vec::new(),
        };

        self.collect_inline(page, row, hotel, &mut collected, reviews)
            .await;
        let highlights = self.collect_highlights(page, row, hotel).await;

        let mut degradation = None;
        if collected.len() < target && self.harvest_details {
            degradation = self
                .visit_details(page, row, hotel, &mut collected, reviews)
                .await;
        }

        self.finalize(hotel, collected, highlights, degradation, reviews)
    }

    async fn collect_inline<P>(
        &self,
        page: &mut P,
        row: &P::Element,
        hotel: HotelRef<'_>,
        collected: &mut Collected,
        reviews: &mut Vec<ReviewRecord>,
    ) where
        P: PageController + ?Sized,
    {
        let target = self.settings.target_reviews;
        let found = resolve(page, Scope::Element(row), &selectors::INLINE_REVIEWS).await;
        debug!("{} inline review element(s) for {}", found.len(), hotel.name);

        for element in found.iter().take(target) {
            let text = element_text(page, element).await;
            if self.accept(collected, &text) {
                reviews.push(ReviewRecord::new(hotel.id, collected.len(), text));
            }
        }
    }

    async fn collect_highlights<P>(
        &self,
        page: &mut P,
        row: &P::Element,
        hotel: HotelRef<'_>,
    ) -> Vec<String>
    where
        P: PageController + ?Sized,
    {
        let found = resolve(page, Scope::Element(row), &selectors::HIGHLIGHTS).await;
        let mut highlights: Vec<String> = Vec::new();

        for element in found.iter().take(self.settings.max_highlights) {
            let text = element_text(page, element).await;
            if !text.is_empty()
                && text.chars().count() < self.settings.max_highlight_len
                && !highlights.contains(&text)
            {
                highlights.push(text);
            }
        }

        debug!("{} highlight(s) for {}", highlights.len(), hotel.name);
        highlights
    }

    /// Accept `text` as an excerpt if it is long enough and new.
    fn accept(&self, collected: &mut Collected, text: &str) -> bool {
        if text.chars().count() <= self.settings.min_excerpt_len
            || collected.excerpts.iter().any(|e| e == text)
        {
            return false;
        }
        collected.excerpts.push(text.to_string());
        true
    }

    /// Detail page visits, bounded by `detail_attempts`.
    async fn visit_details<P>(
        &self,
        page: &mut P,
        row: &P::Element,
        hotel: HotelRef<'_>,
        collected: &mut Collected,
        reviews: &mut Vec<ReviewRecord>,
    ) -> Option<Degradation>
    where
        P: PageController + ?Sized,
    {
        let target = self.settings.target_reviews;
        let attempts = self.settings.detail_attempts;
        let timings = &self.settings.timings;

        for attempt in 1..=attempts {
            info!(
                "Attempt {} to navigate to reviews page for {}",
                attempt, hotel.name
            );

            let Some(url) = self.detail_link(page, row).await else {
                warn!(
                    "No reviews or detail link found for {} (attempt {})",
                    hotel.name, attempt
                );
                return None;
            };
            debug!("Detail link for {}: {}", hotel.name, url);

            let visit = match DetailContext::open(page, &url).await {
                Ok(context) => {
                    let visit = self.visit_detail(page, &url, hotel, collected, reviews).await;
                    if context.release(page).await.is_err() {
                        return Some(Degradation::NavigationFault);
                    }
                    visit
                }
                Err(e) => Err(e),
            };

            match visit {
                Ok(DetailVisit::Blocked) => return Some(Degradation::Captcha),
                Ok(DetailVisit::Completed) if collected.len() >= target => {
                    info!(
                        "Collected {} reviews for {}",
                        collected.len(),
                        hotel.name
                    );
                    return None;
                }
                Ok(DetailVisit::Completed) => {
                    debug!(
                        "{} of {} reviews for {} after attempt {}",
                        collected.len(),
                        target,
                        hotel.name,
                        attempt
                    );
                }
                Err(e) => {
                    error!(
                        "Error navigating to reviews page for {} on attempt {}: {}",
                        hotel.name, attempt, e
                    );
                    if attempt == attempts {
                        warn!(
                            "Failed to get {} reviews for {} after {} attempts",
                            target, hotel.name, attempts
                        );
                    }
                    tokio::time::sleep(timings.retry_delay()).await;
                }
            }
        }

        None
    }

    /// Absolute URL of the row's first displayed detail link.
    async fn detail_link<P>(&self, page: &mut P, row: &P::Element) -> Option<String>
    where
        P: PageController + ?Sized,
    {
        let link = first_displayed(page, Scope::Element(row), &selectors::DETAIL_LINKS).await?;
        let href = match page.attribute(&link, "href").await {
            Ok(Some(href)) if !href.trim().is_empty() => href,
            Ok(_) => return None,
            Err(e) => {
                debug!("Reading detail link failed: {}", e);
                return None;
            }
        };

        match Url::parse(self.base_url).and_then(|base| base.join(href.trim())) {
            Ok(url) => Some(url.to_string()),
            Err(_) => Some(href.trim().to_string()),
        }
    }

    /// Work done inside the detail context.
    async fn visit_detail<P>(
        &self,
        page: &mut P,
        url: &str,
        hotel: HotelRef<'_>,
        collected: &mut Collected,
        reviews: &mut Vec<ReviewRecord>,
    ) -> BrowserResult<DetailVisit>
    where
        P: PageController + ?Sized,
    {
        let timings = &self.settings.timings;
        tokio::time::sleep(timings.detail_settle()).await;

        if self.challenge_present(page).await {
            if self.interactive {
                warn!(
                    "CAPTCHA detected on reviews page for {}. Waiting {:?} for manual solve.",
                    hotel.name,
                    timings.captcha_pause()
                );
                tokio::time::sleep(timings.captcha_pause()).await;
            } else {
                error!(
                    "CAPTCHA detected in non-interactive session for {}. Cannot proceed.",
                    hotel.name
                );
                return Ok(DetailVisit::Blocked);
            }
        }

        if url.contains("hotel-details") {
            self.open_reviews_tab(page, hotel).await;
        }

        for _ in 0..self.settings.scroll_passes {
            if let Err(e) = page.scroll_to_bottom().await {
                debug!("Scroll failed: {}", e);
            }
            tokio::time::sleep(timings.scroll_settle()).await;
        }

        if !wait_until_ready(page, timings.page_load(), timings.poll()).await {
            debug!("Detail page for {} never showed a body", hotel.name);
        }
        tokio::time::sleep(timings.review_settle()).await;

        self.extract_detailed(page, hotel, collected, reviews).await;
        self.paginate(page, hotel, collected, reviews).await;
        Ok(DetailVisit::Completed)
    }

    async fn challenge_present<P>(&self, page: &mut P) -> bool
    where
        P: PageController + ?Sized,
    {
        match page.page_text().await {
            Ok(text) => {
                let lowered = text.to_lowercase();
                selectors::CAPTCHA_MARKERS
                    .iter()
                    .any(|marker| lowered.contains(marker))
            }
            Err(e) => {
                error!("Error checking for CAPTCHA: {}", e);
                false
            }
        }
    }

    async fn open_reviews_tab<P>(&self, page: &mut P, hotel: HotelRef<'_>)
    where
        P: PageController + ?Sized,
    {
        let timings = &self.settings.timings;
        let Some(tab) = wait_for_displayed(
            page,
            Scope::Page,
            &selectors::REVIEWS_TAB,
            timings.control_wait(),
            timings.poll(),
        )
        .await
        else {
            debug!("No reviews tab found for {}", hotel.name);
            return;
        };

        match page.click(&tab).await {
            Ok(()) => {
                tokio::time::sleep(timings.tab_settle()).await;
                debug!("Opened reviews tab for {}", hotel.name);
            }
            Err(e) => debug!("Clicking reviews tab for {} failed: {}", hotel.name, e),
        }
    }

    /// One extraction pass over the first `2 * target` review matches.
    async fn extract_detailed<P>(
        &self,
        page: &mut P,
        hotel: HotelRef<'_>,
        collected: &mut Collected,
        reviews: &mut Vec<ReviewRecord>,
    ) where
        P: PageController + ?Sized,
    {
        let cap = self.settings.target_reviews * 2;
        let found = resolve(page, Scope::Page, &selectors::DETAIL_REVIEWS).await;
        debug!(
            "Found {} detailed review element(s) for {}",
            found.len(),
            hotel.name
        );

        for element in found.iter().take(cap) {
            let text = element_text(page, element).await;
            if !self.accept(collected, &text) {
                continue;
            }
            let mut record = ReviewRecord::new(hotel.id, collected.len(), text);
            self.attach_metadata(page, element, &mut record).await;
            reviews.push(record);
        }
    }

    /// Rating, date, reviewer and helpfulness from the excerpt's parent.
    async fn attach_metadata<P>(&self, page: &mut P, element: &P::Element, record: &mut ReviewRecord)
    where
        P: PageController + ?Sized,
    {
        let Some(parent) = resolve_first(page, Scope::Element(element), &selectors::PARENT).await
        else {
            return;
        };
        let scope = Scope::Element(&parent);

        record.review_rating = resolve_text(page, scope, &selectors::REVIEW_RATING).await;
        record.review_date = resolve_text(page, scope, &selectors::REVIEW_DATE).await;
        let name = resolve_text(page, scope, &selectors::REVIEWER_NAME).await;
        record.reviewer_name = if name.is_empty() {
            ANONYMOUS.to_string()
        } else {
            name
        };
        record.review_helpful_count = resolve_text(page, scope, &selectors::HELPFUL_COUNT).await;
    }

    /// Click "load more" and re-extract until the target is met, bounded.
    async fn paginate<P>(
        &self,
        page: &mut P,
        hotel: HotelRef<'_>,
        collected: &mut Collected,
        reviews: &mut Vec<ReviewRecord>,
    ) where
        P: PageController + ?Sized,
    {
        let timings = &self.settings.timings;

        for attempt in 1..=self.settings.load_more_attempts {
            if collected.len() >= self.settings.target_reviews {
                break;
            }

            let Some(control) = wait_for_displayed(
                page,
                Scope::Page,
                &selectors::LOAD_MORE,
                timings.control_wait(),
                timings.poll(),
            )
            .await
            else {
                debug!(
                    "No 'Show More' button found (attempt {}) for {}",
                    attempt, hotel.name
                );
                break;
            };

            if let Err(e) = page.click(&control).await {
                debug!("Clicking 'Show More' failed for {}: {}", hotel.name, e);
                break;
            }
            tokio::time::sleep(timings.load_more_settle()).await;
            debug!(
                "Clicked 'Show More' (attempt {}) for {}",
                attempt, hotel.name
            );

            self.extract_detailed(page, hotel, collected, reviews).await;
        }
    }

    /// Truncate to the target, backfill placeholders, stamp the hotel sentiment.
    fn finalize(
        &self,
        hotel: HotelRef<'_>,
        collected: Collected,
        highlights: Vec<String>,
        degradation: Option<Degradation>,
        reviews: &mut Vec<ReviewRecord>,
    ) -> HarvestOutcome {
        let target = self.settings.target_reviews;
        let mut excerpts = collected.excerpts;
        excerpts.truncate(target);
        let valid = excerpts.len();
        let sentiment = sentiment_score(&excerpts);

        if valid < target {
            warn!(
                "Only {} valid reviews found for {}. Adding placeholders.",
                valid, hotel.name
            );
            for ordinal in valid + 1..=target {
                excerpts.push(placeholder_text(ordinal));
                reviews.push(ReviewRecord::placeholder(hotel.id, ordinal));
            }
        }

        for review in reviews.iter_mut().filter(|r| r.hotel_id == hotel.id) {
            review.review_sentiment_score = Some(sentiment);
        }

        HarvestOutcome {
            excerpts,
            highlights,
            sentiment,
            degradation,
        }
    }
}
