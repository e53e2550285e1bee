//! Listing page walk: one record per row position.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::browser::{BrowserResult, PageController, Scope};
use crate::config::ScrapeSettings;
use crate::extract::{resolve_attribute, resolve_text, selectors, wait_for_any};
use crate::features::{parse_location, split_currency, tax_amount, TemporalFeatures};
use crate::harvest::{Degradation, HotelRef, ReviewHarvester};
use crate::models::{ListingRecord, ReviewRecord};

/// Row counts for one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalkSummary {
    /// Rows located on the page.
    pub rows_attempted: usize,
    /// Located rows dropped after a row-level fault.
    pub rows_skipped: usize,
    /// Rows whose review harvest was cut short by a challenge page.
    pub rows_captcha: usize,
    /// Rows whose detail visit could not restore the listing context.
    pub rows_navigation_fault: usize,
}

impl WalkSummary {
    /// Rows finished with partial review data.
    pub fn rows_degraded(&self) -> usize {
        self.rows_captcha + self.rows_navigation_fault
    }
}

pub struct ListingWalker<'a> {
    settings: &'a ScrapeSettings,
    harvester: ReviewHarvester<'a>,
    temporal: &'a TemporalFeatures,
    max_rows: usize,
    delay: Duration,
}

impl<'a> ListingWalker<'a> {
    pub fn new(
        settings: &'a ScrapeSettings,
        harvester: ReviewHarvester<'a>,
        temporal: &'a TemporalFeatures,
        max_rows: usize,
        delay: Duration,
    ) -> Self {
        Self {
            settings,
            harvester,
            temporal,
            max_rows,
            delay,
        }
    }

    /// Visit rows `0..max_rows` until one is missing.
    pub async fn walk<P>(
        &self,
        page: &mut P,
        reviews: &mut Vec<ReviewRecord>,
    ) -> (Vec<ListingRecord>, WalkSummary)
    where
        P: PageController + ?Sized,
    {
        let timings = &self.settings.timings;
        let mut listings = Vec::new();
        let mut summary = WalkSummary::default();

        for position in 0..self.max_rows {
            info!("Scraping hotel {}/{}", position + 1, self.max_rows);

            let found = wait_for_any(
                page,
                Scope::Page,
                &selectors::row(position),
                timings.element_wait(),
                timings.poll(),
            )
            .await;
            let Some(row) = found.into_iter().next() else {
                warn!("Hotel {} not found, stopping scrape", position);
                break;
            };
            summary.rows_attempted += 1;

            let scraped = self.scrape_row(page, position, &row, reviews).await;
            page.release_handles();
            match scraped {
                Ok((record, degradation)) => {
                    match degradation {
                        Some(Degradation::Captcha) => summary.rows_captcha += 1,
                        Some(Degradation::NavigationFault) => {
                            summary.rows_navigation_fault += 1
                        }
                        None => {}
                    }
                    listings.push(record);
                }
                Err(e) => {
                    error!("Error scraping hotel {}: {}", position, e);
                    summary.rows_skipped += 1;
                    continue;
                }
            }

            if let Err(e) = page.scroll_to_bottom().await {
                warn!("Courtesy scroll after hotel {} failed: {}", position, e);
            }
            tokio::time::sleep(self.delay).await;
        }

        (listings, summary)
    }

    async fn scrape_row<P>(
        &self,
        page: &mut P,
        position: usize,
        row: &P::Element,
        reviews: &mut Vec<ReviewRecord>,
    ) -> BrowserResult<(ListingRecord, Option<Degradation>)>
    where
        P: PageController + ?Sized,
    {
        // A row that cannot be read at all is a row-level fault.
        let row_id = page.attribute(row, "id").await?;
        debug!("Row {} resolved as {:?}", position, row_id);

        let captured_at = Utc::now();
        let hotel_id = ListingRecord::make_id(position, captured_at);
        let mut record = ListingRecord::new(hotel_id, captured_at, self.temporal);
        let scope = Scope::Element(row);

        record.hotel_name = resolve_text(page, scope, &selectors::HOTEL_NAME).await;
        record.user_rating = resolve_text(page, scope, &selectors::USER_RATING).await;
        record.review_count = resolve_text(page, scope, &selectors::REVIEW_COUNT).await;
        record.rating_description =
            resolve_text(page, scope, &selectors::rating_description(position)).await;

        let location = parse_location(&resolve_text(page, scope, &selectors::LOCATION).await);
        record.location = location.location;
        record.landmark = location.landmark;
        record.distance_to_landmark = location.distance;

        let (price, currency) =
            split_currency(&resolve_text(page, scope, &selectors::SHOWN_PRICE).await);
        record.price = price;
        record.currency = currency;
        record.tax = tax_amount(&resolve_text(page, scope, &selectors::tax(position)).await);
        record.star_rating = resolve_attribute(
            page,
            scope,
            &selectors::STAR_RATING,
            selectors::STAR_RATING_ATTR,
        )
        .await;

        let outcome = self
            .harvester
            .harvest(
                page,
                row,
                HotelRef {
                    name: &record.hotel_name,
                    id: &record.hotel_id,
                },
                reviews,
            )
            .await;
        record.recent_reviews = outcome.excerpts;
        record.review_highlights = outcome.highlights;
        record.avg_sentiment_score = Some(outcome.sentiment);

        if let Some(degradation) = outcome.degradation {
            warn!(
                "Hotel {} ({}) finished with partial reviews: {}",
                position, record.hotel_name, degradation
            );
        }

        Ok((record, outcome.degradation))
    }
}
