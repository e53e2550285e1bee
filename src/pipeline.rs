//! Pipeline driver: load the listing page, walk it, enrich the records.

use std::time::Duration;

use chrono::{Local, NaiveDate};
use tracing::{error, info};

use crate::browser::PageController;
use crate::config::ScrapeSettings;
use crate::extract::wait_until_ready;
use crate::features::{derive_temporal, enrich};
use crate::harvest::ReviewHarvester;
use crate::models::{ListingRecord, ReviewRecord};
use crate::walker::{ListingWalker, WalkSummary};

/// Invocation parameters of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunParams {
    pub url: String,
    pub max_rows: usize,
    pub delay: Duration,
    pub harvest_details: bool,
    /// Allow pausing for a human to solve challenge pages.
    pub interactive: bool,
    /// Reference date for lead-time computation.
    pub today: NaiveDate,
}

impl RunParams {
    /// Parameters for `url` taken from `settings`, dated today.
    pub fn from_settings(url: impl Into<String>, settings: &ScrapeSettings) -> Self {
        Self {
            url: url.into(),
            max_rows: settings.max_rows,
            delay: settings.delay(),
            harvest_details: settings.harvest_details,
            interactive: !settings.browser.headless,
            today: Local::now().date_naive(),
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, Default)]
pub struct ScrapeOutput {
    pub listings: Vec<ListingRecord>,
    pub reviews: Vec<ReviewRecord>,
    pub summary: WalkSummary,
}

/// Run the whole extraction against `page`.
///
/// Never fails: a listing page that cannot be loaded yields an empty output.
pub async fn run<P>(page: &mut P, settings: &ScrapeSettings, params: &RunParams) -> ScrapeOutput
where
    P: PageController + ?Sized,
{
    let timings = &settings.timings;
    info!("Starting scrape for URL: {}", params.url);

    if let Err(e) = page.navigate(&params.url).await {
        error!("Error during scraping: {}", e);
        return ScrapeOutput::default();
    }
    if !wait_until_ready(page, timings.page_load(), timings.poll()).await {
        error!(
            "Listing page did not load within {:?}: {}",
            timings.page_load(),
            params.url
        );
        return ScrapeOutput::default();
    }
    tokio::time::sleep(timings.page_settle()).await;

    let temporal = derive_temporal(&params.url, params.today);
    let harvester = ReviewHarvester::new(
        settings,
        &params.url,
        params.harvest_details,
        params.interactive,
    );
    let walker = ListingWalker::new(
        settings,
        harvester,
        &temporal,
        params.max_rows,
        params.delay,
    );

    let mut reviews = Vec::new();
    let (mut listings, summary) = walker.walk(page, &mut reviews).await;
    for record in &mut listings {
        enrich(record);
    }

    info!(
        "Scraping completed. Total hotels: {} ({} skipped, {} degraded), reviews: {}",
        listings.len(),
        summary.rows_skipped,
        summary.rows_degraded(),
        reviews.len()
    );

    ScrapeOutput {
        listings,
        reviews,
        summary,
    }
}
