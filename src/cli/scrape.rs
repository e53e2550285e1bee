//! Scrape command.

use std::path::Path;

use anyhow::Context;
use console::style;

use tourpulse::browser::{SnapshotController, SnapshotSite};
use tourpulse::config::{ScrapeSettings, Timings};
use tourpulse::pipeline::{self, RunParams, ScrapeOutput};
use tourpulse::sink::{self, OutputFormat, OutputPaths};

use super::Cli;

/// Scrape the listing at `cli.url` and save the records.
pub async fn cmd_scrape(
    cli: &Cli,
    settings: &ScrapeSettings,
    paths: &OutputPaths,
) -> anyhow::Result<()> {
    let mut params = RunParams::from_settings(&cli.url, settings);
    params.interactive |= cli.interactive;

    println!(
        "{} Scraping {} (up to {} hotels, detail reviews {})",
        style("→").cyan(),
        cli.url,
        params.max_rows,
        if params.harvest_details { "on" } else { "off" }
    );

    let output = match &cli.snapshot {
        Some(path) => scrape_snapshot(path, settings, &params).await?,
        None => scrape_live(settings, &params).await?,
    };

    let saved = sink::save(cli.format, paths, &output.listings, &output.reviews)
        .context("Failed to save scraped data")?;

    print_summary(&output);
    if saved {
        print_outputs(cli.format, paths, !output.reviews.is_empty());
    } else {
        println!("{} No data to save", style("!").yellow());
    }
    Ok(())
}

/// Replay a saved listing page as if it were served at `params.url`.
async fn scrape_snapshot(
    path: &Path,
    settings: &ScrapeSettings,
    params: &RunParams,
) -> anyhow::Result<ScrapeOutput> {
    let html = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let site = SnapshotSite::new().with_page(params.url.clone(), html);
    let mut page = SnapshotController::new(site);
    Ok(pipeline::run(&mut page, &replay_settings(settings), params).await)
}

/// Saved pages are complete on load, so replays skip every settle and wait.
fn replay_settings(settings: &ScrapeSettings) -> ScrapeSettings {
    ScrapeSettings {
        timings: Timings::instant(),
        ..settings.clone()
    }
}

#[cfg(feature = "browser")]
async fn scrape_live(settings: &ScrapeSettings, params: &RunParams) -> anyhow::Result<ScrapeOutput> {
    use tourpulse::browser::ChromiumController;

    let mut page = ChromiumController::launch(settings.browser.clone())
        .await
        .context("Failed to start browser")?;
    let output = pipeline::run(&mut page, settings, params).await;
    page.close().await;
    Ok(output)
}

#[cfg(not(feature = "browser"))]
async fn scrape_live(
    _settings: &ScrapeSettings,
    _params: &RunParams,
) -> anyhow::Result<ScrapeOutput> {
    anyhow::bail!("Built without the `browser` feature; use --snapshot to replay a saved page")
}

fn print_summary(output: &ScrapeOutput) {
    let summary = &output.summary;
    println!(
        "{} {} hotels, {} reviews",
        style("✓").green(),
        style(output.listings.len()).bold(),
        style(output.reviews.len()).bold()
    );
    if summary.rows_skipped > 0 {
        println!("  {} {} rows skipped", style("!").yellow(), summary.rows_skipped);
    }
    if summary.rows_captcha > 0 {
        println!(
            "  {} {} rows blocked by a challenge page",
            style("!").yellow(),
            summary.rows_captcha
        );
    }
    if summary.rows_navigation_fault > 0 {
        println!(
            "  {} {} rows lost their detail page",
            style("!").yellow(),
            summary.rows_navigation_fault
        );
    }

    for hotel in &output.listings {
        let price = match hotel.price_numeric {
            Some(price) => format!("{} {:.0}", hotel.currency, price),
            None => "-".to_string(),
        };
        let rating = hotel
            .rating_numeric
            .map(|r| format!("{:.1}", r))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} {} {} rating {} sentiment {:.2}",
            style("•").dim(),
            style(&hotel.hotel_name).cyan(),
            price,
            rating,
            hotel.avg_sentiment_score.unwrap_or(0.0)
        );
    }
}

fn print_outputs(format: OutputFormat, paths: &OutputPaths, has_reviews: bool) {
    if format.includes_csv() {
        println!("  Hotels CSV: {}", paths.hotels_csv.display());
        if has_reviews {
            println!("  Reviews CSV: {}", paths.reviews_csv.display());
        }
    }
    if format.includes_json() {
        println!("  Hotels JSON: {}", paths.hotels_json.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const LISTING: &str = "https://hotels.test/list?checkin=08022025&checkout=08032025";

    #[test]
    fn replay_keeps_limits_and_drops_waits() {
        let settings = ScrapeSettings {
            max_rows: 4,
            target_reviews: 3,
            ..ScrapeSettings::default()
        };
        let replay = replay_settings(&settings);
        assert_eq!(replay.timings, Timings::instant());
        assert_eq!(replay.max_rows, 4);
        assert_eq!(replay.target_reviews, 3);
        assert_eq!(replay.browser, settings.browser);
    }

    #[tokio::test]
    async fn snapshot_replay_does_not_sleep() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listing.html");
        std::fs::write(
            &path,
            r#"<html><body><div id="Listing_hotel_0">
                 <p id="hlistpg_hotel_name">Kolkata Residency</p>
                 <a class="hotel__link" href="/hotel-details/0">Details</a>
               </div></body></html>"#,
        )
        .unwrap();

        let settings = ScrapeSettings::default();
        let params = RunParams {
            url: LISTING.to_string(),
            max_rows: 5,
            delay: std::time::Duration::ZERO,
            harvest_details: true,
            interactive: false,
            today: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        };

        let start = std::time::Instant::now();
        let output = scrape_snapshot(&path, &settings, &params).await.unwrap();

        assert_eq!(output.listings.len(), 1);
        assert_eq!(output.listings[0].hotel_name, "Kolkata Residency");
        // The detail page is not in the snapshot; retries must not wait.
        assert!(start.elapsed() < std::time::Duration::from_secs(5));
    }
}
