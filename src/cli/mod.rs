//! Command-line entry point.

mod scrape;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use tourpulse::config::ScrapeSettings;
use tourpulse::sink::{OutputFormat, OutputPaths};

/// Default log file written next to the outputs.
pub const DEFAULT_LOG_FILE: &str = "tourpulse_scraper.log";

#[derive(Parser, Debug)]
#[command(name = "tourpulse")]
#[command(about = "Hotel listing and review scraper with temporal, numeric and sentiment features")]
#[command(version)]
pub struct Cli {
    /// Listing page URL (checkin/checkout query parameters as MMDDYYYY)
    pub url: String,

    /// Maximum number of listing rows to visit
    #[arg(long)]
    pub max_rows: Option<usize>,

    /// Seconds to pause between rows
    #[arg(long)]
    pub delay: Option<f64>,

    /// Only collect the reviews shown on the listing page
    #[arg(long)]
    pub no_reviews: bool,

    /// Show the browser window (implies --interactive)
    #[arg(long)]
    pub headed: bool,

    /// Pause for a human to solve challenge pages
    #[arg(long)]
    pub interactive: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "both")]
    pub format: OutputFormat,

    /// Hotels CSV output path
    #[arg(long, default_value = "tourpulse_hotels.csv")]
    pub hotels_csv: PathBuf,

    /// Hotels JSON output path
    #[arg(long, default_value = "tourpulse_hotels.json")]
    pub hotels_json: PathBuf,

    /// Reviews CSV output path
    #[arg(long, default_value = "tourpulse_reviews.csv")]
    pub reviews_csv: PathBuf,

    /// Settings file (TOML, or JSON with a .json extension)
    #[arg(short, long, env = "TOURPULSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Replay a saved listing page instead of launching a browser
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Connect to a running browser's DevTools WebSocket URL
    #[arg(long, value_name = "WS_URL")]
    pub remote_browser: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log file path
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Do not write a log file
    #[arg(long, conflicts_with = "log_file")]
    pub no_log_file: bool,
}

impl Cli {
    /// Log file to write, if any.
    pub fn log_path(&self) -> Option<&PathBuf> {
        (!self.no_log_file).then_some(&self.log_file)
    }

    fn output_paths(&self) -> OutputPaths {
        OutputPaths {
            hotels_csv: self.hotels_csv.clone(),
            hotels_json: self.hotels_json.clone(),
            reviews_csv: self.reviews_csv.clone(),
        }
    }

    /// Resolve settings: defaults, then the settings file, then the environment, then flags.
    async fn settings(&self) -> anyhow::Result<ScrapeSettings> {
        let base = match &self.config {
            Some(path) => ScrapeSettings::load_from_path(path)
                .await
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => ScrapeSettings::default(),
        };
        let mut settings = base.with_env_overrides();

        if let Some(rows) = self.max_rows {
            settings.max_rows = rows;
        }
        if let Some(delay) = self.delay {
            settings.delay_secs = delay;
        }
        if self.no_reviews {
            settings.harvest_details = false;
        }
        if self.headed {
            settings.browser.headless = false;
        }
        if let Some(url) = &self.remote_browser {
            settings.browser.remote_url = Some(url.clone());
        }
        Ok(settings)
    }
}

/// Run the CLI.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = cli.settings().await?;
    scrape::cmd_scrape(&cli, &settings, &cli.output_paths()).await
}
