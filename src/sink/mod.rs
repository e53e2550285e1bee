//! Persistence of finished records.

mod csv_file;
mod json_file;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::{ListingRecord, ReviewRecord};

pub use csv_file::CsvSink;
pub use json_file::JsonSink;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Destination for one run's records.
pub trait RecordSink {
    fn write(&self, listings: &[ListingRecord], reviews: &[ReviewRecord]) -> Result<(), SinkError>;
}

/// Which sinks a run writes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
    #[default]
    Both,
}

impl OutputFormat {
    pub fn includes_csv(&self) -> bool {
        matches!(self, Self::Csv | Self::Both)
    }

    pub fn includes_json(&self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }
}

/// Output file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub hotels_csv: PathBuf,
    pub hotels_json: PathBuf,
    pub reviews_csv: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            hotels_csv: PathBuf::from("tourpulse_hotels.csv"),
            hotels_json: PathBuf::from("tourpulse_hotels.json"),
            reviews_csv: PathBuf::from("tourpulse_reviews.csv"),
        }
    }
}

/// Sinks selected by `format`.
pub fn sinks_for(format: OutputFormat, paths: &OutputPaths) -> Vec<Box<dyn RecordSink>> {
    let mut sinks: Vec<Box<dyn RecordSink>> = Vec::new();
    if format.includes_csv() {
        sinks.push(Box::new(CsvSink::new(&paths.hotels_csv, &paths.reviews_csv)));
    }
    if format.includes_json() {
        sinks.push(Box::new(JsonSink::new(&paths.hotels_json)));
    }
    sinks
}

/// Write `listings` and `reviews` to every selected sink.
///
/// Returns `false` without touching the filesystem when there is nothing to save.
pub fn save(
    format: OutputFormat,
    paths: &OutputPaths,
    listings: &[ListingRecord],
    reviews: &[ReviewRecord],
) -> Result<bool, SinkError> {
    if listings.is_empty() {
        warn!("No data to save");
        return Ok(false);
    }
    for sink in sinks_for(format, paths) {
        sink.write(listings, reviews)?;
    }
    Ok(true)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};

    use crate::features::TemporalFeatures;
    use crate::models::{ListingRecord, ReviewRecord};

    pub fn listing() -> ListingRecord {
        let at = Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap();
        let temporal = TemporalFeatures {
            search_date: "2025-07-01".to_string(),
            checkin_date: "2025-08-02".to_string(),
            checkout_date: "2025-08-03".to_string(),
            days_ahead: 32,
            day_of_week: "Saturday".to_string(),
            season: "Summer".to_string(),
        };
        let mut record = ListingRecord::new(ListingRecord::make_id(0, at), at, &temporal);
        record.hotel_name = "Hotel Hindusthan International".to_string();
        record.price = "5,499".to_string();
        record.currency = "INR".to_string();
        record.recent_reviews = vec![
            "Great stay, \"spotless\" rooms".to_string(),
            "No review available 2".to_string(),
        ];
        record.review_highlights = vec!["Clean".to_string()];
        record.price_numeric = Some(5499.0);
        record.avg_sentiment_score = Some(0.5);
        record
    }

    pub fn review(hotel_id: &str) -> ReviewRecord {
        let mut review = ReviewRecord::new(hotel_id, 1, "Great stay, \"spotless\" rooms");
        review.review_sentiment_score = Some(0.5);
        review
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_selects_sinks() {
        let paths = OutputPaths::default();
        assert_eq!(sinks_for(OutputFormat::Csv, &paths).len(), 1);
        assert_eq!(sinks_for(OutputFormat::Json, &paths).len(), 1);
        assert_eq!(sinks_for(OutputFormat::Both, &paths).len(), 2);
    }

    #[test]
    fn empty_listing_set_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths {
            hotels_csv: dir.path().join("hotels.csv"),
            hotels_json: dir.path().join("hotels.json"),
            reviews_csv: dir.path().join("reviews.csv"),
        };
        let review = fixtures::review("hotel_0_1");

        assert!(!save(OutputFormat::Both, &paths, &[], &[review]).unwrap());
        assert!(!paths.hotels_csv.exists());
        assert!(!paths.hotels_json.exists());
        assert!(!paths.reviews_csv.exists());
    }

    #[test]
    fn both_formats_write_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths {
            hotels_csv: dir.path().join("hotels.csv"),
            hotels_json: dir.path().join("hotels.json"),
            reviews_csv: dir.path().join("reviews.csv"),
        };
        let listing = fixtures::listing();
        let review = fixtures::review(&listing.hotel_id);

        assert!(save(OutputFormat::Both, &paths, &[listing], &[review]).unwrap());
        assert!(paths.hotels_csv.exists());
        assert!(paths.hotels_json.exists());
        assert!(paths.reviews_csv.exists());
    }

    #[test]
    fn timestamps_render_identically_in_csv_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths {
            hotels_csv: dir.path().join("hotels.csv"),
            hotels_json: dir.path().join("hotels.json"),
            reviews_csv: dir.path().join("reviews.csv"),
        };
        let mut listing = fixtures::listing();
        listing.scrape_timestamp += chrono::Duration::milliseconds(250);

        save(OutputFormat::Both, &paths, &[listing], &[]).unwrap();

        let mut reader = csv::Reader::from_path(&paths.hotels_csv).unwrap();
        let column = reader
            .headers()
            .unwrap()
            .iter()
            .position(|h| h == "scrape_timestamp")
            .unwrap();
        let row = reader.records().next().unwrap().unwrap();
        let from_csv = row.get(column).unwrap().to_string();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths.hotels_json).unwrap()).unwrap();
        assert_eq!(json[0]["scrape_timestamp"], from_csv.as_str());
        assert_eq!(from_csv, "2025-07-01T12:00:00.250Z");
    }
}
