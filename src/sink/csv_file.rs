//! Two-file CSV output: hotels and reviews.

use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use serde::Serialize;
use tracing::info;

use super::{RecordSink, SinkError};
use crate::models::{ListingRecord, ReviewRecord};

/// Flat CSV shape of a [`ListingRecord`]; list fields are JSON-encoded.
#[derive(Serialize)]
struct HotelRow<'a> {
    hotel_name: &'a str,
    hotel_id: &'a str,
    scrape_timestamp: String,
    location: &'a str,
    landmark: &'a str,
    distance_to_landmark: &'a str,
    user_rating: &'a str,
    rating_description: &'a str,
    review_count: &'a str,
    star_rating: &'a str,
    recent_reviews: String,
    review_highlights: String,
    price: &'a str,
    tax: &'a str,
    currency: &'a str,
    availability_status: &'a str,
    search_date: &'a str,
    checkin_date: &'a str,
    checkout_date: &'a str,
    days_ahead: i64,
    day_of_week: &'a str,
    season: &'a str,
    price_numeric: Option<f64>,
    review_count_numeric: Option<i64>,
    rating_numeric: Option<f64>,
    star_rating_numeric: Option<i64>,
    avg_sentiment_score: Option<f64>,
}

impl<'a> HotelRow<'a> {
    fn from_record(record: &'a ListingRecord) -> Result<Self, SinkError> {
        Ok(Self {
            hotel_name: &record.hotel_name,
            hotel_id: &record.hotel_id,
            // Same rendering as the serde form used by the JSON sink.
            scrape_timestamp: record
                .scrape_timestamp
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
            location: &record.location,
            landmark: &record.landmark,
            distance_to_landmark: &record.distance_to_landmark,
            user_rating: &record.user_rating,
            rating_description: &record.rating_description,
            review_count: &record.review_count,
            star_rating: &record.star_rating,
            recent_reviews: serde_json::to_string(&record.recent_reviews)?,
            review_highlights: serde_json::to_string(&record.review_highlights)?,
            price: &record.price,
            tax: &record.tax,
            currency: &record.currency,
            availability_status: &record.availability_status,
            search_date: &record.search_date,
            checkin_date: &record.checkin_date,
            checkout_date: &record.checkout_date,
            days_ahead: record.days_ahead,
            day_of_week: &record.day_of_week,
            season: &record.season,
            price_numeric: record.price_numeric,
            review_count_numeric: record.review_count_numeric,
            rating_numeric: record.rating_numeric,
            star_rating_numeric: record.star_rating_numeric,
            avg_sentiment_score: record.avg_sentiment_score,
        })
    }
}

/// Writes hotels to one CSV file and reviews to another.
#[derive(Debug, Clone)]
pub struct CsvSink {
    hotels_path: PathBuf,
    reviews_path: PathBuf,
}

impl CsvSink {
    pub fn new(hotels_path: impl AsRef<Path>, reviews_path: impl AsRef<Path>) -> Self {
        Self {
            hotels_path: hotels_path.as_ref().to_path_buf(),
            reviews_path: reviews_path.as_ref().to_path_buf(),
        }
    }

    fn writer(path: &Path) -> Result<csv::Writer<std::fs::File>, SinkError> {
        let file = std::fs::File::create(path).map_err(|source| SinkError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(csv::Writer::from_writer(file))
    }
}

impl RecordSink for CsvSink {
    fn write(&self, listings: &[ListingRecord], reviews: &[ReviewRecord]) -> Result<(), SinkError> {
        let mut writer = Self::writer(&self.hotels_path)?;
        for record in listings {
            writer.serialize(HotelRow::from_record(record)?)?;
        }
        writer.flush().map_err(|source| SinkError::Io {
            path: self.hotels_path.clone(),
            source,
        })?;
        info!("Data saved to CSV: {}", self.hotels_path.display());

        if reviews.is_empty() {
            return Ok(());
        }

        let mut writer = Self::writer(&self.reviews_path)?;
        for review in reviews {
            writer.serialize(review)?;
        }
        writer.flush().map_err(|source| SinkError::Io {
            path: self.reviews_path.clone(),
            source,
        })?;
        info!("Reviews data saved to CSV: {}", self.reviews_path.display());
        Ok(())
    }
}
