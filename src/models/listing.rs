//! Listing records: one hotel as seen on the listing page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::features::TemporalFeatures;

/// Listing-page availability marker; every scraped row is bookable.
pub const AVAILABLE: &str = "Available";

/// A hotel's listing-page snapshot plus derived features.
///
/// Field order is the output column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub hotel_name: String,
    /// `hotel_{row}_{capture_unix_secs}`.
    pub hotel_id: String,
    pub scrape_timestamp: DateTime<Utc>,
    pub location: String,
    pub landmark: String,
    pub distance_to_landmark: String,
    pub user_rating: String,
    /// Qualifier shown next to the rating ("Excellent").
    pub rating_description: String,
    pub review_count: String,
    /// Star marker string from the listing's `data-content` attribute.
    pub star_rating: String,
    pub recent_reviews: Vec<String>,
    pub review_highlights: Vec<String>,
    /// Shown price with the currency symbol stripped.
    pub price: String,
    pub tax: String,
    pub currency: String,
    pub availability_status: String,
    pub search_date: String,
    pub checkin_date: String,
    pub checkout_date: String,
    pub days_ahead: i64,
    pub day_of_week: String,
    pub season: String,
    pub price_numeric: Option<f64>,
    pub review_count_numeric: Option<i64>,
    pub rating_numeric: Option<f64>,
    pub star_rating_numeric: Option<i64>,
    pub avg_sentiment_score: Option<f64>,
}

impl ListingRecord {
    /// Build the id for the row at `position` captured at `captured_at`.
    pub fn make_id(position: usize, captured_at: DateTime<Utc>) -> String {
        format!("hotel_{}_{}", position, captured_at.timestamp())
    }

    /// Empty record for a row; text fields are filled in by the walker.
    pub fn new(hotel_id: String, scrape_timestamp: DateTime<Utc>, temporal: &TemporalFeatures) -> Self {
        Self {
            hotel_name: String::new(),
            hotel_id,
            scrape_timestamp,
            location: String::new(),
            landmark: String::new(),
            distance_to_landmark: String::new(),
            user_rating: String::new(),
            rating_description: String::new(),
            review_count: String::new(),
            star_rating: String::new(),
            recent_reviews: Vec::new(),
            review_highlights: Vec::new(),
            price: String::new(),
            tax: String::new(),
            currency: String::new(),
            availability_status: AVAILABLE.to_string(),
            search_date: temporal.search_date.clone(),
            checkin_date: temporal.checkin_date.clone(),
            checkout_date: temporal.checkout_date.clone(),
            days_ahead: temporal.days_ahead,
            day_of_week: temporal.day_of_week.clone(),
            season: temporal.season.clone(),
            price_numeric: None,
            review_count_numeric: None,
            rating_numeric: None,
            star_rating_numeric: None,
            avg_sentiment_score: None,
        }
    }

    /// Excerpts that are real reviews rather than backfill markers.
    pub fn valid_reviews(&self) -> impl Iterator<Item = &str> {
        self.recent_reviews
            .iter()
            .map(String::as_str)
            .filter(|r| !super::is_placeholder(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn id_combines_position_and_capture_second() {
        let at = Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap();
        assert_eq!(ListingRecord::make_id(4, at), "hotel_4_1751371200");
    }

    #[test]
    fn new_record_carries_temporal_features_and_availability() {
        let temporal = TemporalFeatures {
            search_date: "2025-07-01".to_string(),
            checkin_date: "2025-08-02".to_string(),
            checkout_date: "2025-08-03".to_string(),
            days_ahead: 32,
            day_of_week: "Saturday".to_string(),
            season: "Summer".to_string(),
        };
        let record = ListingRecord::new("hotel_0_1".to_string(), Utc::now(), &temporal);
        assert_eq!(record.availability_status, "Available");
        assert_eq!(record.days_ahead, 32);
        assert_eq!(record.season, "Summer");
        assert!(record.price_numeric.is_none());
    }

    #[test]
    fn placeholders_are_not_valid_reviews() {
        let mut record =
            ListingRecord::new("h".to_string(), Utc::now(), &TemporalFeatures::default());
        record.recent_reviews = vec![
            "Lovely stay, great breakfast and staff".to_string(),
            "No review available 2".to_string(),
        ];
        assert_eq!(record.valid_reviews().count(), 1);
    }
}
