//! Harvested reviews.

use serde::{Deserialize, Serialize};

/// Reviewer name used when the page shows none.
pub const ANONYMOUS: &str = "Anonymous";

/// One review of one hotel. Field order is the output column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// `{hotel_id}_review_{ordinal}`.
    pub review_id: String,
    pub reviewer_name: String,
    pub review_text: String,
    pub review_rating: String,
    pub review_date: String,
    pub review_helpful_count: String,
    pub hotel_id: String,
    /// Hotel-level average, shared by every review of the hotel.
    pub review_sentiment_score: Option<f64>,
}

impl ReviewRecord {
    pub fn new(hotel_id: &str, ordinal: usize, text: impl Into<String>) -> Self {
        Self {
            review_id: format!("{}_review_{}", hotel_id, ordinal),
            reviewer_name: ANONYMOUS.to_string(),
            review_text: text.into(),
            review_rating: String::new(),
            review_date: String::new(),
            review_helpful_count: String::new(),
            hotel_id: hotel_id.to_string(),
            review_sentiment_score: None,
        }
    }

    /// Backfill record for the `ordinal`-th missing review.
    pub fn placeholder(hotel_id: &str, ordinal: usize) -> Self {
        Self::new(hotel_id, ordinal, super::placeholder_text(ordinal))
    }

    pub fn is_placeholder(&self) -> bool {
        super::is_placeholder(&self.review_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_review_defaults_to_anonymous() {
        let review = ReviewRecord::new("hotel_0_1700000000", 3, "Spacious rooms and a quiet street");
        assert_eq!(review.review_id, "hotel_0_1700000000_review_3");
        assert_eq!(review.reviewer_name, "Anonymous");
        assert_eq!(review.hotel_id, "hotel_0_1700000000");
        assert!(!review.is_placeholder());
    }

    #[test]
    fn placeholder_text_matches_ordinal() {
        let review = ReviewRecord::placeholder("h", 4);
        assert_eq!(review.review_text, "No review available 4");
        assert_eq!(review.review_id, "h_review_4");
        assert!(review.is_placeholder());
    }
}
