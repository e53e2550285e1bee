//! Feature derivation: temporal bucketing, sentiment and numeric normalization.
//!
//! Everything here is a pure function of its inputs.

pub mod numeric;
pub mod sentiment;
pub mod temporal;

pub use numeric::{
    parse_location, parse_price, parse_rating, parse_review_count, split_currency, star_count,
    tax_amount, LocationInfo,
};
pub use sentiment::sentiment_score;
pub use temporal::{derive_temporal, parse_mmddyyyy, Season, TemporalFeatures};

use crate::models::ListingRecord;

/// Fill the derived numeric and sentiment fields of a finished record.
pub fn enrich(record: &mut ListingRecord) {
    record.price_numeric = parse_price(&record.price);
    record.review_count_numeric = parse_review_count(&record.review_count);
    record.rating_numeric = parse_rating(&record.user_rating);
    record.star_rating_numeric = star_count(&record.star_rating);

    let valid: Vec<&str> = record.valid_reviews().collect();
    record.avg_sentiment_score = Some(sentiment_score(&valid));
}
