//! Output records.

mod listing;
mod review;

pub use listing::{ListingRecord, AVAILABLE};
pub use review::{ReviewRecord, ANONYMOUS};

/// Prefix of the backfill markers used when a hotel has too few reviews.
pub const PLACEHOLDER_PREFIX: &str = "No review available";

pub fn placeholder_text(ordinal: usize) -> String {
    format!("{} {}", PLACEHOLDER_PREFIX, ordinal)
}

pub fn is_placeholder(text: &str) -> bool {
    text.starts_with(PLACEHOLDER_PREFIX)
}
