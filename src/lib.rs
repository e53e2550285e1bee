//! TourPulse - hotel listing and review acquisition.
//!
//! Walks a hotel search-results page through a [`browser::PageController`],
//! extracts one [`models::ListingRecord`] per row, harvests reviews from the
//! row and the hotel's detail page, derives temporal, numeric and sentiment
//! features, and persists the records through [`sink::RecordSink`]s.

pub mod browser;
pub mod config;
pub mod extract;
pub mod features;
pub mod harvest;
pub mod models;
pub mod pipeline;
pub mod sink;
pub mod walker;

pub use pipeline::{run, RunParams, ScrapeOutput};
