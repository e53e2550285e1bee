//! Pretty-printed JSON array of hotels.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use super::{RecordSink, SinkError};
use crate::models::{ListingRecord, ReviewRecord};

#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn io_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl RecordSink for JsonSink {
    /// Reviews are nested in each hotel's excerpts; the review table is CSV-only.
    fn write(&self, listings: &[ListingRecord], _reviews: &[ReviewRecord]) -> Result<(), SinkError> {
        let file = File::create(&self.path).map_err(|e| self.io_error(e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, listings)?;
        writer.flush().map_err(|e| self.io_error(e))?;
        info!("Data saved to JSON: {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::fixtures;

    #[test]
    fn json_preserves_nulls_and_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotels.json");
        let mut listing = fixtures::listing();
        listing.landmark = "Salt Lake · Sector V".to_string();

        JsonSink::new(&path).write(&[listing], &[]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Salt Lake · Sector V"));
        assert!(text.contains("\n  {"));

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let hotel = &value[0];
        assert!(hotel["rating_numeric"].is_null());
        assert_eq!(hotel["price_numeric"], 5499.0);
        assert_eq!(hotel["recent_reviews"].as_array().unwrap().len(), 2);
        assert_eq!(hotel["scrape_timestamp"], "2025-07-01T12:00:00Z");

        let name_at = text.find("\"hotel_name\"").unwrap();
        let id_at = text.find("\"hotel_id\"").unwrap();
        assert!(name_at < id_at);
    }

    #[test]
    fn round_trips_into_listing_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotels.json");
        let listing = fixtures::listing();

        JsonSink::new(&path).write(std::slice::from_ref(&listing), &[]).unwrap();

        let parsed: Vec<ListingRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, vec![listing]);
    }
}
