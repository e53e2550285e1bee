//! Temporal features derived from the search URL.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

/// Meteorological season of a month (northern hemisphere).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Self::Winter,
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            _ => Self::Autumn,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Winter => "Winter",
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Autumn => "Autumn",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search-context features shared by every record of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalFeatures {
    pub search_date: String,
    pub checkin_date: String,
    pub checkout_date: String,
    /// Days from the search date to check-in; negative for past dates.
    pub days_ahead: i64,
    pub day_of_week: String,
    pub season: String,
}

impl TemporalFeatures {
    fn undated(today: NaiveDate) -> Self {
        Self {
            search_date: iso(today),
            ..Self::default()
        }
    }
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse an `MMDDYYYY` date.
pub fn parse_mmddyyyy(value: &str) -> Option<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let month = value[0..2].parse().ok()?;
    let day = value[2..4].parse().ok()?;
    let year = value[4..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Derive temporal features from the `checkin`/`checkout` query parameters of `url`.
///
/// Both parameters must be present and valid; anything else yields empty
/// dates and a zero lead time.
pub fn derive_temporal(url: &str, today: NaiveDate) -> TemporalFeatures {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Cannot derive temporal features from {}: {}", url, e);
            return TemporalFeatures::undated(today);
        }
    };

    let param = |name: &str| {
        parsed
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    };

    let (Some(checkin), Some(checkout)) = (param("checkin"), param("checkout")) else {
        return TemporalFeatures::undated(today);
    };

    let (Some(checkin), Some(checkout)) = (parse_mmddyyyy(&checkin), parse_mmddyyyy(&checkout))
    else {
        warn!(
            "Malformed stay dates (checkin={}, checkout={})",
            checkin, checkout
        );
        return TemporalFeatures::undated(today);
    };

    TemporalFeatures {
        search_date: iso(today),
        checkin_date: iso(checkin),
        checkout_date: iso(checkout),
        days_ahead: (checkin - today).num_days(),
        day_of_week: checkin.format("%A").to_string(),
        season: Season::from_month(checkin.month()).to_string(),
    }
}
