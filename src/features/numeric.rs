//! Numeric normalization of listing text fields.

use std::sync::LazyLock;

use regex::Regex;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.?\d*").unwrap());

/// Currency symbols that may lead a shown price, with their ISO codes.
const CURRENCY_SYMBOLS: &[(&str, &str)] = &[
    ("₹", "INR"),
    // UTF-8 rupee sign read back as Latin-1
    ("â‚¹", "INR"),
    ("$", "USD"),
    ("€", "EUR"),
    ("£", "GBP"),
];

/// First digit run after removing thousands separators.
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned = text.replace(',', "");
    DIGITS.find(&cleaned)?.as_str().parse().ok()
}

pub fn parse_review_count(text: &str) -> Option<i64> {
    let cleaned = text.replace(',', "");
    DIGITS.find(&cleaned)?.as_str().parse().ok()
}

pub fn parse_rating(text: &str) -> Option<f64> {
    DECIMAL.find(text)?.as_str().parse().ok()
}

/// Character count of the star marker ("****" is 4 stars).
pub fn star_count(marker: &str) -> Option<i64> {
    if marker.is_empty() {
        return None;
    }
    Some(marker.chars().count() as i64)
}

/// Strip a leading currency symbol, returning the bare price and ISO code.
///
/// Without a known symbol the text is returned unchanged with an empty code.
pub fn split_currency(shown: &str) -> (String, String) {
    let shown = shown.trim();
    for (symbol, code) in CURRENCY_SYMBOLS {
        if let Some(rest) = shown.strip_prefix(symbol) {
            return (rest.trim().to_string(), code.to_string());
        }
    }
    (shown.to_string(), String::new())
}

/// Area, landmark and distance parsed from the listing's location line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationInfo {
    pub location: String,
    pub landmark: String,
    pub distance: String,
}

/// Parse `"Area | 1.2 km from Landmark"`.
pub fn parse_location(text: &str) -> LocationInfo {
    let text = text.trim();
    let mut parts = text.split('|');
    let location = parts.next().unwrap_or_default().trim().to_string();

    let Some(detail) = parts.next() else {
        return LocationInfo {
            location,
            ..LocationInfo::default()
        };
    };

    match detail.split_once("from") {
        Some((distance, landmark)) => LocationInfo {
            location,
            distance: distance.trim().to_string(),
            landmark: landmark.trim().to_string(),
        },
        None => LocationInfo {
            location,
            landmark: detail.trim().to_string(),
            distance: String::new(),
        },
    }
}

/// Third space-separated token of the tax line ("+ ₹ 840 taxes & fees" style).
pub fn tax_amount(text: &str) -> String {
    text.split(' ').nth(2).unwrap_or_default().to_string()
}
