//! End-to-end run over an offline fixture site.

use std::time::Duration;

use chrono::NaiveDate;

use tourpulse::browser::{SnapshotController, SnapshotSite};
use tourpulse::config::ScrapeSettings;
use tourpulse::models::{ListingRecord, ReviewRecord};
use tourpulse::sink::{self, OutputFormat, OutputPaths};
use tourpulse::{run, RunParams};

const LISTING: &str = "https://hotels.test/hotels/kolkata?checkin=08022025&checkout=08032025";

const REVIEWS: [&str; 6] = [
    "Excellent location right next to the metro station",
    "Rooms were clean and the beds very comfortable",
    "Breakfast spread was great with plenty of local dishes",
    "Staff were friendly and helpful with our late check-in",
    "Quiet neighbourhood, would recommend for families",
    "Noisy corridor and a dirty bathroom on arrival",
];

fn row(position: usize, name: &str, price: &str, body: &str) -> String {
    format!(
        r#"<div id="Listing_hotel_{position}">
             <p id="hlistpg_hotel_name">{name}</p>
             <span id="hlistpg_hotel_user_rating">4.{position}</span>
             <span id="hlistpg_hotel_reviews_count">({position},210 Ratings)</span>
             <span id="hlistpg_hotel_shown_price">{price}</span>
             <span id="hlistpg_hotel_star_rating" data-content="***"></span>
             <p class="pc__html">Park Street | 800 m from Victoria Memorial</p>
             {body}
           </div>"#
    )
}

fn review_card(name: &str, text: &str) -> String {
    format!(
        r#"<div class="review-card">
             <span class="reviewer-name">{name}</span>
             <span class="rating">4.5</span>
             <span class="review-date">Jul 2025</span>
             <p class="review-text">{text}</p>
           </div>"#
    )
}

fn site() -> SnapshotSite {
    let inline: String = REVIEWS[..5]
        .iter()
        .map(|r| format!("<p class='review-text'>{}</p>", r))
        .collect();
    let listing = format!(
        "<html><body>{}{}{}</body></html>",
        row(
            0,
            "Hotel Hindusthan International",
            "₹5,499",
            &format!(
                "<p class='review-text'>{}</p><a class='hotel__link' href='/hotel-details/0'>Details</a>",
                REVIEWS[0]
            ),
        ),
        row(1, "Kolkata Residency", "₹3,250", &inline),
        row(
            2,
            "Blocked Inn",
            "$120",
            "<a class='hotel__link' href='/hotel-details/2'>Details</a>",
        ),
    );
    let overview = r#"<html><body>
          <a data-cy="reviewsTab" href="/hotel-details/0/reviews">Reviews</a>
        </body></html>"#;
    let reviews_page = format!(
        "<html><body>{}{}{}</body></html>",
        review_card("Asha", REVIEWS[1]),
        review_card("Rahul", REVIEWS[5]),
        review_card("Meera", REVIEWS[3]),
    );

    SnapshotSite::new()
        .with_page(LISTING, listing)
        .with_page("https://hotels.test/hotel-details/0", overview)
        .with_page("https://hotels.test/hotel-details/0/reviews", reviews_page)
        .with_page(
            "https://hotels.test/hotel-details/2",
            "<html><body><h1>Please verify you are not a robot</h1></body></html>",
        )
}

fn params() -> RunParams {
    RunParams {
        url: LISTING.to_string(),
        max_rows: 50,
        delay: Duration::from_secs(3),
        harvest_details: true,
        interactive: false,
        today: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
    }
}

fn reviews_of<'a>(reviews: &'a [ReviewRecord], hotel: &ListingRecord) -> Vec<&'a ReviewRecord> {
    reviews
        .iter()
        .filter(|r| r.hotel_id == hotel.hotel_id)
        .collect()
}

#[tokio::test(start_paused = true)]
async fn full_run_over_fixture_site() {
    let mut page = SnapshotController::new(site());
    let output = run(&mut page, &ScrapeSettings::default(), &params()).await;

    let names: Vec<_> = output.listings.iter().map(|l| l.hotel_name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Hotel Hindusthan International", "Kolkata Residency", "Blocked Inn"]
    );
    assert_eq!(output.summary.rows_attempted, 3);
    assert_eq!(output.summary.rows_skipped, 0);
    assert_eq!(output.summary.rows_captcha, 1);

    for hotel in &output.listings {
        assert_eq!(hotel.recent_reviews.len(), 5);
        assert_eq!(hotel.checkin_date, "2025-08-02");
        assert_eq!(hotel.days_ahead, 32);
        assert_eq!(hotel.day_of_week, "Saturday");
        assert_eq!(hotel.season, "Summer");
        assert_eq!(hotel.availability_status, "Available");
        assert_eq!(hotel.star_rating_numeric, Some(3));
        assert_eq!(hotel.landmark, "Victoria Memorial");
    }

    // Inline excerpt plus three from the reviews tab; one placeholder.
    let first = &output.listings[0];
    assert_eq!(first.currency, "INR");
    assert_eq!(first.price_numeric, Some(5499.0));
    assert_eq!(
        first.recent_reviews,
        vec![
            REVIEWS[0],
            REVIEWS[1],
            REVIEWS[5],
            REVIEWS[3],
            "No review available 5"
        ]
    );
    let first_reviews = reviews_of(&output.reviews, first);
    assert_eq!(first_reviews.len(), 5);
    assert_eq!(first_reviews[1].reviewer_name, "Asha");
    assert_eq!(first_reviews[1].review_rating, "4.5");
    assert!(first_reviews
        .iter()
        .all(|r| r.review_sentiment_score == first.avg_sentiment_score));

    let second = &output.listings[1];
    assert_eq!(second.recent_reviews, REVIEWS[..5].to_vec());
    assert_eq!(second.review_count_numeric, Some(1210));
    assert_eq!(second.rating_numeric, Some(4.1));
    assert!(second.avg_sentiment_score.unwrap() > 0.0);

    let blocked = &output.listings[2];
    assert_eq!(blocked.currency, "USD");
    assert_eq!(blocked.price_numeric, Some(120.0));
    assert!(blocked
        .recent_reviews
        .iter()
        .all(|r| r.starts_with("No review available")));
    assert_eq!(blocked.avg_sentiment_score, Some(0.0));

    assert_eq!(output.reviews.len(), 15);
    assert_eq!(page.current_url(), Some(LISTING));
    assert_eq!(page.open_contexts(), 1);
}

#[tokio::test(start_paused = true)]
async fn run_output_is_saved_to_every_format() {
    let mut page = SnapshotController::new(site());
    let mut params = params();
    params.max_rows = 2;
    let output = run(&mut page, &ScrapeSettings::default(), &params).await;

    let dir = tempfile::tempdir().unwrap();
    let paths = OutputPaths {
        hotels_csv: dir.path().join("hotels.csv"),
        hotels_json: dir.path().join("hotels.json"),
        reviews_csv: dir.path().join("reviews.csv"),
    };
    assert!(sink::save(OutputFormat::Both, &paths, &output.listings, &output.reviews).unwrap());

    let json: Vec<ListingRecord> =
        serde_json::from_str(&std::fs::read_to_string(&paths.hotels_json).unwrap()).unwrap();
    let ids: Vec<_> = json.iter().map(|l| l.hotel_id.as_str()).collect();
    let expected: Vec<_> = output.listings.iter().map(|l| l.hotel_id.as_str()).collect();
    assert_eq!(ids, expected);
    assert_eq!(json[0].recent_reviews, output.listings[0].recent_reviews);
    assert_eq!(json[1].price_numeric, Some(3250.0));

    let hotels = csv::Reader::from_path(&paths.hotels_csv)
        .unwrap()
        .records()
        .count();
    assert_eq!(hotels, 2);

    let reviews: Vec<ReviewRecord> = csv::Reader::from_path(&paths.reviews_csv)
        .unwrap()
        .deserialize()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(reviews.len(), output.reviews.len());
    assert_eq!(reviews[1].reviewer_name, "Asha");
    assert_eq!(reviews[4].review_text, "No review available 5");
}

#[tokio::test(start_paused = true)]
async fn unreachable_listing_saves_nothing() {
    let mut page = SnapshotController::new(SnapshotSite::new());
    let output = run(&mut page, &ScrapeSettings::default(), &params()).await;
    assert!(output.listings.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let paths = OutputPaths {
        hotels_csv: dir.path().join("hotels.csv"),
        hotels_json: dir.path().join("hotels.json"),
        reviews_csv: dir.path().join("reviews.csv"),
    };
    assert!(!sink::save(OutputFormat::Both, &paths, &output.listings, &output.reviews).unwrap());
    assert!(!paths.hotels_json.exists());
}
