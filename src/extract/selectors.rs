//! Candidate locator lists for the listing and review pages.
//!
//! Order is priority: site-specific markers first, generic fallbacks last.

use std::sync::LazyLock;

use crate::browser::Locator;

fn css_list(selectors: &[&str]) -> Vec<Locator> {
    selectors.iter().map(|s| Locator::css(*s)).collect()
}

/// Review excerpts inside a listing row.
pub static INLINE_REVIEWS: LazyLock<Vec<Locator>> = LazyLock::new(|| {
    css_list(&[
        ".userReviewCard__text",
        ".ReviewsDisplayCard__text",
        ".ReviewCard__text",
        ".review-text",
        "[data-cy='reviewText']",
        ".review__comment",
        ".review__body",
        ".user-review",
        ".comment-text",
        ".guest-review",
    ])
});

/// Review excerpts on a detail page; one extra generic fallback.
pub static DETAIL_REVIEWS: LazyLock<Vec<Locator>> = LazyLock::new(|| {
    let mut list = INLINE_REVIEWS.clone();
    list.push(Locator::css(".review-content"));
    list
});

pub static HIGHLIGHTS: LazyLock<Vec<Locator>> = LazyLock::new(|| {
    css_list(&[
        ".tag__item",
        ".highlightTag",
        ".reviewHighlight",
        ".review-tag",
        "[data-cy='reviewHighlight']",
        ".review__tag",
        ".amenity-tag",
        ".guest-review__tag",
    ])
});

/// Links from a listing row to the hotel's review or detail page.
pub static DETAIL_LINKS: LazyLock<Vec<Locator>> = LazyLock::new(|| {
    css_list(&[
        "a[href*='reviews']",
        "[data-cy='reviewsButton']",
        "[data-testid='view-all-reviews']",
        ".btn__review",
        "a[href*='hotel-details']",
        ".hotel__link",
        "[data-cy='hotelNameLink']",
        ".listing__hotel-link",
    ])
});

pub static REVIEWS_TAB: LazyLock<Vec<Locator>> = LazyLock::new(|| {
    css_list(&[
        "[data-cy='reviewsTab']",
        ".tab__reviews",
        "a[href*='reviews']",
        ".reviews__tab",
        "[data-testid='reviews-tab']",
        ".btn--reviews",
        ".nav__reviews",
        ".hotel-reviews__tab",
    ])
});

pub static LOAD_MORE: LazyLock<Vec<Locator>> = LazyLock::new(|| {
    css_list(&[
        ".show-more-reviews",
        "[data-cy='showMoreReviews']",
        ".load-more",
        ".btn--load-more",
        "[data-testid='load-more-reviews']",
        ".more-reviews",
        ".showMoreReviews",
        ".loadMoreReviews",
    ])
});

pub static REVIEW_RATING: LazyLock<Vec<Locator>> = LazyLock::new(|| {
    css_list(&[
        ".rating",
        ".star-rating",
        "[data-cy='rating']",
        ".review__rating",
        "[data-testid='rating']",
        ".rating__value",
        ".review-score",
        ".guest-rating",
    ])
});

pub static REVIEW_DATE: LazyLock<Vec<Locator>> = LazyLock::new(|| {
    css_list(&[
        ".date",
        ".review-date",
        "[data-cy='review-date']",
        ".review__date",
        "[data-testid='review-date']",
        ".posted__date",
        ".review-posted-date",
    ])
});

pub static REVIEWER_NAME: LazyLock<Vec<Locator>> = LazyLock::new(|| {
    css_list(&[
        ".reviewer-name",
        ".user-name",
        "[data-cy='reviewer-name']",
        ".review__author",
        "[data-testid='reviewer-name']",
        ".author__name",
        ".guest-name",
    ])
});

pub static HELPFUL_COUNT: LazyLock<Vec<Locator>> = LazyLock::new(|| {
    css_list(&[
        ".helpful-count",
        ".vote-count",
        "[data-cy='helpful-count']",
        ".review__helpful",
        "[data-testid='helpful-count']",
        ".helpful__count",
        ".helpful-votes",
    ])
});

/// Parent of the current scope, where review metadata lives.
pub static PARENT: LazyLock<Vec<Locator>> = LazyLock::new(|| vec![Locator::path("./..")]);

pub static HOTEL_NAME: LazyLock<Vec<Locator>> =
    LazyLock::new(|| vec![Locator::id("hlistpg_hotel_name")]);

pub static USER_RATING: LazyLock<Vec<Locator>> =
    LazyLock::new(|| vec![Locator::id("hlistpg_hotel_user_rating")]);

pub static REVIEW_COUNT: LazyLock<Vec<Locator>> =
    LazyLock::new(|| vec![Locator::id("hlistpg_hotel_reviews_count")]);

pub static SHOWN_PRICE: LazyLock<Vec<Locator>> =
    LazyLock::new(|| vec![Locator::id("hlistpg_hotel_shown_price")]);

pub static STAR_RATING: LazyLock<Vec<Locator>> =
    LazyLock::new(|| vec![Locator::id("hlistpg_hotel_star_rating")]);

/// Attribute of the star marker holding the star string.
pub const STAR_RATING_ATTR: &str = "data-content";

pub static LOCATION: LazyLock<Vec<Locator>> = LazyLock::new(|| vec![Locator::class("pc__html")]);

/// Page text markers of an anti-bot challenge, matched case-insensitively.
pub const CAPTCHA_MARKERS: &[&str] = &["captcha", "verify you are not a robot", "recaptcha"];

/// Id of the listing row at `position`.
pub fn row_id(position: usize) -> String {
    format!("Listing_hotel_{}", position)
}

fn row_path(position: usize) -> String {
    format!("//*[@id=\"{}\"]", row_id(position))
}

pub fn row(position: usize) -> Vec<Locator> {
    vec![Locator::id(row_id(position)), Locator::path(row_path(position))]
}

/// Rating qualifier ("Excellent"); the two layouts the listing page uses.
pub fn rating_description(position: usize) -> Vec<Locator> {
    let anchor = row_path(position);
    vec![
        Locator::path(format!(
            "{}/a/div/div[1]/div[2]/div[1]/div/div/span[1]",
            anchor
        )),
        Locator::path(format!(
            "{}/a/div/div/div[1]/div[2]/div[2]/div/div/span[2]",
            anchor
        )),
    ]
}

pub fn tax(position: usize) -> Vec<Locator> {
    vec![Locator::path(format!(
        "{}/a/div[1]/div/div[2]/div/div/p[2]",
        row_path(position)
    ))]
}
