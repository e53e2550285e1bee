//! Keyword sentiment scoring.

const POSITIVE: &[&str] = &[
    "excellent",
    "amazing",
    "wonderful",
    "fantastic",
    "great",
    "good",
    "nice",
    "clean",
    "comfortable",
    "friendly",
    "helpful",
    "recommend",
    "perfect",
    "beautiful",
    "spacious",
    "convenient",
    "professional",
    "outstanding",
    "love",
    "loved",
    "enjoy",
    "enjoyed",
    "pleasant",
    "satisfied",
];

const NEGATIVE: &[&str] = &[
    "terrible",
    "awful",
    "bad",
    "worst",
    "horrible",
    "dirty",
    "uncomfortable",
    "rude",
    "unhelpful",
    "disappointing",
    "poor",
    "cheap",
    "noisy",
    "smelly",
    "broken",
    "outdated",
    "cramped",
    "overpriced",
    "hate",
    "hated",
    "annoying",
    "disgusting",
    "unacceptable",
    "nightmare",
    "avoid",
];

/// Score `reviews` in [-1, 1].
///
/// Tokens are lowercased whitespace splits matched exactly against the word
/// lists, so punctuation attached to a word prevents a match. The net count
/// is normalized by the total token count and scaled by 10 before clamping.
pub fn sentiment_score<S: AsRef<str>>(reviews: &[S]) -> f64 {
    let mut score: i64 = 0;
    let mut tokens: usize = 0;

    for review in reviews {
        let lowered = review.as_ref().to_lowercase();
        for word in lowered.split_whitespace() {
            tokens += 1;
            if POSITIVE.contains(&word) {
                score += 1;
            } else if NEGATIVE.contains(&word) {
                score -= 1;
            }
        }
    }

    if tokens == 0 {
        return 0.0;
    }
    (score as f64 / tokens as f64 * 10.0).clamp(-1.0, 1.0)
}
