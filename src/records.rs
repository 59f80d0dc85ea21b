//! Ratings and the generated records handed to storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Characters the stored title column holds.
pub const TITLE_COLUMN_MAX: usize = 255;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid rating {0:?}: expected a decimal such as 4.5")]
pub struct ParseRatingError(String);

/// A property rating with one fractional digit, kept as tenths.
///
/// No range is enforced here; the model is asked for a value out of 5 but may
/// answer anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rating {
    tenths: u32,
}

impl Rating {
    /// Substituted whenever no rating can be extracted.
    pub const FALLBACK: Rating = Rating::from_tenths(45);

    /// Largest value a `decimal(3,1)` column holds.
    pub const COLUMN_MAX: Rating = Rating::from_tenths(999);

    pub const fn from_tenths(tenths: u32) -> Self {
        Self { tenths }
    }
}

impl FromStr for Rating {
    type Err = ParseRatingError;

    /// Parses `<digits>.<digits>`, rounding half up to one fractional digit.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseRatingError(s.to_string());

        let (whole, fraction) = s.trim().split_once('.').ok_or_else(invalid)?;
        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole) || !all_digits(fraction) {
            return Err(invalid());
        }

        let whole: u32 = whole.parse().map_err(|_| invalid())?;
        let mut digits = fraction.bytes().map(|b| u32::from(b - b'0'));
        let tenth = digits.next().unwrap_or(0);
        let round_up = digits.next().is_some_and(|d| d >= 5);

        whole
            .checked_mul(10)
            .and_then(|t| t.checked_add(tenth + u32::from(round_up)))
            .map(Rating::from_tenths)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for Rating {
    type Error = ParseRatingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rating> for String {
    fn from(rating: Rating) -> Self {
        rating.to_string()
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.tenths / 10, self.tenths % 10)
    }
}

/// Generated rating and review for one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingReview {
    pub property_id: i64,
    pub rating: Rating,
    pub review: String,
    pub created_at: DateTime<Utc>,
}

impl RatingReview {
    pub fn new(property_id: i64, rating: Rating, review: String) -> Self {
        Self {
            property_id,
            rating,
            review,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for RatingReview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Review for Property {} - Rating: {}",
            self.property_id, self.rating
        )
    }
}

/// Generated summary for one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySummary {
    pub property_id: i64,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

impl PropertySummary {
    pub fn new(property_id: i64, summary: String) -> Self {
        Self {
            property_id,
            summary,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for PropertySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Summary for propertyID {}", self.property_id)
    }
}

/// A rewritten title and description. Not tied to a property id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewrittenListing {
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl RewrittenListing {
    /// The title is cut to [`TITLE_COLUMN_MAX`] characters.
    pub fn new(title: &str, description: String) -> Self {
        Self {
            title: truncate_chars(title, TITLE_COLUMN_MAX).to_string(),
            description,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for RewrittenListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// First `max` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
