//! Turns raw completion text into ratings, reviews, summaries and rewrites.
//!
//! None of these functions fail. When the call failed or the text lacks the
//! expected structure, a fixed fallback value is returned and the reason is kept
//! in [`Interpreted::fallback`] so callers can tell a real 4.5 from a substitute.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use crate::completion::{Completion, CompletionFailure};
use crate::records::{ParseRatingError, Rating};

pub const FALLBACK_REVIEW: &str = "Default review: This is a great property!";
pub const FALLBACK_SUMMARY: &str = "Error generating summary";

const DESCRIPTION_MARKER: &str = "Description:";

lazy_static! {
    static ref RATING_RE: Regex =
        Regex::new(r"Rating:\s*([0-9]+\.[0-9]+)").expect("rating pattern is valid");
    // Leading whitespace goes with the clause so the surrounding words close up.
    static ref RATING_CLAUSE_RE: Regex =
        Regex::new(r"(?i)\s*rating.*?stars?").expect("rating clause pattern is valid");
}

/// Why a fallback value stands in for a parsed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    Upstream(CompletionFailure),
    NoRatingMarker,
    InvalidRating(ParseRatingError),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Upstream(failure) => write!(f, "completion failed: {}", failure),
            FallbackReason::NoRatingMarker => f.write_str("no \"Rating: <n.n>\" in completion"),
            FallbackReason::InvalidRating(e) => write!(f, "{}", e),
        }
    }
}

/// A value pulled out of a completion, plus why it is a fallback if it is one.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpreted<T> {
    pub value: T,
    pub fallback: Option<FallbackReason>,
}

impl<T> Interpreted<T> {
    fn parsed(value: T) -> Self {
        Self {
            value,
            fallback: None,
        }
    }

    fn fallback(value: T, reason: FallbackReason) -> Self {
        Self {
            value,
            fallback: Some(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleDescription {
    pub title: String,
    pub description: String,
}

impl TitleDescription {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Find `Rating: <n.n>` in the completion, else [`Rating::FALLBACK`].
pub fn extract_rating(completion: &Completion) -> Interpreted<Rating> {
    let text = match completion {
        Completion::Text(text) => text,
        Completion::Failed(failure) => {
            return Interpreted::fallback(
                Rating::FALLBACK,
                FallbackReason::Upstream(failure.clone()),
            )
        }
    };

    let Some(captures) = RATING_RE.captures(text) else {
        return Interpreted::fallback(Rating::FALLBACK, FallbackReason::NoRatingMarker);
    };

    match captures[1].parse::<Rating>() {
        Ok(rating) => Interpreted::parsed(rating),
        Err(e) => Interpreted::fallback(Rating::FALLBACK, FallbackReason::InvalidRating(e)),
    }
}

/// The completion with any "Rating ... stars" clause cut out.
pub fn extract_review(completion: &Completion) -> Interpreted<String> {
    match completion {
        Completion::Text(text) => Interpreted::parsed(strip_rating_clauses(text)),
        Completion::Failed(failure) => Interpreted::fallback(
            FALLBACK_REVIEW.to_string(),
            FallbackReason::Upstream(failure.clone()),
        ),
    }
}

/// The completion verbatim.
pub fn extract_summary(completion: &Completion) -> Interpreted<String> {
    match completion {
        Completion::Text(text) => Interpreted::parsed(text.clone()),
        Completion::Failed(failure) => Interpreted::fallback(
            FALLBACK_SUMMARY.to_string(),
            FallbackReason::Upstream(failure.clone()),
        ),
    }
}

/// Split a rewrite into title and description.
///
/// Prefers the `Description:` marker, then the first `.`; a failed completion
/// leaves the original pair untouched.
pub fn extract_title_description(
    completion: &Completion,
    original_title: &str,
    original_description: &str,
) -> Interpreted<TitleDescription> {
    match completion {
        Completion::Text(text) => Interpreted::parsed(split_title_description(text)),
        Completion::Failed(failure) => Interpreted::fallback(
            TitleDescription::new(original_title, original_description),
            FallbackReason::Upstream(failure.clone()),
        ),
    }
}

fn strip_rating_clauses(text: &str) -> String {
    RATING_CLAUSE_RE.replace_all(text, "").trim().to_string()
}

fn split_title_description(text: &str) -> TitleDescription {
    if let Some((title, description)) = text.split_once(DESCRIPTION_MARKER) {
        return TitleDescription::new(title.trim(), description.trim());
    }

    // The description is whatever follows the title, terminator included.
    tracing::debug!("no {:?} marker, splitting on first sentence", DESCRIPTION_MARKER);
    let title = text.split('.').next().unwrap_or(text);
    TitleDescription::new(title.trim(), text[title.len()..].trim())
}
