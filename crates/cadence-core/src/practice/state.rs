//! Practice State - The per-(learner, item) scheduling record
//!
//! Each state represents one learner's progress on one item with:
//! - SM-2 scheduling fields (repetitions, ease factor, interval)
//! - The next review timestamp
//! - An append-only review history used for trends and streaks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{Result, ValidationError};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Ease factor assigned to a freshly created item
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Ease factor floor; no update ever goes below this
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Longest interval a state may hold or an update may produce (100 years)
pub const MAX_INTERVAL_DAYS: i32 = 36_500;

/// Largest repetition count a state may hold; updates saturate here
pub const MAX_REPETITIONS: i32 = 100_000;

/// Highest quality rating on the SM-2 scale
const MAX_QUALITY: i32 = 5;

/// Standard deviation of qualities that maps to a consistency score of zero
const CONSISTENCY_SPREAD: f64 = 2.5;

// ============================================================================
// QUALITY RATING
// ============================================================================

/// Recall quality on the 0-5 SM-2 scale (0 = total failure, 5 = perfect).
///
/// Only constructible through validated conversions, so an in-hand
/// `QualityRating` is always in domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "u8")]
pub struct QualityRating(u8);

impl QualityRating {
    /// Validate and wrap a raw rating
    pub fn new(value: i32) -> Result<Self> {
        if (0..=MAX_QUALITY).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::QualityOutOfRange(value))
        }
    }

    /// Raw value in 0..=5
    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    /// A lapse is any rating below 3
    #[inline]
    pub fn is_lapse(self) -> bool {
        self.0 < 3
    }
}

impl TryFrom<i32> for QualityRating {
    type Error = ValidationError;

    fn try_from(value: i32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<QualityRating> for u8 {
    fn from(rating: QualityRating) -> Self {
        rating.0
    }
}

impl std::fmt::Display for QualityRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// FEEDBACK
// ============================================================================

/// The four answer buttons shown to a learner.
///
/// The mapping onto [`QualityRating`] is fixed: forgot=0, hard=3, good=4,
/// easy=5. Ratings 1 and 2 are never produced from a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    /// Could not recall the item
    Forgot,
    /// Recalled with serious difficulty
    Hard,
    /// Recalled after some hesitation
    Good,
    /// Recalled instantly
    Easy,
}

impl Feedback {
    /// Fixed label to rating table
    pub fn quality(self) -> QualityRating {
        match self {
            Feedback::Forgot => QualityRating(0),
            Feedback::Hard => QualityRating(3),
            Feedback::Good => QualityRating(4),
            Feedback::Easy => QualityRating(5),
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::Forgot => "forgot",
            Feedback::Hard => "hard",
            Feedback::Good => "good",
            Feedback::Easy => "easy",
        }
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Feedback {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "forgot" => Ok(Feedback::Forgot),
            "hard" => Ok(Feedback::Hard),
            "good" => Ok(Feedback::Good),
            "easy" => Ok(Feedback::Easy),
            _ => Err(ValidationError::UnknownFeedback(s.to_string())),
        }
    }
}

// ============================================================================
// REVIEW HISTORY
// ============================================================================

/// One past review of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEntry {
    /// When the review happened
    pub date: DateTime<Utc>,
    /// Quality rating given (0-5)
    pub quality: u8,
    /// How long the learner took to answer
    pub response_time_ms: u64,
}

impl ReviewEntry {
    /// Create a history entry for a rated review
    pub fn new(date: DateTime<Utc>, quality: QualityRating, response_time_ms: u64) -> Self {
        Self {
            date,
            quality: quality.value(),
            response_time_ms,
        }
    }

    /// Whether the item was retained on this review
    pub fn is_success(&self) -> bool {
        self.quality >= 3
    }
}

// ============================================================================
// PRACTICE STATE
// ============================================================================

/// Scheduling state for one learner on one item.
///
/// Owned by the caller and passed by value through the engine. The integer
/// fields are signed so that negative values coming from callers can be
/// detected and rejected by [`PracticeState::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeState {
    /// Identifier of the item being practised
    pub item_id: String,
    /// Consecutive successful recalls since the last lapse
    pub repetitions: i32,
    /// Difficulty multiplier governing interval growth (>= 1.3)
    pub ease_factor: f64,
    /// Current scheduled gap in days (>= 1)
    pub interval: i32,
    /// When the item is next due
    pub next_review_date: DateTime<Utc>,
    /// Append-only review log, oldest first
    #[serde(default)]
    pub review_history: Vec<ReviewEntry>,
}

impl PracticeState {
    /// Fresh state for an item studied for the first time, due immediately
    pub fn new(item_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            item_id: item_id.into(),
            repetitions: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            interval: 1,
            next_review_date: now,
            review_history: Vec::new(),
        }
    }

    /// Reject states a caller could not legitimately hold
    pub fn validate(&self) -> Result<()> {
        if self.item_id.trim().is_empty() {
            return Err(ValidationError::EmptyItemId);
        }
        if self.repetitions < 0 {
            return Err(ValidationError::NegativeRepetitions(self.repetitions));
        }
        if self.repetitions > MAX_REPETITIONS {
            return Err(ValidationError::TooManyRepetitions(self.repetitions));
        }
        if self.interval < 1 {
            return Err(ValidationError::IntervalTooSmall(self.interval));
        }
        if self.interval > MAX_INTERVAL_DAYS {
            return Err(ValidationError::IntervalTooLarge(self.interval));
        }
        if !self.ease_factor.is_finite() || self.ease_factor < MIN_EASE_FACTOR {
            return Err(ValidationError::InvalidEaseFactor(self.ease_factor));
        }
        if let Some(bad) = self
            .review_history
            .iter()
            .find(|entry| i32::from(entry.quality) > MAX_QUALITY)
        {
            return Err(ValidationError::QualityOutOfRange(i32::from(bad.quality)));
        }
        Ok(())
    }

    /// Append a review to the history
    pub fn push_review(&mut self, entry: ReviewEntry) {
        self.review_history.push(entry);
    }

    /// Date of the most recent review, if any
    pub fn last_review_date(&self) -> Option<DateTime<Utc>> {
        self.review_history.last().map(|entry| entry.date)
    }

    /// Number of recorded reviews
    pub fn total_reviews(&self) -> usize {
        self.review_history.len()
    }

    /// Whether the item has been reviewed at least once
    pub fn has_history(&self) -> bool {
        !self.review_history.is_empty()
    }

    /// Whether the item is due at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_date <= now
    }

    /// Mean quality over the whole history (0.0 when empty)
    pub fn average_quality(&self) -> f64 {
        mean(self.review_history.iter().map(|e| f64::from(e.quality)))
    }

    /// Mean response time over the whole history (0.0 when empty)
    pub fn average_response_time_ms(&self) -> f64 {
        mean(self.review_history.iter().map(|e| e.response_time_ms as f64))
    }

    /// Fraction of reviews with quality >= 3 (0.0 when empty)
    pub fn success_rate(&self) -> f64 {
        if self.review_history.is_empty() {
            return 0.0;
        }
        let successes = self.review_history.iter().filter(|e| e.is_success()).count();
        successes as f64 / self.review_history.len() as f64
    }

    /// Consistency of recall quality in `[0, 1]`, 1 = perfectly consistent.
    ///
    /// Derived from the population standard deviation of qualities; fewer
    /// than two reviews count as perfectly consistent.
    pub fn consistency_score(&self) -> f64 {
        if self.review_history.len() < 2 {
            return 1.0;
        }
        let avg = self.average_quality();
        let variance = mean(
            self.review_history
                .iter()
                .map(|e| (f64::from(e.quality) - avg).powi(2)),
        );
        (1.0 - variance.sqrt() / CONSISTENCY_SPREAD).clamp(0.0, 1.0)
    }

    /// Hours elapsed since the last review, if any
    pub fn hours_since_last_review(&self, now: DateTime<Utc>) -> Option<f64> {
        self.last_review_date()
            .map(|last| (now - last).num_seconds() as f64 / 3600.0)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

// ============================================================================
// TESTS
// ============================================================================
