//! SM-2 Scheduler
//!
//! Stateless service wrapping the SM-2 formulas with the operations callers
//! need around a deck: item creation, review updates, due selection,
//! prioritisation, forecasting and streaks.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::algorithm;
use crate::practice::{Feedback, PracticeState, QualityRating, Result};

// ============================================================================
// RESULT TYPES
// ============================================================================

/// Outcome of a base SM-2 update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    /// Updated scheduling state (history untouched)
    pub state: PracticeState,
    /// Rating the update was computed from
    pub quality: QualityRating,
    /// Interval the item had before this review
    pub previous_interval: i32,
    /// True on a lapse: the item should be shown again this session
    pub should_review_again: bool,
}

/// Number of items falling due on one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    /// Calendar day (UTC)
    pub date: NaiveDate,
    /// Items due that day
    pub due: usize,
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// SM-2 base scheduler.
///
/// Holds no state; construct once and share by reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseScheduler;

impl BaseScheduler {
    /// Create a new scheduler
    pub fn new() -> Self {
        Self
    }

    /// Fresh state for an item studied for the first time
    pub fn create_item(&self, item_id: impl Into<String>) -> PracticeState {
        self.create_item_at(item_id, Utc::now())
    }

    /// Fresh state, due at `now`
    pub fn create_item_at(&self, item_id: impl Into<String>, now: DateTime<Utc>) -> PracticeState {
        PracticeState::new(item_id, now)
    }

    /// Fixed label to rating table (forgot=0, hard=3, good=4, easy=5)
    pub fn feedback_to_quality(&self, feedback: Feedback) -> QualityRating {
        feedback.quality()
    }

    /// Apply one review to a state, timestamped now
    pub fn update(&self, state: &PracticeState, quality: QualityRating) -> ReviewResult {
        self.update_at(state, quality, Utc::now())
    }

    /// Apply one review to a state.
    ///
    /// The review history is not modified; appending the entry is the
    /// caller's decision since only the caller knows the response time.
    pub fn update_at(
        &self,
        state: &PracticeState,
        quality: QualityRating,
        now: DateTime<Utc>,
    ) -> ReviewResult {
        let ease_factor = algorithm::next_ease_factor(state.ease_factor, quality);
        let (interval, repetitions) =
            algorithm::next_interval(state.repetitions, state.interval, ease_factor, quality);

        let mut next = state.clone();
        next.ease_factor = ease_factor;
        next.repetitions = repetitions;
        next.interval = interval;
        next.next_review_date =
            algorithm::checked_review_date(now, interval).unwrap_or(DateTime::<Utc>::MAX_UTC);

        ReviewResult {
            state: next,
            quality,
            previous_interval: state.interval,
            should_review_again: quality.is_lapse(),
        }
    }

    /// Validate raw input, then apply the review
    pub fn update_checked(
        &self,
        state: &PracticeState,
        raw_quality: i32,
        now: DateTime<Utc>,
    ) -> Result<ReviewResult> {
        state.validate()?;
        let quality = QualityRating::new(raw_quality)?;
        Ok(self.update_at(state, quality, now))
    }

    /// Estimated probability the item is still retained now
    pub fn estimate_retention(&self, state: &PracticeState, last_review: DateTime<Utc>) -> f64 {
        self.estimate_retention_at(state, last_review, Utc::now())
    }

    /// Estimated probability the item is still retained at `now`
    pub fn estimate_retention_at(
        &self,
        state: &PracticeState,
        last_review: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> f64 {
        let days_since = (now - last_review).num_seconds() as f64 / 86_400.0;
        algorithm::estimate_retention(days_since, state.interval, state.ease_factor)
    }

    /// Items due at `now`, highest priority first
    pub fn due_items<'a>(
        &self,
        items: &'a [PracticeState],
        now: DateTime<Utc>,
    ) -> Vec<&'a PracticeState> {
        let mut due: Vec<&PracticeState> = items.iter().filter(|s| s.is_due(now)).collect();
        self.sort_by_priority(&mut due);
        due
    }

    /// Most overdue first; at equal due dates, harder items (lower ease) first
    pub fn sort_by_priority<T: Borrow<PracticeState>>(&self, items: &mut [T]) {
        items.sort_by(|a, b| priority_order(a.borrow(), b.borrow()));
    }

    /// Due counts for the next `days` days starting today
    pub fn forecast(&self, items: &[PracticeState], days: u32) -> Vec<DailyForecast> {
        self.forecast_at(items, days, Utc::now())
    }

    /// Due counts for `days` days starting on `now`'s date.
    ///
    /// Overdue items count towards day 0; items past the horizon are ignored.
    pub fn forecast_at(
        &self,
        items: &[PracticeState],
        days: u32,
        now: DateTime<Utc>,
    ) -> Vec<DailyForecast> {
        let today = now.date_naive();
        let mut forecast: Vec<DailyForecast> = (0..days)
            .filter_map(|offset| today.checked_add_signed(Duration::days(i64::from(offset))))
            .map(|date| DailyForecast { date, due: 0 })
            .collect();

        for item in items {
            let offset = (item.next_review_date.date_naive() - today).num_days().max(0);
            if let Some(slot) = usize::try_from(offset)
                .ok()
                .and_then(|idx| forecast.get_mut(idx))
            {
                slot.due += 1;
            }
        }
        forecast
    }

    /// Consecutive-day review streak across all items, as of today
    pub fn streak(&self, items: &[PracticeState]) -> u32 {
        self.streak_at(items, Utc::now().date_naive())
    }

    /// Consecutive-day review streak across all items, as of `today`
    pub fn streak_at(&self, items: &[PracticeState], today: NaiveDate) -> u32 {
        let dates: HashSet<NaiveDate> = items
            .iter()
            .flat_map(|item| item.review_history.iter())
            .map(|entry| entry.date.date_naive())
            .collect();
        algorithm::streak_from_dates(&dates, today)
    }
}

fn priority_order(a: &PracticeState, b: &PracticeState) -> Ordering {
    a.next_review_date
        .cmp(&b.next_review_date)
        .then_with(|| a.ease_factor.total_cmp(&b.ease_factor))
}

// ============================================================================
// TESTS
// ============================================================================
