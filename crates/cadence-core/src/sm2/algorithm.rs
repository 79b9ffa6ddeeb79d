//! SM-2 core formulas

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::practice::{MAX_INTERVAL_DAYS, MAX_REPETITIONS, MIN_EASE_FACTOR, QualityRating};

/// Interval after the second consecutive success
const SECOND_INTERVAL: i32 = 6;

/// Updated ease factor for a rating, never below [`MIN_EASE_FACTOR`].
pub fn next_ease_factor(ease_factor: f64, quality: QualityRating) -> f64 {
    let distance = 5.0 - f64::from(quality.value());
    let delta = 0.1 - distance * (0.08 + distance * 0.02);
    (ease_factor + delta).max(MIN_EASE_FACTOR)
}

/// Interval (days) and repetition count after a review.
///
/// `new_ease_factor` is the already-updated ease factor. The interval is
/// capped at [`MAX_INTERVAL_DAYS`] and repetitions at [`MAX_REPETITIONS`].
pub fn next_interval(
    repetitions: i32,
    interval: i32,
    new_ease_factor: f64,
    quality: QualityRating,
) -> (i32, i32) {
    if quality.is_lapse() {
        return (1, 0);
    }
    let repetitions = repetitions.saturating_add(1).min(MAX_REPETITIONS);
    let interval = match repetitions {
        1 => 1,
        2 => SECOND_INTERVAL,
        _ => clamp_interval(f64::from(interval) * new_ease_factor),
    };
    (interval, repetitions)
}

/// Round a day count into `1..=MAX_INTERVAL_DAYS`
pub(crate) fn clamp_interval(days: f64) -> i32 {
    if days.is_nan() {
        return 1;
    }
    days.round().clamp(1.0, f64::from(MAX_INTERVAL_DAYS)) as i32
}

/// `now` plus `interval` days, `None` past the calendar's range
pub fn checked_review_date(now: DateTime<Utc>, interval: i32) -> Option<DateTime<Utc>> {
    now.checked_add_signed(Duration::days(i64::from(interval)))
}

/// Retention estimate via exponential decay past the scheduled interval.
///
/// Reviews on or before the due date are treated as fully retained.
pub fn estimate_retention(days_since_review: f64, interval: i32, ease_factor: f64) -> f64 {
    let interval = f64::from(interval.max(1));
    let overdue = (days_since_review - interval).max(0.0);
    (-overdue / (interval * ease_factor)).exp().clamp(0.0, 1.0)
}

/// Consecutive days with review activity, counted backwards from `today`.
///
/// A missing review today does not break the streak; any earlier gap does.
pub fn streak_from_dates(dates: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut day = today;
    if !dates.contains(&day) {
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => return 0,
        }
    }

    let mut streak = 0;
    while dates.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

// ============================================================================
// TESTS
// ============================================================================
