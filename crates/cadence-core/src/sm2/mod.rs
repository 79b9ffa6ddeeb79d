//! SM-2 (SuperMemo 2) Scheduling Module
//!
//! The canonical base algorithm every contextual adjustment starts from.
//! Pure functions, no I/O, total over ratings 0-5 and any prior state.
//! Intervals never exceed 36 500 days.
//!
//! ## Core Formulas:
//! - Ease: EF' = max(1.3, EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02)))
//! - Interval: 1, then 6, then round(I * EF'); any q < 3 resets to 1
//! - Retention: R = exp(-max(0, t - I) / (I * EF))

mod algorithm;
mod scheduler;

pub use algorithm::{
    checked_review_date, estimate_retention, next_ease_factor, next_interval, streak_from_dates,
};
pub(crate) use algorithm::clamp_interval;

pub use scheduler::{BaseScheduler, DailyForecast, ReviewResult};
