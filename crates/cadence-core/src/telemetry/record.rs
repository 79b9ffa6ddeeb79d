//! Training Records
//!
//! Immutable snapshots of the numeric features known at review time plus the
//! observed outcome.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::practice::{
    ContentType, EmotionalState, Feedback, ItemMetadata, PracticeState, ReviewContext,
    ReviewEntry,
};

/// Reviews per window when computing the trend direction
pub const TREND_WINDOW: usize = 5;

/// Mean-quality difference that counts as a trend
const TREND_THRESHOLD: f64 = 0.5;

/// Minimum history length before a trend is reported
const TREND_MIN_REVIEWS: usize = 3;

/// Neutral value for features the caller did not supply
const NEUTRAL_FEATURE: f64 = 0.5;

/// Feature vector captured at review time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingFeatures {
    // ========== Item ==========
    /// Intrinsic difficulty in `[0, 1]`
    pub item_difficulty: f64,
    /// Days since the item was created
    pub item_age_days: f64,
    /// Reviews recorded before this one
    pub item_review_count: u32,
    /// Mean response time before this review
    pub item_avg_response_time_ms: f64,
    /// Presentation modality
    pub content_type: Option<ContentType>,

    // ========== Learner ==========
    /// Overall mastery in `[0, 1]`
    pub user_mastery: f64,
    /// Mastery (0-100) of the competency exercised, if known
    pub competency_level: Option<f64>,
    /// Mean related-competency mastery scaled to `[0, 1]`
    pub cluster_mastery: f64,
    /// slow=0, moderate=1, fast=2
    pub learning_pace: u8,
    /// Modality the learner retains best
    pub preferred_content_type: Option<ContentType>,
    /// Mood signal
    pub emotional_state: Option<EmotionalState>,

    // ========== Timing ==========
    /// Days since the previous review
    pub days_since_last_review: f64,
    /// Hour of day (0-23)
    pub hour_of_day: u32,
    /// Day of week, Monday = 0
    pub day_of_week: u32,

    // ========== Session / history ==========
    /// Items already reviewed in the session
    pub session_position: u32,
    /// Current correct streak
    pub consecutive_correct: u32,
    /// Fraction of prior reviews with quality >= 3
    pub prior_success_rate: f64,
    /// +1 improving, -1 declining, 0 flat or unknown
    pub trend_direction: i8,

    // ========== Scheduling state before the review ==========
    /// Ease factor before the review
    pub current_ease_factor: f64,
    /// Interval before the review
    pub current_interval: i32,
    /// Repetitions before the review
    pub repetition_count: i32,
}

/// Observed outcome of the review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingOutcome {
    /// Quality >= 3
    pub retained: bool,
    /// Quality rating (0-5)
    pub quality: u8,
    /// Response time of this review
    pub response_time_ms: u64,
}

/// One row of training data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRecord {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Learner identifier
    pub user_id: String,
    /// Item identifier
    pub item_id: String,
    /// Inputs
    pub features: TrainingFeatures,
    /// Target
    pub outcome: TrainingOutcome,
    /// When the record was captured
    pub created_at: DateTime<Utc>,
}

impl TrainingRecord {
    /// Derive a record from the pre-review state and the review's signals
    pub fn derive(
        state: &PracticeState,
        feedback: Feedback,
        response_time_ms: u64,
        context: &ReviewContext,
        metadata: Option<&ItemMetadata>,
        now: DateTime<Utc>,
    ) -> Self {
        let quality = feedback.quality();
        let profile = context.profile.as_ref();

        let item_age_days = metadata
            .map(|m| m.created_at)
            .or_else(|| state.review_history.first().map(|e| e.date))
            .map(|created| days_between(created, now))
            .unwrap_or(0.0);
        let days_since_last_review = metadata
            .and_then(|m| m.last_reviewed_at)
            .or_else(|| state.last_review_date())
            .map(|last| days_between(last, now))
            .unwrap_or(0.0);

        let cluster_mastery = context
            .competency_id
            .as_deref()
            .and_then(|id| profile?.average_related_level(id))
            .map(|level| level / 100.0)
            .unwrap_or(NEUTRAL_FEATURE);

        let features = TrainingFeatures {
            item_difficulty: metadata.map(|m| m.difficulty).unwrap_or(NEUTRAL_FEATURE),
            item_age_days,
            item_review_count: metadata
                .map(|m| m.total_reviews)
                .unwrap_or(state.total_reviews() as u32),
            item_avg_response_time_ms: metadata
                .map(|m| m.average_response_time_ms)
                .unwrap_or_else(|| state.average_response_time_ms()),
            content_type: metadata.and_then(|m| m.content_type),
            user_mastery: profile.map(|p| p.overall_mastery).unwrap_or(NEUTRAL_FEATURE),
            competency_level: context.competency().map(|c| c.mastery_level),
            cluster_mastery,
            learning_pace: profile.map(|p| p.pace.ordinal()).unwrap_or(1),
            preferred_content_type: profile.and_then(|p| p.preferred_content_type),
            emotional_state: context.emotional_state,
            days_since_last_review,
            hour_of_day: context.hour_of_day.unwrap_or_else(|| now.hour()),
            day_of_week: now.weekday().num_days_from_monday(),
            session_position: context.session.items_reviewed,
            consecutive_correct: context.session.consecutive_correct,
            prior_success_rate: state.success_rate(),
            trend_direction: trend_direction(&state.review_history),
            current_ease_factor: state.ease_factor,
            current_interval: state.interval,
            repetition_count: state.repetitions,
        };

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: context.user_id.clone(),
            item_id: state.item_id.clone(),
            features,
            outcome: TrainingOutcome {
                retained: !quality.is_lapse(),
                quality: quality.value(),
                response_time_ms,
            },
            created_at: now,
        }
    }
}

/// Compare the mean quality of the last five reviews with the five before.
///
/// Returns +1 when recent reviews beat older ones by more than 0.5, -1 when
/// they trail by more than 0.5, otherwise 0.
///
/// A history shorter than three reviews is flat by definition. In practice
/// the comparison needs an older window, so anything up to [`TREND_WINDOW`]
/// reviews is flat as well and the first non-zero trend appears at six. The
/// three-review rule stays as the explicit short-history contract and only
/// decides the outcome if the window size drops below three.
pub fn trend_direction(history: &[ReviewEntry]) -> i8 {
    if history.len() < TREND_MIN_REVIEWS {
        return 0;
    }
    let recent_start = history.len().saturating_sub(TREND_WINDOW);
    let older_start = recent_start.saturating_sub(TREND_WINDOW);
    let recent = &history[recent_start..];
    let older = &history[older_start..recent_start];
    if older.is_empty() {
        return 0;
    }

    let diff = mean_quality(recent) - mean_quality(older);
    if diff > TREND_THRESHOLD {
        1
    } else if diff < -TREND_THRESHOLD {
        -1
    } else {
        0
    }
}

fn mean_quality(entries: &[ReviewEntry]) -> f64 {
    entries.iter().map(|e| f64::from(e.quality)).sum::<f64>() / entries.len() as f64
}

fn days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    ((later - earlier).num_seconds() as f64 / 86_400.0).max(0.0)
}

// ============================================================================
// TESTS
// ============================================================================
