//! Contextual Adjuster
//!
//! Runs the base SM-2 update, then scales the resulting interval by the
//! multiplier chain in [`factors`](super::factors), scores confidence and
//! attaches study recommendations.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::confidence::{ConfidenceInputs, confidence_score};
use super::factors::{self, AppliedFactor, FactorInputs};
use super::similarity::{SimilarityError, SimilarityLookup, SimilarityQuery, select_neighbours};
use crate::config::EngineConfig;
use crate::practice::{Feedback, ItemMetadata, LearningPace, PracticeState, ReviewContext};
use crate::sm2::{BaseScheduler, checked_review_date, clamp_interval};
use crate::telemetry::TelemetryCollector;

/// Reason reported when no multiplier moved the interval
pub const STANDARD_REASON: &str = "standard SM-2";

/// Difficulty assumed for items without metadata
const DEFAULT_DIFFICULTY: f64 = 0.5;

/// Morning study window, `[8, 11)` local hours
pub const DEFAULT_TIME_WINDOW: TimeWindow = TimeWindow {
    start_hour: 8,
    end_hour: 11,
};

// ============================================================================
// RESULT TYPES
// ============================================================================

/// Half-open range of local hours `[start_hour, end_hour)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    /// First hour of the window
    pub start_hour: u32,
    /// First hour after the window
    pub end_hour: u32,
}

impl TimeWindow {
    /// Whether `hour` falls inside the window
    pub fn contains(&self, hour: u32) -> bool {
        (self.start_hour..self.end_hour).contains(&hour)
    }
}

/// Outcome of a contextual review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedResult {
    /// Repetitions after the review
    pub repetitions: i32,
    /// Ease factor after the review
    pub ease_factor: f64,
    /// Adjusted interval in days (>= 1)
    pub interval: i32,
    /// `now + interval`
    pub next_review_date: DateTime<Utc>,
    /// Interval the base algorithm produced before adjustment
    pub base_interval: i32,
    /// Applied reasons joined with "; ", or "standard SM-2"
    pub adjustment_reason: String,
    /// Product of all applied multipliers
    pub adjustment_factor: f64,
    /// Confidence in `[0, 1]`
    pub confidence_score: f64,
    /// True on a lapse
    pub should_review_again: bool,
    /// Suggested time of day for the next session
    pub recommended_time_window: TimeWindow,
    /// Suggested session length in minutes
    pub recommended_session_length: u32,
    /// Items worth interleaving with this one
    pub related_items_to_review: Vec<String>,
    /// Multipliers that changed the interval, in chain order
    #[serde(default)]
    pub factors: Vec<AppliedFactor>,
}

impl EnrichedResult {
    /// `state` with this result's scheduling fields written into it
    pub fn apply_to(&self, state: &PracticeState) -> PracticeState {
        let mut next = state.clone();
        next.repetitions = self.repetitions;
        next.ease_factor = self.ease_factor;
        next.interval = self.interval;
        next.next_review_date = self.next_review_date;
        next
    }
}

/// Session length by pace: fast 30, slow 15, otherwise 20 minutes
pub fn recommended_session_length(pace: Option<LearningPace>) -> u32 {
    match pace {
        Some(LearningPace::Fast) => 30,
        Some(LearningPace::Slow) => 15,
        _ => 20,
    }
}

/// Join reasons, or report the standard algorithm when there are none
pub fn adjustment_reason(factors: &[AppliedFactor]) -> String {
    if factors.is_empty() {
        STANDARD_REASON.to_string()
    } else {
        factors
            .iter()
            .map(|f| f.reason.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// ============================================================================
// ADJUSTER
// ============================================================================

/// Context-aware wrapper around [`BaseScheduler`]
pub struct ContextualAdjuster {
    base: BaseScheduler,
    telemetry: Arc<TelemetryCollector>,
    similarity: Option<Arc<dyn SimilarityLookup>>,
    similarity_limit: usize,
    similarity_threshold: f64,
    fallback_related_items: usize,
    lookup_timeout: Duration,
}

impl std::fmt::Debug for ContextualAdjuster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextualAdjuster")
            .field("telemetry", &self.telemetry)
            .field("similarity", &self.similarity.is_some())
            .field("lookup_timeout", &self.lookup_timeout)
            .finish()
    }
}

impl ContextualAdjuster {
    /// Adjuster with default configuration and no similarity lookup
    pub fn new(telemetry: Arc<TelemetryCollector>) -> Self {
        Self::with_config(telemetry, &EngineConfig::default())
    }

    /// Adjuster using the similarity and timeout settings from `config`
    pub fn with_config(telemetry: Arc<TelemetryCollector>, config: &EngineConfig) -> Self {
        Self {
            base: BaseScheduler::new(),
            telemetry,
            similarity: None,
            similarity_limit: config.similarity_limit,
            similarity_threshold: config.similarity_threshold,
            fallback_related_items: config.fallback_related_items,
            lookup_timeout: config.collaborator_timeout,
        }
    }

    /// Attach a similarity collaborator
    pub fn with_similarity(mut self, lookup: Arc<dyn SimilarityLookup>) -> Self {
        self.similarity = Some(lookup);
        self
    }

    /// Shared telemetry collector
    pub fn telemetry(&self) -> &Arc<TelemetryCollector> {
        &self.telemetry
    }

    /// Full contextual review: compute, look up related items, record
    /// telemetry
    pub async fn adjust(
        &self,
        state: &PracticeState,
        feedback: Feedback,
        response_time_ms: u64,
        context: &ReviewContext,
        metadata: Option<&ItemMetadata>,
    ) -> EnrichedResult {
        self.adjust_at(state, feedback, response_time_ms, context, metadata, Utc::now())
            .await
    }

    /// [`adjust`](Self::adjust) with an explicit clock
    pub async fn adjust_at(
        &self,
        state: &PracticeState,
        feedback: Feedback,
        response_time_ms: u64,
        context: &ReviewContext,
        metadata: Option<&ItemMetadata>,
        now: DateTime<Utc>,
    ) -> EnrichedResult {
        let mut result = self.compute_at(state, feedback, response_time_ms, context, metadata, now);
        result.related_items_to_review = self.related_items(&state.item_id, metadata).await;
        self.record_review(state, feedback, response_time_ms, context, metadata, now);
        result
    }

    /// Synchronous core of the adjustment.
    ///
    /// No I/O and no telemetry; related items come from metadata only.
    pub fn compute_at(
        &self,
        state: &PracticeState,
        feedback: Feedback,
        response_time_ms: u64,
        context: &ReviewContext,
        metadata: Option<&ItemMetadata>,
        now: DateTime<Utc>,
    ) -> EnrichedResult {
        let base = self.base.update_at(state, feedback.quality(), now);
        let profile = context.profile.as_ref();

        let last_review = metadata
            .and_then(|m| m.last_reviewed_at)
            .or_else(|| state.last_review_date());
        let inputs = FactorInputs {
            pace: profile.map(|p| p.pace),
            competency_trend: context.competency().map(|c| c.trend),
            hours_since_last_review: last_review
                .map(|last| (now - last).num_seconds() as f64 / 3600.0),
            related_mastery: context
                .competency_id
                .as_deref()
                .and_then(|id| profile?.average_related_level(id)),
            session: Some(&context.session),
            difficulty: metadata.map(|m| m.difficulty).unwrap_or(DEFAULT_DIFFICULTY),
            response_time_ms,
            average_response_time_ms: metadata.map(|m| m.average_response_time_ms).unwrap_or(0.0),
            content_type: metadata.and_then(|m| m.content_type),
            preferred_content_type: profile.and_then(|p| p.preferred_content_type),
        };
        let applied = factors::evaluate(&inputs);

        let mut adjusted = f64::from(base.state.interval);
        let mut adjustment_factor = 1.0;
        for factor in &applied {
            adjusted *= factor.multiplier;
            adjustment_factor *= factor.multiplier;
        }
        let interval = clamp_interval(adjusted);

        let confidence = confidence_score(&ConfidenceInputs {
            total_reviews: metadata
                .map(|m| m.total_reviews as usize)
                .unwrap_or_else(|| state.total_reviews()),
            consistency_score: metadata
                .map(|m| m.consistency_score)
                .unwrap_or_else(|| state.consistency_score()),
            distractions: context.distractions,
            session_items: context.session.items_reviewed,
            adjustment_factor,
        });

        debug!(
            item_id = %state.item_id,
            base_interval = base.state.interval,
            interval,
            adjustment_factor,
            "Contextual adjustment computed"
        );

        EnrichedResult {
            repetitions: base.state.repetitions,
            ease_factor: base.state.ease_factor,
            interval,
            next_review_date: checked_review_date(now, interval)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            base_interval: base.state.interval,
            adjustment_reason: adjustment_reason(&applied),
            adjustment_factor,
            confidence_score: confidence,
            should_review_again: base.should_review_again,
            recommended_time_window: DEFAULT_TIME_WINDOW,
            recommended_session_length: recommended_session_length(profile.map(|p| p.pace)),
            related_items_to_review: self.fallback_related(metadata),
            factors: applied,
        }
    }

    /// Items to interleave: the similarity lookup when it answers, otherwise
    /// the first few related ids from metadata
    pub async fn related_items(&self, item_id: &str, metadata: Option<&ItemMetadata>) -> Vec<String> {
        let Some(lookup) = &self.similarity else {
            return self.fallback_related(metadata);
        };

        let query = SimilarityQuery {
            item_id: item_id.to_string(),
            limit: self.similarity_limit,
            min_similarity: self.similarity_threshold,
        };
        let outcome = match tokio::time::timeout(self.lookup_timeout, lookup.find_similar(query.clone()))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(SimilarityError::Timeout(self.lookup_timeout)),
        };

        match outcome {
            Ok(items) => select_neighbours(items, &query),
            Err(e) => {
                debug!(item_id, error = %e, "Similarity lookup failed, using item metadata");
                self.fallback_related(metadata)
            }
        }
    }

    /// Append one training record for this review
    pub fn record_review(
        &self,
        state: &PracticeState,
        feedback: Feedback,
        response_time_ms: u64,
        context: &ReviewContext,
        metadata: Option<&ItemMetadata>,
        now: DateTime<Utc>,
    ) {
        self.telemetry
            .record_at(state, feedback, response_time_ms, context, metadata, now);
    }

    fn fallback_related(&self, metadata: Option<&ItemMetadata>) -> Vec<String> {
        metadata
            .map(|m| {
                m.related_item_ids
                    .iter()
                    .take(self.fallback_related_items)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ============================================================================
// TESTS
// ============================================================================
