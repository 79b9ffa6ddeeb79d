//! Adaptive Dispatcher
//!
//! Entry point for review events. Chooses the contextual engine when enough
//! is known about the learner and the item, otherwise the base algorithm.
//! Collaborator failures never escape: they become a [`FallbackReason`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::remote::{RemoteContext, RemoteError, RemoteRequest, RemoteResult, RemoteScheduler};
use crate::config::EngineConfig;
use crate::contextual::{
    ContextualAdjuster, DEFAULT_TIME_WINDOW, EnrichedResult, STANDARD_REASON,
    SimilarityLookup, recommended_session_length,
};
use crate::practice::{Feedback, ItemMetadata, PracticeState, Result, ReviewContext, ReviewEntry};
use crate::sm2::{BaseScheduler, checked_review_date};
use crate::telemetry::TelemetryCollector;

/// Confidence reported whenever the base algorithm served the review
pub const BASE_PATH_CONFIDENCE: f64 = 0.7;

// ============================================================================
// INPUT / OUTPUT
// ============================================================================

/// One review event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInput {
    /// Current state of the item
    pub state: PracticeState,
    /// Recall label
    pub feedback: Feedback,
    /// Time the learner took to answer
    #[serde(default)]
    pub response_time_ms: u64,
    /// Learner and session signals
    #[serde(default)]
    pub context: Option<ReviewContext>,
    /// Item metadata
    #[serde(default)]
    pub metadata: Option<ItemMetadata>,
}

impl ScheduleInput {
    /// Review with no context attached
    pub fn new(state: PracticeState, feedback: Feedback) -> Self {
        Self {
            state,
            feedback,
            response_time_ms: 0,
            context: None,
            metadata: None,
        }
    }

    /// Builder-style response time
    pub fn with_response_time(mut self, response_time_ms: u64) -> Self {
        self.response_time_ms = response_time_ms;
        self
    }

    /// Builder-style context
    pub fn with_context(mut self, context: ReviewContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Builder-style metadata
    pub fn with_metadata(mut self, metadata: ItemMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Boundary checks on everything the caller supplied
    pub fn validate(&self) -> Result<()> {
        self.state.validate()?;
        if let Some(context) = &self.context {
            context.validate()?;
        }
        if let Some(metadata) = &self.metadata {
            metadata.validate()?;
        }
        Ok(())
    }
}

/// Which algorithm served a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMethod {
    /// Plain SM-2
    Base,
    /// SM-2 with contextual adjustment
    Contextual,
}

impl std::fmt::Display for ScheduleMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleMethod::Base => write!(f, "base"),
            ScheduleMethod::Contextual => write!(f, "contextual"),
        }
    }
}

/// Why the base algorithm served a review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum FallbackReason {
    /// Contextual mode switched off
    Disabled,
    /// No learner profile supplied
    NoProfile,
    /// Profile tracks no competencies
    NoCompetencies,
    /// Item has never been reviewed
    NoPriorReviews,
    /// Remote call failed; carries the error text
    RemoteFailed(String),
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::Disabled => write!(f, "contextual scheduling disabled"),
            FallbackReason::NoProfile => write!(f, "no learner profile"),
            FallbackReason::NoCompetencies => write!(f, "profile has no competencies"),
            FallbackReason::NoPriorReviews => write!(f, "item has no prior reviews"),
            FallbackReason::RemoteFailed(e) => write!(f, "remote scheduling failed: {}", e),
        }
    }
}

/// How the review was served
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum DispatchPath {
    /// Contextual engine, locally or through the remote backend
    Contextual {
        /// Full contextual result
        enriched: EnrichedResult,
        /// True when the remote backend computed it
        remote: bool,
    },
    /// Base algorithm
    Base {
        /// Why contextual scheduling was not used
        reason: FallbackReason,
    },
}

/// Result of [`AdaptiveDispatcher::schedule_review`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedResult {
    /// Updated state with this review appended to its history
    pub state: PracticeState,
    /// Path that served the review
    #[serde(flatten)]
    pub path: DispatchPath,
    /// 0.7 on the base path, otherwise the contextual confidence
    pub confidence: f64,
}

impl UnifiedResult {
    /// Algorithm that served the review
    pub fn method(&self) -> ScheduleMethod {
        match self.path {
            DispatchPath::Contextual { .. } => ScheduleMethod::Contextual,
            DispatchPath::Base { .. } => ScheduleMethod::Base,
        }
    }

    /// Contextual details, if that path served the review
    pub fn enriched(&self) -> Option<&EnrichedResult> {
        match &self.path {
            DispatchPath::Contextual { enriched, .. } => Some(enriched),
            DispatchPath::Base { .. } => None,
        }
    }

    /// Why the base path was used, if it was
    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match &self.path {
            DispatchPath::Base { reason } => Some(reason),
            DispatchPath::Contextual { .. } => None,
        }
    }
}

/// Usage counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchStats {
    /// Reviews served contextually
    pub contextual_count: u64,
    /// Reviews served by the base algorithm
    pub base_count: u64,
    /// All reviews
    pub total_count: u64,
    /// Share of contextual reviews, 0-100
    pub contextual_percentage: f64,
    /// Share of base reviews, 0-100
    pub base_percentage: f64,
    /// Remote calls that failed and fell back
    pub remote_failures: u64,
    /// Current toggle state
    pub contextual_enabled: bool,
    /// Training records waiting for a flush
    pub telemetry_buffered: usize,
    /// Telemetry batches flushed so far
    pub telemetry_flushes: u64,
}

// ============================================================================
// DISPATCHER
// ============================================================================

/// Top-level scheduling service.
///
/// Construct once and share; every method takes `&self`.
pub struct AdaptiveDispatcher {
    base: BaseScheduler,
    adjuster: ContextualAdjuster,
    remote: Option<Arc<dyn RemoteScheduler>>,
    remote_timeout: Duration,
    contextual_enabled: AtomicBool,
    contextual_count: AtomicU64,
    base_count: AtomicU64,
    remote_failures: AtomicU64,
}

impl std::fmt::Debug for AdaptiveDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveDispatcher")
            .field("adjuster", &self.adjuster)
            .field("remote", &self.remote.is_some())
            .field("stats", &self.stats())
            .finish()
    }
}

impl AdaptiveDispatcher {
    /// Dispatcher with default configuration, local contextual engine
    pub fn new(telemetry: Arc<TelemetryCollector>) -> Self {
        Self::with_config(&EngineConfig::default(), telemetry)
    }

    /// Dispatcher honouring `config`; no remote backend is attached
    pub fn with_config(config: &EngineConfig, telemetry: Arc<TelemetryCollector>) -> Self {
        Self {
            base: BaseScheduler::new(),
            adjuster: ContextualAdjuster::with_config(telemetry, config),
            remote: None,
            remote_timeout: config.collaborator_timeout,
            contextual_enabled: AtomicBool::new(config.contextual_enabled),
            contextual_count: AtomicU64::new(0),
            base_count: AtomicU64::new(0),
            remote_failures: AtomicU64::new(0),
        }
    }

    /// Dispatcher honouring `config`, attaching the HTTP backend when
    /// `remote_endpoint` is set
    #[cfg(feature = "http-remote")]
    pub fn from_config(
        config: &EngineConfig,
        telemetry: Arc<TelemetryCollector>,
    ) -> std::result::Result<Self, RemoteError> {
        let dispatcher = Self::with_config(config, telemetry);
        match &config.remote_endpoint {
            Some(endpoint) => {
                let remote =
                    super::remote::HttpRemoteScheduler::new(endpoint, config.collaborator_timeout)?;
                info!(url = remote.url(), "Remote scheduling enabled");
                Ok(dispatcher.with_remote(Arc::new(remote)))
            }
            None => Ok(dispatcher),
        }
    }

    /// Delegate contextual computation to a remote backend
    pub fn with_remote(mut self, remote: Arc<dyn RemoteScheduler>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Attach a similarity collaborator for related items
    pub fn with_similarity(mut self, lookup: Arc<dyn SimilarityLookup>) -> Self {
        self.adjuster = self.adjuster.with_similarity(lookup);
        self
    }

    /// The base scheduler, for deck-level operations
    pub fn base(&self) -> &BaseScheduler {
        &self.base
    }

    /// The contextual engine
    pub fn adjuster(&self) -> &ContextualAdjuster {
        &self.adjuster
    }

    /// Shared telemetry collector
    pub fn telemetry(&self) -> &Arc<TelemetryCollector> {
        self.adjuster.telemetry()
    }

    /// Turn contextual scheduling on or off
    pub fn set_contextual_enabled(&self, enabled: bool) {
        let previous = self.contextual_enabled.swap(enabled, Ordering::Relaxed);
        if previous != enabled {
            info!(enabled, "Contextual scheduling toggled");
        }
    }

    /// Whether contextual scheduling is on
    pub fn is_contextual_enabled(&self) -> bool {
        self.contextual_enabled.load(Ordering::Relaxed)
    }

    /// Schedule one review, timestamped now
    pub async fn schedule_review(&self, input: ScheduleInput) -> Result<UnifiedResult> {
        self.schedule_review_at(input, Utc::now()).await
    }

    /// Schedule one review.
    ///
    /// Only invalid input is an error. Every collaborator failure resolves
    /// to the base path with the failure recorded in the result.
    pub async fn schedule_review_at(
        &self,
        input: ScheduleInput,
        now: DateTime<Utc>,
    ) -> Result<UnifiedResult> {
        input.validate()?;
        let quality = input.feedback.quality();
        let entry = ReviewEntry::new(now, quality, input.response_time_ms);

        let served = match (self.contextual_context(&input), &self.remote) {
            (Err(reason), _) => Err(reason),
            (Ok(context), None) => {
                let enriched = self
                    .adjuster
                    .adjust_at(
                        &input.state,
                        input.feedback,
                        input.response_time_ms,
                        context,
                        input.metadata.as_ref(),
                        now,
                    )
                    .await;
                Ok((enriched, false))
            }
            (Ok(context), Some(remote)) => {
                let outcome = self.call_remote(remote.as_ref(), &input, context).await;
                self.adjuster.record_review(
                    &input.state,
                    input.feedback,
                    input.response_time_ms,
                    context,
                    input.metadata.as_ref(),
                    now,
                );
                let enriched = match outcome {
                    Ok(result) => self.enrich_remote(result, &input, context, now).await,
                    Err(e) => Err(e),
                };
                match enriched {
                    Ok(enriched) => Ok((enriched, true)),
                    Err(e) => {
                        self.remote_failures.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            item_id = %input.state.item_id,
                            error = %e,
                            "Remote scheduling failed, falling back to base algorithm"
                        );
                        Err(FallbackReason::RemoteFailed(e.to_string()))
                    }
                }
            }
        };

        let result = match served {
            Ok((enriched, remote)) => {
                self.contextual_count.fetch_add(1, Ordering::Relaxed);
                let mut state = enriched.apply_to(&input.state);
                state.push_review(entry);
                debug!(
                    item_id = %state.item_id,
                    method = "contextual",
                    remote,
                    interval = state.interval,
                    "Review scheduled"
                );
                UnifiedResult {
                    state,
                    confidence: enriched.confidence_score,
                    path: DispatchPath::Contextual { enriched, remote },
                }
            }
            Err(reason) => {
                self.base_count.fetch_add(1, Ordering::Relaxed);
                let mut state = self.base.update_at(&input.state, quality, now).state;
                state.push_review(entry);
                debug!(
                    item_id = %state.item_id,
                    method = "base",
                    reason = %reason,
                    interval = state.interval,
                    "Review scheduled"
                );
                UnifiedResult {
                    state,
                    confidence: BASE_PATH_CONFIDENCE,
                    path: DispatchPath::Base { reason },
                }
            }
        };
        Ok(result)
    }

    /// Usage counters and telemetry status
    pub fn stats(&self) -> DispatchStats {
        let contextual_count = self.contextual_count.load(Ordering::Relaxed);
        let base_count = self.base_count.load(Ordering::Relaxed);
        let total_count = contextual_count + base_count;
        let percentage = |count: u64| {
            if total_count == 0 {
                0.0
            } else {
                count as f64 / total_count as f64 * 100.0
            }
        };
        let telemetry = self.telemetry();

        DispatchStats {
            contextual_count,
            base_count,
            total_count,
            contextual_percentage: percentage(contextual_count),
            base_percentage: percentage(base_count),
            remote_failures: self.remote_failures.load(Ordering::Relaxed),
            contextual_enabled: self.is_contextual_enabled(),
            telemetry_buffered: telemetry.len(),
            telemetry_flushes: telemetry.flush_count(),
        }
    }

    /// The review context when every contextual precondition holds
    fn contextual_context<'a>(
        &self,
        input: &'a ScheduleInput,
    ) -> std::result::Result<&'a ReviewContext, FallbackReason> {
        if !self.is_contextual_enabled() {
            return Err(FallbackReason::Disabled);
        }
        let context = input.context.as_ref().ok_or(FallbackReason::NoProfile)?;
        let profile = context.profile.as_ref().ok_or(FallbackReason::NoProfile)?;
        if profile.competencies.is_empty() {
            return Err(FallbackReason::NoCompetencies);
        }
        if !input.state.has_history() {
            return Err(FallbackReason::NoPriorReviews);
        }
        Ok(context)
    }

    async fn call_remote(
        &self,
        remote: &dyn RemoteScheduler,
        input: &ScheduleInput,
        context: &ReviewContext,
    ) -> std::result::Result<RemoteResult, RemoteError> {
        let request = RemoteRequest {
            user_id: context.user_id.clone(),
            item_id: input.state.item_id.clone(),
            course_id: context.course_id.clone(),
            competency_id: context.competency_id.clone(),
            feedback: input.feedback,
            response_time_ms: input.response_time_ms,
            context: RemoteContext {
                device_type: context.device_type,
                time_of_day: context.hour_of_day,
            },
        };
        let response = tokio::time::timeout(self.remote_timeout, remote.schedule(request))
            .await
            .map_err(|_| RemoteError::Timeout(self.remote_timeout))??;
        response.into_result()
    }

    /// Remote scheduling fields with locally computed recommendations.
    ///
    /// The next review date is recomputed from the remote interval.
    async fn enrich_remote(
        &self,
        result: RemoteResult,
        input: &ScheduleInput,
        context: &ReviewContext,
        now: DateTime<Utc>,
    ) -> std::result::Result<EnrichedResult, RemoteError> {
        let next_review_date = checked_review_date(now, result.interval).ok_or_else(|| {
            RemoteError::Malformed(format!("interval {} overflows the calendar", result.interval))
        })?;
        let base = self.base.update_at(&input.state, input.feedback.quality(), now);
        let related = self
            .adjuster
            .related_items(&input.state.item_id, input.metadata.as_ref())
            .await;
        let adjustment_reason = if result.adjustment_reason.trim().is_empty() {
            STANDARD_REASON.to_string()
        } else {
            result.adjustment_reason
        };

        Ok(EnrichedResult {
            repetitions: result.repetitions,
            ease_factor: result.ease_factor,
            interval: result.interval,
            next_review_date,
            base_interval: base.state.interval,
            adjustment_reason,
            adjustment_factor: result.adjustment_factor,
            confidence_score: result.confidence,
            should_review_again: base.should_review_again,
            recommended_time_window: DEFAULT_TIME_WINDOW,
            recommended_session_length: recommended_session_length(
                context.profile.as_ref().map(|p| p.pace),
            ),
            related_items_to_review: related,
            factors: Vec::new(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
