//! # Cadence Core
//!
//! Adaptive spaced-repetition scheduling engine. Decides when a learner
//! should next see a previously studied item:
//!
//! - **SM-2 Base Scheduler**: ease factor, repetitions and interval from a
//!   0-5 recall quality, plus due selection, forecasting and streaks
//! - **Contextual Adjuster**: ordered chain of interval multipliers (pace,
//!   competency trend, cramming, transfer, flow state, response time,
//!   fatigue, content affinity) with a confidence score and recommendations
//! - **Training Telemetry**: one feature record per contextual review,
//!   buffered and flushed in batches for offline model training
//! - **Adaptive Dispatcher**: picks the contextual or base path per review
//!   and absorbs every collaborator failure into a fallback
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cadence_core::prelude::*;
//!
//! let telemetry = Arc::new(TelemetryCollector::new(1000, Arc::new(DiscardSink)));
//! let dispatcher = AdaptiveDispatcher::new(telemetry);
//!
//! let state = BaseScheduler::new().create_item("capital-of-peru");
//! let result = dispatcher
//!     .schedule_review(ScheduleInput::new(state, Feedback::Good))
//!     .await?;
//! assert_eq!(result.method(), ScheduleMethod::Base);
//! ```
//!
//! ## Feature Flags
//!
//! - `http-remote` (default): HTTP implementation of the remote scheduling call

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod contextual;
pub mod dispatch;
pub mod practice;
pub mod sm2;
pub mod telemetry;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Practice types
pub use practice::{
    Competency, CompetencyTrend, ContentType, DEFAULT_EASE_FACTOR, DeviceType, EmotionalState,
    Feedback, ItemMetadata, LearnerProfile, LearningPace, MAX_INTERVAL_DAYS, MAX_REPETITIONS,
    MIN_EASE_FACTOR, PracticeState, QualityRating, Result, ReviewContext, ReviewEntry,
    SessionStats, ValidationError,
};

// SM-2 base algorithm
pub use sm2::{
    BaseScheduler, DailyForecast, ReviewResult,
    // Core functions for advanced usage
    checked_review_date, estimate_retention, next_ease_factor, next_interval, streak_from_dates,
};

// Contextual engine
pub use contextual::{
    AppliedFactor, ContextualAdjuster, EnrichedResult, FactorKind, InMemorySimilarity,
    STANDARD_REASON, SimilarItem, SimilarityError, SimilarityLookup, SimilarityQuery, TimeWindow,
};

// Telemetry
pub use telemetry::{
    ChannelSink, DiscardSink, JsonlFileSink, TelemetryCollector, TelemetryError, TelemetrySink,
    TrainingFeatures, TrainingOutcome, TrainingRecord,
};

// Dispatcher
pub use dispatch::{
    AdaptiveDispatcher, BASE_PATH_CONFIDENCE, DispatchPath, DispatchStats, FallbackReason,
    RemoteContext, RemoteError, RemoteRequest, RemoteResponse, RemoteResult, RemoteScheduler,
    ScheduleInput, ScheduleMethod, UnifiedResult,
};

#[cfg(feature = "http-remote")]
#[cfg_attr(docsrs, doc(cfg(feature = "http-remote")))]
pub use dispatch::HttpRemoteScheduler;

// Configuration
pub use config::EngineConfig;

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        AdaptiveDispatcher, BaseScheduler, DiscardSink, EngineConfig, EnrichedResult, Feedback,
        FallbackReason, ItemMetadata, LearnerProfile, PracticeState, Result, ReviewContext,
        ScheduleInput, ScheduleMethod, TelemetryCollector, UnifiedResult, ValidationError,
    };
}
