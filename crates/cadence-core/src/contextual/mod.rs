//! Contextual Scheduling Module
//!
//! Adapts the SM-2 interval to the learner and the session:
//! - Ordered multiplier chain (pace, trend, cramming, transfer, flow state,
//!   response time, fatigue, content affinity)
//! - Composite confidence score
//! - Study recommendations and related items to interleave
//!
//! The arithmetic is synchronous. Only the optional similarity lookup
//! suspends, and it is bounded by a timeout with a metadata fallback.

mod adjuster;
mod confidence;
mod factors;
mod similarity;

pub use adjuster::{
    ContextualAdjuster, DEFAULT_TIME_WINDOW, EnrichedResult, STANDARD_REASON, TimeWindow,
    adjustment_reason, recommended_session_length,
};
pub use confidence::{BASE_CONFIDENCE, ConfidenceInputs, confidence_score};
pub use factors::{
    AppliedFactor, CRAMMING_WINDOW_HOURS, FATIGUE_ITEMS, FATIGUE_MINUTES, FactorInputs,
    FactorKind, affinity_multiplier, cramming_multiplier, evaluate as evaluate_factors,
    fatigue_multiplier, flow_multiplier, pace_multiplier, response_time_multiplier,
    transfer_multiplier, trend_multiplier,
};
pub use similarity::{
    InMemorySimilarity, SimilarItem, SimilarityError, SimilarityLookup, SimilarityQuery,
    select_neighbours,
};
