//! Practice module - Core types and data structures
//!
//! Implements the per-item learning model with:
//! - Practice state carrying SM-2 scheduling fields and review history
//! - Feedback labels and quality ratings
//! - Learner, session and item context used by the contextual engine

mod context;
mod state;
mod validation;

pub use context::{
    Competency, CompetencyTrend, ContentType, DeviceType, EmotionalState, ItemMetadata,
    LearnerProfile, LearningPace, ReviewContext, SessionStats,
};
pub use state::{
    DEFAULT_EASE_FACTOR, Feedback, MAX_INTERVAL_DAYS, MAX_REPETITIONS, MIN_EASE_FACTOR,
    PracticeState, QualityRating, ReviewEntry,
};
pub use validation::{Result, ValidationError};
