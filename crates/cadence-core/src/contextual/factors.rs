//! Interval Multipliers
//!
//! Each factor looks at one signal and returns a multiplier for the base
//! interval. The chain is evaluated in a fixed order and only factors that
//! differ from 1.0 are reported.

use serde::{Deserialize, Serialize};

use crate::practice::{CompetencyTrend, ContentType, LearningPace, SessionStats};

// ============================================================================
// THRESHOLDS
// ============================================================================

/// Reviews closer together than this count as cramming
pub const CRAMMING_WINDOW_HOURS: f64 = 12.0;

/// Session length after which fatigue sets in
pub const FATIGUE_MINUTES: f64 = 30.0;

/// Items per session after which fatigue sets in
pub const FATIGUE_ITEMS: u32 = 20;

const FLOW_EASY_STREAK: u32 = 5;
const FLOW_EASY_DIFFICULTY: f64 = 0.3;
const FLOW_HARD_STREAK: u32 = 2;
const FLOW_HARD_DIFFICULTY: f64 = 0.7;

const FAST_RESPONSE_RATIO: f64 = 0.5;
const SLOW_RESPONSE_RATIO: f64 = 2.0;

// ============================================================================
// TYPES
// ============================================================================

/// Which signal produced a multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FactorKind {
    /// Learner's typical pace
    Pace,
    /// Direction of the exercised competency
    CompetencyTrend,
    /// Reviewing again too soon
    Cramming,
    /// Mastery of related competencies
    Transfer,
    /// Difficulty versus current streak
    FlowState,
    /// Response time versus the item's average
    ResponseTime,
    /// Long or crowded session
    Fatigue,
    /// Content matches the preferred modality
    ContentAffinity,
}

impl std::fmt::Display for FactorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FactorKind::Pace => "pace",
            FactorKind::CompetencyTrend => "competency_trend",
            FactorKind::Cramming => "cramming",
            FactorKind::Transfer => "transfer",
            FactorKind::FlowState => "flow_state",
            FactorKind::ResponseTime => "response_time",
            FactorKind::Fatigue => "fatigue",
            FactorKind::ContentAffinity => "content_affinity",
        };
        write!(f, "{}", name)
    }
}

/// A multiplier that changed the interval, with its explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFactor {
    /// Signal that produced it
    pub kind: FactorKind,
    /// Multiplier applied to the running interval
    pub multiplier: f64,
    /// Human-readable reason
    pub reason: String,
}

/// Signals the chain reads. Every field is optional input already resolved
/// by the adjuster.
#[derive(Debug, Clone, Default)]
pub struct FactorInputs<'a> {
    /// Learner pace, when a profile exists
    pub pace: Option<LearningPace>,
    /// Trend of the exercised competency, when it exists in the profile
    pub competency_trend: Option<CompetencyTrend>,
    /// Hours since the previous review
    pub hours_since_last_review: Option<f64>,
    /// Mean mastery (0-100) of related competencies
    pub related_mastery: Option<f64>,
    /// Session counters
    pub session: Option<&'a SessionStats>,
    /// Item difficulty in `[0, 1]`
    pub difficulty: f64,
    /// Response time of this review
    pub response_time_ms: u64,
    /// Item's average response time (0 = unknown)
    pub average_response_time_ms: f64,
    /// Item modality
    pub content_type: Option<ContentType>,
    /// Modality the learner prefers
    pub preferred_content_type: Option<ContentType>,
}

// ============================================================================
// INDIVIDUAL FACTORS
// ============================================================================

/// fast ×1.3, slow ×0.8, moderate ×1.0
pub fn pace_multiplier(pace: LearningPace) -> f64 {
    match pace {
        LearningPace::Fast => 1.3,
        LearningPace::Slow => 0.8,
        LearningPace::Moderate => 1.0,
    }
}

/// improving ×1.2, declining ×0.7, stable ×1.0
pub fn trend_multiplier(trend: CompetencyTrend) -> f64 {
    match trend {
        CompetencyTrend::Improving => 1.2,
        CompetencyTrend::Declining => 0.7,
        CompetencyTrend::Stable => 1.0,
    }
}

/// ×0.8 when the previous review was less than 12 hours ago
pub fn cramming_multiplier(hours_since_last_review: f64) -> f64 {
    if hours_since_last_review < CRAMMING_WINDOW_HOURS {
        0.8
    } else {
        1.0
    }
}

/// `0.8 + level/100 · 0.4`, i.e. ×0.8 at no related mastery up to ×1.2
pub fn transfer_multiplier(related_mastery: f64) -> f64 {
    0.8 + (related_mastery / 100.0) * 0.4
}

/// Widen intervals for a streak on easy material, narrow them for a losing
/// streak on hard material
pub fn flow_multiplier(session: &SessionStats, difficulty: f64) -> f64 {
    if session.consecutive_correct > FLOW_EASY_STREAK && difficulty < FLOW_EASY_DIFFICULTY {
        1.3
    } else if session.consecutive_wrong > FLOW_HARD_STREAK && difficulty > FLOW_HARD_DIFFICULTY {
        0.7
    } else {
        1.0
    }
}

/// Fast answers (under half the average) ×1.2, slow ones (over double) ×0.85.
/// No average yet means no signal.
pub fn response_time_multiplier(response_time_ms: u64, average_response_time_ms: f64) -> f64 {
    if average_response_time_ms <= 0.0 || !average_response_time_ms.is_finite() {
        return 1.0;
    }
    let ratio = response_time_ms as f64 / average_response_time_ms;
    if ratio < FAST_RESPONSE_RATIO {
        1.2
    } else if ratio > SLOW_RESPONSE_RATIO {
        0.85
    } else {
        1.0
    }
}

/// ×0.9 after 30 minutes or 20 items
pub fn fatigue_multiplier(session: &SessionStats) -> f64 {
    if session.duration_minutes > FATIGUE_MINUTES || session.items_reviewed > FATIGUE_ITEMS {
        0.9
    } else {
        1.0
    }
}

/// ×1.15 when the item is in the learner's preferred modality
pub fn affinity_multiplier(content: ContentType, preferred: ContentType) -> f64 {
    if content == preferred { 1.15 } else { 1.0 }
}

// ============================================================================
// CHAIN
// ============================================================================

/// Evaluate every factor in order and keep the ones that moved the interval
pub fn evaluate(inputs: &FactorInputs<'_>) -> Vec<AppliedFactor> {
    let mut applied = Vec::new();
    let mut push = |kind: FactorKind, multiplier: f64, reason: String| {
        if multiplier != 1.0 {
            applied.push(AppliedFactor {
                kind,
                multiplier,
                reason,
            });
        }
    };

    if let Some(pace) = inputs.pace {
        push(
            FactorKind::Pace,
            pace_multiplier(pace),
            format!("{} learning pace", pace),
        );
    }

    if let Some(trend) = inputs.competency_trend {
        push(
            FactorKind::CompetencyTrend,
            trend_multiplier(trend),
            format!("competency {}", trend),
        );
    }

    if let Some(hours) = inputs.hours_since_last_review {
        push(
            FactorKind::Cramming,
            cramming_multiplier(hours),
            format!("cramming penalty ({:.1}h since last review)", hours),
        );
    }

    if let Some(level) = inputs.related_mastery {
        push(
            FactorKind::Transfer,
            transfer_multiplier(level),
            format!("related competency mastery {:.0}%", level),
        );
    }

    if let Some(session) = inputs.session {
        let flow = flow_multiplier(session, inputs.difficulty);
        let reason = if flow > 1.0 {
            "flow state: material too easy".to_string()
        } else {
            "flow state: material too hard".to_string()
        };
        push(FactorKind::FlowState, flow, reason);
    }

    let speed = response_time_multiplier(inputs.response_time_ms, inputs.average_response_time_ms);
    push(
        FactorKind::ResponseTime,
        speed,
        if speed > 1.0 {
            "fast response".to_string()
        } else {
            "slow response".to_string()
        },
    );

    if let Some(session) = inputs.session {
        push(
            FactorKind::Fatigue,
            fatigue_multiplier(session),
            format!(
                "session fatigue ({:.0} min, {} items)",
                session.duration_minutes, session.items_reviewed
            ),
        );
    }

    if let (Some(content), Some(preferred)) = (inputs.content_type, inputs.preferred_content_type)
    {
        push(
            FactorKind::ContentAffinity,
            affinity_multiplier(content, preferred),
            format!("preferred content type ({})", content),
        );
    }

    applied
}

// ============================================================================
// TESTS
// ============================================================================
