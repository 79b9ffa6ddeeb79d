//! Confidence score for a contextual schedule

/// Starting point before any adjustment
pub const BASE_CONFIDENCE: f64 = 0.5;

const HISTORY_WEIGHT: f64 = 0.02;
const HISTORY_CAP: f64 = 0.2;
const CONSISTENCY_WEIGHT: f64 = 0.15;
const LOW_DISTRACTION_BONUS: f64 = 0.1;
const LOW_DISTRACTION_LIMIT: u32 = 3;
const SHORT_SESSION_BONUS: f64 = 0.05;
const SHORT_SESSION_LIMIT: u32 = 15;
const LARGE_ADJUSTMENT_PENALTY: f64 = 0.1;
const LARGE_ADJUSTMENT_THRESHOLD: f64 = 0.3;

/// Signals the confidence score is built from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInputs {
    /// Reviews recorded for the item
    pub total_reviews: usize,
    /// Consistency in `[0, 1]`, 1 = perfectly consistent
    pub consistency_score: f64,
    /// Distractions observed this session
    pub distractions: u32,
    /// Items already reviewed this session
    pub session_items: u32,
    /// Product of all applied multipliers
    pub adjustment_factor: f64,
}

/// Composite confidence in `[0, 1]`.
///
/// The consistency term adds `(1 - consistency) · 0.15`: a less consistent
/// item scores higher on it.
pub fn confidence_score(inputs: &ConfidenceInputs) -> f64 {
    let mut score = BASE_CONFIDENCE;

    score += (inputs.total_reviews as f64 * HISTORY_WEIGHT).min(HISTORY_CAP);
    score += (1.0 - inputs.consistency_score) * CONSISTENCY_WEIGHT;

    if inputs.distractions < LOW_DISTRACTION_LIMIT {
        score += LOW_DISTRACTION_BONUS;
    }
    if inputs.session_items < SHORT_SESSION_LIMIT {
        score += SHORT_SESSION_BONUS;
    }
    if (1.0 - inputs.adjustment_factor).abs() > LARGE_ADJUSTMENT_THRESHOLD {
        score -= LARGE_ADJUSTMENT_PENALTY;
    }

    if score.is_nan() {
        return BASE_CONFIDENCE;
    }
    score.clamp(0.0, 1.0)
}
