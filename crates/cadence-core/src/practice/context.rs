//! Review Context - Learner, session and item signals
//!
//! Everything here is optional input: the base scheduler never needs it, the
//! contextual engine reads it through explicit presence checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{Result, check_range, check_unit};

/// Competency mastery levels are expressed on a 0-100 scale
const MAX_MASTERY_LEVEL: f64 = 100.0;

// ============================================================================
// LEARNER PROFILE
// ============================================================================

/// How quickly a learner typically progresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LearningPace {
    /// Needs more repetition than average
    Slow,
    /// Typical progression
    #[default]
    #[serde(alias = "medium")]
    Moderate,
    /// Needs less repetition than average
    Fast,
}

impl LearningPace {
    /// Ordinal encoding used in training features (slow=0, moderate=1, fast=2)
    pub fn ordinal(self) -> u8 {
        match self {
            LearningPace::Slow => 0,
            LearningPace::Moderate => 1,
            LearningPace::Fast => 2,
        }
    }
}

impl std::fmt::Display for LearningPace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LearningPace::Slow => write!(f, "slow"),
            LearningPace::Moderate => write!(f, "moderate"),
            LearningPace::Fast => write!(f, "fast"),
        }
    }
}

/// Direction a competency's mastery is moving in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompetencyTrend {
    /// Mastery rising
    Improving,
    /// Mastery falling
    Declining,
    /// No clear movement
    #[default]
    Stable,
}

impl std::fmt::Display for CompetencyTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompetencyTrend::Improving => write!(f, "improving"),
            CompetencyTrend::Declining => write!(f, "declining"),
            CompetencyTrend::Stable => write!(f, "stable"),
        }
    }
}

/// A named skill or topic area tracked per learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competency {
    /// Competency identifier
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Mastery level on a 0-100 scale
    pub mastery_level: f64,
    /// Recent direction of the mastery level
    #[serde(default)]
    pub trend: CompetencyTrend,
    /// Competencies whose knowledge transfers to this one
    #[serde(default)]
    pub related_competency_ids: Vec<String>,
}

impl Competency {
    /// Create a competency with no related topics
    pub fn new(id: impl Into<String>, mastery_level: f64, trend: CompetencyTrend) -> Self {
        Self {
            id: id.into(),
            name: None,
            mastery_level,
            trend,
            related_competency_ids: Vec::new(),
        }
    }

    /// Builder-style helper to attach related competencies
    pub fn with_related<I, S>(mut self, related: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related_competency_ids = related.into_iter().map(Into::into).collect();
        self
    }
}

/// Modality a piece of content is presented in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Images, diagrams, video
    Visual,
    /// Spoken or musical content
    Auditory,
    /// Written text
    Textual,
    /// Hands-on exercises
    Kinesthetic,
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentType::Visual => write!(f, "visual"),
            ContentType::Auditory => write!(f, "auditory"),
            ContentType::Textual => write!(f, "textual"),
            ContentType::Kinesthetic => write!(f, "kinesthetic"),
        }
    }
}

/// What the engine knows about a learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProfile {
    /// Learner identifier
    pub user_id: String,
    /// Typical learning pace
    #[serde(default)]
    pub pace: LearningPace,
    /// Tracked competencies
    #[serde(default)]
    pub competencies: Vec<Competency>,
    /// Modality the learner retains best
    #[serde(default)]
    pub preferred_content_type: Option<ContentType>,
    /// Overall mastery in `[0, 1]`
    #[serde(default)]
    pub overall_mastery: f64,
}

impl LearnerProfile {
    /// Create an empty profile
    pub fn new(user_id: impl Into<String>, pace: LearningPace) -> Self {
        Self {
            user_id: user_id.into(),
            pace,
            competencies: Vec::new(),
            preferred_content_type: None,
            overall_mastery: 0.0,
        }
    }

    /// Look up a competency by id
    pub fn competency(&self, id: &str) -> Option<&Competency> {
        self.competencies.iter().find(|c| c.id == id)
    }

    /// Mean mastery level (0-100) of the competencies related to `id`.
    ///
    /// Related ids missing from the profile are ignored; `None` when nothing
    /// related is known.
    pub fn average_related_level(&self, id: &str) -> Option<f64> {
        let competency = self.competency(id)?;
        let levels: Vec<f64> = competency
            .related_competency_ids
            .iter()
            .filter_map(|related| self.competency(related))
            .map(|c| c.mastery_level)
            .collect();
        if levels.is_empty() {
            None
        } else {
            Some(levels.iter().sum::<f64>() / levels.len() as f64)
        }
    }

    /// Check numeric ranges
    pub fn validate(&self) -> Result<()> {
        check_unit("overallMastery", self.overall_mastery)?;
        for competency in &self.competencies {
            check_range("masteryLevel", competency.mastery_level, MAX_MASTERY_LEVEL)?;
        }
        Ok(())
    }
}

// ============================================================================
// SESSION / ENVIRONMENT SIGNALS
// ============================================================================

/// Counters for the study session the review belongs to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionStats {
    /// Minutes since the session started
    pub duration_minutes: f64,
    /// Items already reviewed in this session
    pub items_reviewed: u32,
    /// Current streak of correct answers
    pub consecutive_correct: u32,
    /// Current streak of wrong answers
    pub consecutive_wrong: u32,
}

/// Self-reported or inferred mood of the learner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalState {
    /// Engaged and attentive
    Focused,
    /// Relaxed, neutral
    Calm,
    /// Under pressure
    Stressed,
    /// Disengaged
    Bored,
    /// Struggling
    Frustrated,
}

/// Device the review is performed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    /// Desktop or laptop
    Desktop,
    /// Phone
    Mobile,
    /// Tablet
    Tablet,
}

/// Everything the caller knows about the circumstances of a review
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewContext {
    /// Learner identifier
    pub user_id: String,
    /// Course the item belongs to
    pub course_id: Option<String>,
    /// Competency the item exercises
    pub competency_id: Option<String>,
    /// Learner profile, enables contextual scheduling
    pub profile: Option<LearnerProfile>,
    /// Session counters
    pub session: SessionStats,
    /// Local hour of day (0-23)
    pub hour_of_day: Option<u32>,
    /// Mood signal
    pub emotional_state: Option<EmotionalState>,
    /// Device signal
    pub device_type: Option<DeviceType>,
    /// Distractions (notifications, tab switches) observed this session
    pub distractions: u32,
}

impl ReviewContext {
    /// Context for a learner with a profile attached
    pub fn for_profile(profile: LearnerProfile) -> Self {
        Self {
            user_id: profile.user_id.clone(),
            profile: Some(profile),
            ..Default::default()
        }
    }

    /// The competency this review exercises, if both id and profile entry exist
    pub fn competency(&self) -> Option<&Competency> {
        let id = self.competency_id.as_deref()?;
        self.profile.as_ref()?.competency(id)
    }

    /// Check numeric ranges
    pub fn validate(&self) -> Result<()> {
        if let Some(hour) = self.hour_of_day {
            check_range("hourOfDay", f64::from(hour), 23.0)?;
        }
        check_range(
            "durationMinutes",
            self.session.duration_minutes,
            f64::MAX,
        )?;
        if let Some(profile) = &self.profile {
            profile.validate()?;
        }
        Ok(())
    }
}

// ============================================================================
// ITEM METADATA
// ============================================================================

/// Descriptive data about an item, enables the item-dependent factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    /// Item identifier
    pub item_id: String,
    /// Intrinsic difficulty in `[0, 1]`
    pub difficulty: f64,
    /// Presentation modality
    #[serde(default)]
    pub content_type: Option<ContentType>,
    /// Cognitive load in `[0, 1]`
    #[serde(default)]
    pub cognitive_load: f64,
    /// Items related to this one
    #[serde(default)]
    pub related_item_ids: Vec<String>,
    /// When the item was created
    pub created_at: DateTime<Utc>,
    /// When the item was last reviewed
    #[serde(default)]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// Cumulative review count
    #[serde(default)]
    pub total_reviews: u32,
    /// Mean response time across reviews (0 when unknown)
    #[serde(default)]
    pub average_response_time_ms: f64,
    /// Mean quality across reviews
    #[serde(default)]
    pub average_quality: f64,
    /// Consistency in `[0, 1]`, 1 = perfectly consistent
    #[serde(default = "default_consistency")]
    pub consistency_score: f64,
}

fn default_consistency() -> f64 {
    1.0
}

impl ItemMetadata {
    /// Metadata with neutral defaults
    pub fn new(item_id: impl Into<String>, difficulty: f64, created_at: DateTime<Utc>) -> Self {
        Self {
            item_id: item_id.into(),
            difficulty,
            content_type: None,
            cognitive_load: 0.0,
            related_item_ids: Vec::new(),
            created_at,
            last_reviewed_at: None,
            total_reviews: 0,
            average_response_time_ms: 0.0,
            average_quality: 0.0,
            consistency_score: 1.0,
        }
    }

    /// Check numeric ranges
    pub fn validate(&self) -> Result<()> {
        check_unit("difficulty", self.difficulty)?;
        check_unit("cognitiveLoad", self.cognitive_load)?;
        check_unit("consistencyScore", self.consistency_score)?;
        check_range("averageQuality", self.average_quality, 5.0)?;
        check_range(
            "averageResponseTimeMs",
            self.average_response_time_ms,
            f64::MAX,
        )?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
