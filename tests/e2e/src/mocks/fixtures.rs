//! Test Data Factory
//!
//! Builds realistic learners, items and review histories:
//! - Learner profiles with competency graphs
//! - Practice states with a backdated review history
//! - Item metadata with response-time averages

use chrono::{DateTime, Duration, TimeZone, Utc};

use cadence_core::{
    Competency, CompetencyTrend, ContentType, ItemMetadata, LearnerProfile, LearningPace,
    PracticeState, ReviewContext, ReviewEntry, SessionStats,
};

/// Fixed reference instant used across journeys (Monday 09:00 UTC)
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

/// Factory for learners, items and contexts
pub struct PracticeFactory;

impl PracticeFactory {
    /// Learner studying Spanish verbs; `verbs` is related to `nouns` and
    /// `pronouns`
    pub fn spanish_learner(pace: LearningPace, verbs_trend: CompetencyTrend) -> LearnerProfile {
        let mut profile = LearnerProfile::new("learner-ana", pace);
        profile.overall_mastery = 0.55;
        profile.competencies = vec![
            Competency::new("verbs", 60.0, verbs_trend).with_related(["nouns", "pronouns"]),
            Competency::new("nouns", 80.0, CompetencyTrend::Stable),
            Competency::new("pronouns", 40.0, CompetencyTrend::Improving),
        ];
        profile
    }

    /// Learner with a profile but no competencies yet
    pub fn newcomer() -> LearnerProfile {
        LearnerProfile::new("learner-new", LearningPace::Moderate)
    }

    /// Context for a review of the `verbs` competency
    pub fn verbs_context(profile: LearnerProfile) -> ReviewContext {
        let mut context = ReviewContext::for_profile(profile);
        context.course_id = Some("spanish-101".to_string());
        context.competency_id = Some("verbs".to_string());
        context.hour_of_day = Some(9);
        context
    }

    /// Same context with session statistics attached
    pub fn with_session(
        mut context: ReviewContext,
        duration_minutes: f64,
        items_reviewed: u32,
    ) -> ReviewContext {
        context.session = SessionStats {
            duration_minutes,
            items_reviewed,
            ..SessionStats::default()
        };
        context
    }

    /// A brand-new item due at `t0`
    pub fn fresh_item(id: &str) -> PracticeState {
        PracticeState::new(id, t0())
    }

    /// An item with one review per entry of `qualities`, spaced `gap_days`
    /// apart and ending `last_review_days_ago` before `t0`
    pub fn reviewed_item(
        id: &str,
        qualities: &[u8],
        gap_days: i64,
        last_review_days_ago: i64,
    ) -> PracticeState {
        let mut state = PracticeState::new(id, t0());
        let last = t0() - Duration::days(last_review_days_ago);
        let count = qualities.len() as i64;
        for (i, quality) in qualities.iter().enumerate() {
            state.push_review(ReviewEntry {
                date: last - Duration::days((count - 1 - i as i64) * gap_days),
                quality: *quality,
                response_time_ms: 2_000,
            });
        }
        state.repetitions = qualities.iter().rev().take_while(|q| **q >= 3).count() as i32;
        state
    }

    /// Metadata for a visual item with known timing statistics
    pub fn visual_metadata(id: &str, total_reviews: u32, average_response_time_ms: f64) -> ItemMetadata {
        let mut metadata = ItemMetadata::new(id, 0.5, t0() - Duration::days(60));
        metadata.content_type = Some(ContentType::Visual);
        metadata.total_reviews = total_reviews;
        metadata.average_response_time_ms = average_response_time_ms;
        metadata.average_quality = 4.0;
        metadata.consistency_score = 0.8;
        metadata.related_item_ids = vec![
            "verb-ser".to_string(),
            "verb-estar".to_string(),
            "verb-tener".to_string(),
            "verb-ir".to_string(),
        ];
        metadata
    }
}
