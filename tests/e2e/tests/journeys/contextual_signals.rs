//! Journey: learner and session signals shape the interval
//!
//! A slow learner, late in a long session, answers a visual verb quickly.
//! Every signal lands in the multiplier chain, the recommendations follow
//! the profile, and the review is captured as training data.

use std::sync::Arc;

use chrono::{Duration, Timelike};

use cadence_core::{
    CompetencyTrend, ContentType, FactorKind, Feedback, InMemorySimilarity, LearningPace,
    PracticeState, ScheduleInput, ScheduleMethod,
};
use cadence_e2e_tests::harness::TestTelemetry;
use cadence_e2e_tests::mocks::{FailingSimilarity, PracticeFactory, t0};

fn hablar() -> PracticeState {
    let mut state = PracticeFactory::reviewed_item("verb-hablar", &[4, 4, 5], 3, 6);
    state.repetitions = 2;
    state.interval = 6;
    state
}

fn slow_visual_learner_input() -> ScheduleInput {
    let mut profile =
        PracticeFactory::spanish_learner(LearningPace::Slow, CompetencyTrend::Declining);
    profile.preferred_content_type = Some(ContentType::Visual);
    let context = PracticeFactory::with_session(PracticeFactory::verbs_context(profile), 35.0, 10);

    ScheduleInput::new(hablar(), Feedback::Easy)
        .with_response_time(1_500)
        .with_context(context)
        .with_metadata(PracticeFactory::visual_metadata("verb-hablar", 3, 4_000.0))
}

#[tokio::test]
async fn test_full_multiplier_chain() {
    let telemetry = TestTelemetry::new(1000);
    let dispatcher = telemetry.dispatcher();

    let result = dispatcher
        .schedule_review_at(slow_visual_learner_input(), t0())
        .await
        .unwrap();

    assert_eq!(result.method(), ScheduleMethod::Contextual);
    let enriched = result.enriched().unwrap();

    let kinds: Vec<FactorKind> = enriched.factors.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![
            FactorKind::Pace,
            FactorKind::CompetencyTrend,
            FactorKind::Transfer,
            FactorKind::ResponseTime,
            FactorKind::Fatigue,
            FactorKind::ContentAffinity,
        ]
    );

    // 0.8 * 0.7 * 1.04 * 1.2 * 0.9 * 1.15
    assert!((enriched.adjustment_factor - 0.7233408).abs() < 1e-9);
    assert_eq!(enriched.base_interval, 16);
    assert_eq!(enriched.interval, 12);
    assert_eq!(result.state.interval, 12);
    assert_eq!(result.state.next_review_date, t0() + Duration::days(12));
    assert!((result.state.ease_factor - 2.6).abs() < 1e-9);
    assert_eq!(result.state.repetitions, 3);

    // 0.5 + 3*0.02 + (1-0.8)*0.15 + 0.1 + 0.05
    assert!((result.confidence - 0.74).abs() < 1e-9);

    assert_eq!(enriched.recommended_session_length, 15);
    assert_eq!(enriched.recommended_time_window.start_hour, 8);
    assert_eq!(enriched.recommended_time_window.end_hour, 11);
    assert_eq!(
        enriched.related_items_to_review,
        vec!["verb-ser", "verb-estar", "verb-tener"]
    );
    assert!(enriched.adjustment_reason.contains("slow learning pace"));
    assert!(enriched.adjustment_reason.contains("; "));
}

#[tokio::test]
async fn test_review_is_captured_as_training_data() {
    let telemetry = TestTelemetry::new(1000);
    let dispatcher = telemetry.dispatcher();
    dispatcher
        .schedule_review_at(slow_visual_learner_input(), t0())
        .await
        .unwrap();

    let records = telemetry.collector.snapshot();
    assert_eq!(records.len(), 1);
    let record = &records[0];

    assert_eq!(record.user_id, "learner-ana");
    assert_eq!(record.item_id, "verb-hablar");
    assert_eq!(record.outcome.quality, 5);
    assert!(record.outcome.retained);
    assert_eq!(record.outcome.response_time_ms, 1_500);

    let features = &record.features;
    assert_eq!(features.learning_pace, 0);
    assert_eq!(features.competency_level, Some(60.0));
    assert!((features.cluster_mastery - 0.6).abs() < 1e-9);
    assert_eq!(features.item_review_count, 3);
    assert_eq!(features.content_type, Some(ContentType::Visual));
    assert_eq!(features.session_position, 10);
    assert_eq!(features.hour_of_day, 9);
    assert_eq!(features.day_of_week, 0);
    assert!((features.days_since_last_review - 6.0).abs() < 1e-9);
    assert_eq!(features.current_interval, 6);
    assert_eq!(features.repetition_count, 2);
    assert_eq!(record.created_at.hour(), 9);

    // Nothing reaches disk until the buffer fills or is flushed
    assert_eq!(telemetry.flushed_count(), 0);
    assert_eq!(telemetry.collector.flush(), 1);
    assert_eq!(telemetry.flushed_records()[0].id, record.id);
}

#[tokio::test]
async fn test_similarity_lookup_supplies_related_items() {
    let telemetry = TestTelemetry::new(1000);
    let mut index = InMemorySimilarity::new();
    index.link("verb-hablar", "verb-comer", 0.92);
    index.link("verb-hablar", "verb-vivir", 0.81);
    index.link("verb-hablar", "noun-mesa", 0.40);
    let dispatcher = telemetry.dispatcher().with_similarity(Arc::new(index));

    let result = dispatcher
        .schedule_review_at(slow_visual_learner_input(), t0())
        .await
        .unwrap();

    assert_eq!(
        result.enriched().unwrap().related_items_to_review,
        vec!["verb-comer", "verb-vivir"]
    );
}

#[tokio::test]
async fn test_similarity_outage_falls_back_to_metadata() {
    let telemetry = TestTelemetry::new(1000);
    let dispatcher = telemetry
        .dispatcher()
        .with_similarity(Arc::new(FailingSimilarity));

    let result = dispatcher
        .schedule_review_at(slow_visual_learner_input(), t0())
        .await
        .unwrap();

    assert_eq!(result.method(), ScheduleMethod::Contextual);
    assert_eq!(
        result.enriched().unwrap().related_items_to_review,
        vec!["verb-ser", "verb-estar", "verb-tener"]
    );
}

#[tokio::test]
async fn test_cramming_shortens_interval() {
    let telemetry = TestTelemetry::new(1000);
    let dispatcher = telemetry.dispatcher();

    let mut state = hablar();
    if let Some(last) = state.review_history.last_mut() {
        last.date = t0() - Duration::hours(2);
    }
    let context = PracticeFactory::verbs_context(PracticeFactory::spanish_learner(
        LearningPace::Moderate,
        CompetencyTrend::Stable,
    ));

    let result = dispatcher
        .schedule_review_at(
            ScheduleInput::new(state, Feedback::Good).with_context(context),
            t0(),
        )
        .await
        .unwrap();

    let enriched = result.enriched().unwrap();
    assert!(enriched.factors.iter().any(|f| f.kind == FactorKind::Cramming));
    // round(6 * 2.5) = 15, then 0.8 * 1.04
    assert_eq!(enriched.base_interval, 15);
    assert_eq!(enriched.interval, 12);
}
