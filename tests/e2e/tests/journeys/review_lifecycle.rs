//! Journey: one item from first sight to a lapse
//!
//! A learner with a competency profile studies a new verb. The first review
//! has no history, so plain SM-2 serves it; later reviews are contextual.
//! A forgotten answer resets progress and asks for a same-session repeat.

use std::sync::Arc;

use chrono::Duration;

use cadence_core::{
    AdaptiveDispatcher, BaseScheduler, CompetencyTrend, DiscardSink, FactorKind, FallbackReason,
    Feedback, LearningPace, ScheduleInput, ScheduleMethod, TelemetryCollector,
};
use cadence_e2e_tests::harness::TestTelemetry;
use cadence_e2e_tests::mocks::{PracticeFactory, t0};

#[tokio::test]
async fn test_good_good_forgot_lifecycle() {
    let telemetry = TestTelemetry::new(1000);
    let dispatcher = telemetry.dispatcher();
    let context = PracticeFactory::verbs_context(PracticeFactory::spanish_learner(
        LearningPace::Moderate,
        CompetencyTrend::Stable,
    ));

    // Day 0: first sight, no history yet
    let state = PracticeFactory::fresh_item("verb-hablar");
    let first = dispatcher
        .schedule_review_at(
            ScheduleInput::new(state, Feedback::Good)
                .with_response_time(3_000)
                .with_context(context.clone()),
            t0(),
        )
        .await
        .unwrap();

    assert_eq!(first.method(), ScheduleMethod::Base);
    assert_eq!(first.fallback_reason(), Some(&FallbackReason::NoPriorReviews));
    assert_eq!(first.state.repetitions, 1);
    assert_eq!(first.state.interval, 1);
    assert_eq!(first.state.next_review_date, t0() + Duration::days(1));
    assert_eq!(first.state.review_history.len(), 1);
    assert_eq!(first.confidence, 0.7);
    assert!(telemetry.collector.is_empty());

    // Day 1: contextual; only related-competency transfer applies (avg 60%)
    let day1 = t0() + Duration::days(1);
    let second = dispatcher
        .schedule_review_at(
            ScheduleInput::new(first.state, Feedback::Good)
                .with_response_time(2_500)
                .with_context(context.clone()),
            day1,
        )
        .await
        .unwrap();

    assert_eq!(second.method(), ScheduleMethod::Contextual);
    let enriched = second.enriched().unwrap();
    assert_eq!(enriched.base_interval, 6);
    assert_eq!(enriched.interval, 6);
    assert_eq!(enriched.factors.len(), 1);
    assert_eq!(enriched.factors[0].kind, FactorKind::Transfer);
    assert!((enriched.adjustment_factor - 1.04).abs() < 1e-9);
    assert_eq!(enriched.adjustment_reason, "related competency mastery 60%");
    assert!((second.confidence - 0.67).abs() < 1e-9);
    assert_eq!(second.state.repetitions, 2);
    assert!((second.state.ease_factor - 2.5).abs() < 1e-9);
    assert_eq!(second.state.next_review_date, day1 + Duration::days(6));
    assert_eq!(second.state.review_history.len(), 2);
    assert_eq!(telemetry.collector.len(), 1);

    // Day 7: forgotten
    let day7 = day1 + Duration::days(6);
    let third = dispatcher
        .schedule_review_at(
            ScheduleInput::new(second.state, Feedback::Forgot)
                .with_response_time(9_000)
                .with_context(context),
            day7,
        )
        .await
        .unwrap();

    let enriched = third.enriched().unwrap();
    assert!(enriched.should_review_again);
    assert_eq!(third.state.repetitions, 0);
    assert_eq!(third.state.interval, 1);
    assert!((third.state.ease_factor - 1.7).abs() < 1e-9);
    assert_eq!(third.state.review_history.last().unwrap().quality, 0);
    assert!((third.confidence - 0.69).abs() < 1e-9);
    assert_eq!(telemetry.collector.len(), 2);

    let stats = dispatcher.stats();
    assert_eq!(stats.base_count, 1);
    assert_eq!(stats.contextual_count, 2);
    assert_eq!(stats.total_count, 3);
    assert!((stats.contextual_percentage - 200.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_ease_never_drops_below_floor() {
    let dispatcher =
        AdaptiveDispatcher::new(Arc::new(TelemetryCollector::new(10, Arc::new(DiscardSink))));
    let mut state = PracticeFactory::fresh_item("verb-caber");
    let mut now = t0();

    for _ in 0..12 {
        let result = dispatcher
            .schedule_review_at(ScheduleInput::new(state, Feedback::Forgot), now)
            .await
            .unwrap();
        state = result.state;
        assert!(state.ease_factor >= 1.3);
        assert_eq!(state.interval, 1);
        now += Duration::days(1);
    }

    assert!((state.ease_factor - 1.3).abs() < 1e-9);
    assert_eq!(state.review_history.len(), 12);
}

#[tokio::test]
async fn test_disabled_dispatcher_matches_plain_sm2() {
    let telemetry = TestTelemetry::new(100);
    let dispatcher = telemetry.dispatcher();
    dispatcher.set_contextual_enabled(false);

    let context = PracticeFactory::verbs_context(PracticeFactory::spanish_learner(
        LearningPace::Fast,
        CompetencyTrend::Improving,
    ));
    let state = PracticeFactory::reviewed_item("verb-ir", &[4, 4], 3, 3);
    let scheduler = BaseScheduler::new();
    let expected = scheduler.update_at(&state, Feedback::Easy.quality(), t0());

    let result = dispatcher
        .schedule_review_at(
            ScheduleInput::new(state, Feedback::Easy).with_context(context),
            t0(),
        )
        .await
        .unwrap();

    assert_eq!(result.fallback_reason(), Some(&FallbackReason::Disabled));
    assert_eq!(result.state.interval, expected.state.interval);
    assert_eq!(result.state.ease_factor, expected.state.ease_factor);
    assert_eq!(result.state.repetitions, expected.state.repetitions);
    assert_eq!(result.state.review_history.len(), 3);
    assert!(telemetry.collector.is_empty());
}

#[tokio::test]
async fn test_newcomer_without_competencies() {
    let dispatcher =
        AdaptiveDispatcher::new(Arc::new(TelemetryCollector::new(10, Arc::new(DiscardSink))));
    let state = PracticeFactory::reviewed_item("noun-casa", &[5], 1, 1);
    let context = PracticeFactory::verbs_context(PracticeFactory::newcomer());

    let result = dispatcher
        .schedule_review_at(
            ScheduleInput::new(state, Feedback::Good).with_context(context),
            t0(),
        )
        .await
        .unwrap();

    assert_eq!(result.fallback_reason(), Some(&FallbackReason::NoCompetencies));
    assert_eq!(result.state.interval, 6);
}
