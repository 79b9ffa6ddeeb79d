//! Journey: a flaky remote scheduling backend
//!
//! The backend is consulted for every contextual-eligible review. Whatever
//! goes wrong (transport, rejection, nonsense, silence) the learner still
//! gets a plain SM-2 schedule and the failure is visible in the result.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;

use cadence_core::{
    AdaptiveDispatcher, CompetencyTrend, DispatchPath, FallbackReason, Feedback, LearningPace,
    RemoteError, RemoteResponse, RemoteResult, ScheduleInput, ScheduleMethod, STANDARD_REASON,
};
use cadence_e2e_tests::harness::TestTelemetry;
use cadence_e2e_tests::mocks::{HangingRemote, PracticeFactory, ScriptedRemote, t0};

fn eligible_input() -> ScheduleInput {
    let mut context = PracticeFactory::verbs_context(PracticeFactory::spanish_learner(
        LearningPace::Fast,
        CompetencyTrend::Improving,
    ));
    context.user_id = "learner-remote".to_string();
    let state = PracticeFactory::reviewed_item("verb-poder", &[4], 1, 1);
    ScheduleInput::new(state, Feedback::Good)
        .with_response_time(1_800)
        .with_context(context)
}

fn remote_result(interval: i32) -> RemoteResult {
    RemoteResult {
        repetitions: 2,
        ease_factor: 2.5,
        interval,
        // Deliberately inconsistent with the interval
        next_review_date: t0() + Duration::days(100),
        adjustment_reason: String::new(),
        adjustment_factor: 1.5,
        confidence: 0.88,
        stats: None,
    }
}

#[tokio::test]
async fn test_remote_success_then_every_kind_of_failure() {
    let telemetry = TestTelemetry::new(1000);
    let remote = Arc::new(ScriptedRemote::new([
        Ok(RemoteResponse::ok(remote_result(9))),
        Err(RemoteError::Transport("connection refused".to_string())),
        Err(RemoteError::HttpStatus {
            status: 503,
            body: "maintenance".to_string(),
        }),
        Ok(RemoteResponse::failed("model not trained for course")),
        Ok(RemoteResponse::ok(remote_result(0))),
        Ok(RemoteResponse::ok(remote_result(i32::MAX))),
    ]));
    let dispatcher = telemetry.dispatcher().with_remote(remote.clone());

    // Success: remote numbers, local recommendations, date recomputed
    let served = dispatcher
        .schedule_review_at(eligible_input(), t0())
        .await
        .unwrap();
    match &served.path {
        DispatchPath::Contextual { enriched, remote } => {
            assert!(*remote);
            assert_eq!(enriched.interval, 9);
            assert_eq!(enriched.adjustment_reason, STANDARD_REASON);
            assert_eq!(enriched.recommended_session_length, 30);
            assert!(enriched.factors.is_empty());
        }
        other => panic!("expected contextual path, got {:?}", other),
    }
    assert_eq!(served.state.interval, 9);
    assert_eq!(served.state.next_review_date, t0() + Duration::days(9));
    assert_eq!(served.confidence, 0.88);
    assert_eq!(served.state.review_history.len(), 2);

    // Five failures in a row
    let mut messages = Vec::new();
    for _ in 0..5 {
        let result = dispatcher
            .schedule_review_at(eligible_input(), t0())
            .await
            .unwrap();
        assert_eq!(result.method(), ScheduleMethod::Base);
        assert_eq!(result.state.interval, 6);
        assert_eq!(result.state.review_history.len(), 2);
        assert_eq!(result.confidence, 0.7);
        match result.fallback_reason() {
            Some(FallbackReason::RemoteFailed(message)) => messages.push(message.clone()),
            other => panic!("expected remote failure, got {:?}", other),
        }
    }
    assert!(messages[0].contains("connection refused"));
    assert!(messages[1].contains("503"));
    assert!(messages[2].contains("model not trained"));
    assert!(messages[3].contains("interval 0"));
    assert!(messages[4].contains("interval 2147483647"));

    let stats = dispatcher.stats();
    assert_eq!(stats.contextual_count, 1);
    assert_eq!(stats.base_count, 5);
    assert_eq!(stats.remote_failures, 5);

    // Every eligible review is training data, served remotely or not
    assert_eq!(telemetry.collector.len(), 6);

    let requests = remote.requests();
    assert_eq!(requests.len(), 6);
    assert_eq!(requests[0].user_id, "learner-remote");
    assert_eq!(requests[0].competency_id.as_deref(), Some("verbs"));
    assert_eq!(requests[0].context.time_of_day, Some(9));
    assert_eq!(requests[0].response_time_ms, 1_800);
}

#[tokio::test]
async fn test_ineligible_reviews_never_call_remote() {
    let telemetry = TestTelemetry::new(1000);
    let remote = Arc::new(ScriptedRemote::default());
    let dispatcher = telemetry.dispatcher().with_remote(remote.clone());

    let fresh = ScheduleInput::new(PracticeFactory::fresh_item("verb-ver"), Feedback::Good);
    let result = dispatcher.schedule_review_at(fresh, t0()).await.unwrap();
    assert_eq!(result.fallback_reason(), Some(&FallbackReason::NoProfile));

    dispatcher.set_contextual_enabled(false);
    let result = dispatcher
        .schedule_review_at(eligible_input(), t0())
        .await
        .unwrap();
    assert_eq!(result.fallback_reason(), Some(&FallbackReason::Disabled));

    assert!(remote.requests().is_empty());
    assert_eq!(dispatcher.stats().remote_failures, 0);
}

#[tokio::test]
async fn test_silent_remote_times_out() {
    let telemetry = TestTelemetry::new(1000);
    let mut config = telemetry.config();
    config.collaborator_timeout = StdDuration::from_millis(50);
    let dispatcher = AdaptiveDispatcher::with_config(&config, telemetry.collector.clone())
        .with_remote(Arc::new(HangingRemote(StdDuration::from_secs(30))));

    let started = std::time::Instant::now();
    let result = dispatcher
        .schedule_review_at(eligible_input(), t0())
        .await
        .unwrap();

    assert!(started.elapsed() < StdDuration::from_secs(5));
    match result.fallback_reason() {
        Some(FallbackReason::RemoteFailed(message)) => assert!(message.contains("timed out")),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert_eq!(result.state.interval, 6);
}
