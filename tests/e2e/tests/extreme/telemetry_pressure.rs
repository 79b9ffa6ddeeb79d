//! Extreme: telemetry under volume and concurrency
//!
//! The buffer flushes exactly once per capacity crossing, never loses or
//! duplicates a record, and a broken sink never reaches the learner.

use std::sync::Arc;

use cadence_core::{
    AdaptiveDispatcher, ChannelSink, CompetencyTrend, EngineConfig, Feedback, JsonlFileSink,
    LearningPace, ScheduleInput, ScheduleMethod, TelemetryCollector, TelemetrySink,
};
use cadence_e2e_tests::harness::TestTelemetry;
use cadence_e2e_tests::mocks::{PracticeFactory, t0};

fn eligible_input(n: usize) -> ScheduleInput {
    let context = PracticeFactory::verbs_context(PracticeFactory::spanish_learner(
        LearningPace::Moderate,
        CompetencyTrend::Stable,
    ));
    let state = PracticeFactory::reviewed_item(&format!("card-{n}"), &[4, 3], 2, 2);
    ScheduleInput::new(state, Feedback::Good)
        .with_response_time(1_000 + n as u64)
        .with_context(context)
}

#[tokio::test]
async fn test_thousand_and_first_review_starts_a_new_batch() {
    let telemetry = TestTelemetry::new(1000);
    let dispatcher = telemetry.dispatcher();

    for n in 0..1000 {
        dispatcher.schedule_review_at(eligible_input(n), t0()).await.unwrap();
    }
    assert_eq!(telemetry.flushed_count(), 1000);
    assert!(telemetry.collector.is_empty());
    assert_eq!(telemetry.collector.flush_count(), 1);

    dispatcher.schedule_review_at(eligible_input(1000), t0()).await.unwrap();
    assert_eq!(telemetry.collector.len(), 1);
    assert_eq!(telemetry.flushed_count(), 1000);
    assert_eq!(dispatcher.stats().telemetry_buffered, 1);

    assert_eq!(telemetry.collector.flush(), 1);
    let records = telemetry.flushed_records();
    assert_eq!(records.len(), 1001);
    assert_eq!(records[1000].item_id, "card-1000");
    assert_eq!(telemetry.collector.recorded_count(), 1001);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reviews_flush_exactly_once_per_batch() {
    let telemetry = TestTelemetry::new(100);
    let dispatcher = Arc::new(telemetry.dispatcher());

    let mut handles = Vec::new();
    for worker in 0..8 {
        let dispatcher = Arc::clone(&dispatcher);
        handles.push(tokio::spawn(async move {
            for i in 0..125 {
                let result = dispatcher
                    .schedule_review_at(eligible_input(worker * 1000 + i), t0())
                    .await
                    .unwrap();
                assert_eq!(result.method(), ScheduleMethod::Contextual);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(telemetry.collector.flush_count(), 10);
    assert!(telemetry.collector.is_empty());

    let records = telemetry.flushed_records();
    assert_eq!(records.len(), 1000);
    let mut ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 1000);

    assert_eq!(dispatcher.stats().contextual_count, 1000);
}

#[tokio::test]
async fn test_background_writer_drains_on_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("telemetry.jsonl");

    let (sink, rx) = ChannelSink::new();
    let target: Arc<dyn TelemetrySink> = Arc::new(JsonlFileSink::new(&path));
    let writer = ChannelSink::spawn_writer(rx, target);

    let collector = Arc::new(TelemetryCollector::new(10, Arc::new(sink)));
    let config = EngineConfig {
        telemetry_capacity: 10,
        ..EngineConfig::default()
    };
    let dispatcher = AdaptiveDispatcher::with_config(&config, Arc::clone(&collector));

    for n in 0..25 {
        dispatcher.schedule_review_at(eligible_input(n), t0()).await.unwrap();
    }
    assert_eq!(collector.flush_count(), 2);
    assert_eq!(collector.flush(), 5);

    drop(dispatcher);
    drop(collector);
    writer.await.unwrap();

    let lines = std::fs::read_to_string(&path).unwrap();
    assert_eq!(lines.lines().count(), 25);
}

#[tokio::test]
async fn test_broken_sink_never_fails_a_review() {
    let dir = tempfile::tempdir().unwrap();
    // A directory cannot be opened for appending
    let sink = Arc::new(JsonlFileSink::new(dir.path()));
    let collector = Arc::new(TelemetryCollector::new(3, sink));
    let dispatcher = AdaptiveDispatcher::new(Arc::clone(&collector));

    for n in 0..7 {
        let result = dispatcher.schedule_review_at(eligible_input(n), t0()).await.unwrap();
        assert_eq!(result.method(), ScheduleMethod::Contextual);
    }

    assert_eq!(collector.flush_failure_count(), 2);
    assert_eq!(collector.len(), 1);
    assert_eq!(collector.recorded_count(), 7);
}
