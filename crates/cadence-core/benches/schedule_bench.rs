//! Cadence Scheduling Benchmarks
//!
//! Hot paths of a review event using Criterion.
//! Run with: cargo bench -p cadence-core

use std::sync::Arc;

use cadence_core::{
    BaseScheduler, Competency, CompetencyTrend, ContextualAdjuster, DiscardSink, Feedback,
    LearnerProfile, LearningPace, PracticeState, ReviewContext, ReviewEntry, TelemetryCollector,
};
use chrono::{Duration, Utc};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn deck(size: usize) -> Vec<PracticeState> {
    let now = Utc::now();
    (0..size)
        .map(|i| {
            let mut state = PracticeState::new(format!("card-{i}"), now);
            state.ease_factor = 1.3 + (i % 13) as f64 * 0.1;
            state.interval = 1 + (i % 30) as i32;
            state.next_review_date = now + Duration::hours((i as i64 % 240) - 120);
            state
        })
        .collect()
}

fn bench_base_update(c: &mut Criterion) {
    let scheduler = BaseScheduler::new();
    let state = PracticeState::new("card", Utc::now());

    c.bench_function("sm2_update", |b| {
        b.iter(|| black_box(scheduler.update(black_box(&state), Feedback::Good.quality())))
    });
}

fn bench_due_items(c: &mut Criterion) {
    let scheduler = BaseScheduler::new();
    let items = deck(1_000);
    let now = Utc::now();

    c.bench_function("due_items_1000", |b| {
        b.iter(|| black_box(scheduler.due_items(&items, now).len()))
    });
}

fn bench_contextual_compute(c: &mut Criterion) {
    let adjuster =
        ContextualAdjuster::new(Arc::new(TelemetryCollector::new(1000, Arc::new(DiscardSink))));
    let now = Utc::now();

    let mut state = PracticeState::new("card", now);
    state.repetitions = 3;
    state.interval = 15;
    for day in 1..=10 {
        state.push_review(ReviewEntry {
            date: now - Duration::days(day * 3),
            quality: 3 + (day % 3) as u8,
            response_time_ms: 1500,
        });
    }

    let mut profile = LearnerProfile::new("learner", LearningPace::Fast);
    profile.competencies = vec![
        Competency::new("verbs", 70.0, CompetencyTrend::Improving).with_related(["nouns"]),
        Competency::new("nouns", 90.0, CompetencyTrend::Stable),
    ];
    let mut context = ReviewContext::for_profile(profile);
    context.competency_id = Some("verbs".to_string());

    c.bench_function("contextual_compute", |b| {
        b.iter(|| {
            black_box(adjuster.compute_at(&state, Feedback::Good, 1200, &context, None, now))
        })
    });
}

criterion_group!(
    benches,
    bench_base_update,
    bench_due_items,
    bench_contextual_compute,
);
criterion_main!(benches);
