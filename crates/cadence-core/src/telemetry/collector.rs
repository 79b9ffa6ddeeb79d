//! Telemetry Collector
//!
//! Shared, bounded buffer of training records. Reaching capacity swaps the
//! buffer out under the lock and hands the batch to the sink after the lock
//! is released, so concurrent reviewers never wait on sink I/O.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::record::TrainingRecord;
use super::sink::{DiscardSink, TelemetrySink};
use crate::config::DEFAULT_TELEMETRY_CAPACITY;
use crate::practice::{Feedback, ItemMetadata, PracticeState, ReviewContext};

/// Buffers training records and flushes them in capacity-sized batches
pub struct TelemetryCollector {
    buffer: Mutex<Vec<TrainingRecord>>,
    capacity: usize,
    sink: Arc<dyn TelemetrySink>,
    recorded: AtomicU64,
    flushes: AtomicU64,
    flush_failures: AtomicU64,
}

impl std::fmt::Debug for TelemetryCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryCollector")
            .field("capacity", &self.capacity)
            .field("buffered", &self.len())
            .field("flushes", &self.flush_count())
            .finish()
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(DEFAULT_TELEMETRY_CAPACITY, Arc::new(DiscardSink))
    }
}

impl TelemetryCollector {
    /// Collector flushing to `sink` every `capacity` records (min 1)
    pub fn new(capacity: usize, sink: Arc<dyn TelemetrySink>) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
            sink,
            recorded: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            flush_failures: AtomicU64::new(0),
        }
    }

    /// Derive a training record from a review and buffer it
    pub fn record(
        &self,
        state: &PracticeState,
        feedback: Feedback,
        response_time_ms: u64,
        context: &ReviewContext,
        metadata: Option<&ItemMetadata>,
    ) {
        self.record_at(state, feedback, response_time_ms, context, metadata, Utc::now());
    }

    /// [`record`](Self::record) with an explicit clock
    pub fn record_at(
        &self,
        state: &PracticeState,
        feedback: Feedback,
        response_time_ms: u64,
        context: &ReviewContext,
        metadata: Option<&ItemMetadata>,
        now: DateTime<Utc>,
    ) {
        let record =
            TrainingRecord::derive(state, feedback, response_time_ms, context, metadata, now);
        self.append(record);
    }

    /// Buffer a prepared record, flushing if this append reaches capacity
    pub fn append(&self, record: TrainingRecord) {
        let batch = {
            let mut buffer = self.lock_buffer();
            buffer.push(record);
            if buffer.len() >= self.capacity {
                Some(std::mem::replace(
                    &mut *buffer,
                    Vec::with_capacity(self.capacity),
                ))
            } else {
                None
            }
        };
        self.recorded.fetch_add(1, Ordering::Relaxed);

        if let Some(batch) = batch {
            self.deliver(batch);
        }
    }

    /// Flush whatever is buffered. Returns the number of records handed off.
    pub fn flush(&self) -> usize {
        let batch = std::mem::take(&mut *self.lock_buffer());
        let count = batch.len();
        if count > 0 {
            self.deliver(batch);
        }
        count
    }

    /// Records currently buffered
    pub fn len(&self) -> usize {
        self.lock_buffer().len()
    }

    /// True when nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flush threshold
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records appended since creation
    pub fn recorded_count(&self) -> u64 {
        self.recorded.load(Ordering::Relaxed)
    }

    /// Batches handed to the sink (including failed ones)
    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    /// Batches the sink rejected
    pub fn flush_failure_count(&self) -> u64 {
        self.flush_failures.load(Ordering::Relaxed)
    }

    /// Copy of the buffered records
    pub fn snapshot(&self) -> Vec<TrainingRecord> {
        self.lock_buffer().clone()
    }

    fn lock_buffer(&self) -> std::sync::MutexGuard<'_, Vec<TrainingRecord>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(&self, batch: Vec<TrainingRecord>) {
        let count = batch.len();
        self.flushes.fetch_add(1, Ordering::Relaxed);
        match self.sink.flush(batch) {
            Ok(()) => debug!(records = count, "Telemetry flushed"),
            Err(e) => {
                self.flush_failures.fetch_add(1, Ordering::Relaxed);
                warn!(records = count, error = %e, "Telemetry flush failed; batch dropped");
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
