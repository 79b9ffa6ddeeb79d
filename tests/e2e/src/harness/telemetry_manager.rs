//! Test Telemetry Manager
//!
//! Provides an isolated training-data file per test:
//! - Temporary directory cleaned up on drop
//! - Collector wired to a JSON lines sink in that directory
//! - Helpers to read the flushed records back

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cadence_core::{
    AdaptiveDispatcher, EngineConfig, JsonlFileSink, TelemetryCollector, TrainingRecord,
};
use tempfile::TempDir;

/// Collector writing to a temporary telemetry file
///
/// # Example
///
/// ```rust,ignore
/// let telemetry = TestTelemetry::new(1000);
/// let dispatcher = telemetry.dispatcher();
/// // ... schedule reviews ...
/// assert_eq!(telemetry.flushed_records().len(), 1000);
/// ```
pub struct TestTelemetry {
    /// Shared collector
    pub collector: Arc<TelemetryCollector>,
    _temp_dir: TempDir,
    path: PathBuf,
}

impl TestTelemetry {
    /// Collector flushing every `capacity` records into a fresh temp file
    pub fn new(capacity: usize) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("telemetry.jsonl");
        let sink = Arc::new(JsonlFileSink::new(&path));
        Self {
            collector: Arc::new(TelemetryCollector::new(capacity, sink)),
            _temp_dir: temp_dir,
            path,
        }
    }

    /// Path of the telemetry file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configuration pointing at this file
    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            telemetry_capacity: self.collector.capacity(),
            telemetry_path: Some(self.path.clone()),
            ..EngineConfig::default()
        }
    }

    /// Dispatcher sharing this collector, no collaborators attached
    pub fn dispatcher(&self) -> AdaptiveDispatcher {
        AdaptiveDispatcher::with_config(&self.config(), Arc::clone(&self.collector))
    }

    /// Records that reached the file so far
    pub fn flushed_records(&self) -> Vec<TrainingRecord> {
        if !self.path.exists() {
            return Vec::new();
        }
        let raw = fs::read_to_string(&self.path).expect("Failed to read telemetry file");
        raw.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).expect("Malformed telemetry line"))
            .collect()
    }

    /// Number of lines in the telemetry file
    pub fn flushed_count(&self) -> usize {
        self.flushed_records().len()
    }
}
