//! Telemetry Sinks
//!
//! Where flushed training records go. A sink is called outside the buffer
//! lock and must return quickly; slow I/O belongs behind a [`ChannelSink`].

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::record::TrainingRecord;

/// Flush failure. Logged by the collector, never returned to reviewers.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// File I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Record could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Background writer is gone
    #[error("Telemetry channel closed ({0} records dropped)")]
    ChannelClosed(usize),
}

/// Destination for flushed training records
pub trait TelemetrySink: Send + Sync {
    /// Accept a full batch. Ownership of the records moves to the sink.
    fn flush(&self, records: Vec<TrainingRecord>) -> Result<(), TelemetryError>;
}

// ============================================================================
// DISCARD
// ============================================================================

/// Drops every batch. Used when no telemetry destination is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl TelemetrySink for DiscardSink {
    fn flush(&self, records: Vec<TrainingRecord>) -> Result<(), TelemetryError> {
        debug!(records = records.len(), "Discarding telemetry batch");
        Ok(())
    }
}

// ============================================================================
// JSON LINES FILE
// ============================================================================

/// Appends one JSON object per line to a file
#[derive(Debug)]
pub struct JsonlFileSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlFileSink {
    /// Sink writing to `path`; parent directories are created on first flush
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Target file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TelemetrySink for JsonlFileSink {
    fn flush(&self, records: Vec<TrainingRecord>) -> Result<(), TelemetryError> {
        if records.is_empty() {
            return Ok(());
        }
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        for record in &records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        debug!(records = records.len(), path = %self.path.display(), "Telemetry batch written");
        Ok(())
    }
}

// ============================================================================
// CHANNEL
// ============================================================================

/// Hands batches to a background task so flushing never waits on I/O
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Vec<TrainingRecord>>,
}

impl ChannelSink {
    /// Create a sink and the receiving end for the writer task
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Vec<TrainingRecord>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Spawn a task forwarding every received batch to `target`.
    ///
    /// Writes run on the blocking pool. The task ends once every
    /// `ChannelSink` clone has been dropped and the queue is drained.
    pub fn spawn_writer(
        mut rx: mpsc::UnboundedReceiver<Vec<TrainingRecord>>,
        target: Arc<dyn TelemetrySink>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(batch) = rx.recv().await {
                let target = Arc::clone(&target);
                let count = batch.len();
                match tokio::task::spawn_blocking(move || target.flush(batch)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(records = count, error = %e, "Telemetry writer failed"),
                    Err(e) => warn!(records = count, error = %e, "Telemetry writer task panicked"),
                }
            }
            debug!("Telemetry writer stopped");
        })
    }
}

impl TelemetrySink for ChannelSink {
    fn flush(&self, records: Vec<TrainingRecord>) -> Result<(), TelemetryError> {
        self.tx
            .send(records)
            .map_err(|e| TelemetryError::ChannelClosed(e.0.len()))
    }
}

// ============================================================================
// TESTS
// ============================================================================
