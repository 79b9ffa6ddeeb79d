//! Training Telemetry Module
//!
//! Captures one structured record per contextual review so a retention model
//! can be trained offline:
//! - Feature derivation from state, context and metadata
//! - Bounded, mutex-guarded buffer with single flush per capacity crossing
//! - Pluggable sinks (JSON lines file, channel to a background writer)

mod collector;
mod record;
mod sink;

pub use collector::TelemetryCollector;
pub use record::{
    TrainingFeatures, TrainingOutcome, TrainingRecord, TREND_WINDOW, trend_direction,
};
pub use sink::{ChannelSink, DiscardSink, JsonlFileSink, TelemetryError, TelemetrySink};
