//! Test Harness

mod telemetry_manager;

pub use telemetry_manager::TestTelemetry;
