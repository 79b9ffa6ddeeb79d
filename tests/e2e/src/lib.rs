//! Cadence End-to-End Test Support
//!
//! - `harness`: isolated telemetry files and dispatcher construction
//! - `mocks`: learner/item fixtures and scripted collaborators

pub mod harness;
pub mod mocks;
