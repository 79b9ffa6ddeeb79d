//! Test Doubles and Fixtures

mod collaborators;
mod fixtures;

pub use collaborators::{FailingSimilarity, HangingRemote, ScriptedRemote};
pub use fixtures::{PracticeFactory, t0};
