//! MCP Tools
//!
//! Each tool module exposes `schema()` for `tools/list` and an `execute`
//! function returning either a JSON payload or a message for the client.

pub mod deck;
pub mod engine;
pub mod schedule;
