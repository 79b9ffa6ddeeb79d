//! Dispatch Module
//!
//! Per-review choice between the contextual engine and the base algorithm:
//! - Eligibility rules (profile, competencies, prior reviews, toggle)
//! - Optional remote backend with timeout and fallback
//! - Usage counters for observability

mod dispatcher;
mod remote;

pub use dispatcher::{
    AdaptiveDispatcher, BASE_PATH_CONFIDENCE, DispatchPath, DispatchStats, FallbackReason,
    ScheduleInput, ScheduleMethod, UnifiedResult,
};
pub use remote::{
    RemoteContext, RemoteError, RemoteRequest, RemoteResponse, RemoteResult, RemoteScheduler,
};

#[cfg(feature = "http-remote")]
pub use remote::HttpRemoteScheduler;
