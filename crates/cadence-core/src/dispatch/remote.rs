//! Remote Scheduling Call
//!
//! Optional backend that performs the contextual computation centrally.
//! The dispatcher treats every error here as a reason to fall back to the
//! base algorithm.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::practice::{
    DeviceType, Feedback, MAX_INTERVAL_DAYS, MAX_REPETITIONS, MIN_EASE_FACTOR,
};

// ============================================================================
// WIRE TYPES
// ============================================================================

/// Environment signals forwarded to the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteContext {
    /// Device the review happened on
    pub device_type: Option<DeviceType>,
    /// Local hour of day (0-23)
    pub time_of_day: Option<u32>,
}

/// Body of a remote scheduling request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRequest {
    /// Learner identifier
    pub user_id: String,
    /// Item identifier
    pub item_id: String,
    /// Course the item belongs to
    pub course_id: Option<String>,
    /// Competency the item exercises
    pub competency_id: Option<String>,
    /// Recall label
    pub feedback: Feedback,
    /// Response time of this review
    pub response_time_ms: u64,
    /// Environment signals
    pub context: RemoteContext,
}

/// Scheduling fields computed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteResult {
    /// Repetitions after the review
    pub repetitions: i32,
    /// Ease factor after the review
    pub ease_factor: f64,
    /// Interval in days
    pub interval: i32,
    /// Next review timestamp
    pub next_review_date: DateTime<Utc>,
    /// Why the interval differs from plain SM-2
    #[serde(default)]
    pub adjustment_reason: String,
    /// Product of applied multipliers
    #[serde(default = "neutral_factor")]
    pub adjustment_factor: f64,
    /// Backend confidence in `[0, 1]`
    pub confidence: f64,
    /// Backend-specific diagnostics, passed through untouched
    #[serde(default)]
    pub stats: Option<serde_json::Value>,
}

fn neutral_factor() -> f64 {
    1.0
}

impl RemoteResult {
    /// Reject results that would break state invariants
    pub fn validate(&self) -> Result<(), RemoteError> {
        if !(0..=MAX_REPETITIONS).contains(&self.repetitions) {
            return Err(RemoteError::Malformed(format!(
                "repetitions {} out of range",
                self.repetitions
            )));
        }
        if !self.ease_factor.is_finite() || self.ease_factor < MIN_EASE_FACTOR {
            return Err(RemoteError::Malformed(format!(
                "ease factor {} below floor",
                self.ease_factor
            )));
        }
        if !(1..=MAX_INTERVAL_DAYS).contains(&self.interval) {
            return Err(RemoteError::Malformed(format!(
                "interval {} outside 1..={MAX_INTERVAL_DAYS} days",
                self.interval
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(RemoteError::Malformed(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// Envelope returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteResponse {
    /// Whether the backend produced a schedule
    pub success: bool,
    /// Schedule, present on success
    #[serde(default)]
    pub result: Option<RemoteResult>,
    /// Error description, present on failure
    #[serde(default)]
    pub error: Option<String>,
}

impl RemoteResponse {
    /// Successful response wrapping `result`
    pub fn ok(result: RemoteResult) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    /// Failed response with a message
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(message.into()),
        }
    }

    /// Unwrap the envelope into a validated result
    pub fn into_result(self) -> Result<RemoteResult, RemoteError> {
        if !self.success {
            return Err(RemoteError::Rejected(
                self.error.unwrap_or_else(|| "unspecified error".to_string()),
            ));
        }
        let result = self
            .result
            .ok_or_else(|| RemoteError::Malformed("success without result".to_string()))?;
        result.validate()?;
        Ok(result)
    }
}

// ============================================================================
// ERRORS / TRAIT
// ============================================================================

/// Remote call failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    /// Transport failed before a response arrived
    #[error("request failed: {0}")]
    Transport(String),
    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// Status code
        status: u16,
        /// Response body
        body: String,
    },
    /// Backend answered `success: false`
    #[error("backend rejected request: {0}")]
    Rejected(String),
    /// Response could not be used
    #[error("malformed response: {0}")]
    Malformed(String),
    /// No answer within the collaborator timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Remote scheduling collaborator
#[async_trait]
pub trait RemoteScheduler: Send + Sync {
    /// Perform one scheduling call. Single attempt, no retry.
    async fn schedule(&self, request: RemoteRequest) -> Result<RemoteResponse, RemoteError>;
}

// ============================================================================
// HTTP IMPLEMENTATION
// ============================================================================

#[cfg(feature = "http-remote")]
pub use http::HttpRemoteScheduler;

#[cfg(feature = "http-remote")]
mod http {
    use super::*;

    /// JSON POST to `<endpoint>/schedule`
    #[derive(Debug, Clone)]
    pub struct HttpRemoteScheduler {
        client: reqwest::Client,
        url: String,
    }

    impl HttpRemoteScheduler {
        /// Client for `endpoint` with a per-request timeout
        pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, RemoteError> {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| RemoteError::Transport(e.to_string()))?;
            Ok(Self {
                client,
                url: format!("{}/schedule", endpoint.trim().trim_end_matches('/')),
            })
        }

        /// Full request URL
        pub fn url(&self) -> &str {
            &self.url
        }
    }

    #[async_trait]
    impl RemoteScheduler for HttpRemoteScheduler {
        async fn schedule(&self, request: RemoteRequest) -> Result<RemoteResponse, RemoteError> {
            let resp = self
                .client
                .post(&self.url)
                .json(&request)
                .send()
                .await
                .map_err(|e| RemoteError::Transport(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(RemoteError::HttpStatus {
                    status: status.as_u16(),
                    body,
                });
            }
            resp.json::<RemoteResponse>()
                .await
                .map_err(|e| RemoteError::Malformed(e.to_string()))
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
