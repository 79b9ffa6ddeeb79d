//! Scheduling Tools
//!
//! `schedule_review` runs one review through the adaptive dispatcher.
//! `create_item` returns a fresh state for a new item.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use cadence_core::{AdaptiveDispatcher, ScheduleInput};

/// Input schema for schedule_review
pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "state": {
                "type": "object",
                "description": "Current practice state: itemId, repetitions, easeFactor, interval, nextReviewDate, reviewHistory"
            },
            "feedback": {
                "type": "string",
                "enum": ["forgot", "hard", "good", "easy"],
                "description": "How well the learner recalled the item"
            },
            "responseTimeMs": {
                "type": "integer",
                "minimum": 0,
                "description": "Time the learner took to answer, in milliseconds"
            },
            "context": {
                "type": "object",
                "description": "Optional learner profile, course, competency and session signals. Enables contextual scheduling."
            },
            "metadata": {
                "type": "object",
                "description": "Optional item metadata: difficulty, averageResponseTimeMs, contentType, relatedItems"
            },
            "reviewedAt": {
                "type": "string",
                "format": "date-time",
                "description": "Review timestamp (defaults to now)"
            }
        },
        "required": ["state", "feedback"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleArgs {
    #[serde(flatten)]
    input: ScheduleInput,
    reviewed_at: Option<DateTime<Utc>>,
}

pub async fn execute(dispatcher: &AdaptiveDispatcher, args: Option<Value>) -> Result<Value, String> {
    let args: ScheduleArgs = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("Invalid arguments: {}", e))?,
        None => return Err("Missing arguments".to_string()),
    };

    let now = args.reviewed_at.unwrap_or_else(Utc::now);
    let result = dispatcher
        .schedule_review_at(args.input, now)
        .await
        .map_err(|e| e.to_string())?;

    serde_json::to_value(result).map_err(|e| e.to_string())
}

/// Input schema for create_item
pub fn create_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "itemId": {
                "type": "string",
                "description": "Identifier of the item to start practising"
            }
        },
        "required": ["itemId"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateArgs {
    item_id: String,
}

pub async fn execute_create(
    dispatcher: &AdaptiveDispatcher,
    args: Option<Value>,
) -> Result<Value, String> {
    let args: CreateArgs = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("Invalid arguments: {}", e))?,
        None => return Err("Missing arguments".to_string()),
    };
    if args.item_id.trim().is_empty() {
        return Err("itemId must not be empty".to_string());
    }

    let state = dispatcher.base().create_item(args.item_id);
    serde_json::to_value(state).map_err(|e| e.to_string())
}

// ============================================================================
// TESTS
// ============================================================================
