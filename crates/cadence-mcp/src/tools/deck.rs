//! Deck Tools
//!
//! Read-only queries over a caller-supplied list of practice states:
//! due selection, workload forecast, study streak and retention estimate.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use cadence_core::{AdaptiveDispatcher, PracticeState};

/// Longest forecast horizon accepted
const MAX_FORECAST_DAYS: u32 = 365;

fn items_property() -> Value {
    serde_json::json!({
        "type": "array",
        "items": { "type": "object" },
        "description": "Practice states of the deck"
    })
}

fn parse<T: serde::de::DeserializeOwned>(args: Option<Value>) -> Result<T, String> {
    match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("Invalid arguments: {}", e)),
        None => Err("Missing arguments".to_string()),
    }
}

// ============================================================================
// due_items
// ============================================================================

pub fn due_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "items": items_property(),
            "limit": {
                "type": "integer",
                "minimum": 1,
                "description": "Maximum number of items to return"
            },
            "now": {
                "type": "string",
                "format": "date-time",
                "description": "Reference time (defaults to now)"
            }
        },
        "required": ["items"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DueArgs {
    items: Vec<PracticeState>,
    limit: Option<usize>,
    now: Option<DateTime<Utc>>,
}

pub async fn execute_due(dispatcher: &AdaptiveDispatcher, args: Option<Value>) -> Result<Value, String> {
    let args: DueArgs = parse(args)?;
    let now = args.now.unwrap_or_else(Utc::now);

    let due = dispatcher.base().due_items(&args.items, now);
    let total_due = due.len();
    let limit = args.limit.unwrap_or(total_due);

    let items: Vec<Value> = due
        .into_iter()
        .take(limit)
        .map(|state| {
            let overdue_hours = (now - state.next_review_date).num_minutes() as f64 / 60.0;
            serde_json::json!({
                "itemId": state.item_id,
                "nextReviewDate": state.next_review_date.to_rfc3339(),
                "easeFactor": state.ease_factor,
                "interval": state.interval,
                "overdueDays": (overdue_hours / 24.0 * 100.0).round() / 100.0,
            })
        })
        .collect();

    Ok(serde_json::json!({
        "totalDue": total_due,
        "returned": items.len(),
        "items": items,
    }))
}

// ============================================================================
// forecast
// ============================================================================

pub fn forecast_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "items": items_property(),
            "days": {
                "type": "integer",
                "minimum": 1,
                "maximum": MAX_FORECAST_DAYS,
                "default": 7,
                "description": "Number of days to forecast, starting today"
            }
        },
        "required": ["items"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForecastArgs {
    items: Vec<PracticeState>,
    days: Option<u32>,
    now: Option<DateTime<Utc>>,
}

pub async fn execute_forecast(
    dispatcher: &AdaptiveDispatcher,
    args: Option<Value>,
) -> Result<Value, String> {
    let args: ForecastArgs = parse(args)?;
    let days = args.days.unwrap_or(7);
    if !(1..=MAX_FORECAST_DAYS).contains(&days) {
        return Err(format!("days must be between 1 and {}", MAX_FORECAST_DAYS));
    }

    let forecast = dispatcher
        .base()
        .forecast_at(&args.items, days, args.now.unwrap_or_else(Utc::now));
    let total: usize = forecast.iter().map(|day| day.due).sum();

    Ok(serde_json::json!({
        "days": forecast,
        "total": total,
    }))
}

// ============================================================================
// streak
// ============================================================================

pub fn streak_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "items": items_property()
        },
        "required": ["items"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreakArgs {
    items: Vec<PracticeState>,
    today: Option<chrono::NaiveDate>,
}

pub async fn execute_streak(
    dispatcher: &AdaptiveDispatcher,
    args: Option<Value>,
) -> Result<Value, String> {
    let args: StreakArgs = parse(args)?;
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
    let streak = dispatcher.base().streak_at(&args.items, today);

    Ok(serde_json::json!({
        "streak": streak,
        "asOf": today.to_string(),
    }))
}

// ============================================================================
// estimate_retention
// ============================================================================

pub fn retention_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "state": {
                "type": "object",
                "description": "Practice state of the item"
            },
            "lastReviewDate": {
                "type": "string",
                "format": "date-time",
                "description": "Date of the last review (defaults to the newest history entry)"
            }
        },
        "required": ["state"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetentionArgs {
    state: PracticeState,
    last_review_date: Option<DateTime<Utc>>,
    now: Option<DateTime<Utc>>,
}

pub async fn execute_retention(
    dispatcher: &AdaptiveDispatcher,
    args: Option<Value>,
) -> Result<Value, String> {
    let args: RetentionArgs = parse(args)?;
    let last_review = args
        .last_review_date
        .or_else(|| args.state.last_review_date())
        .ok_or_else(|| "Item has no review history; supply lastReviewDate".to_string())?;
    let now = args.now.unwrap_or_else(Utc::now);

    let retention = dispatcher
        .base()
        .estimate_retention_at(&args.state, last_review, now);
    let days_since = (now - last_review).num_seconds() as f64 / 86_400.0;

    Ok(serde_json::json!({
        "itemId": args.state.item_id,
        "retention": retention,
        "daysSinceReview": (days_since * 100.0).round() / 100.0,
        "interval": args.state.interval,
    }))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cadence_core::{DiscardSink, TelemetryCollector};
    use serde_json::json;

    fn dispatcher() -> AdaptiveDispatcher {
        AdaptiveDispatcher::new(Arc::new(TelemetryCollector::new(10, Arc::new(DiscardSink))))
    }

    fn state(id: &str, ease: f64, due: &str) -> Value {
        json!({
            "itemId": id,
            "repetitions": 2,
            "easeFactor": ease,
            "interval": 6,
            "nextReviewDate": due
        })
    }

    #[tokio::test]
    async fn test_due_items_ordered_and_limited() {
        let args = json!({
            "items": [
                state("later", 2.5, "2026-03-10T00:00:00Z"),
                state("old", 2.5, "2026-02-20T00:00:00Z"),
                state("hard", 1.5, "2026-02-28T00:00:00Z"),
                state("easy", 2.8, "2026-02-28T00:00:00Z"),
            ],
            "limit": 2,
            "now": "2026-03-01T00:00:00Z"
        });
        let result = execute_due(&dispatcher(), Some(args)).await.unwrap();

        assert_eq!(result["totalDue"], 3);
        assert_eq!(result["returned"], 2);
        assert_eq!(result["items"][0]["itemId"], "old");
        assert_eq!(result["items"][0]["overdueDays"], 9.0);
        assert_eq!(result["items"][1]["itemId"], "hard");
    }

    #[tokio::test]
    async fn test_forecast_bounds() {
        let err = execute_forecast(&dispatcher(), Some(json!({ "items": [], "days": 0 })))
            .await
            .unwrap_err();
        assert!(err.contains("between 1 and 365"));

        let args = json!({
            "items": [
                state("a", 2.5, "2026-02-27T00:00:00Z"),
                state("b", 2.5, "2026-03-02T08:00:00Z"),
                state("c", 2.5, "2026-04-30T00:00:00Z"),
            ],
            "days": 3,
            "now": "2026-03-01T12:00:00Z"
        });
        let result = execute_forecast(&dispatcher(), Some(args)).await.unwrap();
        assert_eq!(result["days"].as_array().unwrap().len(), 3);
        assert_eq!(result["days"][0]["due"], 1);
        assert_eq!(result["days"][1]["due"], 1);
        assert_eq!(result["total"], 2);
    }

    #[tokio::test]
    async fn test_streak_counts_consecutive_days() {
        let mut item = state("a", 2.5, "2026-03-10T00:00:00Z");
        item["reviewHistory"] = json!([
            { "date": "2026-02-27T10:00:00Z", "quality": 4, "responseTimeMs": 1000 },
            { "date": "2026-02-28T10:00:00Z", "quality": 4, "responseTimeMs": 1000 },
            { "date": "2026-03-01T10:00:00Z", "quality": 5, "responseTimeMs": 900 }
        ]);
        let args = json!({ "items": [item], "today": "2026-03-01" });
        let result = execute_streak(&dispatcher(), Some(args)).await.unwrap();
        assert_eq!(result["streak"], 3);
    }

    #[tokio::test]
    async fn test_retention_needs_a_review_date() {
        let args = json!({ "state": state("a", 2.5, "2026-03-10T00:00:00Z") });
        let err = execute_retention(&dispatcher(), Some(args)).await.unwrap_err();
        assert!(err.contains("lastReviewDate"));
    }

    #[tokio::test]
    async fn test_retention_within_interval_is_full() {
        let args = json!({
            "state": state("a", 2.5, "2026-03-10T00:00:00Z"),
            "lastReviewDate": "2026-03-01T00:00:00Z",
            "now": "2026-03-04T00:00:00Z"
        });
        let result = execute_retention(&dispatcher(), Some(args)).await.unwrap();
        assert_eq!(result["retention"], 1.0);
        assert_eq!(result["daysSinceReview"], 3.0);
    }
}
