//! Engine Tools
//!
//! Operational controls: usage counters, the contextual toggle and a manual
//! telemetry flush.

use serde::Deserialize;
use serde_json::Value;

use cadence_core::AdaptiveDispatcher;

pub fn stats_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {}
    })
}

pub async fn execute_stats(dispatcher: &AdaptiveDispatcher) -> Result<Value, String> {
    let stats = dispatcher.stats();
    let telemetry = dispatcher.telemetry();

    let mut value = serde_json::to_value(stats).map_err(|e| e.to_string())?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("telemetryRecorded".to_string(), telemetry.recorded_count().into());
        obj.insert(
            "telemetryFlushFailures".to_string(),
            telemetry.flush_failure_count().into(),
        );
    }
    Ok(value)
}

pub fn toggle_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "enabled": {
                "type": "boolean",
                "description": "true to allow contextual scheduling, false to force plain SM-2"
            }
        },
        "required": ["enabled"]
    })
}

#[derive(Debug, Deserialize)]
struct ToggleArgs {
    enabled: bool,
}

pub async fn execute_toggle(
    dispatcher: &AdaptiveDispatcher,
    args: Option<Value>,
) -> Result<Value, String> {
    let args: ToggleArgs = match args {
        Some(v) => serde_json::from_value(v).map_err(|e| format!("Invalid arguments: {}", e))?,
        None => return Err("Missing arguments".to_string()),
    };

    let previous = dispatcher.is_contextual_enabled();
    dispatcher.set_contextual_enabled(args.enabled);

    Ok(serde_json::json!({
        "contextualEnabled": args.enabled,
        "changed": previous != args.enabled,
    }))
}

pub fn flush_schema() -> Value {
    stats_schema()
}

pub async fn execute_flush(dispatcher: &AdaptiveDispatcher) -> Result<Value, String> {
    let flushed = dispatcher.telemetry().flush();
    Ok(serde_json::json!({ "flushed": flushed }))
}
