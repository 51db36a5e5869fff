//! Request bodies and helpers shared by the integration tests.

use serde_json::json;
use uuid::Uuid;

/// Create a register request body.
pub fn register_request(daily_goal_minutes: Option<i32>, utc_offset_minutes: Option<i32>) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    obj.insert("display_name".to_string(), json!("First Officer"));
    if let Some(goal) = daily_goal_minutes {
        obj.insert("daily_goal_minutes".to_string(), json!(goal));
    }
    if let Some(offset) = utc_offset_minutes {
        obj.insert("utc_offset_minutes".to_string(), json!(offset));
    }
    serde_json::Value::Object(obj)
}

pub fn review_request(quality: i32) -> serde_json::Value {
    json!({ "quality": quality })
}

pub fn listening_request(score_percent: f64) -> serde_json::Value {
    json!({ "score_percent": score_percent })
}

/// Completed speaking submission with every criterion at `score`.
pub fn speaking_request(score: f64) -> serde_json::Value {
    json!({
        "status": "completed",
        "criteria": {
            "pronunciation": score,
            "structure": score,
            "vocabulary": score,
            "fluency": score,
            "comprehension": score,
            "interaction": score
        }
    })
}

pub fn practice_request(vocab: i64, listening: i64, speaking: i64, minutes: i64) -> serde_json::Value {
    json!({
        "vocab_reviewed": vocab,
        "listening_completed": listening,
        "speaking_completed": speaking,
        "practice_minutes": minutes
    })
}

/// Generate a unique category so queue tests ignore other rows.
pub fn unique_category(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}
