//! Dataset listing for Data Flow.

use axum::Json;
use serde_json::{json, Value};

/// GET /datasets/
pub async fn datasets() -> Json<Value> {
    Json(json!({
        "headers": [],
        "values": [],
        "next": null,
    }))
}
