use axum::{Extension, Json};
use serde_json::{json, Value as JsonValue};

use crate::config::Config;

/// GET /health
pub async fn health_check(Extension(config): Extension<Config>) -> Json<JsonValue> {
    Json(json!({
        "status": "ok",
        "backend": config.backend.name(),
    }))
}
