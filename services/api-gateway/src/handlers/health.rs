use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use tradeflow_database::mongo_health_check;

use crate::AppState;

pub async fn detailed_health_check(State(state): State<AppState>) -> Json<Value> {
    let mongo_status = match mongo_health_check(&state.mongo_client).await {
        Ok(_) => json!({"status": "healthy", "message": "Connected"}),
        Err(e) => json!({"status": "unhealthy", "message": e.to_string()}),
    };

    let status = if mongo_status["status"] == "healthy" {
        "healthy"
    } else {
        "degraded"
    };

    Json(json!({
        "status": status,
        "service": "tradeflow-api-gateway",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "mongodb": mongo_status,
        }
    }))
}
