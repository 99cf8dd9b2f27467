use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "habitflow-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Ready when the local tier is writable. The remote tier is reported but
/// never blocks readiness.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let local = state.store.check_local().await;
    let remote = state.store.remote_status().await;
    let data_dir = state.config.data_dir.display().to_string();
    let insights = if state.insights.is_configured() {
        "configured"
    } else {
        "fallback"
    };

    match local {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "checks": { "local": "ok", "remote": remote, "insights": insights },
                "data_dir": data_dir,
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Local data directory not writable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not_ready",
                    "checks": { "local": "failed", "remote": remote, "insights": insights },
                    "data_dir": data_dir,
                })),
            )
        }
    }
}
