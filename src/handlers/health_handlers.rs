//! Health handler.
//!
//! - GET /api/healthcheck -> "up" when the database answers, "down" otherwise

use crate::{state::AppState, store};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;

/// `GET /api/healthcheck`
///
/// Runs `SELECT 1` against SQLite. HTTP 200 with `"up"` when it succeeds,
/// HTTP 500 with `"down"` and the failing check otherwise.
pub async fn healthcheck(State(state): State<AppState>) -> impl IntoResponse {
    let sqlite_check = match store::ping(&state.db).await {
        Ok(()) => CheckStatus {
            ok: true,
            error: None,
        },
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            CheckStatus {
                ok: false,
                error: Some(format!("error: {}", e)),
            }
        }
    };

    let overall_ok = sqlite_check.ok;
    let mut checks = HashMap::new();
    checks.insert("sqlite", sqlite_check);

    let body = HealthResponse {
        status: if overall_ok {
            HealthStatus::Up
        } else {
            HealthStatus::Down
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(body))
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum HealthStatus {
    Up,
    Down,
}

#[derive(Serialize)]
struct HealthResponse {
    status: HealthStatus,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}
