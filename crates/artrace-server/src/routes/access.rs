use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::Utc;
use serde_json::json;

use crate::{auth::middleware::AuthContext, error::AppError, state::AppState};

/// `POST /api/trial` — Activate the one-shot free trial for the session
/// account. Returns 201 with the expiry, or 400 once the trial is spent.
pub async fn start_trial(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, AppError> {
    let subscription = state.access.request_trial(&ctx.email, Utc::now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "data": {
                "kind": subscription.kind.as_str(),
                "expires_at": subscription.expires_at.to_rfc3339(),
            }
        })),
    ))
}

/// `GET /api/access` — Current access status for the session account.
///
/// Always 200; `has_access: false` is an answer, not an error.
pub async fn access_status(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, AppError> {
    let status = state.access.has_access(&ctx.email, Utc::now()).await?;

    Ok(Json(json!({
        "data": {
            "has_access": status.has_access,
            "expires_at": status.expires_at.map(|t| t.to_rfc3339()),
            "kind": status.kind.map(|k| k.as_str()),
        }
    })))
}
