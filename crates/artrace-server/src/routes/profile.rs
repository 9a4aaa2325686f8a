use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use serde_json::json;

use artrace_store::UpdateProfileParams;

use crate::{auth::middleware::AuthContext, error::AppError, state::AppState};

/// `GET /api/profile` — The session account's profile.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, AppError> {
    let account = state
        .store
        .find_account(&ctx.email)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound("account not found".to_string()))?;

    Ok(Json(json!({
        "data": {
            "email": account.email,
            "full_name": account.full_name.unwrap_or_default(),
            "phone": account.phone.unwrap_or_default(),
            "onboarded": account.onboarded,
        }
    })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// `POST /api/profile` — Update profile fields. Omitted fields are left
/// untouched.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state
        .store
        .update_profile(
            &ctx.email,
            UpdateProfileParams {
                full_name: req.full_name,
                phone: req.phone,
            },
        )
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound("account not found".to_string()))?;

    Ok(Json(json!({
        "data": {
            "email": updated.email,
            "full_name": updated.full_name.unwrap_or_default(),
            "phone": updated.phone.unwrap_or_default(),
        }
    })))
}

/// `POST /api/onboarding/complete` — Mark the session account as having
/// finished first-run onboarding. Idempotent.
pub async fn complete_onboarding(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, AppError> {
    state
        .store
        .mark_onboarded(&ctx.email)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(json!({ "data": { "ok": true } })))
}
