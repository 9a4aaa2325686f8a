use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::{auth::middleware::AuthContext, error::AppError, state::AppState};

/// `POST /api/checkout` — Start a paid checkout for the session account.
///
/// Returns the gateway's hosted checkout URL and the reference the
/// callback will come back with.
pub async fn start_checkout(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.access.begin_checkout(&ctx.email, Utc::now()).await?;

    Ok(Json(json!({
        "data": {
            "checkout_url": session.checkout_url,
            "reference": session.reference,
        }
    })))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// The gateway redirects with either `reference` or `trxref`
    /// depending on the flow; accept both.
    pub reference: Option<String>,
    pub trxref: Option<String>,
}

/// `GET /api/checkout/callback` — Gateway return URL.
///
/// Verifies the payment server-side and credits the subscription, then
/// sends the browser back into the app. Safe to hit more than once.
pub async fn checkout_callback(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<CallbackQuery>,
) -> Result<impl IntoResponse, AppError> {
    let reference = query
        .reference
        .or(query.trxref)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::BadRequest("payment reference required".to_string()))?;

    state
        .access
        .complete_checkout(&ctx.email, &reference, Utc::now())
        .await?;

    Ok(Redirect::to("/ar?payment=success"))
}
