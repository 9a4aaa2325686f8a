use std::sync::Arc;

use axum::{
    extract::{Request, State},
    response::{Html, IntoResponse, Redirect},
};
use chrono::Utc;

use crate::{auth::middleware::session_email, error::AppError, state::AppState};

/// `GET /ar` — The gated application surface.
///
/// Access is re-checked on every hit rather than cached in the session,
/// so an expiry takes effect on the next page load:
/// no session -> 303 to `/login`; session without an active
/// subscription -> 303 to `/subscribe`; otherwise the app shell.
pub async fn gated_app(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<impl IntoResponse, AppError> {
    let email = match session_email(&state, &request) {
        Some(email) => email,
        None => return Ok(Redirect::to("/login").into_response()),
    };

    let status = state.access.has_access(&email, Utc::now()).await?;
    if !status.has_access {
        return Ok(Redirect::to("/subscribe").into_response());
    }

    Ok(Html(APP_SHELL).into_response())
}

/// Minimal shell; the real frontend assets are mounted in front of the
/// API in deployment.
const APP_SHELL: &str = "<!doctype html>\
<html><head><title>ArTrace</title></head>\
<body><div id=\"app\" data-page=\"ar\"></div></body></html>";
