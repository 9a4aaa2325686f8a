use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::state::AppState;

use super::jwt::decode_jwt;

/// Auth context injected into request extensions after successful auth.
/// Handlers take the account identity from here, never from the request
/// body or query string.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub email: String,
}

/// Require a valid session cookie. Responds 401 otherwise.
pub async fn require_auth(state: Arc<AppState>, mut request: Request, next: Next) -> Response {
    match session_email(&state, &request) {
        Some(email) => {
            request.extensions_mut().insert(AuthContext { email });
            next.run(request).await
        }
        None => unauthorized_response(),
    }
}

/// Extract and validate the session cookie, returning the account email.
pub fn session_email(state: &AppState, request: &Request) -> Option<String> {
    let token = request
        .headers()
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookie_str| {
            cookie_str
                .split(';')
                .find_map(|c| c.trim().strip_prefix("art_session="))
                .map(|t| t.to_string())
        })?;

    let claims = decode_jwt(&token, &state.jwt_secret).ok()?;
    Some(claims.sub)
}

fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": {
                "code": "unauthorized",
                "message": "Not authenticated"
            }
        })),
    )
        .into_response()
}
