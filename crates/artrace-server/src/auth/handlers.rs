use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use artrace_core::account::{is_valid_email, normalize_email};
use artrace_store::{CreateAccountParams, VerificationCode};

use crate::{error::AppError, state::AppState};

use super::jwt::encode_jwt;
use super::middleware::AuthContext;
use super::password::{hash_password, validate_password_strength, verify_password};

const LOGIN_RATE_LIMIT_RETRY_AFTER_SECONDS: u64 = 15 * 60;

// ---------------------------------------------------------------------------
// POST /api/auth/send-otp
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// `POST /api/auth/send-otp` — Start registration.
///
/// Validates the email and password up front, stashes the pending
/// registration with a six-digit code, and emails the code. Resending
/// replaces any earlier pending code for the same address.
pub async fn auth_send_otp(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !is_valid_email(&req.email) {
        return Err(AppError::BadRequest("invalid email address".to_string()));
    }
    let email = normalize_email(&req.email);

    if state
        .store
        .find_account(&email)
        .await
        .map_err(AppError::Internal)?
        .is_some()
    {
        return Err(AppError::BadRequest(
            "an account with this email already exists".to_string(),
        ));
    }

    validate_password_strength(&req.password).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let password_hash =
        hash_password(&req.password, state.config.argon2_memory_kb).map_err(AppError::Internal)?;

    let code = generate_otp();
    state
        .store
        .put_verification_code(VerificationCode {
            email: email.clone(),
            code: code.clone(),
            password_hash,
            full_name: req.full_name,
            phone: req.phone,
            expires_at: Utc::now() + state.config.otp_ttl(),
        })
        .await
        .map_err(AppError::Internal)?;

    match &state.mailer {
        Some(mailer) => {
            if let Err(e) = mailer.send_verification_code(&email, &code).await {
                warn!(email = %email, error = %e, "Failed to send verification email");
                return Err(AppError::Internal(e));
            }
        }
        // No SMTP configured: surface the code in the logs for development.
        None => info!(email = %email, code = %code, "Verification code (SMTP not configured)"),
    }

    Ok(Json(json!({ "data": { "ok": true } })))
}

// ---------------------------------------------------------------------------
// POST /api/auth/verify-otp
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub code: String,
}

/// `POST /api/auth/verify-otp` — Complete registration.
///
/// A wrong code leaves the pending registration intact; only a correct
/// code (or expiry) consumes it. Returns 201 with a session cookie.
pub async fn auth_verify_otp(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&req.email);

    let pending = state
        .store
        .get_verification_code(&email, Utc::now())
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::BadRequest("no pending verification code".to_string()))?;

    if pending.code != req.code {
        return Err(AppError::BadRequest("incorrect verification code".to_string()));
    }

    let account = state
        .store
        .create_account(CreateAccountParams {
            email: email.clone(),
            full_name: pending.full_name,
            phone: pending.phone,
            password_hash: Some(pending.password_hash),
        })
        .await
        .map_err(AppError::Internal)?;

    state
        .store
        .delete_verification_code(&email)
        .await
        .map_err(AppError::Internal)?;

    info!(email = %email, "Account registered");

    let (token, expires_at) = encode_jwt(&state.jwt_secret, &email, state.config.session_days)
        .map_err(AppError::Internal)?;
    let cookie = build_session_cookie(&token, state.config.https(), state.config.session_days);

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "data": { "email": account.email, "expires_at": expires_at } })),
    ))
}

// ---------------------------------------------------------------------------
// POST /api/auth/login
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/login` — Login with email and password.
///
/// Rate limited: 5 failed attempts per 15 min per IP.
pub async fn auth_login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let client_ip = extract_client_ip(&headers);

    let allowed = state
        .store
        .check_login_rate_limit(&client_ip)
        .await
        .map_err(AppError::Internal)?;
    if !allowed {
        return Err(AppError::RateLimited {
            retry_after_seconds: LOGIN_RATE_LIMIT_RETRY_AFTER_SECONDS,
        });
    }

    let email = normalize_email(&req.email);
    let account = state
        .store
        .find_account(&email)
        .await
        .map_err(AppError::Internal)?;

    // Same failure path whether the account is missing or the password is
    // wrong, so responses do not reveal which addresses are registered.
    let verified = account
        .as_ref()
        .and_then(|a| a.password_hash.as_deref())
        .is_some_and(|hash| verify_password(&req.password, hash));

    state
        .store
        .record_login_attempt(&client_ip, verified)
        .await
        .map_err(AppError::Internal)?;

    if !verified {
        return Err(AppError::Unauthorized);
    }

    let (token, expires_at) = encode_jwt(&state.jwt_secret, &email, state.config.session_days)
        .map_err(AppError::Internal)?;
    let cookie = build_session_cookie(&token, state.config.https(), state.config.session_days);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "data": { "expires_at": expires_at } })),
    ))
}

// ---------------------------------------------------------------------------
// POST /api/auth/logout
// ---------------------------------------------------------------------------

/// `POST /api/auth/logout` — Clear session cookie. Always 200.
pub async fn auth_logout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cookie = clear_session_cookie(state.config.https());
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "data": { "ok": true } })),
    )
}

// ---------------------------------------------------------------------------
// POST /api/auth/change-password
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// `POST /api/auth/change-password` — Change the session account's password.
pub async fn auth_change_password(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = state
        .store
        .find_account(&ctx.email)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound("account not found".to_string()))?;

    let current_ok = account
        .password_hash
        .as_deref()
        .is_some_and(|hash| verify_password(&req.current_password, hash));
    if !current_ok {
        return Err(AppError::Unauthorized);
    }

    validate_password_strength(&req.new_password)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let new_hash = hash_password(&req.new_password, state.config.argon2_memory_kb)
        .map_err(AppError::Internal)?;
    state
        .store
        .update_password(&ctx.email, &new_hash)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(json!({ "data": { "ok": true } })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Six decimal digits, zero-padded.
fn generate_otp() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// Extract the real client IP from `X-Forwarded-For` (first entry).
///
/// Falls back to `"unknown"` when the header is absent.
fn extract_client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn build_session_cookie(token: &str, https: bool, session_days: u32) -> String {
    let secure = if https { "; Secure" } else { "" };
    format!(
        "art_session={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}{}",
        token,
        u64::from(session_days) * 86_400,
        secure,
    )
}

fn clear_session_cookie(https: bool) -> String {
    let secure = if https { "; Secure" } else { "" };
    format!(
        "art_session=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0{}",
        secure,
    )
}

#[cfg(test)]
mod tests {
    use super::{extract_client_ip, generate_otp};
    use axum::http::HeaderMap;

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..50 {
            let code = generate_otp();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn client_ip_takes_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().expect("value"));
        assert_eq!(extract_client_ip(&headers), "203.0.113.9");
    }

    #[test]
    fn client_ip_falls_back_to_unknown() {
        assert_eq!(extract_client_ip(&HeaderMap::new()), "unknown");
    }
}
