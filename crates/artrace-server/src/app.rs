use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{auth, routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer` — structured request/response logging via `tracing`.
/// 2. `CorsLayer` — permissive CORS for the JSON API.
///
/// Session auth runs only on the protected subrouter; registration,
/// login and the gated page handle their own session handling.
pub fn build_app(state: Arc<AppState>) -> Router {
    let require_auth = middleware::from_fn({
        let state = Arc::clone(&state);
        move |request, next| auth::middleware::require_auth(Arc::clone(&state), request, next)
    });

    let protected = Router::new()
        .route("/api/trial", post(routes::access::start_trial))
        .route("/api/access", get(routes::access::access_status))
        .route("/api/checkout", post(routes::checkout::start_checkout))
        .route(
            "/api/checkout/callback",
            get(routes::checkout::checkout_callback),
        )
        .route(
            "/api/profile",
            get(routes::profile::get_profile).post(routes::profile::update_profile),
        )
        .route(
            "/api/onboarding/complete",
            post(routes::profile::complete_onboarding),
        )
        .route(
            "/api/auth/change-password",
            post(auth::handlers::auth_change_password),
        )
        .layer(require_auth);

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/auth/send-otp", post(auth::handlers::auth_send_otp))
        .route("/api/auth/verify-otp", post(auth::handlers::auth_verify_otp))
        .route("/api/auth/login", post(auth::handlers::auth_login))
        .route("/api/auth/logout", post(auth::handlers::auth_logout))
        .route("/ar", get(routes::gate::gated_app))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
