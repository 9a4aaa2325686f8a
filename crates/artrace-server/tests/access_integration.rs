use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use artrace_core::config::Config;
use artrace_core::payment::{NullVerifier, PaymentVerifier};
use artrace_duckdb::DuckDbBackend;
use artrace_server::access::AccessControl;
use artrace_server::app::build_app;
use artrace_server::auth::jwt::encode_jwt;
use artrace_server::state::AppState;
use artrace_store::{AccountStore, CreateAccountParams};

const TEST_SECRET: &str = "test-jwt-secret";

fn test_config() -> Config {
    Config {
        port: 0,
        data_dir: "/tmp/artrace-test".to_string(),
        public_url: "http://localhost:3000".to_string(),
        cors_origins: vec![],
        trial_duration_hours: 24,
        paid_duration_days: 7,
        subscription_amount_kobo: 20_000,
        gateway_timeout_secs: 10,
        paystack_secret_key: String::new(),
        paystack_base_url: "https://api.paystack.co".to_string(),
        session_days: 7,
        argon2_memory_kb: 4096,
        otp_ttl_minutes: 5,
        smtp: None,
        duckdb_memory_limit: "1GB".to_string(),
    }
}

fn setup() -> (Arc<dyn AccountStore>, axum::Router) {
    let store: Arc<dyn AccountStore> =
        Arc::new(DuckDbBackend::open_in_memory().expect("in-memory DuckDB"));
    let config = test_config();
    let verifier: Arc<dyn PaymentVerifier> = Arc::new(NullVerifier::paid(20_000));
    let access = AccessControl::new(Arc::clone(&store), verifier, &config);
    let state = Arc::new(AppState {
        store: Arc::clone(&store),
        config: Arc::new(config),
        access,
        mailer: None,
        jwt_secret: TEST_SECRET.to_string(),
    });
    (store, build_app(state))
}

/// Seed an account and mint a session cookie for it.
async fn seeded_session(store: &Arc<dyn AccountStore>, email: &str) -> String {
    store
        .create_account(CreateAccountParams {
            email: email.to_string(),
            full_name: Some("Ada Example".to_string()),
            phone: None,
            password_hash: None,
        })
        .await
        .expect("create account");
    let (token, _) = encode_jwt(TEST_SECRET, email, 7).expect("encode jwt");
    format!("art_session={token}")
}

async fn json_body(response: axum::http::Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::empty()).expect("build request")
}

fn post(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("cookie", cookie)
        .body(Body::empty())
        .expect("build request")
}

// ============================================================
// BDD: Trial grants access once
// ============================================================
#[tokio::test]
async fn test_trial_grants_access() {
    let (store, app) = setup();
    let cookie = seeded_session(&store, "ada@example.com").await;

    let response = app
        .clone()
        .oneshot(post("/api/trial", &cookie))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = json_body(response).await;
    assert_eq!(json["data"]["kind"], "trial");

    let response = app
        .oneshot(get("/api/access", Some(&cookie)))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["data"]["has_access"], true);
    assert_eq!(json["data"]["kind"], "trial");
}

// ============================================================
// BDD: Second trial request fails with trial_already_used
// ============================================================
#[tokio::test]
async fn test_second_trial_is_rejected() {
    let (store, app) = setup();
    let cookie = seeded_session(&store, "ada@example.com").await;

    let response = app
        .clone()
        .oneshot(post("/api/trial", &cookie))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(post("/api/trial", &cookie))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "trial_already_used");
}

// ============================================================
// BDD: No subscription means has_access is false, not an error
// ============================================================
#[tokio::test]
async fn test_no_subscription_is_not_an_error() {
    let (store, app) = setup();
    let cookie = seeded_session(&store, "ada@example.com").await;

    let response = app
        .oneshot(get("/api/access", Some(&cookie)))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["data"]["has_access"], false);
    assert!(json["data"]["expires_at"].is_null());
}

// ============================================================
// BDD: Gated page redirects anonymous visitors to login
// ============================================================
#[tokio::test]
async fn test_gated_page_redirects_anonymous_to_login() {
    let (_store, app) = setup();

    let response = app.oneshot(get("/ar", None)).await.expect("request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get("location").expect("location header"),
        "/login"
    );
}

// ============================================================
// BDD: Gated page redirects expired accounts to subscribe
// ============================================================
#[tokio::test]
async fn test_gated_page_redirects_lapsed_to_subscribe() {
    let (store, app) = setup();
    let cookie = seeded_session(&store, "ada@example.com").await;

    let response = app
        .oneshot(get("/ar", Some(&cookie)))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get("location").expect("location header"),
        "/subscribe"
    );
}

// ============================================================
// BDD: Gated page serves the app to active subscribers
// ============================================================
#[tokio::test]
async fn test_gated_page_serves_active_subscribers() {
    let (store, app) = setup();
    let cookie = seeded_session(&store, "ada@example.com").await;

    let response = app
        .clone()
        .oneshot(post("/api/trial", &cookie))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(get("/ar", Some(&cookie)))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================
// BDD: Profile update keeps omitted fields
// ============================================================
#[tokio::test]
async fn test_profile_update_keeps_omitted_fields() {
    let (store, app) = setup();
    let cookie = seeded_session(&store, "ada@example.com").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/profile")
        .header("cookie", &cookie)
        .header("content-type", "application/json")
        .body(Body::from(r#"{"phone":"+2348000000000"}"#))
        .expect("build request");
    let response = app.clone().oneshot(request).await.expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["data"]["phone"], "+2348000000000");
    // Seeded name survives a partial update.
    assert_eq!(json["data"]["full_name"], "Ada Example");
}

// ============================================================
// BDD: Onboarding completion is idempotent
// ============================================================
#[tokio::test]
async fn test_onboarding_complete_is_idempotent() {
    let (store, app) = setup();
    let cookie = seeded_session(&store, "ada@example.com").await;

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post("/api/onboarding/complete", &cookie))
            .await
            .expect("request");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(get("/api/profile", Some(&cookie)))
        .await
        .expect("request");
    let json = json_body(response).await;
    assert_eq!(json["data"]["onboarded"], true);
}

// ============================================================
// BDD: Health endpoint answers without auth
// ============================================================
#[tokio::test]
async fn test_health_is_public() {
    let (_store, app) = setup();

    let response = app.oneshot(get("/health", None)).await.expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
}
