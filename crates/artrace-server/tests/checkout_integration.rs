use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use artrace_core::config::Config;
use artrace_core::payment::{NullVerifier, NullVerifierMode, PaymentVerifier};
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

fn setup_with(verifier: NullVerifier) -> (Arc<dyn AccountStore>, axum::Router) {
    let store: Arc<dyn AccountStore> =
        Arc::new(DuckDbBackend::open_in_memory().expect("in-memory DuckDB"));
    let config = test_config();
    let verifier: Arc<dyn PaymentVerifier> = Arc::new(verifier);
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

async fn seeded_session(store: &Arc<dyn AccountStore>, email: &str) -> String {
    store
        .create_account(CreateAccountParams {
            email: email.to_string(),
            full_name: None,
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

fn get(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("cookie", cookie)
        .body(Body::empty())
        .expect("build request")
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
// BDD: Starting a checkout returns the gateway URL
// ============================================================
#[tokio::test]
async fn test_checkout_returns_gateway_url() {
    let (store, app) = setup_with(NullVerifier::paid(20_000));
    let cookie = seeded_session(&store, "ada@example.com").await;

    let response = app
        .oneshot(post("/api/checkout", &cookie))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    let reference = json["data"]["reference"].as_str().expect("reference");
    assert!(reference.starts_with("ARTRACE-"));
    assert!(json["data"]["checkout_url"].as_str().expect("url").contains(reference));
}

// ============================================================
// BDD: Callback credits the subscription and redirects into the app
// ============================================================
#[tokio::test]
async fn test_callback_credits_and_redirects() {
    let (store, app) = setup_with(NullVerifier::paid(20_000));
    let cookie = seeded_session(&store, "ada@example.com").await;

    let response = app
        .clone()
        .oneshot(get("/api/checkout/callback?reference=REF-1", &cookie))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get("location").expect("location header"),
        "/ar?payment=success"
    );

    let response = app
        .oneshot(get("/api/access", &cookie))
        .await
        .expect("request");
    let json = json_body(response).await;
    assert_eq!(json["data"]["has_access"], true);
    assert_eq!(json["data"]["kind"], "paid");
}

// ============================================================
// BDD: The trxref query parameter is accepted as the reference
// ============================================================
#[tokio::test]
async fn test_callback_accepts_trxref_parameter() {
    let (store, app) = setup_with(NullVerifier::paid(20_000));
    let cookie = seeded_session(&store, "ada@example.com").await;

    let response = app
        .oneshot(get("/api/checkout/callback?trxref=REF-TRX", &cookie))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

// ============================================================
// BDD: Replaying the callback does not extend access
// ============================================================
#[tokio::test]
async fn test_callback_replay_is_benign() {
    let (store, app) = setup_with(NullVerifier::paid(20_000));
    let cookie = seeded_session(&store, "ada@example.com").await;

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get("/api/checkout/callback?reference=REF-DUP", &cookie))
            .await
            .expect("request");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    let subscription = store
        .find_subscription_by_reference("REF-DUP")
        .await
        .expect("query")
        .expect("subscription");
    assert_eq!(subscription.payment_reference.as_deref(), Some("REF-DUP"));
}

// ============================================================
// BDD: Callback without a reference is a validation error
// ============================================================
#[tokio::test]
async fn test_callback_without_reference_is_rejected() {
    let (store, app) = setup_with(NullVerifier::paid(20_000));
    let cookie = seeded_session(&store, "ada@example.com").await;

    let response = app
        .oneshot(get("/api/checkout/callback", &cookie))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
}

// ============================================================
// BDD: Unpaid verification does not credit access
// ============================================================
#[tokio::test]
async fn test_unpaid_verification_does_not_credit() {
    let (store, app) = setup_with(NullVerifier::unpaid());
    let cookie = seeded_session(&store, "ada@example.com").await;

    let response = app
        .clone()
        .oneshot(get("/api/checkout/callback?reference=REF-NO", &cookie))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "payment_not_completed");

    let response = app
        .oneshot(get("/api/access", &cookie))
        .await
        .expect("request");
    let json = json_body(response).await;
    assert_eq!(json["data"]["has_access"], false);
}

// ============================================================
// BDD: A stalled gateway surfaces as 504
// ============================================================
#[tokio::test]
async fn test_gateway_timeout_is_504() {
    let (store, app) = setup_with(NullVerifier::with_mode(NullVerifierMode::Timeout, 0));
    let cookie = seeded_session(&store, "ada@example.com").await;

    let response = app
        .oneshot(post("/api/checkout", &cookie))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "payment_gateway_timeout");
}

// ============================================================
// BDD: A rejecting gateway surfaces as 502 without provider detail
// ============================================================
#[tokio::test]
async fn test_gateway_rejection_is_502_and_opaque() {
    let (store, app) = setup_with(NullVerifier::with_mode(NullVerifierMode::Rejected, 0));
    let cookie = seeded_session(&store, "ada@example.com").await;

    let response = app
        .oneshot(post("/api/checkout", &cookie))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "payment_init_failed");
    // Provider detail stays in the logs.
    assert_eq!(json["error"]["message"], "Payment could not be initiated");
}
