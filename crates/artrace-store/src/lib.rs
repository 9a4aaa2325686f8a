use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use artrace_core::account::{Account, Subscription, SubscriptionKind};

#[derive(Debug, Clone)]
pub struct CreateAccountParams {
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProfileParams {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InsertSubscriptionParams {
    pub account_email: String,
    pub kind: SubscriptionKind,
    pub amount_paid_kobo: i64,
    pub payment_reference: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// A pending registration: the OTP code plus everything needed to create
/// the account once the code is confirmed. Stored durably so a process
/// restart cannot drop a registration mid-flow.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationCode {
    pub email: String,
    pub code: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Storage interface for accounts, subscriptions, and auth bookkeeping.
///
/// The server depends only on this trait; the DuckDB implementation lives
/// in `artrace-duckdb` and can be swapped without touching handlers. All
/// email arguments are expected pre-normalized (lowercase, trimmed).
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    async fn find_account(&self, email: &str) -> anyhow::Result<Option<Account>>;
    async fn create_account(&self, params: CreateAccountParams) -> anyhow::Result<Account>;
    /// Atomically claim the one-shot trial. Returns `true` for exactly one
    /// caller per account (the one whose update flipped `trial_used` from
    /// false to true); racing or repeat callers get `false`. Implementations
    /// must make the test and the set a single store operation.
    async fn mark_trial_used(&self, email: &str) -> anyhow::Result<bool>;
    async fn update_password(&self, email: &str, new_hash: &str) -> anyhow::Result<()>;
    async fn update_profile(
        &self,
        email: &str,
        params: UpdateProfileParams,
    ) -> anyhow::Result<Option<Account>>;
    async fn mark_onboarded(&self, email: &str) -> anyhow::Result<()>;

    /// Insert one subscription row. Must fail (constraint violation) if the
    /// payment reference is already present, so a racing duplicate callback
    /// cannot create a second row.
    async fn insert_subscription(
        &self,
        params: InsertSubscriptionParams,
    ) -> anyhow::Result<Subscription>;
    async fn find_subscription_by_reference(
        &self,
        reference: &str,
    ) -> anyhow::Result<Option<Subscription>>;
    /// The unexpired subscription with the **latest** `expires_at`, if any.
    /// Latest-expiry, not latest-created: a timely renewal must report the
    /// true access boundary.
    async fn latest_access(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Subscription>>;
    async fn count_subscriptions(&self, email: &str) -> anyhow::Result<i64>;

    async fn put_verification_code(&self, code: VerificationCode) -> anyhow::Result<()>;
    /// The pending code for `email`, if present and unexpired. An expired
    /// row is deleted and reported as absent. The row itself survives a
    /// wrong-code attempt; callers delete it explicitly once consumed.
    async fn get_verification_code(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<VerificationCode>>;
    async fn delete_verification_code(&self, email: &str) -> anyhow::Result<()>;

    async fn get_setting(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set_setting(&self, key: &str, value: &str) -> anyhow::Result<()>;
    async fn ensure_jwt_secret(&self) -> anyhow::Result<String>;

    async fn record_login_attempt(&self, ip: &str, succeeded: bool) -> anyhow::Result<()>;
    /// False when the IP has 5+ failed attempts in the last 15 minutes.
    async fn check_login_rate_limit(&self, ip: &str) -> anyhow::Result<bool>;
}
