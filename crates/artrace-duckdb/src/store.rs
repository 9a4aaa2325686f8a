use async_trait::async_trait;
use chrono::{DateTime, Utc};

use artrace_core::account::{Account, Subscription};
use artrace_store::{
    AccountStore, CreateAccountParams, InsertSubscriptionParams, UpdateProfileParams,
    VerificationCode,
};

use crate::DuckDbBackend;

/// Delegates the [`AccountStore`] trait to the inherent query methods so
/// the server can hold an `Arc<dyn AccountStore>` while tests may call the
/// backend directly.
#[async_trait]
impl AccountStore for DuckDbBackend {
    async fn find_account(&self, email: &str) -> anyhow::Result<Option<Account>> {
        DuckDbBackend::find_account(self, email).await
    }

    async fn create_account(&self, params: CreateAccountParams) -> anyhow::Result<Account> {
        DuckDbBackend::create_account(self, params).await
    }

    async fn mark_trial_used(&self, email: &str) -> anyhow::Result<bool> {
        DuckDbBackend::mark_trial_used(self, email).await
    }

    async fn update_password(&self, email: &str, new_hash: &str) -> anyhow::Result<()> {
        DuckDbBackend::update_password(self, email, new_hash).await
    }

    async fn update_profile(
        &self,
        email: &str,
        params: UpdateProfileParams,
    ) -> anyhow::Result<Option<Account>> {
        DuckDbBackend::update_profile(self, email, params).await
    }

    async fn mark_onboarded(&self, email: &str) -> anyhow::Result<()> {
        DuckDbBackend::mark_onboarded(self, email).await
    }

    async fn insert_subscription(
        &self,
        params: InsertSubscriptionParams,
    ) -> anyhow::Result<Subscription> {
        DuckDbBackend::insert_subscription(self, params).await
    }

    async fn find_subscription_by_reference(
        &self,
        reference: &str,
    ) -> anyhow::Result<Option<Subscription>> {
        DuckDbBackend::find_subscription_by_reference(self, reference).await
    }

    async fn latest_access(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Subscription>> {
        DuckDbBackend::latest_access(self, email, now).await
    }

    async fn count_subscriptions(&self, email: &str) -> anyhow::Result<i64> {
        DuckDbBackend::count_subscriptions(self, email).await
    }

    async fn put_verification_code(&self, code: VerificationCode) -> anyhow::Result<()> {
        DuckDbBackend::put_verification_code(self, code).await
    }

    async fn get_verification_code(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<VerificationCode>> {
        DuckDbBackend::get_verification_code(self, email, now).await
    }

    async fn delete_verification_code(&self, email: &str) -> anyhow::Result<()> {
        DuckDbBackend::delete_verification_code(self, email).await
    }

    async fn get_setting(&self, key: &str) -> anyhow::Result<Option<String>> {
        DuckDbBackend::get_setting(self, key).await
    }

    async fn set_setting(&self, key: &str, value: &str) -> anyhow::Result<()> {
        DuckDbBackend::set_setting(self, key, value).await
    }

    async fn ensure_jwt_secret(&self) -> anyhow::Result<String> {
        DuckDbBackend::ensure_jwt_secret(self).await
    }

    async fn record_login_attempt(&self, ip: &str, succeeded: bool) -> anyhow::Result<()> {
        DuckDbBackend::record_login_attempt(self, ip, succeeded).await
    }

    async fn check_login_rate_limit(&self, ip: &str) -> anyhow::Result<bool> {
        DuckDbBackend::check_login_rate_limit(self, ip).await
    }
}
