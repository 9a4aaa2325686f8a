use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use artrace_core::account::{is_valid_email, normalize_email, AccessStatus, Subscription, SubscriptionKind};
use artrace_core::config::Config;
use artrace_core::error::AccessError;
use artrace_core::payment::{
    generate_reference, CheckoutSession, PaymentError, PaymentVerifier,
};
use artrace_store::{AccountStore, CreateAccountParams, InsertSubscriptionParams};

/// The access-control service: gates trial grants and subscription
/// activation behind the lifecycle rules, and answers access queries.
///
/// Every operation runs to completion within one inbound request; the
/// only outbound call is the gateway round-trip during checkout.
#[derive(Clone)]
pub struct AccessControl {
    store: Arc<dyn AccountStore>,
    verifier: Arc<dyn PaymentVerifier>,
    trial_duration: Duration,
    paid_duration: Duration,
    amount_kobo: i64,
}

impl AccessControl {
    pub fn new(
        store: Arc<dyn AccountStore>,
        verifier: Arc<dyn PaymentVerifier>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            verifier,
            trial_duration: config.trial_duration(),
            paid_duration: config.paid_duration(),
            amount_kobo: config.subscription_amount_kobo,
        }
    }

    /// Grant the one-shot free trial.
    ///
    /// Creates the account on first contact, so a trial can precede full
    /// registration. `trial_used` makes this unreachable a second time in
    /// any state, even after the trial window lapses.
    pub async fn request_trial(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Subscription, AccessError> {
        let email = validated(email)?;

        if self.store.find_account(&email).await?.is_none() {
            let created = self
                .store
                .create_account(CreateAccountParams {
                    email: email.clone(),
                    full_name: None,
                    phone: None,
                    password_hash: None,
                })
                .await;
            if let Err(e) = created {
                // A racing registration may win the unique-email race;
                // its account serves just as well.
                if self.store.find_account(&email).await?.is_none() {
                    return Err(AccessError::Store(e));
                }
            }
        }

        // The atomic claim is the only gate: of any number of racing
        // requests, exactly one flips the flag and inserts the row.
        if !self.store.mark_trial_used(&email).await? {
            return Err(AccessError::TrialAlreadyUsed);
        }
        let subscription = self
            .store
            .insert_subscription(InsertSubscriptionParams {
                account_email: email.clone(),
                kind: SubscriptionKind::Trial,
                amount_paid_kobo: 0,
                payment_reference: None,
                expires_at: now + self.trial_duration,
            })
            .await?;

        info!(email = %email, expires_at = %subscription.expires_at, "Trial granted");
        Ok(subscription)
    }

    /// Start a paid checkout: mint a fresh reference and hand the caller
    /// the gateway's checkout URL.
    pub async fn begin_checkout(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<CheckoutSession, AccessError> {
        let email = validated(email)?;
        let reference = generate_reference(now);

        let session = self
            .verifier
            .initiate(&email, self.amount_kobo, &reference)
            .await
            .map_err(|e| match e {
                PaymentError::Timeout => AccessError::PaymentGatewayTimeout,
                PaymentError::Gateway(detail) => AccessError::PaymentInitiationFailed(detail),
                PaymentError::InvalidResponse(detail) => {
                    AccessError::PaymentInitiationFailed(detail)
                }
            })?;

        info!(email = %email, reference = %session.reference, "Checkout initiated");
        Ok(session)
    }

    /// Reconcile a gateway callback for `reference`.
    ///
    /// Idempotent per reference: a repeat callback (or a racing duplicate)
    /// returns the already-created subscription rather than inserting a
    /// second row. `amount_paid_kobo` is always the gateway's verified
    /// amount, never anything the client sent.
    pub async fn complete_checkout(
        &self,
        email: &str,
        reference: &str,
        now: DateTime<Utc>,
    ) -> Result<Subscription, AccessError> {
        let email = validated(email)?;
        if reference.is_empty() {
            return Err(AccessError::Validation(
                "payment reference required".to_string(),
            ));
        }

        if let Some(existing) = self.store.find_subscription_by_reference(reference).await? {
            info!(reference = %reference, "Callback replay — subscription already credited");
            return Ok(existing);
        }

        if self.store.find_account(&email).await?.is_none() {
            return Err(AccessError::NotFound(format!("account {email}")));
        }

        let payment = self.verifier.verify(reference).await.map_err(|e| match e {
            PaymentError::Timeout => AccessError::PaymentGatewayTimeout,
            // A gateway that cannot confirm the payment means the attempt
            // stays uncredited; the user may retry the checkout.
            PaymentError::Gateway(detail) | PaymentError::InvalidResponse(detail) => {
                warn!(reference = %reference, detail = %detail, "Payment verification failed");
                AccessError::PaymentNotCompleted
            }
        })?;

        if !payment.paid {
            return Err(AccessError::PaymentNotCompleted);
        }

        let inserted = self
            .store
            .insert_subscription(InsertSubscriptionParams {
                account_email: email.clone(),
                kind: SubscriptionKind::Paid,
                amount_paid_kobo: payment.amount_kobo,
                payment_reference: Some(reference.to_string()),
                expires_at: now + self.paid_duration,
            })
            .await;

        match inserted {
            Ok(subscription) => {
                info!(
                    email = %email,
                    reference = %reference,
                    amount_kobo = payment.amount_kobo,
                    expires_at = %subscription.expires_at,
                    "Paid subscription created"
                );
                Ok(subscription)
            }
            // Two callbacks for one reference can race past the check
            // above; the UNIQUE constraint turns the loser into a no-op.
            Err(e) => match self.store.find_subscription_by_reference(reference).await? {
                Some(existing) => Ok(existing),
                None => Err(AccessError::Store(e)),
            },
        }
    }

    /// Does `email` hold access at `now`? Pure query, never an error for
    /// an unknown email or an empty subscription history.
    pub async fn has_access(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessStatus, AccessError> {
        let email = normalize_email(email);
        let status = match self.store.latest_access(&email, now).await? {
            Some(subscription) => {
                AccessStatus::granted(subscription.expires_at, subscription.kind)
            }
            None => AccessStatus::none(),
        };
        Ok(status)
    }
}

fn validated(email: &str) -> Result<String, AccessError> {
    if !is_valid_email(email) {
        return Err(AccessError::Validation(format!(
            "invalid email address: {email:?}"
        )));
    }
    Ok(normalize_email(email))
}
