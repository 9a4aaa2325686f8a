use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// What the gateway hands back from a successful initiation call.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub checkout_url: String,
    pub reference: String,
}

/// Result of verifying a reference against the gateway. `amount_kobo` is
/// the amount the provider actually settled — the only amount the service
/// ever trusts.
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub paid: bool,
    pub amount_kobo: i64,
    pub reference: String,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    /// Gateway answered with a non-success status. Body kept for logs.
    #[error("gateway rejected request: {0}")]
    Gateway(String),

    /// The bounded request timeout elapsed before the gateway answered.
    #[error("gateway timed out")]
    Timeout,

    #[error("unusable gateway response: {0}")]
    InvalidResponse(String),
}

/// Payment-gateway boundary.
///
/// Provider-specific request/response shaping (Paystack today) lives
/// entirely behind this trait; the access-control service only sees
/// checkout URLs, references, and verified amounts.
#[async_trait]
pub trait PaymentVerifier: Send + Sync + 'static {
    /// Start a checkout for `email` over `amount_kobo`, correlated by the
    /// caller-generated `reference`.
    async fn initiate(
        &self,
        email: &str,
        amount_kobo: i64,
        reference: &str,
    ) -> Result<CheckoutSession, PaymentError>;

    /// Ask the gateway whether `reference` was paid, and for how much.
    async fn verify(&self, reference: &str) -> Result<VerifiedPayment, PaymentError>;
}

/// How a [`NullVerifier`] answers `verify` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullVerifierMode {
    /// Every reference verifies as paid for the configured amount.
    Paid,
    /// Every reference verifies as unpaid.
    Unpaid,
    /// Every gateway call times out.
    Timeout,
    /// Every gateway call is rejected by the provider.
    Rejected,
}

/// A gateway stand-in that never leaves the process.
///
/// Used by the test suites and by deployments without a configured
/// provider key (checkouts then fail loudly as rejected instead of
/// hitting the network with bad credentials).
pub struct NullVerifier {
    mode: NullVerifierMode,
    amount_kobo: i64,
    initiated: std::sync::Mutex<Vec<String>>,
}

impl NullVerifier {
    pub fn paid(amount_kobo: i64) -> Self {
        Self::with_mode(NullVerifierMode::Paid, amount_kobo)
    }

    pub fn unpaid() -> Self {
        Self::with_mode(NullVerifierMode::Unpaid, 0)
    }

    pub fn with_mode(mode: NullVerifierMode, amount_kobo: i64) -> Self {
        Self {
            mode,
            amount_kobo,
            initiated: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// References passed to `initiate` so far, in call order.
    pub fn initiated_references(&self) -> Vec<String> {
        self.initiated.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PaymentVerifier for NullVerifier {
    async fn initiate(
        &self,
        _email: &str,
        _amount_kobo: i64,
        reference: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        match self.mode {
            NullVerifierMode::Timeout => return Err(PaymentError::Timeout),
            NullVerifierMode::Rejected => {
                return Err(PaymentError::Gateway("no gateway configured".to_string()))
            }
            _ => {}
        }
        if let Ok(mut log) = self.initiated.lock() {
            log.push(reference.to_string());
        }
        Ok(CheckoutSession {
            checkout_url: format!("https://checkout.invalid/{reference}"),
            reference: reference.to_string(),
        })
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedPayment, PaymentError> {
        match self.mode {
            NullVerifierMode::Timeout => Err(PaymentError::Timeout),
            NullVerifierMode::Rejected => {
                Err(PaymentError::Gateway("no gateway configured".to_string()))
            }
            NullVerifierMode::Unpaid => Ok(VerifiedPayment {
                paid: false,
                amount_kobo: 0,
                reference: reference.to_string(),
            }),
            NullVerifierMode::Paid => Ok(VerifiedPayment {
                paid: true,
                amount_kobo: self.amount_kobo,
                reference: reference.to_string(),
            }),
        }
    }
}

/// Generate a process-unique payment reference:
/// `ARTRACE-{yyyymmddHHMMSS}-{6 random alphanumerics}`.
///
/// A bare timestamp collides for two checkouts in the same second; the
/// random suffix closes that hole.
pub fn generate_reference(now: DateTime<Utc>) -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| {
            let idx = rng.gen_range(0..36);
            if idx < 10 {
                (b'0' + idx) as char
            } else {
                (b'a' + idx - 10) as char
            }
        })
        .collect();
    format!("ARTRACE-{}-{}", now.format("%Y%m%d%H%M%S"), suffix)
}
