use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use artrace_core::config::Config;
use artrace_core::payment::{CheckoutSession, PaymentError, PaymentVerifier, VerifiedPayment};

/// Gateway client speaking the Paystack transaction API.
///
/// Every call carries the same bounded timeout so a stalled gateway
/// surfaces as [`PaymentError::Timeout`] instead of hanging the request.
pub struct PaystackVerifier {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
    callback_url: String,
}

// Paystack wraps every response in `{"status": bool, "message": ..., "data": ...}`.

#[derive(Debug, Deserialize)]
struct InitializeResponse {
    status: bool,
    message: Option<String>,
    data: Option<InitializeData>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    status: bool,
    message: Option<String>,
    data: Option<VerifyData>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    /// Transaction state: "success", "failed", "abandoned", ...
    status: String,
    /// Settled amount in kobo.
    amount: i64,
    reference: String,
}

impl PaystackVerifier {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.gateway_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.paystack_base_url.trim_end_matches('/').to_string(),
            secret_key: config.paystack_secret_key.clone(),
            callback_url: format!(
                "{}/api/checkout/callback",
                config.public_url.trim_end_matches('/')
            ),
        })
    }

    fn map_send_error(e: reqwest::Error) -> PaymentError {
        if e.is_timeout() {
            PaymentError::Timeout
        } else {
            PaymentError::Gateway(e.to_string())
        }
    }
}

#[async_trait]
impl PaymentVerifier for PaystackVerifier {
    async fn initiate(
        &self,
        email: &str,
        amount_kobo: i64,
        reference: &str,
    ) -> Result<CheckoutSession, PaymentError> {
        let payload = json!({
            "email": email,
            "amount": amount_kobo,
            "reference": reference,
            "callback_url": self.callback_url,
        });

        let resp = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&payload)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Self::map_send_error)?;
        if !status.is_success() {
            return Err(PaymentError::Gateway(format!(
                "initialize returned {status}: {body}"
            )));
        }

        let parsed: InitializeResponse = serde_json::from_str(&body)
            .map_err(|e| PaymentError::InvalidResponse(format!("{e}; body={body}")))?;
        if !parsed.status {
            return Err(PaymentError::Gateway(
                parsed.message.unwrap_or_else(|| "initialize rejected".to_string()),
            ));
        }
        let data = parsed
            .data
            .ok_or_else(|| PaymentError::InvalidResponse("initialize: missing data".to_string()))?;

        debug!(reference = %data.reference, "Paystack checkout initialized");
        Ok(CheckoutSession {
            checkout_url: data.authorization_url,
            reference: data.reference,
        })
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedPayment, PaymentError> {
        let resp = self
            .client
            .get(format!("{}/transaction/verify/{reference}", self.base_url))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Self::map_send_error)?;
        if !status.is_success() {
            return Err(PaymentError::Gateway(format!(
                "verify returned {status}: {body}"
            )));
        }

        let parsed: VerifyResponse = serde_json::from_str(&body)
            .map_err(|e| PaymentError::InvalidResponse(format!("{e}; body={body}")))?;
        if !parsed.status {
            return Err(PaymentError::Gateway(
                parsed.message.unwrap_or_else(|| "verify rejected".to_string()),
            ));
        }
        let data = parsed
            .data
            .ok_or_else(|| PaymentError::InvalidResponse("verify: missing data".to_string()))?;

        Ok(VerifiedPayment {
            paid: data.status == "success",
            amount_kobo: data.amount,
            reference: data.reference,
        })
    }
}
