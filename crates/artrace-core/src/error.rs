use thiserror::Error;

/// Error taxonomy of the access-control service.
///
/// Every variant is terminal for the current operation and maps to a
/// distinguishable HTTP error in the server crate. Nothing here is retried
/// internally; a caller may retry `begin_checkout` after a payment failure.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("free trial already used")]
    TrialAlreadyUsed,

    /// The gateway rejected the initiation call. The provider's own error
    /// text is preserved here for logs but is never echoed to end users.
    #[error("payment initiation failed: {0}")]
    PaymentInitiationFailed(String),

    #[error("payment not completed")]
    PaymentNotCompleted,

    #[error("payment gateway timed out")]
    PaymentGatewayTimeout,

    #[error("not found: {0}")]
    NotFound(String),

    /// Underlying persistence failure. Surfaced as a 500, never swallowed.
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}
