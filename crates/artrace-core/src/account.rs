use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user account.
///
/// `email` is the external identity: it is unique, stored lowercase, and
/// every subscription row references it. `trial_used` flips false→true
/// exactly once, on the first trial grant, and never back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub trial_used: bool,
    pub onboarded: bool,
    pub created_at: DateTime<Utc>,
}

/// One timed access grant. Rows are append-only: a renewal inserts a new
/// row with a later `expires_at` rather than mutating the old one. Only
/// `active` may be flipped afterwards (manual revocation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub account_email: String,
    pub kind: SubscriptionKind,
    pub amount_paid_kobo: i64,
    /// `None` for trials; unique across all paid rows.
    pub payment_reference: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionKind {
    Trial,
    Paid,
}

impl SubscriptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionKind::Trial => "trial",
            SubscriptionKind::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "trial" => Some(SubscriptionKind::Trial),
            "paid" => Some(SubscriptionKind::Paid),
            _ => None,
        }
    }
}

/// Answer to an access query. Absence of any subscription is a normal
/// negative result, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct AccessStatus {
    pub has_access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<SubscriptionKind>,
}

impl AccessStatus {
    pub fn none() -> Self {
        Self {
            has_access: false,
            expires_at: None,
            kind: None,
        }
    }

    pub fn granted(expires_at: DateTime<Utc>, kind: SubscriptionKind) -> Self {
        Self {
            has_access: true,
            expires_at: Some(expires_at),
            kind: Some(kind),
        }
    }
}

/// Lowercase + trim an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal syntactic email check: one `@`, non-empty local part, and a
/// dotted domain. Deliverability is the mail provider's problem.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    if email.contains(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_address() {
        assert!(is_valid_email("a@example.com"));
        assert!(is_valid_email("  user.name+tag@sub.example.co  "));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("a@b@example.com"));
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  User@Example.COM "), "user@example.com");
    }

    #[test]
    fn kind_round_trips_through_str() {
        assert_eq!(
            SubscriptionKind::parse(SubscriptionKind::Trial.as_str()),
            Some(SubscriptionKind::Trial)
        );
        assert_eq!(
            SubscriptionKind::parse(SubscriptionKind::Paid.as_str()),
            Some(SubscriptionKind::Paid)
        );
        assert_eq!(SubscriptionKind::parse("weekly"), None);
    }
}
