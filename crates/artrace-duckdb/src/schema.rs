/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup (idempotent).
///
/// Timestamps are stored as epoch milliseconds (BIGINT). The comparison
/// queries (access windows, code expiry) then reduce to integer compares
/// with no timezone ambiguity.
///
/// The UNIQUE constraint on `subscriptions.payment_reference` is the
/// idempotency anchor for payment callbacks: the existence check and the
/// insert both run under the single-writer connection mutex, and even a
/// racing duplicate insert can only fail the constraint, never produce a
/// second row for the same reference.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

CREATE SEQUENCE IF NOT EXISTS seq_account_id START 1;
CREATE SEQUENCE IF NOT EXISTS seq_subscription_id START 1;

-- ===========================================
-- SETTINGS
-- ===========================================
-- Keys stored in this table:
--   'jwt_secret'  – 32-byte random hex, signs the art_session cookie
CREATE TABLE IF NOT EXISTS settings (
    key             VARCHAR PRIMARY KEY,
    value           VARCHAR NOT NULL
);

-- ===========================================
-- ACCOUNTS
-- ===========================================
CREATE TABLE IF NOT EXISTS accounts (
    id              BIGINT PRIMARY KEY DEFAULT nextval('seq_account_id'),
    email           VARCHAR NOT NULL UNIQUE,       -- stored lowercase
    full_name       VARCHAR,
    phone           VARCHAR,
    password_hash   VARCHAR,                       -- NULL for trial-only accounts
    trial_used      BOOLEAN NOT NULL DEFAULT false,
    onboarded       BOOLEAN NOT NULL DEFAULT false,
    created_at_ms   BIGINT NOT NULL
);

-- ===========================================
-- SUBSCRIPTIONS (append-only access grants)
-- ===========================================
CREATE TABLE IF NOT EXISTS subscriptions (
    id                  BIGINT PRIMARY KEY DEFAULT nextval('seq_subscription_id'),
    account_email       VARCHAR NOT NULL,
    kind                VARCHAR NOT NULL,          -- 'trial' | 'paid'
    amount_paid_kobo    BIGINT NOT NULL,
    payment_reference   VARCHAR UNIQUE,            -- NULL for trials
    expires_at_ms       BIGINT NOT NULL,
    created_at_ms       BIGINT NOT NULL,
    active              BOOLEAN NOT NULL DEFAULT true
);
-- Optimised for the latest-access query (hot path on every gated request)
CREATE INDEX IF NOT EXISTS idx_subscriptions_email_expiry
    ON subscriptions(account_email, expires_at_ms DESC);

-- ===========================================
-- VERIFICATION CODES (pending registrations)
-- ===========================================
-- Durable replacement for an in-process OTP map: a restart must not drop
-- pending registrations. One row per email; re-sending replaces the row.
CREATE TABLE IF NOT EXISTS verification_codes (
    email           VARCHAR PRIMARY KEY,
    code            VARCHAR NOT NULL,
    password_hash   VARCHAR NOT NULL,
    full_name       VARCHAR,
    phone           VARCHAR,
    expires_at_ms   BIGINT NOT NULL
);

-- ===========================================
-- LOGIN ATTEMPTS (rate limiting)
-- ===========================================
CREATE TABLE IF NOT EXISTS login_attempts (
    id              VARCHAR PRIMARY KEY,
    ip_address      VARCHAR NOT NULL,
    attempted_at_ms BIGINT NOT NULL,
    succeeded       BOOLEAN NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_login_attempts_ip
    ON login_attempts(ip_address, attempted_at_ms DESC);
"#
    )
}
