use std::time::Duration;

use chrono::Duration as ChronoDuration;

/// Parsed configuration, loaded once at startup from environment variables.
///
/// Product parameters (trial length, paid length, amount) are explicit
/// here with documented defaults rather than being scattered through
/// handlers.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub public_url: String,
    pub cors_origins: Vec<String>,

    /// Length of the one-shot free trial. Default 24 hours.
    pub trial_duration_hours: i64,
    /// Length of one paid access window. Default 7 days.
    pub paid_duration_days: i64,
    /// Price of a paid subscription in kobo (NGN minor unit). Default ₦200.
    pub subscription_amount_kobo: i64,
    /// Bound on every outbound payment-gateway call. Default 10 s.
    pub gateway_timeout_secs: u64,

    pub paystack_secret_key: String,
    pub paystack_base_url: String,

    /// Lifetime of the `art_session` JWT cookie, in days.
    pub session_days: u32,
    /// Argon2id memory cost in KB. Lowered in tests for speed.
    pub argon2_memory_kb: u32,
    /// Minutes before a pending registration code expires.
    pub otp_ttl_minutes: i64,

    pub smtp: Option<SmtpConfig>,

    pub duckdb_memory_limit: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub sender: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("ARTRACE_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("ARTRACE_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            public_url: std::env::var("ARTRACE_PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            cors_origins: std::env::var("ARTRACE_CORS_ORIGINS")
                .map(|v| v.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            trial_duration_hours: std::env::var("ARTRACE_TRIAL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .unwrap_or(24),
            paid_duration_days: std::env::var("ARTRACE_PAID_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .unwrap_or(7),
            subscription_amount_kobo: std::env::var("ARTRACE_AMOUNT_KOBO")
                .unwrap_or_else(|_| "20000".to_string())
                .parse()
                .unwrap_or(20_000),
            gateway_timeout_secs: std::env::var("ARTRACE_GATEWAY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            paystack_secret_key: std::env::var("ARTRACE_PAYSTACK_SECRET_KEY").unwrap_or_default(),
            paystack_base_url: std::env::var("ARTRACE_PAYSTACK_BASE_URL")
                .unwrap_or_else(|_| "https://api.paystack.co".to_string()),
            session_days: std::env::var("ARTRACE_SESSION_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .unwrap_or(7),
            argon2_memory_kb: std::env::var("ARTRACE_ARGON2_MEMORY_KB")
                .unwrap_or_else(|_| "65536".to_string())
                .parse()
                .unwrap_or(65_536),
            otp_ttl_minutes: std::env::var("ARTRACE_OTP_TTL_MINUTES")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            smtp: Self::smtp_from_env(),
            duckdb_memory_limit: std::env::var("ARTRACE_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "512MB".to_string()),
        })
    }

    /// SMTP is optional: without it, registration codes are only logged,
    /// which is enough for development.
    fn smtp_from_env() -> Option<SmtpConfig> {
        let host = std::env::var("ARTRACE_SMTP_HOST").ok()?;
        Some(SmtpConfig {
            host,
            port: std::env::var("ARTRACE_SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .unwrap_or(587),
            username: std::env::var("ARTRACE_SMTP_USERNAME").unwrap_or_default(),
            password: std::env::var("ARTRACE_SMTP_PASSWORD").unwrap_or_default(),
            sender: std::env::var("ARTRACE_SMTP_SENDER").unwrap_or_default(),
        })
    }

    pub fn trial_duration(&self) -> ChronoDuration {
        ChronoDuration::hours(self.trial_duration_hours)
    }

    pub fn paid_duration(&self) -> ChronoDuration {
        ChronoDuration::days(self.paid_duration_days)
    }

    /// Session cookies carry `Secure` whenever the deployment is served
    /// over TLS.
    pub fn https(&self) -> bool {
        self.public_url.starts_with("https://")
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }

    pub fn otp_ttl(&self) -> ChronoDuration {
        ChronoDuration::minutes(self.otp_ttl_minutes)
    }
}
