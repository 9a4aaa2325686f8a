use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use artrace_store::VerificationCode;

use crate::backend::{ms_to_utc, rand_hex};
use crate::DuckDbBackend;

impl DuckDbBackend {
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        let result = conn
            .prepare("SELECT value FROM settings WHERE key = ?1")?
            .query_row(duckdb::params![key], |row| row.get::<_, String>(0))
            .ok();
        Ok(result)
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
            duckdb::params![key, value],
        )?;
        Ok(())
    }

    /// Ensure a JWT secret exists in settings. If not, generate one.
    /// Returns the JWT secret.
    pub async fn ensure_jwt_secret(&self) -> Result<String> {
        if let Some(secret) = self.get_setting("jwt_secret").await? {
            return Ok(secret);
        }
        let secret = rand_hex(32);
        self.set_setting("jwt_secret", &secret).await?;
        Ok(secret)
    }

    /// Store (or replace) the pending registration for an email. Re-sending
    /// a code simply overwrites the previous row with a fresh expiry.
    pub async fn put_verification_code(&self, code: VerificationCode) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO verification_codes \
             (email, code, password_hash, full_name, phone, expires_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT (email) DO UPDATE SET \
                 code = EXCLUDED.code, \
                 password_hash = EXCLUDED.password_hash, \
                 full_name = EXCLUDED.full_name, \
                 phone = EXCLUDED.phone, \
                 expires_at_ms = EXCLUDED.expires_at_ms",
            duckdb::params![
                code.email,
                code.code,
                code.password_hash,
                code.full_name,
                code.phone,
                code.expires_at.timestamp_millis()
            ],
        )?;
        Ok(())
    }

    /// The pending code for `email`, if any.
    ///
    /// An expired row is deleted on sight and reported as absent, so a
    /// stale code can never create an account. A wrong-code attempt leaves
    /// the row in place for a retry within the expiry window.
    pub async fn get_verification_code(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationCode>> {
        let conn = self.conn.lock().await;
        let found = conn
            .prepare(
                "SELECT email, code, password_hash, full_name, phone, expires_at_ms \
                 FROM verification_codes WHERE email = ?1",
            )?
            .query_row(duckdb::params![email], |row| {
                Ok(VerificationCode {
                    email: row.get(0)?,
                    code: row.get(1)?,
                    password_hash: row.get(2)?,
                    full_name: row.get(3)?,
                    phone: row.get(4)?,
                    expires_at: ms_to_utc(row.get(5)?),
                })
            })
            .ok();

        let Some(code) = found else {
            return Ok(None);
        };

        if code.expires_at <= now {
            conn.execute(
                "DELETE FROM verification_codes WHERE email = ?1",
                duckdb::params![email],
            )?;
            return Ok(None);
        }
        Ok(Some(code))
    }

    pub async fn delete_verification_code(&self, email: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "DELETE FROM verification_codes WHERE email = ?1",
            duckdb::params![email],
        )?;
        Ok(())
    }

    /// Record a login attempt for rate limiting.
    pub async fn record_login_attempt(&self, ip: &str, succeeded: bool) -> Result<()> {
        let id = rand_hex(5);
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO login_attempts (id, ip_address, attempted_at_ms, succeeded) \
             VALUES (?1, ?2, ?3, ?4)",
            duckdb::params![id, ip, Utc::now().timestamp_millis(), succeeded],
        )?;
        Ok(())
    }

    /// Check if the IP is rate-limited (5 failed attempts in last 15 min).
    /// Returns true if allowed (under limit), false if blocked.
    pub async fn check_login_rate_limit(&self, ip: &str) -> Result<bool> {
        let cutoff = (Utc::now() - Duration::minutes(15)).timestamp_millis();
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .prepare(
                "SELECT COUNT(*) FROM login_attempts \
                 WHERE ip_address = ?1 AND attempted_at_ms > ?2 AND NOT succeeded",
            )?
            .query_row(duckdb::params![ip, cutoff], |row| row.get(0))?;
        Ok(count < 5)
    }
}
