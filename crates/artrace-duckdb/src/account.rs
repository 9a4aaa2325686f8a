use anyhow::Result;
use chrono::Utc;
use duckdb::Row;

use artrace_core::account::Account;
use artrace_store::{CreateAccountParams, UpdateProfileParams};

use crate::backend::ms_to_utc;
use crate::DuckDbBackend;

const ACCOUNT_COLUMNS: &str =
    "id, email, full_name, phone, password_hash, trial_used, onboarded, created_at_ms";

pub(crate) fn decode_account(row: &Row<'_>) -> duckdb::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        phone: row.get(3)?,
        password_hash: row.get(4)?,
        trial_used: row.get(5)?,
        onboarded: row.get(6)?,
        created_at: ms_to_utc(row.get(7)?),
    })
}

impl DuckDbBackend {
    pub async fn find_account(&self, email: &str) -> Result<Option<Account>> {
        let conn = self.conn.lock().await;
        let account = conn
            .prepare(&format!(
                "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1"
            ))?
            .query_row(duckdb::params![email], |row| decode_account(row))
            .ok();
        Ok(account)
    }

    pub async fn create_account(&self, params: CreateAccountParams) -> Result<Account> {
        let conn = self.conn.lock().await;
        let account = conn
            .prepare(&format!(
                "INSERT INTO accounts (email, full_name, phone, password_hash, created_at_ms) \
                 VALUES (?1, ?2, ?3, ?4, ?5) \
                 RETURNING {ACCOUNT_COLUMNS}"
            ))?
            .query_row(
                duckdb::params![
                    params.email,
                    params.full_name,
                    params.phone,
                    params.password_hash,
                    Utc::now().timestamp_millis()
                ],
                |row| decode_account(row),
            )?;
        Ok(account)
    }

    /// Atomically claim the one-shot trial: flips `trial_used` to true and
    /// reports whether this call did the flipping. The `AND NOT trial_used`
    /// guard in a single UPDATE means exactly one of any number of racing
    /// callers gets `true`; everyone else sees zero rows affected.
    pub async fn mark_trial_used(&self, email: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let flipped = conn.execute(
            "UPDATE accounts SET trial_used = true WHERE email = ?1 AND NOT trial_used",
            duckdb::params![email],
        )?;
        Ok(flipped == 1)
    }

    pub async fn update_password(&self, email: &str, new_hash: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE accounts SET password_hash = ?1 WHERE email = ?2",
            duckdb::params![new_hash, email],
        )?;
        Ok(())
    }

    pub async fn update_profile(
        &self,
        email: &str,
        params: UpdateProfileParams,
    ) -> Result<Option<Account>> {
        let conn = self.conn.lock().await;
        let updated = conn
            .prepare(&format!(
                "UPDATE accounts \
                 SET full_name = COALESCE(?1, full_name), phone = COALESCE(?2, phone) \
                 WHERE email = ?3 \
                 RETURNING {ACCOUNT_COLUMNS}"
            ))?
            .query_row(
                duckdb::params![params.full_name, params.phone, email],
                |row| decode_account(row),
            )
            .ok();
        Ok(updated)
    }

    pub async fn mark_onboarded(&self, email: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE accounts SET onboarded = true WHERE email = ?1",
            duckdb::params![email],
        )?;
        Ok(())
    }
}
