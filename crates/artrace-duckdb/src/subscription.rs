use anyhow::Result;
use chrono::{DateTime, Utc};
use duckdb::Row;

use artrace_core::account::{Subscription, SubscriptionKind};
use artrace_store::InsertSubscriptionParams;

use crate::backend::ms_to_utc;
use crate::DuckDbBackend;

const SUBSCRIPTION_COLUMNS: &str = "id, account_email, kind, amount_paid_kobo, \
     payment_reference, expires_at_ms, created_at_ms, active";

fn decode_subscription(row: &Row<'_>) -> duckdb::Result<Subscription> {
    let kind: String = row.get(2)?;
    Ok(Subscription {
        id: row.get(0)?,
        account_email: row.get(1)?,
        kind: SubscriptionKind::parse(&kind).unwrap_or(SubscriptionKind::Paid),
        amount_paid_kobo: row.get(3)?,
        payment_reference: row.get(4)?,
        expires_at: ms_to_utc(row.get(5)?),
        created_at: ms_to_utc(row.get(6)?),
        active: row.get(7)?,
    })
}

impl DuckDbBackend {
    /// Insert one access grant.
    ///
    /// The UNIQUE constraint on `payment_reference` rejects a second row
    /// for a reference that was already credited; the caller treats that
    /// constraint error as "already granted".
    pub async fn insert_subscription(
        &self,
        params: InsertSubscriptionParams,
    ) -> Result<Subscription> {
        let conn = self.conn.lock().await;
        let subscription = conn
            .prepare(&format!(
                "INSERT INTO subscriptions \
                 (account_email, kind, amount_paid_kobo, payment_reference, \
                  expires_at_ms, created_at_ms) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
                 RETURNING {SUBSCRIPTION_COLUMNS}"
            ))?
            .query_row(
                duckdb::params![
                    params.account_email,
                    params.kind.as_str(),
                    params.amount_paid_kobo,
                    params.payment_reference,
                    params.expires_at.timestamp_millis(),
                    Utc::now().timestamp_millis()
                ],
                |row| decode_subscription(row),
            )?;
        Ok(subscription)
    }

    pub async fn find_subscription_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Subscription>> {
        let conn = self.conn.lock().await;
        let subscription = conn
            .prepare(&format!(
                "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE payment_reference = ?1"
            ))?
            .query_row(duckdb::params![reference], |row| decode_subscription(row))
            .ok();
        Ok(subscription)
    }

    /// The unexpired active subscription with the latest `expires_at`.
    ///
    /// Ordered by expiry, not creation: after a renewal the newest row is
    /// not necessarily the one bounding the access window.
    pub async fn latest_access(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Subscription>> {
        let conn = self.conn.lock().await;
        let subscription = conn
            .prepare(&format!(
                "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions \
                 WHERE account_email = ?1 AND active AND expires_at_ms > ?2 \
                 ORDER BY expires_at_ms DESC LIMIT 1"
            ))?
            .query_row(duckdb::params![email, now.timestamp_millis()], |row| {
                decode_subscription(row)
            })
            .ok();
        Ok(subscription)
    }

    pub async fn count_subscriptions(&self, email: &str) -> Result<i64> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .prepare("SELECT COUNT(*) FROM subscriptions WHERE account_email = ?1")?
            .query_row(duckdb::params![email], |row| row.get(0))?;
        Ok(count)
    }
}
