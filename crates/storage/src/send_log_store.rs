//! `SendLogStore`: owned exclusively by the Notification Dispatcher
//! (`spec.md` §5). Backs the `email_send_logs` table.

use alloy_primitives::B256;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use timelockwatch_common::{ChainId, FlowStatus, Standard};
use timelockwatch_primitives::{SendLog, SendLogKey, SendStatus};

use crate::error::{StoreError, StoreResult};

#[async_trait]
pub trait SendLogStore: Send + Sync {
    /// Reserves the `(email, flow_id, status_to)` unique key before sending,
    /// so a retried dispatch can never send twice (`spec.md` §3.2 invariant
    /// 3). A unique violation is mapped to `Ok(false)`, not an error.
    async fn try_reserve(&self, log: &SendLog) -> StoreResult<bool>;

    async fn mark_sent(&self, key: &SendLogKey, at: DateTime<Utc>) -> StoreResult<()>;

    async fn mark_failed(&self, key: &SendLogKey, error: &str) -> StoreResult<()>;

    /// Emergency sends for `flow_id` that have not yet been replied to or
    /// marked complete, for the resend loop (`spec.md` §4.4).
    async fn unacked_emergency(&self, flow_id: B256) -> StoreResult<Vec<SendLog>>;

    /// Distinct `flow_id`s with at least one unacknowledged, uncompleted
    /// emergency `SendLog`, so the resend ticker can discover work without
    /// already knowing which flows are in emergency mode.
    async fn flow_ids_with_unacked_emergency(&self) -> StoreResult<Vec<B256>>;

    async fn find_by_token(&self, token: &str) -> StoreResult<Option<SendLog>>;

    async fn mark_replied(&self, token: &str, at: DateTime<Utc>) -> StoreResult<bool>;

    /// Marks every emergency `SendLog` row for `flow_id` as `completed`, once
    /// every recipient has replied (`spec.md` §4.4).
    async fn mark_group_completed(&self, flow_id: B256) -> StoreResult<()>;
}

pub struct PgSendLogStore {
    pool: PgPool,
}

impl PgSendLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_log(row: PgRow) -> StoreResult<SendLog> {
    let flow_id: String = row.try_get("flow_id").map_err(StoreError::from)?;
    let standard_str: String = row.try_get("standard").map_err(StoreError::from)?;
    let standard = match standard_str.as_str() {
        "compound" => Standard::Compound,
        "openzeppelin" => Standard::OpenZeppelin,
        other => return Err(StoreError::Decode(format!("unknown standard {other}"))),
    };
    let status_to_str: String = row.try_get("status_to").map_err(StoreError::from)?;
    let status_to = match status_to_str.as_str() {
        "waiting" => FlowStatus::Waiting,
        "ready" => FlowStatus::Ready,
        "executed" => FlowStatus::Executed,
        "cancelled" => FlowStatus::Cancelled,
        "expired" => FlowStatus::Expired,
        other => return Err(StoreError::Decode(format!("unknown status_to {other}"))),
    };
    let send_status_str: String = row.try_get("send_status").map_err(StoreError::from)?;
    let send_status = match send_status_str.as_str() {
        "success" => SendStatus::Success,
        "failed" => SendStatus::Failed,
        other => return Err(StoreError::Decode(format!("unknown send_status {other}"))),
    };

    Ok(SendLog {
        key: SendLogKey {
            email: row.try_get("email").map_err(StoreError::from)?,
            flow_id: flow_id.parse().map_err(|_| StoreError::Decode("flow_id".into()))?,
            standard,
            chain_id: ChainId(row.try_get::<i64, _>("chain_id").map_err(StoreError::from)? as u64),
            status_to,
        },
        send_status,
        error: row.try_get("error").map_err(StoreError::from)?,
        retry_count: row.try_get::<i32, _>("retry_count").map_err(StoreError::from)? as u32,
        sent_at: row.try_get("sent_at").map_err(StoreError::from)?,
        reply_token: row.try_get("reply_token").map_err(StoreError::from)?,
        is_replied: row.try_get("is_replied").map_err(StoreError::from)?,
        replied_at: row.try_get("replied_at").map_err(StoreError::from)?,
        send_count: row.try_get::<i32, _>("send_count").map_err(StoreError::from)? as u32,
        completed: row.try_get("completed").map_err(StoreError::from)?,
    })
}

#[async_trait]
impl SendLogStore for PgSendLogStore {
    async fn try_reserve(&self, log: &SendLog) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO email_send_logs
                (email, flow_id, standard, chain_id, status_to, send_status, retry_count,
                 reply_token, is_replied, send_count, completed)
             VALUES ($1, $2, $3, $4, $5, 'failed', 0, $6, false, 0, false)
             ON CONFLICT (email, flow_id, status_to) DO NOTHING",
        )
        .bind(&log.key.email)
        .bind(log.key.flow_id.to_string())
        .bind(log.key.standard.as_str())
        .bind(log.key.chain_id.0 as i64)
        .bind(log.key.status_to.as_str())
        .bind(&log.reply_token)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_sent(&self, key: &SendLogKey, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query(
            "UPDATE email_send_logs
             SET send_status = 'success', sent_at = $1, send_count = send_count + 1
             WHERE email = $2 AND flow_id = $3 AND status_to = $4",
        )
        .bind(at)
        .bind(&key.email)
        .bind(key.flow_id.to_string())
        .bind(key.status_to.as_str())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(())
    }

    async fn mark_failed(&self, key: &SendLogKey, error: &str) -> StoreResult<()> {
        sqlx::query(
            "UPDATE email_send_logs
             SET send_status = 'failed', error = $1, retry_count = retry_count + 1
             WHERE email = $2 AND flow_id = $3 AND status_to = $4",
        )
        .bind(error)
        .bind(&key.email)
        .bind(key.flow_id.to_string())
        .bind(key.status_to.as_str())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(())
    }

    async fn unacked_emergency(&self, flow_id: B256) -> StoreResult<Vec<SendLog>> {
        let rows = sqlx::query(
            "SELECT * FROM email_send_logs
             WHERE flow_id = $1 AND reply_token IS NOT NULL
               AND is_replied = false AND completed = false",
        )
        .bind(flow_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;
        rows.into_iter().map(row_to_log).collect()
    }

    async fn flow_ids_with_unacked_emergency(&self) -> StoreResult<Vec<B256>> {
        let rows = sqlx::query(
            "SELECT DISTINCT flow_id FROM email_send_logs
             WHERE reply_token IS NOT NULL AND is_replied = false AND completed = false",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;
        rows.into_iter()
            .map(|row| {
                let flow_id: String = row.try_get("flow_id").map_err(StoreError::from)?;
                flow_id.parse().map_err(|_| StoreError::Decode("flow_id".into()))
            })
            .collect()
    }

    async fn find_by_token(&self, token: &str) -> StoreResult<Option<SendLog>> {
        let row = sqlx::query("SELECT * FROM email_send_logs WHERE reply_token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?;
        row.map(row_to_log).transpose()
    }

    async fn mark_replied(&self, token: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE email_send_logs
             SET is_replied = true, replied_at = $1
             WHERE reply_token = $2 AND is_replied = false",
        )
        .bind(at)
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_group_completed(&self, flow_id: B256) -> StoreResult<()> {
        sqlx::query(
            "UPDATE email_send_logs SET completed = true
             WHERE flow_id = $1 AND reply_token IS NOT NULL",
        )
        .bind(flow_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(())
    }
}
