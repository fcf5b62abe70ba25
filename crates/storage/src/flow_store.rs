//! `FlowStore`: owned exclusively by the Flow Engine (`spec.md` §5). Backs
//! the `timelock_transaction_flows` table.

use alloy_primitives::{Bytes, B256, U256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use timelockwatch_common::{Address, ChainId, FlowStatus, Standard};
use timelockwatch_primitives::{Flow, FlowKey};

use crate::error::{StoreError, StoreResult};

#[async_trait]
pub trait FlowStore: Send + Sync {
    /// Inserts a brand-new `waiting` flow, or is a no-op if `flow_id` already
    /// exists (a queue event can arrive more than once across ticks).
    async fn upsert_waiting(&self, flow: &Flow) -> StoreResult<bool>;

    /// Transitions a flow to `to`, guarded by `WHERE status = $from` so a
    /// concurrent terminal transition cannot be clobbered (`spec.md` §5).
    /// Returns `false` if the guard did not match — logged as
    /// `FLOW_CONFLICT`, never retried blindly.
    #[allow(clippy::too_many_arguments)]
    async fn transition(
        &self,
        key: &FlowKey,
        from: FlowStatus,
        to: FlowStatus,
        tx_hash: Option<B256>,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    async fn get(&self, key: &FlowKey) -> StoreResult<Option<Flow>>;

    /// Looks a flow up by `flow_id` alone, for callers (the emergency resend
    /// ticker) that only have the id half of the key on hand.
    async fn get_by_flow_id(&self, flow_id: B256) -> StoreResult<Option<Flow>>;

    /// Flows in `waiting` whose `eta` has passed, for the Flow Engine's
    /// time-driven `waiting -> ready` transition.
    async fn waiting_due(&self, now: DateTime<Utc>, limit: i64) -> StoreResult<Vec<Flow>>;

    /// Compound flows in `ready` whose `expired_at` has passed, for the
    /// time-driven `ready -> expired` transition.
    async fn compound_expired(&self, now: DateTime<Utc>, limit: i64) -> StoreResult<Vec<Flow>>;
}

pub struct PgFlowStore {
    pool: PgPool,
}

impl PgFlowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_flow(row: PgRow) -> StoreResult<Flow> {
    let flow_id: String = row.try_get("flow_id").map_err(StoreError::from)?;
    let standard_str: String = row.try_get("standard").map_err(StoreError::from)?;
    let standard = match standard_str.as_str() {
        "compound" => Standard::Compound,
        "openzeppelin" => Standard::OpenZeppelin,
        other => return Err(StoreError::Decode(format!("unknown standard {other}"))),
    };
    let contract_address: String = row.try_get("contract_address").map_err(StoreError::from)?;
    let status_str: String = row.try_get("status").map_err(StoreError::from)?;
    let status = match status_str.as_str() {
        "waiting" => FlowStatus::Waiting,
        "ready" => FlowStatus::Ready,
        "executed" => FlowStatus::Executed,
        "cancelled" => FlowStatus::Cancelled,
        "expired" => FlowStatus::Expired,
        other => return Err(StoreError::Decode(format!("unknown status {other}"))),
    };

    let parse_hash = |s: Option<String>| -> StoreResult<Option<B256>> {
        s.map(|v| v.parse::<B256>()).transpose().map_err(|_| StoreError::Decode("hash".into()))
    };
    let parse_addr = |s: Option<String>| -> StoreResult<Option<Address>> {
        s.map(|v| v.parse::<Address>()).transpose().map_err(|_| StoreError::Decode("address".into()))
    };

    let value: String = row.try_get("value").map_err(StoreError::from)?;
    let calldata: String = row.try_get("calldata").map_err(StoreError::from)?;

    Ok(Flow {
        key: FlowKey {
            flow_id: flow_id.parse().map_err(|_| StoreError::Decode("flow_id".into()))?,
            standard,
            chain_id: ChainId(row.try_get::<i64, _>("chain_id").map_err(StoreError::from)? as u64),
            contract_address: contract_address
                .parse()
                .map_err(|_| StoreError::Decode("contract_address".into()))?,
        },
        status,
        queue_tx_hash: parse_hash(row.try_get("queue_tx_hash").map_err(StoreError::from)?)?,
        execute_tx_hash: parse_hash(row.try_get("execute_tx_hash").map_err(StoreError::from)?)?,
        cancel_tx_hash: parse_hash(row.try_get("cancel_tx_hash").map_err(StoreError::from)?)?,
        initiator_address: parse_addr(row.try_get("initiator_address").map_err(StoreError::from)?)?,
        target: parse_addr(row.try_get("target").map_err(StoreError::from)?)?,
        value: value.parse::<U256>().map_err(|_| StoreError::Decode("value".into()))?,
        calldata: hex::decode(calldata.trim_start_matches("0x"))
            .map(Bytes::from)
            .map_err(|_| StoreError::Decode("calldata".into()))?,
        queued_at: row.try_get("queued_at").map_err(StoreError::from)?,
        executed_at: row.try_get("executed_at").map_err(StoreError::from)?,
        cancelled_at: row.try_get("cancelled_at").map_err(StoreError::from)?,
        eta: row.try_get("eta").map_err(StoreError::from)?,
        expired_at: row.try_get("expired_at").map_err(StoreError::from)?,
    })
}

#[async_trait]
impl FlowStore for PgFlowStore {
    async fn upsert_waiting(&self, flow: &Flow) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO timelock_transaction_flows
                (flow_id, standard, chain_id, contract_address, status, queue_tx_hash,
                 initiator_address, target, value, calldata, queued_at, eta, expired_at)
             VALUES ($1, $2, $3, $4, 'waiting', $5, $6, $7, $8, $9, $10, $11, $12)
             ON CONFLICT (flow_id, standard, chain_id, contract_address) DO NOTHING",
        )
        .bind(flow.key.flow_id.to_string())
        .bind(flow.key.standard.as_str())
        .bind(flow.key.chain_id.0 as i64)
        .bind(flow.key.contract_address.to_lowercase_hex())
        .bind(flow.queue_tx_hash.map(|h| h.to_string()))
        .bind(flow.initiator_address.map(|a| a.to_lowercase_hex()))
        .bind(flow.target.map(|a| a.to_lowercase_hex()))
        .bind(flow.value.to_string())
        .bind(format!("0x{}", hex::encode(&flow.calldata)))
        .bind(flow.queued_at)
        .bind(flow.eta)
        .bind(flow.expired_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn transition(
        &self,
        key: &FlowKey,
        from: FlowStatus,
        to: FlowStatus,
        tx_hash: Option<B256>,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let tx_column = match to {
            FlowStatus::Executed => "execute_tx_hash",
            FlowStatus::Cancelled => "cancel_tx_hash",
            _ => "queue_tx_hash",
        };
        let at_column = match to {
            FlowStatus::Ready => "eta",
            FlowStatus::Executed => "executed_at",
            FlowStatus::Cancelled => "cancelled_at",
            FlowStatus::Expired => "expired_at",
            FlowStatus::Waiting => "queued_at",
        };
        let query = format!(
            "UPDATE timelock_transaction_flows
             SET status = $1, {tx_column} = COALESCE({tx_column}, $2), {at_column} = $3
             WHERE flow_id = $4 AND standard = $5 AND chain_id = $6 AND contract_address = $7
               AND status = $8"
        );
        let result = sqlx::query(&query)
            .bind(to.as_str())
            .bind(tx_hash.map(|h| h.to_string()))
            .bind(at)
            .bind(key.flow_id.to_string())
            .bind(key.standard.as_str())
            .bind(key.chain_id.0 as i64)
            .bind(key.contract_address.to_lowercase_hex())
            .bind(from.as_str())
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, key: &FlowKey) -> StoreResult<Option<Flow>> {
        let row = sqlx::query(
            "SELECT * FROM timelock_transaction_flows
             WHERE flow_id = $1 AND standard = $2 AND chain_id = $3 AND contract_address = $4",
        )
        .bind(key.flow_id.to_string())
        .bind(key.standard.as_str())
        .bind(key.chain_id.0 as i64)
        .bind(key.contract_address.to_lowercase_hex())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)?;
        row.map(row_to_flow).transpose()
    }

    async fn get_by_flow_id(&self, flow_id: B256) -> StoreResult<Option<Flow>> {
        let row = sqlx::query("SELECT * FROM timelock_transaction_flows WHERE flow_id = $1 LIMIT 1")
            .bind(flow_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?;
        row.map(row_to_flow).transpose()
    }

    async fn waiting_due(&self, now: DateTime<Utc>, limit: i64) -> StoreResult<Vec<Flow>> {
        let rows = sqlx::query(
            "SELECT * FROM timelock_transaction_flows
             WHERE status = 'waiting' AND eta <= $1
             ORDER BY eta ASC
             LIMIT $2",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;
        rows.into_iter().map(row_to_flow).collect()
    }

    async fn compound_expired(&self, now: DateTime<Utc>, limit: i64) -> StoreResult<Vec<Flow>> {
        let rows = sqlx::query(
            "SELECT * FROM timelock_transaction_flows
             WHERE standard = 'compound' AND (status = 'ready' OR status = 'waiting')
               AND expired_at IS NOT NULL AND expired_at <= $1
             ORDER BY expired_at ASC
             LIMIT $2",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;
        rows.into_iter().map(row_to_flow).collect()
    }
}
