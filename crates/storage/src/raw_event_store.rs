//! `RawEventStore`: owned exclusively by the Chain Scanner (`spec.md` §5).
//! Backs the `compound_timelock_transactions` / `openzeppelin_timelock_transactions`
//! tables (`spec.md` §6).

use alloy_primitives::{Bytes, B256, U256};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use timelockwatch_common::{Address, ChainId, Standard};
use timelockwatch_primitives::{EventType, RawEvent};

use crate::error::{StoreError, StoreResult};

#[async_trait]
pub trait RawEventStore: Send + Sync {
    /// Inserts the event if its unique key `(chain_id, standard, tx_hash,
    /// log_index)` is new; returns `false` on conflict rather than erroring
    /// (`spec.md` §3.2 invariant 3, §7 `PERSIST_CONFLICT`).
    async fn insert_if_absent(&self, event: &RawEvent) -> StoreResult<bool>;

    /// Events not yet folded into a Flow, oldest first, capped at `limit`.
    async fn unfolded(&self, chain_id: ChainId, limit: i64) -> StoreResult<Vec<RawEvent>>;

    async fn mark_folded(&self, chain_id: ChainId, tx_hash: B256, log_index: u64) -> StoreResult<()>;
}

pub struct PgRawEventStore {
    pool: PgPool,
}

impl PgRawEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn table_for(standard: Standard) -> &'static str {
        match standard {
            Standard::Compound => "compound_timelock_transactions",
            Standard::OpenZeppelin => "openzeppelin_timelock_transactions",
        }
    }
}

fn row_to_event(standard: Standard, row: PgRow) -> StoreResult<RawEvent> {
    let event_type_str: String = row.try_get("event_type").map_err(StoreError::from)?;
    let event_type = match event_type_str.as_str() {
        "queue" => EventType::Queue,
        "execute" => EventType::Execute,
        "cancel" => EventType::Cancel,
        other => return Err(StoreError::Decode(format!("unknown event_type {other}"))),
    };
    let contract_address: String = row.try_get("contract_address").map_err(StoreError::from)?;
    let tx_hash: String = row.try_get("tx_hash").map_err(StoreError::from)?;
    let flow_id: String = row.try_get("flow_id").map_err(StoreError::from)?;
    let from_address: Option<String> = row.try_get("from_address").map_err(StoreError::from)?;
    let to_address: Option<String> = row.try_get("to_address").map_err(StoreError::from)?;
    let value: String = row.try_get("value").map_err(StoreError::from)?;
    let calldata: String = row.try_get("calldata").map_err(StoreError::from)?;

    Ok(RawEvent {
        chain_id: ChainId(row.try_get::<i64, _>("chain_id").map_err(StoreError::from)? as u64),
        contract_address: contract_address
            .parse()
            .map_err(|_| StoreError::Decode("contract_address".into()))?,
        standard,
        tx_hash: tx_hash.parse().map_err(|_| StoreError::Decode("tx_hash".into()))?,
        event_type,
        block_number: row.try_get::<i64, _>("block_number").map_err(StoreError::from)? as u64,
        log_index: row.try_get::<i64, _>("log_index").map_err(StoreError::from)? as u64,
        block_timestamp: row.try_get("block_timestamp").map_err(StoreError::from)?,
        flow_id: flow_id.parse().map_err(|_| StoreError::Decode("flow_id".into()))?,
        from_address: from_address
            .map(|a| a.parse::<Address>())
            .transpose()
            .map_err(|_| StoreError::Decode("from_address".into()))?,
        to_address: to_address
            .map(|a| a.parse::<Address>())
            .transpose()
            .map_err(|_| StoreError::Decode("to_address".into()))?,
        value: value.parse::<U256>().map_err(|_| StoreError::Decode("value".into()))?,
        decoded_payload: row.try_get("decoded_payload").map_err(StoreError::from)?,
        calldata: hex::decode(calldata.trim_start_matches("0x"))
            .map(Bytes::from)
            .map_err(|_| StoreError::Decode("calldata".into()))?,
        folded: row.try_get("folded").map_err(StoreError::from)?,
    })
}

#[async_trait]
impl RawEventStore for PgRawEventStore {
    async fn insert_if_absent(&self, event: &RawEvent) -> StoreResult<bool> {
        let table = Self::table_for(event.standard);
        let query = format!(
            "INSERT INTO {table}
                (chain_id, contract_address, tx_hash, event_type, block_number, log_index,
                 block_timestamp, flow_id, from_address, to_address, value, decoded_payload,
                 calldata, folded)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             ON CONFLICT (chain_id, tx_hash, log_index) DO NOTHING"
        );
        let result = sqlx::query(&query)
            .bind(event.chain_id.0 as i64)
            .bind(event.contract_address.to_lowercase_hex())
            .bind(event.tx_hash.to_string())
            .bind(event.event_type.as_str())
            .bind(event.block_number as i64)
            .bind(event.log_index as i64)
            .bind(event.block_timestamp)
            .bind(event.flow_id.to_string())
            .bind(event.from_address.map(|a| a.to_lowercase_hex()))
            .bind(event.to_address.map(|a| a.to_lowercase_hex()))
            .bind(event.value.to_string())
            .bind(&event.decoded_payload)
            .bind(format!("0x{}", hex::encode(&event.calldata)))
            .bind(event.folded)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn unfolded(&self, chain_id: ChainId, limit: i64) -> StoreResult<Vec<RawEvent>> {
        let mut out = Vec::new();
        for standard in [Standard::Compound, Standard::OpenZeppelin] {
            let table = Self::table_for(standard);
            let query = format!(
                "SELECT * FROM {table}
                 WHERE chain_id = $1 AND folded = false
                 ORDER BY block_number ASC, log_index ASC
                 LIMIT $2"
            );
            let rows = sqlx::query(&query)
                .bind(chain_id.0 as i64)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
                .map_err(StoreError::from)?;
            for row in rows {
                out.push(row_to_event(standard, row)?);
            }
        }
        out.sort_by_key(|e| (e.block_number, e.log_index));
        out.truncate(limit as usize);
        Ok(out)
    }

    async fn mark_folded(&self, chain_id: ChainId, tx_hash: B256, log_index: u64) -> StoreResult<()> {
        for table in ["compound_timelock_transactions", "openzeppelin_timelock_transactions"] {
            let query = format!(
                "UPDATE {table} SET folded = true
                 WHERE chain_id = $1 AND tx_hash = $2 AND log_index = $3"
            );
            sqlx::query(&query)
                .bind(chain_id.0 as i64)
                .bind(tx_hash.to_string())
                .bind(log_index as i64)
                .execute(&self.pool)
                .await
                .map_err(StoreError::from)?;
        }
        Ok(())
    }
}
