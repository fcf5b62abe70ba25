//! Read-side accessors over the `emails`/`user_emails`/
//! `email_verification_codes` tables, which the external auth/notifications
//! API owns for writes (`spec.md` §5). Consumed by the Dispatcher's
//! recipient resolution and by `timelockwatch-registry`'s
//! `UserEmailRegistry` implementation.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use timelockwatch_common::{Address, ChainId};
use timelockwatch_primitives::{EmailBinding, VerificationCode};

use crate::error::{StoreError, StoreResult};

#[async_trait]
pub trait EmailBindingStore: Send + Sync {
    async fn subscribed_to(
        &self,
        chain_id: ChainId,
        contract_address: Address,
    ) -> StoreResult<Vec<EmailBinding>>;
}

#[async_trait]
pub trait VerificationCodeStore: Send + Sync {
    async fn find(&self, user_email_id: uuid::Uuid) -> StoreResult<Option<VerificationCode>>;
}

pub struct PgEmailBindingStore {
    pool: PgPool,
}

impl PgEmailBindingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailBindingStore for PgEmailBindingStore {
    async fn subscribed_to(
        &self,
        chain_id: ChainId,
        contract_address: Address,
    ) -> StoreResult<Vec<EmailBinding>> {
        let rows = sqlx::query(
            "SELECT e.user_id, e.email, e.is_verified, e.last_verified_at,
                    array_agg(u.contract_address) AS subscribed_contracts
             FROM emails e
             JOIN user_emails u ON u.email_id = e.user_id
             WHERE u.chain_id = $1 AND u.contract_address = $2 AND e.is_verified = true
             GROUP BY e.user_id, e.email, e.is_verified, e.last_verified_at",
        )
        .bind(chain_id.0 as i64)
        .bind(contract_address.to_lowercase_hex())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;
        rows.into_iter().map(row_to_binding).collect()
    }
}

fn row_to_binding(row: PgRow) -> StoreResult<EmailBinding> {
    let contracts: Vec<String> =
        row.try_get("subscribed_contracts").map_err(StoreError::from)?;
    let subscribed_contracts = contracts
        .into_iter()
        .map(|s| s.parse::<Address>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| StoreError::Decode("subscribed_contracts".into()))?;
    Ok(EmailBinding {
        user_id: row.try_get("user_id").map_err(StoreError::from)?,
        email: row.try_get("email").map_err(StoreError::from)?,
        is_verified: row.try_get("is_verified").map_err(StoreError::from)?,
        last_verified_at: row.try_get("last_verified_at").map_err(StoreError::from)?,
        subscribed_contracts,
    })
}

pub struct PgVerificationCodeStore {
    pool: PgPool,
}

impl PgVerificationCodeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationCodeStore for PgVerificationCodeStore {
    async fn find(&self, user_email_id: uuid::Uuid) -> StoreResult<Option<VerificationCode>> {
        let row = sqlx::query(
            "SELECT * FROM email_verification_codes WHERE user_email_id = $1
             ORDER BY expires_at DESC LIMIT 1",
        )
        .bind(user_email_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)?;
        row.map(|r: PgRow| {
            Ok(VerificationCode {
                user_email_id: r.try_get("user_email_id").map_err(StoreError::from)?,
                code: r.try_get("code").map_err(StoreError::from)?,
                expires_at: r.try_get("expires_at").map_err(StoreError::from)?,
                attempt_count: r.try_get::<i32, _>("attempt_count").map_err(StoreError::from)? as u32,
                is_used: r.try_get("is_used").map_err(StoreError::from)?,
            })
        })
        .transpose()
    }
}
