//! `ScanProgressStore`: owned exclusively by the Chain Scanner (`spec.md`
//! §5). Backs the `block_scan_progress` table.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use timelockwatch_common::ChainId;
use timelockwatch_primitives::{ScanProgress, ScanStatus};

use crate::error::{StoreError, StoreResult};

#[async_trait]
pub trait ScanProgressStore: Send + Sync {
    async fn load(&self, chain_id: ChainId) -> StoreResult<Option<ScanProgress>>;
    async fn save(&self, progress: &ScanProgress) -> StoreResult<()>;
}

pub struct PgScanProgressStore {
    pool: PgPool,
}

impl PgScanProgressStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_progress(row: PgRow) -> StoreResult<ScanProgress> {
    let status_str: String = row.try_get("scan_status").map_err(StoreError::from)?;
    let scan_status = match status_str.as_str() {
        "running" => ScanStatus::Running,
        "paused" => ScanStatus::Paused,
        "error" => ScanStatus::Error,
        other => return Err(StoreError::Decode(format!("unknown scan_status {other}"))),
    };
    Ok(ScanProgress {
        chain_id: ChainId(row.try_get::<i64, _>("chain_id").map_err(StoreError::from)? as u64),
        last_scanned_block: row
            .try_get::<Option<i64>, _>("last_scanned_block")
            .map_err(StoreError::from)?
            .map(|v| v as u64),
        latest_network_block: row
            .try_get::<Option<i64>, _>("latest_network_block")
            .map_err(StoreError::from)?
            .map(|v| v as u64),
        scan_status,
        last_error: row.try_get("last_error").map_err(StoreError::from)?,
        updated_at: row.try_get("updated_at").map_err(StoreError::from)?,
        current_window: row.try_get::<i64, _>("current_window").map_err(StoreError::from)? as u64,
    })
}

#[async_trait]
impl ScanProgressStore for PgScanProgressStore {
    async fn load(&self, chain_id: ChainId) -> StoreResult<Option<ScanProgress>> {
        let row = sqlx::query("SELECT * FROM block_scan_progress WHERE chain_id = $1")
            .bind(chain_id.0 as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?;
        row.map(row_to_progress).transpose()
    }

    async fn save(&self, progress: &ScanProgress) -> StoreResult<()> {
        let scan_status = match progress.scan_status {
            ScanStatus::Running => "running",
            ScanStatus::Paused => "paused",
            ScanStatus::Error => "error",
        };
        sqlx::query(
            "INSERT INTO block_scan_progress
                (chain_id, last_scanned_block, latest_network_block, scan_status, last_error,
                 updated_at, current_window)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (chain_id) DO UPDATE SET
                last_scanned_block = EXCLUDED.last_scanned_block,
                latest_network_block = EXCLUDED.latest_network_block,
                scan_status = EXCLUDED.scan_status,
                last_error = EXCLUDED.last_error,
                updated_at = EXCLUDED.updated_at,
                current_window = EXCLUDED.current_window",
        )
        .bind(progress.chain_id.0 as i64)
        .bind(progress.last_scanned_block.map(|v| v as i64))
        .bind(progress.latest_network_block.map(|v| v as i64))
        .bind(scan_status)
        .bind(&progress.last_error)
        .bind(progress.updated_at)
        .bind(progress.current_window as i64)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(())
    }
}
