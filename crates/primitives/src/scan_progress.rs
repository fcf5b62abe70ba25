//! The `ScanProgress` entity (`spec.md` §3.1) — owned exclusively by the
//! Scanner for its chain (`spec.md` §5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use timelockwatch_common::ChainId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Running,
    Paused,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanProgress {
    pub chain_id: ChainId,
    /// Next block to process is `last_scanned_block`; invariant 1 of
    /// `spec.md` §3.2 requires this to be monotone non-decreasing.
    pub last_scanned_block: Option<u64>,
    pub latest_network_block: Option<u64>,
    pub scan_status: ScanStatus,
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
    /// The current adaptive log-filter window size (`spec.md` §4.2).
    pub current_window: u64,
}

impl ScanProgress {
    pub fn fresh(chain_id: ChainId, initial_window: u64) -> Self {
        Self {
            chain_id,
            last_scanned_block: None,
            latest_network_block: None,
            scan_status: ScanStatus::Running,
            last_error: None,
            updated_at: Utc::now(),
            current_window: initial_window,
        }
    }
}
