//! The `EmailBinding` and `VerificationCode` entities (`spec.md` §3.1).
//!
//! Both tables are owned by the external auth/notifications API (`spec.md`
//! §5); these types exist here only as the read-side contract the
//! Dispatcher's recipient resolution consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use timelockwatch_common::Address;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailBinding {
    pub user_id: uuid::Uuid,
    pub email: String,
    pub is_verified: bool,
    pub last_verified_at: Option<DateTime<Utc>>,
    /// Timelock contract addresses this binding is subscribed to.
    pub subscribed_contracts: Vec<Address>,
}

impl EmailBinding {
    pub fn is_subscribed_to(&self, contract: &Address) -> bool {
        self.is_verified && self.subscribed_contracts.contains(contract)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCode {
    pub user_email_id: uuid::Uuid,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub attempt_count: u32,
    pub is_used: bool,
}
