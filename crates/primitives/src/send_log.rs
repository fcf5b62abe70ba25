//! The `SendLog` entity (`spec.md` §3.1) — the at-most-once delivery
//! dedup key, owned exclusively by the Dispatcher (`spec.md` §5).

use alloy_primitives::B256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use timelockwatch_common::{ChainId, FlowStatus, Standard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    Success,
    Failed,
}

/// Identity of a notification attempt: `(email, flow_id, status_to)`,
/// unique per `spec.md` §3.2 invariant 3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendLogKey {
    pub email: String,
    pub flow_id: B256,
    pub standard: Standard,
    pub chain_id: ChainId,
    pub status_to: FlowStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendLog {
    pub key: SendLogKey,
    pub send_status: SendStatus,
    pub error: Option<String>,
    pub retry_count: u32,
    pub sent_at: Option<DateTime<Utc>>,

    /// Emergency-notification fields, set only when `status_to == waiting`
    /// and the contract is in emergency mode (`spec.md` §4.4).
    pub reply_token: Option<String>,
    pub is_replied: bool,
    pub replied_at: Option<DateTime<Utc>>,
    /// Number of times this notification has been (re)sent, including the
    /// original. Emergency resends stop once this reaches `N_max`.
    pub send_count: u32,
    /// Set once every recipient in the emergency group has replied.
    pub completed: bool,
}

impl SendLog {
    pub fn new_pending(key: SendLogKey, emergency: bool) -> Self {
        Self {
            key,
            send_status: SendStatus::Failed,
            error: None,
            retry_count: 0,
            sent_at: None,
            reply_token: emergency.then(|| generate_reply_token()),
            is_replied: false,
            replied_at: None,
            send_count: 0,
            completed: false,
        }
    }

    pub const fn is_emergency(&self) -> bool {
        self.reply_token.is_some()
    }

    pub fn needs_resend(&self, max_sends: u32) -> bool {
        self.is_emergency() && !self.is_replied && !self.completed && self.send_count < max_sends
    }
}

/// Generates the 256-bit random confirmation token embedded in emergency
/// notification links (`spec.md` §4.4).
fn generate_reply_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SendLogKey {
        SendLogKey {
            email: "a@example.com".into(),
            flow_id: B256::repeat_byte(1),
            standard: Standard::Compound,
            chain_id: ChainId(1),
            status_to: FlowStatus::Waiting,
        }
    }

    #[test]
    fn emergency_send_log_gets_a_token() {
        let log = SendLog::new_pending(key(), true);
        assert!(log.is_emergency());
        assert_eq!(log.reply_token.as_ref().unwrap().len(), 64); // 32 bytes hex-encoded
    }

    #[test]
    fn non_emergency_has_no_token_and_never_resends() {
        let log = SendLog::new_pending(key(), false);
        assert!(!log.is_emergency());
        assert!(!log.needs_resend(5));
    }

    #[test]
    fn resend_stops_after_max_sends_or_reply() {
        let mut log = SendLog::new_pending(key(), true);
        log.send_count = 4;
        assert!(log.needs_resend(5));
        log.send_count = 5;
        assert!(!log.needs_resend(5));

        let mut replied = SendLog::new_pending(key(), true);
        replied.is_replied = true;
        assert!(!replied.needs_resend(5));
    }
}
