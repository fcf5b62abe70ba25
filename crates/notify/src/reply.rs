//! Emergency confirmation reply handling (`spec.md` §4.4): idempotent so a
//! recipient re-clicking an old link never errors.

use chrono::{DateTime, Utc};
use timelockwatch_storage::SendLogStore;

use crate::error::NotifyError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// First time this token has been confirmed.
    Confirmed { replied_at: DateTime<Utc> },
    /// The token was already confirmed; returns the original timestamp
    /// rather than erroring on replay.
    AlreadyConfirmed { replied_at: DateTime<Utc> },
}

/// Handles a `GET /emergency-reply?token=...` hit.
pub async fn confirm(token: &str, send_log_store: &dyn SendLogStore) -> Result<ConfirmOutcome, NotifyError> {
    let log = send_log_store
        .find_by_token(token)
        .await?
        .ok_or(NotifyError::EmergTokenInvalid)?;

    if log.is_replied {
        let replied_at = log.replied_at.unwrap_or_else(Utc::now);
        return Ok(ConfirmOutcome::AlreadyConfirmed { replied_at });
    }

    let now = Utc::now();
    if !send_log_store.mark_replied(token, now).await? {
        // Lost a race with a concurrent reply for the same token; fetch the
        // now-committed state rather than erroring.
        let refreshed = send_log_store.find_by_token(token).await?.ok_or(NotifyError::EmergTokenInvalid)?;
        let replied_at = refreshed.replied_at.unwrap_or(now);
        return Ok(ConfirmOutcome::AlreadyConfirmed { replied_at });
    }

    let remaining = send_log_store.unacked_emergency(log.key.flow_id).await?;
    if remaining.iter().all(|l| l.is_replied || l.completed) {
        send_log_store.mark_group_completed(log.key.flow_id).await?;
    }

    Ok(ConfirmOutcome::Confirmed { replied_at: now })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use timelockwatch_common::{ChainId, FlowStatus, Standard};
    use timelockwatch_primitives::{SendLog, SendLogKey};
    use timelockwatch_storage::StoreResult;

    struct FakeStore {
        logs: Mutex<Vec<SendLog>>,
    }

    fn key() -> SendLogKey {
        SendLogKey {
            email: "a@example.com".into(),
            flow_id: B256::repeat_byte(7),
            standard: Standard::Compound,
            chain_id: ChainId(1),
            status_to: FlowStatus::Waiting,
        }
    }

    #[async_trait]
    impl SendLogStore for FakeStore {
        async fn try_reserve(&self, log: &SendLog) -> StoreResult<bool> {
            self.logs.lock().unwrap().push(log.clone());
            Ok(true)
        }
        async fn mark_sent(&self, _key: &SendLogKey, _at: DateTime<Utc>) -> StoreResult<()> {
            Ok(())
        }
        async fn mark_failed(&self, _key: &SendLogKey, _error: &str) -> StoreResult<()> {
            Ok(())
        }
        async fn unacked_emergency(&self, flow_id: B256) -> StoreResult<Vec<SendLog>> {
            Ok(self
                .logs
                .lock()
                .unwrap()
                .iter()
                .filter(|l| l.key.flow_id == flow_id && l.is_emergency() && !l.is_replied && !l.completed)
                .cloned()
                .collect())
        }
        async fn find_by_token(&self, token: &str) -> StoreResult<Option<SendLog>> {
            Ok(self.logs.lock().unwrap().iter().find(|l| l.reply_token.as_deref() == Some(token)).cloned())
        }
        async fn mark_replied(&self, token: &str, at: DateTime<Utc>) -> StoreResult<bool> {
            let mut logs = self.logs.lock().unwrap();
            if let Some(log) = logs.iter_mut().find(|l| l.reply_token.as_deref() == Some(token)) {
                if log.is_replied {
                    return Ok(false);
                }
                log.is_replied = true;
                log.replied_at = Some(at);
                return Ok(true);
            }
            Ok(false)
        }
        async fn mark_group_completed(&self, flow_id: B256) -> StoreResult<()> {
            for log in self.logs.lock().unwrap().iter_mut() {
                if log.key.flow_id == flow_id && log.is_emergency() {
                    log.completed = true;
                }
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let store = FakeStore { logs: Mutex::new(vec![]) };
        let err = confirm("nope", &store).await.unwrap_err();
        assert!(matches!(err, NotifyError::EmergTokenInvalid));
    }

    #[tokio::test]
    async fn replaying_a_confirmed_token_returns_the_original_timestamp() {
        let mut log = SendLog::new_pending(key(), true);
        log.reply_token = Some("tok".into());
        let store = FakeStore { logs: Mutex::new(vec![log]) };

        let first = confirm("tok", &store).await.unwrap();
        let replied_at = match first {
            ConfirmOutcome::Confirmed { replied_at } => replied_at,
            other => panic!("expected Confirmed, got {other:?}"),
        };

        let second = confirm("tok", &store).await.unwrap();
        assert_eq!(second, ConfirmOutcome::AlreadyConfirmed { replied_at });
    }

    #[tokio::test]
    async fn last_reply_in_a_group_marks_it_completed() {
        let mut log = SendLog::new_pending(key(), true);
        log.reply_token = Some("only".into());
        let store = FakeStore { logs: Mutex::new(vec![log]) };

        confirm("only", &store).await.unwrap();
        let logs = store.logs.lock().unwrap();
        assert!(logs[0].completed);
    }
}
