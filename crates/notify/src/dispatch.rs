//! Recipient resolution and sending (`spec.md` §4.4), driven by
//! [`timelockwatch_flow::FlowTransition`]s emitted by the Flow Engine.

use lettre::{
    transport::smtp::authentication::Credentials, AsyncSmtpTransport, AsyncTransport, Message,
    Tokio1Executor,
};
use timelockwatch_common::metrics::{EMAILS_FAILED, EMAILS_SENT};
use timelockwatch_common::Address;
use timelockwatch_flow::FlowTransition;
use timelockwatch_primitives::{SendLog, SendLogKey};
use timelockwatch_registry::{TimelockRegistry, UserEmailRegistry};
use timelockwatch_storage::SendLogStore;

use crate::error::NotifyError;
use crate::render::render;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
    pub from_name: String,
    pub reply_base_url: String,
}

pub fn build_transport(cfg: &SmtpConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
    AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)
        .map_err(|e| NotifyError::SmtpPermanent { recipient: cfg.host.clone(), message: e.to_string() })
        .map(|builder| {
            builder
                .port(cfg.port)
                .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
                .build()
        })
}

/// Processes one flow transition: resolves subscribed, verified recipients,
/// reserves a SendLog per recipient, and sends. A unique-violation on the
/// reservation means "already enqueued or sent" and is silently skipped
/// (`spec.md` §4.4 step 2, at-most-once).
pub async fn dispatch_transition(
    transition: &FlowTransition,
    contract_address: Address,
    emergency_mode: bool,
    user_emails: &dyn UserEmailRegistry,
    send_log_store: &dyn SendLogStore,
    transport: &AsyncSmtpTransport<Tokio1Executor>,
    smtp: &SmtpConfig,
    max_retry_attempts: u32,
) -> Result<usize, NotifyError> {
    use timelockwatch_common::FlowStatus;

    let bindings = user_emails
        .bindings_subscribed_to(transition.key.chain_id, contract_address)
        .await?;

    let is_emergency = emergency_mode && transition.status_to == FlowStatus::Waiting;
    let mut sent = 0usize;

    for binding in bindings {
        let key = SendLogKey {
            email: binding.email.clone(),
            flow_id: transition.key.flow_id,
            standard: transition.key.standard,
            chain_id: transition.key.chain_id,
            status_to: transition.status_to,
        };
        let log = SendLog::new_pending(key.clone(), is_emergency);
        if !send_log_store.try_reserve(&log).await? {
            continue; // already enqueued/sent for this (email, flow_id, status_to)
        }

        let rendered = render(
            contract_address,
            transition.status_to,
            is_emergency,
            &smtp.reply_base_url,
            log.reply_token.as_deref(),
        );

        match send_one(transport, smtp, &binding.email, &rendered.subject, &rendered.body).await {
            Ok(()) => {
                send_log_store.mark_sent(&key, chrono::Utc::now()).await?;
                EMAILS_SENT.inc();
                sent += 1;
            }
            Err(e) => {
                send_log_store.mark_failed(&key, &e.to_string()).await?;
                EMAILS_FAILED.inc();
                if matches!(e, NotifyError::SmtpTransient { .. }) {
                    tracing::warn!(email = %binding.email, attempts = max_retry_attempts, "SMTP_TRANSIENT, retry scheduled next tick");
                } else {
                    tracing::error!(email = %binding.email, "SMTP_PERMANENT, terminal failure");
                }
            }
        }
    }

    Ok(sent)
}

async fn send_one(
    transport: &AsyncSmtpTransport<Tokio1Executor>,
    smtp: &SmtpConfig,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<(), NotifyError> {
    let from = format!("{} <{}>", smtp.from_name, smtp.from_address);
    let email = Message::builder()
        .from(from.parse().map_err(|e: lettre::address::AddressError| NotifyError::SmtpPermanent {
            recipient: to.to_string(),
            message: e.to_string(),
        })?)
        .to(to.parse().map_err(|e: lettre::address::AddressError| NotifyError::SmtpPermanent {
            recipient: to.to_string(),
            message: e.to_string(),
        })?)
        .subject(subject)
        .body(body.to_string())
        .map_err(|e| NotifyError::SmtpPermanent { recipient: to.to_string(), message: e.to_string() })?;

    transport.send(email).await.map_err(|e| {
        if e.is_transient() {
            NotifyError::SmtpTransient { recipient: to.to_string(), message: e.to_string() }
        } else {
            NotifyError::SmtpPermanent { recipient: to.to_string(), message: e.to_string() }
        }
    })?;
    Ok(())
}

/// Exponential backoff used between retry attempts, capped at `R_max`
/// attempts (`spec.md` §4.4).
pub fn backoff_for_attempt(base_secs: u64, attempt: u32) -> std::time::Duration {
    std::time::Duration::from_secs(base_secs.saturating_mul(1u64 << attempt.min(16)))
}

/// The registry-driven half of recipient resolution: which contracts are in
/// emergency mode right now, so the caller can pass `emergency_mode` into
/// [`dispatch_transition`] without re-deriving it per transition.
pub async fn is_emergency_contract(
    timelock_registry: &dyn TimelockRegistry,
    chain_id: timelockwatch_common::ChainId,
    contract_address: Address,
    global_default: bool,
) -> Result<bool, NotifyError> {
    let compound = timelock_registry.active_compound_by_chain(chain_id).await?;
    let oz = timelock_registry.active_oz_by_chain(chain_id).await?;
    let found = compound.into_iter().chain(oz).find(|c| c.contract_address == contract_address);
    Ok(found.and_then(|c| c.emergency_mode).unwrap_or(global_default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        assert_eq!(backoff_for_attempt(30, 0), std::time::Duration::from_secs(30));
        assert_eq!(backoff_for_attempt(30, 1), std::time::Duration::from_secs(60));
        assert_eq!(backoff_for_attempt(30, 2), std::time::Duration::from_secs(120));
    }
}
