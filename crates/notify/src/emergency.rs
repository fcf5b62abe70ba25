//! Emergency resend loop (`spec.md` §4.4): every `T_emerg`, re-sends any
//! unacknowledged emergency notification whose `send_count` has not yet
//! reached `N_max`.

use alloy_primitives::B256;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use timelockwatch_common::metrics::{EMAILS_FAILED, EMERGENCY_RESENDS};
use timelockwatch_common::Address;
use timelockwatch_storage::SendLogStore;

use crate::dispatch::SmtpConfig;
use crate::error::NotifyError;
use crate::render::render;

/// Re-sends every unacked emergency `SendLog` for `flow_id` whose
/// `send_count < max_sends`, rendering with the flow's already-assigned
/// `reply_token` so the confirmation link stays stable across resends.
pub async fn resend_unacked(
    flow_id: B256,
    contract_address: Address,
    status_to: timelockwatch_common::FlowStatus,
    max_sends: u32,
    send_log_store: &dyn SendLogStore,
    transport: &AsyncSmtpTransport<Tokio1Executor>,
    smtp: &SmtpConfig,
) -> Result<usize, NotifyError> {
    let pending = send_log_store.unacked_emergency(flow_id).await?;
    let mut resent = 0usize;

    for log in pending {
        if !log.needs_resend(max_sends) {
            continue;
        }
        let rendered = render(contract_address, status_to, true, &smtp.reply_base_url, log.reply_token.as_deref());

        let result = send_resend(transport, smtp, &log.key.email, &rendered.subject, &rendered.body).await;
        match result {
            Ok(()) => {
                send_log_store.mark_sent(&log.key, chrono::Utc::now()).await?;
                EMERGENCY_RESENDS.inc();
                resent += 1;
            }
            Err(e) => {
                send_log_store.mark_failed(&log.key, &e.to_string()).await?;
                EMAILS_FAILED.inc();
                tracing::warn!(email = %log.key.email, flow_id = %flow_id, "emergency resend failed, retried next tick");
            }
        }
    }

    // Once every unacked row for this flow has either replied or exhausted
    // its resend budget, the group is not touched further; `mark_group_completed`
    // is only ever driven by `reply::confirm` seeing the last reply come in.
    Ok(resent)
}

async fn send_resend(
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
