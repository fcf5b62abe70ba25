//! The emergency resend ticker (`spec.md` §4.6 step 4): every `T_emerg`,
//! re-sends any unacknowledged emergency notification under `N_max`.

use std::sync::Arc;
use std::time::Duration;

use lettre::{AsyncSmtpTransport, Tokio1Executor};
use timelockwatch_notify::{resend_unacked, SmtpConfig};
use timelockwatch_storage::{FlowStore, SendLogStore};
use tokio_util::sync::CancellationToken;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    flow_store: Arc<dyn FlowStore>,
    send_log_store: Arc<dyn SendLogStore>,
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    smtp: SmtpConfig,
    max_sends: u32,
    tick_interval: Duration,
    shutdown: CancellationToken,
) {
    let mut interval = tokio::time::interval(tick_interval);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("emergency resend ticker stopping");
                return;
            }
            _ = interval.tick() => {
                let flow_ids = match send_log_store.flow_ids_with_unacked_emergency().await {
                    Ok(ids) => ids,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to list flows pending emergency resend");
                        continue;
                    }
                };

                for flow_id in flow_ids {
                    let flow = match flow_store.get_by_flow_id(flow_id).await {
                        Ok(Some(flow)) => flow,
                        Ok(None) => continue,
                        Err(e) => {
                            tracing::warn!(flow_id = %flow_id, error = %e, "failed to load flow for emergency resend");
                            continue;
                        }
                    };

                    match resend_unacked(
                        flow_id,
                        flow.key.contract_address,
                        flow.status,
                        max_sends,
                        send_log_store.as_ref(),
                        &transport,
                        &smtp,
                    )
                    .await
                    {
                        Ok(resent) if resent > 0 => {
                            tracing::info!(flow_id = %flow_id, resent, "emergency notifications resent");
                        }
                        Ok(_) => {}
                        Err(e) => tracing::warn!(flow_id = %flow_id, error = %e, "emergency resend failed"),
                    }
                }
            }
        }
    }
}
