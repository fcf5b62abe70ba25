//! The Flow Engine ticker (`spec.md` §4.6 step 3): every `T_flow`, folds
//! newly persisted events into flow state for every active chain, applies
//! time-driven transitions, then hands the resulting transitions to the
//! Dispatcher.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lettre::{AsyncSmtpTransport, Tokio1Executor};
use timelockwatch_common::{Address, ChainId};
use timelockwatch_flow::{fold_events, time_tick, FlowTransition};
use timelockwatch_notify::{dispatch_transition, is_emergency_contract, SmtpConfig};
use timelockwatch_registry::{TimelockRegistry, UserEmailRegistry};
use timelockwatch_storage::{FlowStore, RawEventStore, SendLogStore};
use tokio_util::sync::CancellationToken;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    chain_ids: Vec<ChainId>,
    raw_event_store: Arc<dyn RawEventStore>,
    flow_store: Arc<dyn FlowStore>,
    send_log_store: Arc<dyn SendLogStore>,
    timelock_registry: Arc<dyn TimelockRegistry>,
    user_email_registry: Arc<dyn UserEmailRegistry>,
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    smtp: SmtpConfig,
    tick_interval: Duration,
    batch_limit: i64,
    max_retry_attempts: u32,
    emergency_global_default: bool,
    shutdown: CancellationToken,
) {
    let mut interval = tokio::time::interval(tick_interval);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("flow engine ticker stopping");
                return;
            }
            _ = interval.tick() => {
                let now = chrono::Utc::now();
                let mut transitions: Vec<FlowTransition> = Vec::new();

                for chain_id in &chain_ids {
                    let grace_periods = match grace_periods_for(*chain_id, timelock_registry.as_ref()).await {
                        Ok(map) => map,
                        Err(e) => {
                            tracing::warn!(chain_id = %chain_id, error = %e, "failed to refresh grace periods, skipping fold this tick");
                            continue;
                        }
                    };
                    match fold_events(*chain_id, raw_event_store.as_ref(), flow_store.as_ref(), &grace_periods, batch_limit).await {
                        Ok(mut t) => transitions.append(&mut t),
                        Err(e) => tracing::warn!(chain_id = %chain_id, error = %e, "flow fold failed, retrying next tick"),
                    }
                }

                match time_tick(flow_store.as_ref(), now, batch_limit).await {
                    Ok(mut t) => transitions.append(&mut t),
                    Err(e) => tracing::warn!(error = %e, "flow time tick failed, retrying next tick"),
                }

                for transition in &transitions {
                    let contract_address = transition.key.contract_address;
                    let emergency_mode = is_emergency_contract(
                        timelock_registry.as_ref(),
                        transition.key.chain_id,
                        contract_address,
                        emergency_global_default,
                    )
                    .await
                    .unwrap_or(emergency_global_default);

                    if let Err(e) = dispatch_transition(
                        transition,
                        contract_address,
                        emergency_mode,
                        user_email_registry.as_ref(),
                        send_log_store.as_ref(),
                        &transport,
                        &smtp,
                        max_retry_attempts,
                    )
                    .await
                    {
                        tracing::warn!(
                            flow_id = %transition.key.flow_id,
                            chain_id = %transition.key.chain_id,
                            error = %e,
                            "dispatch failed for flow transition"
                        );
                    }
                }
            }
        }
    }
}

async fn grace_periods_for(
    chain_id: ChainId,
    timelock_registry: &dyn TimelockRegistry,
) -> Result<HashMap<Address, u64>, timelockwatch_registry::RegistryError> {
    let mut map = HashMap::new();
    for contract in timelock_registry.active_compound_by_chain(chain_id).await? {
        if let Some(secs) = contract.fields.grace_period_secs() {
            map.insert(contract.contract_address, secs);
        }
    }
    Ok(map)
}
