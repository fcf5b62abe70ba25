//! One Scanner worker: drives [`crate::tick::tick`] on `T_scan` until the
//! root cancellation token fires, then returns so the Supervisor's bounded
//! drain can complete (`spec.md` §4.6, §5).

use std::time::Duration;

use timelockwatch_common::ChainId;
use timelockwatch_registry::TimelockRegistry;
use timelockwatch_rpc::ChainClient;
use timelockwatch_storage::{RawEventStore, ScanProgressStore};
use tokio_util::sync::CancellationToken;

use crate::tick::{tick, TimelockMap};
use crate::window::{WindowPolicy, WindowState};

#[allow(clippy::too_many_arguments)]
pub async fn run_worker(
    chain_id: ChainId,
    client: ChainClient,
    store: &dyn RawEventStore,
    progress_store: &dyn ScanProgressStore,
    timelock_registry: &dyn TimelockRegistry,
    policy: WindowPolicy,
    initial_window: u64,
    initial_lookback: u64,
    confirmations: u64,
    tick_interval: Duration,
    shutdown: CancellationToken,
) {
    let mut window = WindowState::new(initial_window);
    let mut interval = tokio::time::interval(tick_interval);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!(chain_id = %chain_id, "scanner worker stopping");
                return;
            }
            _ = interval.tick() => {
                let registry_map = match refresh_registry_map(chain_id, timelock_registry).await {
                    Ok(map) => map,
                    Err(e) => {
                        tracing::warn!(chain_id = %chain_id, error = %e, "failed to refresh timelock registry map");
                        continue;
                    }
                };

                match tick(
                    chain_id,
                    &client,
                    store,
                    progress_store,
                    &registry_map,
                    &policy,
                    &mut window,
                    initial_lookback,
                    confirmations,
                )
                .await
                {
                    Ok(outcome) => {
                        tracing::debug!(
                            chain_id = %chain_id,
                            persisted = outcome.events_persisted,
                            blocks = outcome.blocks_advanced,
                            window = window.current,
                            "scan tick complete"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(chain_id = %chain_id, error = %e, "scan tick failed, retrying next tick");
                    }
                }
            }
        }
    }
}

async fn refresh_registry_map(
    chain_id: ChainId,
    timelock_registry: &dyn TimelockRegistry,
) -> Result<TimelockMap, timelockwatch_registry::RegistryError> {
    let mut map = TimelockMap::new();
    for contract in timelock_registry.active_compound_by_chain(chain_id).await? {
        map.insert(contract.contract_address, contract);
    }
    for contract in timelock_registry.active_oz_by_chain(chain_id).await? {
        map.insert(contract.contract_address, contract);
    }
    Ok(map)
}
