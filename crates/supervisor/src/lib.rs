//! The Supervisor (`spec.md` §4.6): owns every worker's lifecycle. `Start`
//! dials the RPC Pool and launches one Scanner per chain plus the Flow
//! Engine and emergency-resend tickers; `Stop` cancels the root context and
//! bounds how long it waits for workers to drain.

mod emergency_task;
mod error;
mod flow_task;

pub use error::SupervisorError;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lettre::{AsyncSmtpTransport, Tokio1Executor};
use timelockwatch_common::{ChainId, Tunables};
use timelockwatch_notify::SmtpConfig;
use timelockwatch_registry::{ChainRegistry, TimelockRegistry, UserEmailRegistry};
use timelockwatch_rpc::RpcPool;
use timelockwatch_scanner::{run_worker, WindowPolicy};
use timelockwatch_storage::{FlowStore, RawEventStore, ScanProgressStore, SendLogStore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Everything the Supervisor needs that isn't a tunable: repository handles
/// and the registries it reads from but does not own.
pub struct SupervisorDeps {
    pub rpc_pool: Arc<RpcPool>,
    pub chain_registry: Arc<dyn ChainRegistry>,
    pub timelock_registry: Arc<dyn TimelockRegistry>,
    pub user_email_registry: Arc<dyn UserEmailRegistry>,
    pub raw_event_store: Arc<dyn RawEventStore>,
    pub flow_store: Arc<dyn FlowStore>,
    pub send_log_store: Arc<dyn SendLogStore>,
    pub scan_progress_store: Arc<dyn ScanProgressStore>,
}

#[derive(Clone)]
pub struct SupervisorConfig {
    pub tunables: Tunables,
    /// Per-chain RPC API key, keyed by `chain_id`. A chain with no entry
    /// dials with an empty key, which fails fast if its template requires
    /// one (`spec.md` §4.5 step 1).
    pub api_keys: HashMap<ChainId, String>,
    pub smtp: SmtpConfig,
    /// Default emergency-mode flag for contracts that don't override it.
    pub emergency_global_default: bool,
    /// Maximum time `Stop` waits for workers to drain before giving up on
    /// a graceful exit (`spec.md` §4.6, default 30s).
    pub drain_timeout: Duration,
}

pub struct Supervisor {
    deps: SupervisorDeps,
    config: SupervisorConfig,
}

impl Supervisor {
    pub fn new(deps: SupervisorDeps, config: SupervisorConfig) -> Self {
        Self { deps, config }
    }

    /// Runs the Start sequence and blocks until `shutdown` is cancelled,
    /// then runs the bounded-drain Stop sequence.
    pub async fn run(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let chains = self
            .deps
            .chain_registry
            .list_rpc_enabled(self.config.tunables.include_testnets)
            .await
            .map_err(SupervisorError::from)?;

        if chains.is_empty() {
            return Err(SupervisorError::AllChainsUnreachable.into());
        }

        let mut dialed = Vec::new();
        for chain in &chains {
            let api_key = self.config.api_keys.get(&chain.chain_id).cloned().unwrap_or_default();
            match self.deps.rpc_pool.dial_with_fallback(chain, &api_key).await {
                Ok(client) => dialed.push((chain.chain_id, (*client).clone())),
                Err(e) => tracing::warn!(chain_id = %chain.chain_id, error = %e, "chain unreachable at startup, skipping"),
            }
        }
        if dialed.is_empty() {
            return Err(SupervisorError::AllChainsUnreachable.into());
        }

        let transport = Arc::new(
            timelockwatch_notify::build_transport(&self.config.smtp)
                .map_err(|e| anyhow::anyhow!("smtp transport init failed: {e}"))?,
        );

        let mut workers = JoinSet::new();

        for (chain_id, client) in dialed {
            let raw_event_store = self.deps.raw_event_store.clone();
            let scan_progress_store = self.deps.scan_progress_store.clone();
            let timelock_registry = self.deps.timelock_registry.clone();
            let scan = self.config.tunables.scan;
            let shutdown = shutdown.clone();

            workers.spawn(async move {
                let policy = WindowPolicy {
                    min: scan.window_min,
                    max: scan.window_max,
                    grow_after_successes: scan.grow_after_successes,
                };
                run_worker(
                    chain_id,
                    client,
                    raw_event_store.as_ref(),
                    scan_progress_store.as_ref(),
                    timelock_registry.as_ref(),
                    policy,
                    scan.window_min,
                    scan.initial_lookback,
                    scan.confirmations,
                    scan.tick(),
                    shutdown,
                )
                .await;
            });
        }

        {
            let chain_ids: Vec<ChainId> = chains.iter().map(|c| c.chain_id).collect();
            let raw_event_store = self.deps.raw_event_store.clone();
            let flow_store = self.deps.flow_store.clone();
            let send_log_store = self.deps.send_log_store.clone();
            let timelock_registry = self.deps.timelock_registry.clone();
            let user_email_registry = self.deps.user_email_registry.clone();
            let transport = transport.clone();
            let smtp = self.config.smtp.clone();
            let flow = self.config.tunables.flow;
            let send_retry = self.config.tunables.send_retry;
            let emergency_global_default = self.config.emergency_global_default;
            let shutdown = shutdown.clone();

            workers.spawn(async move {
                flow_task::run(
                    chain_ids,
                    raw_event_store,
                    flow_store,
                    send_log_store,
                    timelock_registry,
                    user_email_registry,
                    transport,
                    smtp,
                    flow.tick(),
                    flow.batch_limit as i64,
                    send_retry.max_attempts,
                    emergency_global_default,
                    shutdown,
                )
                .await;
            });
        }

        {
            let flow_store = self.deps.flow_store.clone();
            let send_log_store = self.deps.send_log_store.clone();
            let transport = transport.clone();
            let smtp = self.config.smtp.clone();
            let emerg = self.config.tunables.emerg;
            let shutdown = shutdown.clone();

            workers.spawn(async move {
                emergency_task::run(
                    flow_store,
                    send_log_store,
                    transport,
                    smtp,
                    emerg.max_sends,
                    emerg.resend_interval(),
                    shutdown,
                )
                .await;
            });
        }

        shutdown.cancelled().await;
        tracing::info!("shutdown requested, draining workers");

        match tokio::time::timeout(self.config.drain_timeout, drain(&mut workers)).await {
            Ok(()) => tracing::info!("all workers drained cleanly"),
            Err(_) => {
                tracing::warn!(timeout = ?self.config.drain_timeout, "drain timed out, force-terminating remaining workers");
                workers.abort_all();
                while workers.join_next().await.is_some() {}
            }
        }

        Ok(())
    }
}

async fn drain(workers: &mut JoinSet<()>) {
    while let Some(result) = workers.join_next().await {
        if let Err(e) = result {
            if e.is_panic() {
                tracing::error!(error = %e, "worker task panicked during drain");
            }
        }
    }
}
