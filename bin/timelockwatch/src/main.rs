//! TimelockWatch binary: wires the RPC Pool, registries, storage layer, and
//! Supervisor together, then runs until SIGINT/SIGTERM (`spec.md` §4.6,
//! §6 exit codes).

mod cli;
mod server;
mod telemetry;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;

use timelockwatch_common::{
    config::{EmergencyTunables, FlowTunables, ScanTunables, SendRetryTunables, VerificationTunables},
    ChainId, Tunables,
};
use timelockwatch_notify::SmtpConfig;
use timelockwatch_registry::{ChainRegistry, TomlRegistry};
use timelockwatch_storage::{
    PgEmailBindingStore, PgFlowStore, PgRawEventStore, PgScanProgressStore, PgSendLogStore,
    PgVerificationCodeStore, StorageUserEmailRegistry,
};
use timelockwatch_supervisor::{Supervisor, SupervisorConfig, SupervisorDeps};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::ScannerArgs::parse();
    telemetry::init(args.v).context("initializing tracing subscriber")?;

    match run(args).await {
        Ok(()) => {
            tracing::info!("timelockwatch stopped cleanly");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "timelockwatch failed to start");
            std::process::exit(1);
        }
    }
}

async fn run(args: cli::ScannerArgs) -> anyhow::Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(args.database_max_connections)
        .connect(&args.database_url)
        .await
        .context("connecting to postgres")?;

    let chains_path = args
        .chains
        .as_ref()
        .context("--chains is required; no database-backed ChainRegistry/TimelockRegistry is wired in this build")?;
    let registry = Arc::new(
        TomlRegistry::load(Path::new(chains_path)).map_err(|e| anyhow::anyhow!("loading --chains file: {e}"))?,
    );

    let user_email_registry = Arc::new(StorageUserEmailRegistry::new(
        PgEmailBindingStore::new(pool.clone()),
        PgVerificationCodeStore::new(pool.clone()),
    ));

    let tunables = Tunables {
        scan: ScanTunables {
            tick_secs: args.scan_tick_secs,
            window_max: args.scan_window_max,
            window_min: args.scan_window_min,
            initial_lookback: args.scan_initial_lookback,
            confirmations: args.scan_confirmations,
            grow_after_successes: args.scan_grow_after_successes,
        },
        flow: FlowTunables { tick_secs: args.flow_tick_secs, batch_limit: args.flow_batch_limit },
        emerg: EmergencyTunables {
            resend_interval_secs: args.emerg_resend_interval_secs,
            max_sends: args.emerg_max_sends,
        },
        send_retry: SendRetryTunables {
            max_attempts: args.send_retry_max_attempts,
            base_backoff_secs: args.send_retry_base_backoff_secs,
        },
        verify: VerificationTunables::default(),
        rpc_provider: Default::default(),
        include_testnets: args.include_testnets,
    };

    let smtp = SmtpConfig {
        host: args.smtp_host.clone(),
        port: args.smtp_port,
        username: args.smtp_username.clone(),
        password: args.smtp_password.clone(),
        from_address: args.smtp_from_address.clone(),
        from_name: args.smtp_from_name.clone(),
        reply_base_url: args.reply_base_url.clone(),
    };

    let raw_event_store: Arc<dyn timelockwatch_storage::RawEventStore> =
        Arc::new(PgRawEventStore::new(pool.clone()));
    let flow_store: Arc<dyn timelockwatch_storage::FlowStore> = Arc::new(PgFlowStore::new(pool.clone()));
    let send_log_store: Arc<dyn timelockwatch_storage::SendLogStore> = Arc::new(PgSendLogStore::new(pool.clone()));
    let scan_progress_store: Arc<dyn timelockwatch_storage::ScanProgressStore> =
        Arc::new(PgScanProgressStore::new(pool.clone()));

    let deps = SupervisorDeps {
        rpc_pool: Arc::new(timelockwatch_rpc::RpcPool::new()),
        chain_registry: registry.clone(),
        timelock_registry: registry.clone(),
        user_email_registry,
        raw_event_store,
        flow_store,
        send_log_store: send_log_store.clone(),
        scan_progress_store,
    };

    let api_keys: HashMap<ChainId, String> = registry
        .list_rpc_enabled(args.include_testnets)
        .await
        .map_err(|e| anyhow::anyhow!("listing chains for api key assignment: {e}"))?
        .into_iter()
        .map(|c| (c.chain_id, args.rpc_api_key.clone()))
        .collect();
    let config = SupervisorConfig {
        tunables,
        api_keys,
        smtp,
        emergency_global_default: args.emerg_global_default,
        drain_timeout: Duration::from_secs(args.drain_timeout_secs),
    };

    let supervisor = Supervisor::new(deps, config);
    let shutdown = CancellationToken::new();

    let shutdown_for_signal = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received shutdown signal");
        shutdown_for_signal.cancel();
    });

    let http_bind_addr = args.http_bind_addr.clone();
    let http_send_log_store = send_log_store.clone();
    let http_shutdown = shutdown.clone();

    tokio::select! {
        res = supervisor.run(shutdown.clone()) => {
            http_shutdown.cancel();
            res.context("supervisor exited with an error")
        }
        res = server::serve(&http_bind_addr, http_send_log_store) => {
            shutdown.cancel();
            res.context("http server exited with an error")
        }
    }
}
