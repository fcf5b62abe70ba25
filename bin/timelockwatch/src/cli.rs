//! CLI arguments (`spec.md` §6 configuration table / `SPEC_FULL.md` §4.8).

use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "timelockwatch", author, version, about = "Multi-chain timelock governance indexer and notifier")]
pub struct ScannerArgs {
    /// Verbosity level (0-4): error, warn, info, debug, trace.
    #[arg(long, short, action = ArgAction::Count)]
    pub v: u8,

    /// Postgres connection string.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Max Postgres pool connections.
    #[arg(long, default_value_t = 10)]
    pub database_max_connections: u32,

    /// Bind address for the `/emergency-reply` and `/metrics` server.
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub http_bind_addr: String,

    /// Path to a TOML file of chains and timelock contracts (local/dev mode).
    /// When absent, a `ChainRegistry`/`TimelockRegistry` backed by the
    /// storage layer should be wired in instead.
    #[arg(long)]
    pub chains: Option<PathBuf>,

    /// API key applied to every chain's RPC URL template.
    #[arg(long, env = "RPC_API_KEY", default_value = "")]
    pub rpc_api_key: String,

    #[arg(long, default_value_t = 30)]
    pub scan_tick_secs: u64,
    #[arg(long, default_value_t = 500)]
    pub scan_window_max: u64,
    #[arg(long, default_value_t = 16)]
    pub scan_window_min: u64,
    #[arg(long, default_value_t = 100)]
    pub scan_initial_lookback: u64,
    #[arg(long, default_value_t = 0)]
    pub scan_confirmations: u64,
    #[arg(long, default_value_t = 3)]
    pub scan_grow_after_successes: u32,

    #[arg(long, default_value_t = 60)]
    pub flow_tick_secs: u64,
    #[arg(long, default_value_t = 500)]
    pub flow_batch_limit: u32,

    #[arg(long, default_value_t = 7200)]
    pub emerg_resend_interval_secs: u64,
    #[arg(long, default_value_t = 5)]
    pub emerg_max_sends: u32,
    #[arg(long)]
    pub emerg_global_default: bool,

    #[arg(long, default_value_t = 5)]
    pub send_retry_max_attempts: u32,
    #[arg(long, default_value_t = 30)]
    pub send_retry_base_backoff_secs: u64,

    #[arg(long)]
    pub include_testnets: bool,

    #[arg(long, env = "SMTP_HOST")]
    pub smtp_host: String,
    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    pub smtp_port: u16,
    #[arg(long, env = "SMTP_USERNAME")]
    pub smtp_username: String,
    #[arg(long, env = "SMTP_PASSWORD")]
    pub smtp_password: String,
    #[arg(long, env = "SMTP_FROM_ADDRESS")]
    pub smtp_from_address: String,
    #[arg(long, env = "SMTP_FROM_NAME", default_value = "TimelockWatch")]
    pub smtp_from_name: String,
    /// Externally reachable base URL embedded in emergency confirmation
    /// links, e.g. `https://timelockwatch.example`.
    #[arg(long, env = "REPLY_BASE_URL")]
    pub reply_base_url: String,

    /// Maximum time to wait for workers to drain on shutdown, in seconds.
    #[arg(long, default_value_t = 30)]
    pub drain_timeout_secs: u64,
}
