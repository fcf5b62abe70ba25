//! Tunable defaults shared by every component, mirroring the configuration
//! table in `spec.md` §6 / `SPEC_FULL.md` §4.8.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scanner-related tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanTunables {
    /// `scan.tick` — interval between Scanner ticks, per chain.
    pub tick_secs: u64,
    /// `scan.window_max` — upper bound of the adaptive log-filter window.
    pub window_max: u64,
    /// `scan.window_min` — lower bound of the adaptive log-filter window.
    pub window_min: u64,
    /// `scan.initial_lookback` — blocks behind head on first scan.
    pub initial_lookback: u64,
    /// `scan.confirmations` — confirmation depth subtracted from head.
    pub confirmations: u64,
    /// Consecutive successes required before growing the window back up.
    pub grow_after_successes: u32,
}

impl Default for ScanTunables {
    fn default() -> Self {
        Self {
            tick_secs: 30,
            window_max: 500,
            window_min: 16,
            initial_lookback: 100,
            confirmations: 0,
            grow_after_successes: 3,
        }
    }
}

impl ScanTunables {
    /// `T_scan` as a [`Duration`].
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }
}

/// Flow-engine tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowTunables {
    /// `flow.tick` — interval between time-driven transition sweeps.
    pub tick_secs: u64,
    /// Max rows fetched per `WaitingFlowsDue`/`CompoundFlowsExpired` query.
    pub batch_limit: u32,
}

impl Default for FlowTunables {
    fn default() -> Self {
        Self {
            tick_secs: 60,
            batch_limit: 500,
        }
    }
}

impl FlowTunables {
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }
}

/// Emergency-notification tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyTunables {
    /// `emerg.resend_interval`.
    pub resend_interval_secs: u64,
    /// `emerg.max_sends` — `N_max`.
    pub max_sends: u32,
}

impl Default for EmergencyTunables {
    fn default() -> Self {
        Self {
            resend_interval_secs: 2 * 60 * 60,
            max_sends: 5,
        }
    }
}

impl EmergencyTunables {
    pub fn resend_interval(&self) -> Duration {
        Duration::from_secs(self.resend_interval_secs)
    }
}

/// SMTP retry tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendRetryTunables {
    /// `R_max` — max transient-failure retries before giving up.
    pub max_attempts: u32,
    /// Base backoff; attempt `n` waits `base * 2^n`.
    pub base_backoff_secs: u64,
}

impl Default for SendRetryTunables {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff_secs: 30,
        }
    }
}

/// `verify.ttl` — verification code lifetime. Not exercised by the core
/// (owned by the external auth surface) but kept alongside the rest of the
/// configuration table for completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationTunables {
    pub ttl_secs: u64,
}

impl Default for VerificationTunables {
    fn default() -> Self {
        Self { ttl_secs: 600 }
    }
}

/// The RPC provider template to render chain URLs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcProvider {
    Alchemy,
    Infura,
}

impl Default for RpcProvider {
    fn default() -> Self {
        Self::Alchemy
    }
}

/// Every tunable this system recognizes, grouped the way `spec.md` §6 groups
/// them. Deserializes from the `--chains`/config TOML file with per-group
/// defaults, so an operator only overrides what they care about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    pub scan: ScanTunables,
    pub flow: FlowTunables,
    pub emerg: EmergencyTunables,
    pub send_retry: SendRetryTunables,
    pub verify: VerificationTunables,
    pub rpc_provider: RpcProvider,
    pub include_testnets: bool,
}
