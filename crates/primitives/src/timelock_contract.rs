//! The `Timelock Contract` entity (`spec.md` §3.1).

use serde::{Deserialize, Serialize};
use timelockwatch_common::{Address, ChainId, Standard};

/// Whether a registered contract is still being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractLifecycle {
    Active,
    Inactive,
    Deleted,
}

impl ContractLifecycle {
    /// Only `Active` contracts participate in scanning (`spec.md` §6,
    /// `TimelockRegistry.activeCompoundByChain`/`activeOZByChain`).
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Compound-standard-specific fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundFields {
    pub pending_admin: Option<Address>,
    /// The contract's current grace period, in seconds. Used to compute
    /// `expired_at` at queue time (`spec.md` §4.3, Open Question 2).
    pub grace_period_secs: u64,
    pub minimum_delay_secs: u64,
    pub maximum_delay_secs: u64,
}

/// OpenZeppelin-standard-specific fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenZeppelinFields {
    pub proposers: Vec<Address>,
    pub executors: Vec<Address>,
}

/// Standard-specific attributes, keeping the two shapes distinct rather than
/// a single struct padded with options for both standards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "standard", rename_all = "lowercase")]
pub enum StandardFields {
    Compound(CompoundFields),
    OpenZeppelin(OpenZeppelinFields),
}

impl StandardFields {
    pub const fn standard(&self) -> Standard {
        match self {
            Self::Compound(_) => Standard::Compound,
            Self::OpenZeppelin(_) => Standard::OpenZeppelin,
        }
    }

    /// The grace period to use when computing `expired_at` on queue, if this
    /// is a Compound contract.
    pub const fn grace_period_secs(&self) -> Option<u64> {
        match self {
            Self::Compound(fields) => Some(fields.grace_period_secs),
            Self::OpenZeppelin(_) => None,
        }
    }
}

/// A registered timelock contract. Identity is `(chain_id, contract_address,
/// standard)`; immutable to the core except for the `lifecycle` flag a user
/// sets from outside this system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelockContract {
    pub chain_id: ChainId,
    pub contract_address: Address,
    pub creator: Address,
    pub admin: Address,
    pub min_delay_secs: u64,
    pub lifecycle: ContractLifecycle,
    /// Whether this contract should be notified in emergency mode for new
    /// (`waiting`) proposals (`spec.md` §4.4). Falls back to a global
    /// default when unset.
    pub emergency_mode: Option<bool>,
    pub fields: StandardFields,
}

impl TimelockContract {
    pub const fn standard(&self) -> Standard {
        self.fields.standard()
    }
}
