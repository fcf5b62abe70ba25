//! Small identity and enum types shared across every TimelockWatch crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A chain identifier, e.g. `1` for Ethereum mainnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// The two timelock contract standards this system understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Standard {
    /// A Compound Governor-style `Timelock` contract.
    Compound,
    /// An OpenZeppelin `TimelockController` contract.
    OpenZeppelin,
}

impl Standard {
    /// The string used in persisted rows and config files for this standard.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Compound => "compound",
            Self::OpenZeppelin => "openzeppelin",
        }
    }
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The lifecycle state of a [`Flow`](crate::flow::FlowId) — see `spec.md` §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowStatus {
    /// Queued, `eta` not yet reached.
    Waiting,
    /// `eta` reached, not yet executed/cancelled.
    Ready,
    /// Executed on-chain. Terminal.
    Executed,
    /// Cancelled on-chain. Terminal.
    Cancelled,
    /// Grace period elapsed without execution (Compound only). Terminal.
    Expired,
}

impl FlowStatus {
    /// Terminal statuses are absorbing: no further event or tick may change them.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Executed | Self::Cancelled | Self::Expired)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Ready => "ready",
            Self::Executed => "executed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(FlowStatus::Executed.is_terminal());
        assert!(FlowStatus::Cancelled.is_terminal());
        assert!(FlowStatus::Expired.is_terminal());
        assert!(!FlowStatus::Waiting.is_terminal());
        assert!(!FlowStatus::Ready.is_terminal());
    }
}
