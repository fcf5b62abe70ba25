//! The typed sum of the six recognized timelock events.
//!
//! This is the tagged-union representation `spec.md` §9 calls for in place
//! of a dynamically-typed decode: each variant carries exactly the fields
//! its signature defines, and a log that matches none of them simply never
//! produces a [`DecodedEvent`] rather than falling back to a dictionary.

use alloy_primitives::{Bytes, B256, U256};
use timelockwatch_common::Address;

/// One decoded occurrence of a `QueueTransaction`/`ExecuteTransaction`/
/// `CancelTransaction` event — the three Compound signatures share this
/// shape (`spec.md` §4.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundEvent {
    pub tx_hash: B256,
    pub target: Address,
    pub value: U256,
    pub signature: String,
    pub data: Bytes,
    pub eta: u64,
}

/// One decoded `CallScheduled` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallScheduled {
    pub id: B256,
    pub index: U256,
    pub target: Address,
    pub value: U256,
    pub data: Bytes,
    pub predecessor: B256,
    pub delay: u64,
}

/// One decoded `CallExecuted` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExecuted {
    pub id: B256,
    pub index: U256,
    pub target: Address,
    pub value: U256,
    pub data: Bytes,
}

/// One decoded `Cancelled` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OzCancelled {
    pub id: B256,
}

/// A single timelock lifecycle event, decoded to one of the six known
/// shapes. Carries nothing about the source log; callers that need the
/// block number, tx hash, or contract address keep those alongside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEvent {
    CompoundQueue(CompoundEvent),
    CompoundExecute(CompoundEvent),
    CompoundCancel(CompoundEvent),
    OzScheduled(CallScheduled),
    OzExecuted(CallExecuted),
    OzCancelled(OzCancelled),
}

impl DecodedEvent {
    /// The standard this event belongs to.
    pub const fn standard(&self) -> timelockwatch_common::Standard {
        use timelockwatch_common::Standard;
        match self {
            Self::CompoundQueue(_) | Self::CompoundExecute(_) | Self::CompoundCancel(_) => {
                Standard::Compound
            }
            Self::OzScheduled(_) | Self::OzExecuted(_) | Self::OzCancelled(_) => {
                Standard::OpenZeppelin
            }
        }
    }

    /// The flow identity this event folds into — `txHash` for Compound,
    /// `id` for OpenZeppelin (`spec.md` §3.1).
    pub const fn flow_id(&self) -> B256 {
        match self {
            Self::CompoundQueue(e) | Self::CompoundExecute(e) | Self::CompoundCancel(e) => {
                e.tx_hash
            }
            Self::OzScheduled(e) => e.id,
            Self::OzExecuted(e) => e.id,
            Self::OzCancelled(e) => e.id,
        }
    }

    /// A short tag used in logs and RawEvent rows (`spec.md` §3.1
    /// `event_type`).
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::CompoundQueue(_) => "queue",
            Self::CompoundExecute(_) => "execute",
            Self::CompoundCancel(_) => "cancel",
            Self::OzScheduled(_) => "queue",
            Self::OzExecuted(_) => "execute",
            Self::OzCancelled(_) => "cancel",
        }
    }
}
