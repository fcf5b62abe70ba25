//! The `Flow` entity (`spec.md` §3.1) — the reconstructed lifecycle of one
//! queued proposal. Owned exclusively by the Flow Engine for writes
//! (`spec.md` §5).

use alloy_primitives::{Bytes, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use timelockwatch_common::{Address, ChainId, FlowStatus, Standard};

/// The compound identity of a Flow: `(flow_id, standard, chain_id,
/// contract_address)` from `spec.md` §3.1. Kept as its own type since every
/// store query and update keys off this whole tuple, not just `flow_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowKey {
    pub flow_id: B256,
    pub standard: Standard,
    pub chain_id: ChainId,
    pub contract_address: Address,
}

/// The reconstructed state of one queued proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    pub key: FlowKey,
    pub status: FlowStatus,

    pub queue_tx_hash: Option<B256>,
    pub execute_tx_hash: Option<B256>,
    pub cancel_tx_hash: Option<B256>,

    pub initiator_address: Option<Address>,
    pub target: Option<Address>,
    pub value: U256,
    pub calldata: Bytes,

    pub queued_at: Option<DateTime<Utc>>,
    pub executed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Present iff the flow has ever been `waiting` or `ready`
    /// (`spec.md` §3.2 invariant 4).
    pub eta: Option<DateTime<Utc>>,
    /// Compound only (`spec.md` §3.2 invariant 4).
    pub expired_at: Option<DateTime<Utc>>,
}

impl Flow {
    /// A brand-new flow in the `waiting` state, as created by a queue event.
    pub fn new_waiting(
        key: FlowKey,
        queue_tx_hash: B256,
        initiator_address: Address,
        target: Address,
        value: U256,
        calldata: Bytes,
        queued_at: DateTime<Utc>,
        eta: DateTime<Utc>,
        expired_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            key,
            status: FlowStatus::Waiting,
            queue_tx_hash: Some(queue_tx_hash),
            execute_tx_hash: None,
            cancel_tx_hash: None,
            initiator_address: Some(initiator_address),
            target: Some(target),
            value,
            calldata,
            queued_at: Some(queued_at),
            executed_at: None,
            cancelled_at: None,
            eta: Some(eta),
            expired_at,
        }
    }

    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
