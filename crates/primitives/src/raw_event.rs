//! The `RawEvent` entity (`spec.md` §3.1) — append-only, persisted per
//! standard (`compound_timelock_transactions` /
//! `openzeppelin_timelock_transactions`), unique on `(chain_id,
//! contract_address, tx_hash, event_type)`.

use alloy_primitives::{Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use timelockwatch_common::{Address, ChainId, Standard};

/// The lifecycle event a `RawEvent` row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Queue,
    Execute,
    Cancel,
}

impl EventType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queue => "queue",
            Self::Execute => "execute",
            Self::Cancel => "cancel",
        }
    }
}

/// One persisted occurrence of a decoded timelock event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub chain_id: ChainId,
    pub contract_address: Address,
    pub standard: Standard,
    pub tx_hash: B256,
    pub event_type: EventType,
    pub block_number: u64,
    pub log_index: u64,
    pub block_timestamp: i64,
    /// The flow identity this event folds into (`txHash` for Compound,
    /// `id` for OpenZeppelin).
    pub flow_id: B256,
    pub from_address: Option<Address>,
    pub to_address: Option<Address>,
    pub value: U256,
    /// The full decoded payload, kept as a semi-structured blob so the Flow
    /// Engine can read standard-specific fields without a schema migration
    /// every time a new field is needed (`spec.md` §9: "typed sum over the
    /// six known events", persisted as JSON rather than a dynamic map).
    pub decoded_payload: serde_json::Value,
    pub calldata: Bytes,
    /// Set by the Flow Engine once this row has been folded into a `Flow`
    /// transition (`spec.md` §4.3 failure semantics: a fold failure does not
    /// roll back the scanner, it is retried via this flag).
    pub folded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_round_trips_through_json() {
        let json = serde_json::to_string(&EventType::Execute).unwrap();
        assert_eq!(json, "\"execute\"");
        let back: EventType = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "execute");
    }
}
