use alloy_primitives::B256;
use timelockwatch_common::{ChainId, Classify, ErrorClass};

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("flow {flow_id} on chain {chain_id}: store call failed: {message}")]
    Store { flow_id: B256, chain_id: ChainId, message: String },
    /// A transition lost its `WHERE status = $from` race: the flow was
    /// already moved to a different state by a concurrent update
    /// (`spec.md` §4.3 tie-break rule). Logged, never retried blindly.
    #[error("flow {flow_id} on chain {chain_id}: FLOW_CONFLICT, attempted {attempted} but state had moved on")]
    Conflict { flow_id: B256, chain_id: ChainId, attempted: &'static str },
}

impl Classify for FlowError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::Store { .. } => ErrorClass::PersistConflict,
            Self::Conflict { .. } => ErrorClass::FlowConflict,
        }
    }
}
