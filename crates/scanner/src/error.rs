use timelockwatch_common::{ChainId, Classify, ErrorClass};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("chain {0}: rpc call failed: {1}")]
    Rpc(ChainId, String),
    #[error("chain {0}: store call failed: {1}")]
    Store(ChainId, String),
}

impl Classify for ScanError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::Rpc(..) => ErrorClass::RpcUnavailable,
            Self::Store(..) => ErrorClass::PersistConflict,
        }
    }
}
