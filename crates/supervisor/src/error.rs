use timelockwatch_common::{Classify, ErrorClass};

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("no configured chain could be dialed at startup")]
    AllChainsUnreachable,
    #[error("chain registry unavailable at startup: {0}")]
    Registry(#[from] timelockwatch_registry::RegistryError),
}

impl Classify for SupervisorError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::AllChainsUnreachable => ErrorClass::RpcUnavailable,
            Self::Registry(_) => ErrorClass::RpcUnavailable,
        }
    }
}
