use timelockwatch_common::{Classify, ErrorClass};

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("registry lookup failed: {0}")]
    Registry(#[from] timelockwatch_registry::RegistryError),
    #[error("store call failed: {0}")]
    Store(#[from] timelockwatch_storage::StoreError),
    #[error("smtp transient failure sending to {recipient}: {message}")]
    SmtpTransient { recipient: String, message: String },
    #[error("smtp permanent failure sending to {recipient}: {message}")]
    SmtpPermanent { recipient: String, message: String },
    #[error("emergency reply token invalid or already used")]
    EmergTokenInvalid,
}

impl Classify for NotifyError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::Registry(_) => ErrorClass::RpcUnavailable,
            Self::Store(_) => ErrorClass::PersistConflict,
            Self::SmtpTransient { .. } => ErrorClass::SmtpTransient,
            Self::SmtpPermanent { .. } => ErrorClass::SmtpPermanent,
            Self::EmergTokenInvalid => ErrorClass::EmergTokenInvalid,
        }
    }
}
