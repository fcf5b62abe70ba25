//! The error taxonomy of `spec.md` §7, shared so every crate's `thiserror`
//! enum can report which class it belongs to for metrics and logging.

use std::fmt;

/// One of the named error classes from `spec.md` §7. Carried alongside a
/// crate-local error so dashboards and logs can group unrelated error types
/// under a single, spec-stable label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    ConfigInvalid,
    RpcUnavailable,
    DecodeMalformed,
    PersistConflict,
    FlowConflict,
    SmtpTransient,
    SmtpPermanent,
    EmergTokenInvalid,
}

impl ErrorClass {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigInvalid => "CONFIG_INVALID",
            Self::RpcUnavailable => "RPC_UNAVAILABLE",
            Self::DecodeMalformed => "DECODE_MALFORMED",
            Self::PersistConflict => "PERSIST_CONFLICT",
            Self::FlowConflict => "FLOW_CONFLICT",
            Self::SmtpTransient => "SMTP_TRANSIENT",
            Self::SmtpPermanent => "SMTP_PERMANENT",
            Self::EmergTokenInvalid => "EMERG_TOKEN_INVALID",
        }
    }

    /// Whether this class can ever abort the whole process (only true during
    /// startup, per the propagation policy in `spec.md` §7).
    pub const fn is_fatal_only_at_startup(&self) -> bool {
        matches!(self, Self::ConfigInvalid)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented by every crate-local error enum so call sites can uniformly
/// extract the `spec.md` §7 class for logging/metrics without a match on
/// each concrete type.
pub trait Classify {
    fn class(&self) -> ErrorClass;
}
