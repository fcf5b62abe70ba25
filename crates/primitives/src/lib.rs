//! Persisted entity types shared across TimelockWatch crates.
//!
//! Each module corresponds to one table of `spec.md` §3.1; ownership of
//! writes to each table is assigned to exactly one component per §5, which
//! is noted on the owning type.

pub mod chain;
pub mod email;
pub mod flow;
pub mod raw_event;
pub mod scan_progress;
pub mod send_log;
pub mod timelock_contract;

pub use chain::{Chain, RpcEndpoints};
pub use email::{EmailBinding, VerificationCode};
pub use flow::{Flow, FlowKey};
pub use raw_event::{EventType, RawEvent};
pub use scan_progress::{ScanProgress, ScanStatus};
pub use send_log::{SendLog, SendLogKey, SendStatus};
pub use timelock_contract::{
    CompoundFields, ContractLifecycle, OpenZeppelinFields, StandardFields, TimelockContract,
};
