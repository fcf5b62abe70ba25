//! Decodes raw EVM logs into the six known timelock lifecycle events
//! (`spec.md` §4.1).

mod abi;
pub mod decode;
pub mod event;
pub mod signatures;

pub use decode::{decode_log, DecodeMalformed, RawLog};
pub use event::{CallExecuted, CallScheduled, CompoundEvent, DecodedEvent, OzCancelled};
pub use signatures::Signature;
