//! Postgres-backed repositories, one per single-writer table (`spec.md`
//! §5). Each trait is a narrow slice of CRUD over its table; callers pass an
//! explicit per-call timeout at the `PgPool` construction site.

pub mod email_store;
pub mod error;
pub mod flow_store;
pub mod raw_event_store;
pub mod scan_progress_store;
pub mod send_log_store;
pub mod user_email_registry;

pub use email_store::{
    EmailBindingStore, PgEmailBindingStore, PgVerificationCodeStore, VerificationCodeStore,
};
pub use error::{StoreError, StoreResult};
pub use flow_store::{FlowStore, PgFlowStore};
pub use raw_event_store::{PgRawEventStore, RawEventStore};
pub use scan_progress_store::{PgScanProgressStore, ScanProgressStore};
pub use send_log_store::{PgSendLogStore, SendLogStore};
pub use user_email_registry::StorageUserEmailRegistry;
