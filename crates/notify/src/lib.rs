//! The Notification Dispatcher (`spec.md` §4.4): recipient resolution, SMTP
//! sending, emergency resend, and reply handling.

pub mod dispatch;
pub mod emergency;
pub mod error;
pub mod render;
pub mod reply;

pub use dispatch::{backoff_for_attempt, build_transport, dispatch_transition, is_emergency_contract, SmtpConfig};
pub use emergency::resend_unacked;
pub use error::NotifyError;
pub use render::{render, RenderedMessage};
pub use reply::{confirm, ConfirmOutcome};
