//! The Chain Scanner (`spec.md` §4.2): one worker per chain, each running
//! [`tick`] on a fixed interval until cancelled.

pub mod error;
pub mod tick;
pub mod window;
pub mod worker;

pub use error::ScanError;
pub use tick::{tick as run_tick, TickOutcome};
pub use window::{WindowPolicy, WindowState};
pub use worker::run_worker;
