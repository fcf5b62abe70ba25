//! The Flow Engine (`spec.md` §4.3): folds decoded events into proposal
//! lifecycle state and applies time-driven transitions.

pub mod engine;
pub mod error;
pub mod payload;
pub mod statemachine;

pub use engine::{fold_events, time_tick, FlowTransition};
pub use error::FlowError;
