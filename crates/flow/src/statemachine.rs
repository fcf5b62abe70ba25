//! The Flow Engine's pure state machine (`spec.md` §4.3). Every function
//! here is total over plain data; no I/O, so these are the functions
//! property-tested over synthetic sequences.

use timelockwatch_common::{FlowStatus, Standard};
use timelockwatch_primitives::EventType;

/// The event-driven transition for `event_type`, or `None` if `current` is
/// already terminal (terminals are absorbing, `spec.md` §4.3).
pub fn next_for_event(current: FlowStatus, event_type: EventType) -> Option<FlowStatus> {
    if current.is_terminal() {
        return None;
    }
    match event_type {
        EventType::Queue => None, // handled as flow creation, not a transition
        EventType::Execute => Some(FlowStatus::Executed),
        EventType::Cancel => Some(FlowStatus::Cancelled),
    }
}

/// The time-driven `waiting -> ready` transition.
pub fn ready_if_due(current: FlowStatus, now_ge_eta: bool) -> Option<FlowStatus> {
    (current == FlowStatus::Waiting && now_ge_eta).then_some(FlowStatus::Ready)
}

/// The time-driven `{waiting,ready} -> expired` transition (Compound only;
/// OZ has no expiry, `spec.md` §4.3). A Compound flow that is never executed
/// expires straight from `waiting` once its grace period elapses, not only
/// from `ready`.
pub fn expired_if_due(current: FlowStatus, standard: Standard, now_ge_expiry: bool) -> Option<FlowStatus> {
    let expirable = current == FlowStatus::Ready || current == FlowStatus::Waiting;
    (expirable && standard == Standard::Compound && now_ge_expiry).then_some(FlowStatus::Expired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_status() -> impl Strategy<Value = FlowStatus> {
        prop_oneof![
            Just(FlowStatus::Waiting),
            Just(FlowStatus::Ready),
            Just(FlowStatus::Executed),
            Just(FlowStatus::Cancelled),
            Just(FlowStatus::Expired),
        ]
    }

    fn any_event() -> impl Strategy<Value = EventType> {
        prop_oneof![Just(EventType::Queue), Just(EventType::Execute), Just(EventType::Cancel)]
    }

    proptest! {
        #[test]
        fn terminal_absorbs_every_event(status in any_status(), event in any_event()) {
            if status.is_terminal() {
                prop_assert_eq!(next_for_event(status, event), None);
            }
        }

        #[test]
        fn terminal_absorbs_time_ticks(status in any_status()) {
            if status.is_terminal() {
                prop_assert_eq!(ready_if_due(status, true), None);
                prop_assert_eq!(expired_if_due(status, Standard::Compound, true), None);
            }
        }
    }

    #[test]
    fn execute_and_cancel_move_waiting_or_ready_to_terminal() {
        assert_eq!(next_for_event(FlowStatus::Waiting, EventType::Execute), Some(FlowStatus::Executed));
        assert_eq!(next_for_event(FlowStatus::Ready, EventType::Execute), Some(FlowStatus::Executed));
        assert_eq!(next_for_event(FlowStatus::Waiting, EventType::Cancel), Some(FlowStatus::Cancelled));
        assert_eq!(next_for_event(FlowStatus::Ready, EventType::Cancel), Some(FlowStatus::Cancelled));
    }

    #[test]
    fn queue_event_never_transitions_an_existing_flow() {
        assert_eq!(next_for_event(FlowStatus::Waiting, EventType::Queue), None);
        assert_eq!(next_for_event(FlowStatus::Ready, EventType::Queue), None);
    }

    #[test]
    fn oz_never_expires() {
        assert_eq!(expired_if_due(FlowStatus::Ready, Standard::OpenZeppelin, true), None);
    }

    #[test]
    fn compound_expires_from_waiting_when_never_executed() {
        assert_eq!(expired_if_due(FlowStatus::Waiting, Standard::Compound, true), Some(FlowStatus::Expired));
        assert_eq!(expired_if_due(FlowStatus::Ready, Standard::Compound, true), Some(FlowStatus::Expired));
    }
}
