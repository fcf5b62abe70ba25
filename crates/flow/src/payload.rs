//! Extracts the queue-time fields the Flow Engine needs (`eta`, or OZ's
//! relative `delay`) out of a RawEvent's semi-structured decoded payload,
//! without the Flow Engine depending on `timelockwatch-decoder`'s wire
//! types directly.

use chrono::{DateTime, Utc};
use timelockwatch_common::Standard;

/// `eta` for a queue event: Compound's payload carries an absolute
/// timestamp directly; OZ's carries a `delay` relative to the block the
/// event was queued in.
pub fn queue_eta(standard: Standard, queued_at: DateTime<Utc>, payload: &serde_json::Value) -> Option<DateTime<Utc>> {
    match standard {
        Standard::Compound => payload.get("eta")?.as_u64().and_then(|secs| {
            DateTime::from_timestamp(secs as i64, 0)
        }),
        Standard::OpenZeppelin => {
            let delay = payload.get("delay")?.as_u64()?;
            queued_at.checked_add_signed(chrono::Duration::seconds(delay as i64))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compound_eta_is_absolute() {
        let payload = json!({ "eta": 1_700_000_100u64 });
        let queued_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let eta = queue_eta(Standard::Compound, queued_at, &payload).unwrap();
        assert_eq!(eta.timestamp(), 1_700_000_100);
    }

    #[test]
    fn oz_eta_is_queued_at_plus_delay() {
        let payload = json!({ "delay": 100u64 });
        let queued_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let eta = queue_eta(Standard::OpenZeppelin, queued_at, &payload).unwrap();
        assert_eq!(eta.timestamp(), 1_700_000_100);
    }
}
