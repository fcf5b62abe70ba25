//! Process-wide Prometheus counters (`SPEC_FULL.md` §4.9), registered into
//! the default global registry so `bin/timelockwatch`'s `/metrics` handler
//! can `prometheus::gather()` them without holding a reference to every
//! crate that increments one.

use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

lazy_static! {
    pub static ref BLOCKS_SCANNED: IntCounterVec =
        register_int_counter_vec!("blocks_scanned_total", "Blocks advanced per chain", &["chain_id"]).unwrap();
    pub static ref EVENTS_DECODED: IntCounterVec = register_int_counter_vec!(
        "events_decoded_total",
        "Decoded events per chain and event type",
        &["chain_id", "event_type"]
    )
    .unwrap();
    pub static ref EVENTS_SKIPPED: IntCounterVec = register_int_counter_vec!(
        "events_skipped_total",
        "Skipped events per error taxonomy class",
        &["class"]
    )
    .unwrap();
    pub static ref FLOW_TRANSITIONS: IntCounterVec = register_int_counter_vec!(
        "flow_transitions_total",
        "Flow transitions per standard and target status",
        &["standard", "status_to"]
    )
    .unwrap();
    pub static ref EMAILS_SENT: IntCounter =
        register_int_counter!("emails_sent_total", "Notification emails sent successfully").unwrap();
    pub static ref EMAILS_FAILED: IntCounter =
        register_int_counter!("emails_failed_total", "Notification emails that failed to send").unwrap();
    pub static ref EMERGENCY_RESENDS: IntCounter =
        register_int_counter!("emergency_resends_total", "Emergency notifications resent").unwrap();
}
