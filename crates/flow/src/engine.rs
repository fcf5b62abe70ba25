//! The Flow Engine's two entry points (`spec.md` §4.3): `fold_events`,
//! invoked after each Scanner batch, and `time_tick`, invoked every
//! `T_flow`, both periodic and idempotent to retry.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use timelockwatch_common::metrics::FLOW_TRANSITIONS;
use timelockwatch_common::{Address, ChainId, FlowStatus};
use timelockwatch_primitives::{EventType, Flow, FlowKey, RawEvent};
use timelockwatch_storage::{FlowStore, RawEventStore};

use crate::error::FlowError;
use crate::payload::queue_eta;
use crate::statemachine::{expired_if_due, next_for_event, ready_if_due};

/// A flow-state transition the Dispatcher reacts to (`spec.md` §4.4).
#[derive(Debug, Clone)]
pub struct FlowTransition {
    pub key: FlowKey,
    pub status_from: FlowStatus,
    pub status_to: FlowStatus,
    pub trigger_tx_hash: Option<alloy_primitives::B256>,
}

/// Reads events not yet folded for `chain_id`, applies them in
/// `(block_number, log_index)` order per flow, and returns the resulting
/// transitions for the Dispatcher.
///
/// `grace_periods` is the Compound contracts' currently configured grace
/// period, keyed by contract address, used to compute `expired_at` at queue
/// time (`spec.md` §4.3, Open Question 2: later grace period changes do not
/// retroactively update already-queued flows).
pub async fn fold_events(
    chain_id: ChainId,
    raw_store: &dyn RawEventStore,
    flow_store: &dyn FlowStore,
    grace_periods: &HashMap<Address, u64>,
    limit: i64,
) -> Result<Vec<FlowTransition>, FlowError> {
    let events = raw_store
        .unfolded(chain_id, limit)
        .await
        .map_err(|e| FlowError::Store { flow_id: Default::default(), chain_id, message: e.to_string() })?;

    let mut by_flow: HashMap<FlowKey, Vec<RawEvent>> = HashMap::new();
    for event in events {
        let key = FlowKey {
            flow_id: event.flow_id,
            standard: event.standard,
            chain_id: event.chain_id,
            contract_address: event.contract_address,
        };
        by_flow.entry(key).or_default().push(event);
    }

    let mut transitions = Vec::new();
    for (key, mut group) in by_flow {
        group.sort_by_key(|e| (e.block_number, e.log_index));
        for event in &group {
            let grace_period_secs = grace_periods.get(&key.contract_address).copied().unwrap_or(0);
            if let Some(transition) = apply_one(&key, event, flow_store, grace_period_secs).await? {
                transitions.push(transition);
            }
            raw_store
                .mark_folded(key.chain_id, event.tx_hash, event.log_index)
                .await
                .map_err(|e| FlowError::Store { flow_id: key.flow_id, chain_id: key.chain_id, message: e.to_string() })?;
        }
    }
    Ok(transitions)
}

async fn apply_one(
    key: &FlowKey,
    event: &RawEvent,
    flow_store: &dyn FlowStore,
    grace_period_secs: u64,
) -> Result<Option<FlowTransition>, FlowError> {
    let store_err = |e: timelockwatch_storage::StoreError| FlowError::Store {
        flow_id: key.flow_id,
        chain_id: key.chain_id,
        message: e.to_string(),
    };

    if event.event_type == EventType::Queue {
        let queued_at = DateTime::from_timestamp(event.block_timestamp, 0).unwrap_or_else(Utc::now);
        let eta = queue_eta(key.standard, queued_at, &event.decoded_payload).unwrap_or(queued_at);
        let expired_at = (key.standard == timelockwatch_common::Standard::Compound)
            .then(|| eta + chrono::Duration::seconds(grace_period_secs as i64));
        let flow = Flow::new_waiting(
            *key,
            event.tx_hash,
            event.from_address.unwrap_or(event.contract_address),
            event.to_address.unwrap_or(event.contract_address),
            event.value,
            event.calldata.clone(),
            queued_at,
            eta,
            expired_at,
        );
        flow_store.upsert_waiting(&flow).await.map_err(store_err)?;
        return Ok(None); // creation is not a Dispatcher-visible transition in itself; waiting IS the initial state
    }

    let Some(current) = flow_store.get(key).await.map_err(store_err)? else {
        // An execute/cancel with no known flow: the queue event may still
        // be in the same unsorted batch arriving out of order, or was lost.
        // Nothing to transition yet; retried on the next fold.
        return Ok(None);
    };

    let Some(to) = next_for_event(current.status, event.event_type) else {
        if !current.status.is_terminal() {
            return Ok(None);
        }
        tracing::warn!(
            flow_id = %key.flow_id, chain_id = %key.chain_id, event_type = event.event_type.as_str(),
            "FLOW_CONFLICT: event arrived for an already-terminal flow"
        );
        return Ok(None);
    };

    let now = DateTime::from_timestamp(event.block_timestamp, 0).unwrap_or_else(Utc::now);
    let applied = flow_store
        .transition(key, current.status, to, Some(event.tx_hash), now)
        .await
        .map_err(store_err)?;

    if applied {
        FLOW_TRANSITIONS.with_label_values(&[key.standard.as_str(), to.as_str()]).inc();
        Ok(Some(FlowTransition {
            key: *key,
            status_from: current.status,
            status_to: to,
            trigger_tx_hash: Some(event.tx_hash),
        }))
    } else {
        tracing::warn!(
            flow_id = %key.flow_id, chain_id = %key.chain_id, attempted_to = to.as_str(),
            "FLOW_CONFLICT: guarded transition lost the race, state had moved on"
        );
        Ok(None)
    }
}

/// Time-driven transitions (`spec.md` §4.3): `waiting -> ready` and
/// `ready -> expired`. Run every `T_flow`.
pub async fn time_tick(
    flow_store: &dyn FlowStore,
    now: DateTime<Utc>,
    batch_limit: i64,
) -> Result<Vec<FlowTransition>, FlowError> {
    let mut transitions = Vec::new();

    for flow in flow_store.waiting_due(now, batch_limit).await.map_err(|e| FlowError::Store {
        flow_id: Default::default(),
        chain_id: ChainId(0),
        message: e.to_string(),
    })? {
        if ready_if_due(flow.status, true).is_some()
            && flow_store
                .transition(&flow.key, FlowStatus::Waiting, FlowStatus::Ready, None, now)
                .await
                .map_err(|e| FlowError::Store {
                    flow_id: flow.key.flow_id,
                    chain_id: flow.key.chain_id,
                    message: e.to_string(),
                })?
        {
            FLOW_TRANSITIONS.with_label_values(&[flow.key.standard.as_str(), FlowStatus::Ready.as_str()]).inc();
            transitions.push(FlowTransition {
                key: flow.key,
                status_from: FlowStatus::Waiting,
                status_to: FlowStatus::Ready,
                trigger_tx_hash: None,
            });
        }
    }

    for flow in flow_store.compound_expired(now, batch_limit).await.map_err(|e| FlowError::Store {
        flow_id: Default::default(),
        chain_id: ChainId(0),
        message: e.to_string(),
    })? {
        let status_from = flow.status;
        if expired_if_due(status_from, flow.key.standard, true).is_some()
            && flow_store
                .transition(&flow.key, status_from, FlowStatus::Expired, None, now)
                .await
                .map_err(|e| FlowError::Store {
                    flow_id: flow.key.flow_id,
                    chain_id: flow.key.chain_id,
                    message: e.to_string(),
                })?
        {
            FLOW_TRANSITIONS.with_label_values(&[flow.key.standard.as_str(), FlowStatus::Expired.as_str()]).inc();
            transitions.push(FlowTransition {
                key: flow.key,
                status_from,
                status_to: FlowStatus::Expired,
                trigger_tx_hash: None,
            });
        }
    }

    Ok(transitions)
}
