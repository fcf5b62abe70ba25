//! One Chain Scanner tick (`spec.md` §4.2): fetch head, widen the scanned
//! range by the current adaptive window, run one global-topic `eth_getLogs`,
//! decode, look the address up in the timelock registry map, and persist.

use std::collections::HashMap;

use alloy_primitives::B256;
use alloy_provider::Provider;
use alloy_rpc_types::{Filter, Log};
use timelockwatch_common::metrics::{BLOCKS_SCANNED, EVENTS_DECODED, EVENTS_SKIPPED};
use timelockwatch_common::{Address, ChainId};
use timelockwatch_decoder::{decode_log, signatures, RawLog};
use timelockwatch_primitives::{RawEvent, ScanProgress, ScanStatus, TimelockContract};
use timelockwatch_rpc::ChainClient;
use timelockwatch_storage::{RawEventStore, ScanProgressStore};

use crate::error::ScanError;
use crate::window::{WindowPolicy, WindowState};

/// A map of `(chain_id, lower(address))` to the registered contract, kept
/// current by refreshing at least once per tick (`spec.md` §4.2 step 5).
pub type TimelockMap = HashMap<Address, TimelockContract>;

pub fn all_topic0() -> Vec<B256> {
    signatures::ALL.iter().map(|s| s.topic0()).collect()
}

#[derive(Debug, Clone, Copy)]
pub struct TickOutcome {
    pub events_persisted: u64,
    pub events_skipped_unknown: u64,
    pub events_skipped_unregistered: u64,
    pub events_malformed: u64,
    pub blocks_advanced: u64,
}

/// Runs one tick for a single chain. `registry_map` must already reflect the
/// current set of active contracts for this chain.
pub async fn tick(
    chain_id: ChainId,
    client: &ChainClient,
    store: &dyn RawEventStore,
    progress_store: &dyn ScanProgressStore,
    registry_map: &TimelockMap,
    policy: &WindowPolicy,
    window: &mut WindowState,
    initial_lookback: u64,
    confirmations: u64,
) -> Result<TickOutcome, ScanError> {
    let mut outcome = TickOutcome {
        events_persisted: 0,
        events_skipped_unknown: 0,
        events_skipped_unregistered: 0,
        events_malformed: 0,
        blocks_advanced: 0,
    };

    let head = client
        .latest_block_number()
        .await
        .map_err(|e| ScanError::Rpc(chain_id, e.to_string()))?
        .saturating_sub(confirmations);

    let mut progress = progress_store
        .load(chain_id)
        .await
        .map_err(|e| ScanError::Store(chain_id, e.to_string()))?
        .unwrap_or_else(|| ScanProgress::fresh(chain_id, window.current));

    let from = progress.last_scanned_block.unwrap_or_else(|| head.saturating_sub(initial_lookback));
    let to = head.min(from + window.current);
    if to <= from {
        return Ok(outcome);
    }

    let filter = Filter::new().event_signature(all_topic0()).from_block(from).to_block(to);

    let logs = match client.provider().get_logs(&filter).await {
        Ok(logs) => logs,
        Err(e) => {
            window.on_error(policy);
            progress.scan_status = ScanStatus::Error;
            progress.last_error = Some(e.to_string());
            progress.current_window = window.current;
            progress.latest_network_block = Some(head);
            let _ = progress_store.save(&progress).await;
            return Err(ScanError::Rpc(chain_id, e.to_string()));
        }
    };
    window.on_success(policy);

    let mut sorted_logs = logs;
    sorted_logs.sort_by_key(|l| {
        (l.block_number.unwrap_or(0), l.log_index.unwrap_or(0))
    });

    for log in &sorted_logs {
        match to_raw_log(log) {
            Some(raw) => match decode_log(&raw) {
                Ok(Some(decoded)) => {
                    let Some(contract) = registry_map.get(&raw.address) else {
                        outcome.events_skipped_unregistered += 1;
                        EVENTS_SKIPPED.with_label_values(&["unregistered"]).inc();
                        continue;
                    };
                    // Populated only when the provider enriches eth_getLogs
                    // responses with a timestamp (an Alchemy-style
                    // extension); the core RPC wire is otherwise limited to
                    // eth_chainId/eth_blockNumber/eth_getLogs, so a missing
                    // value defaults to 0 rather than triggering another call.
                    let block_timestamp = log.block_timestamp.unwrap_or(0) as i64;
                    let event = build_raw_event(chain_id, &raw, contract, &decoded, block_timestamp);
                    match store.insert_if_absent(&event).await {
                        Ok(true) => {
                            outcome.events_persisted += 1;
                            EVENTS_DECODED
                                .with_label_values(&[&chain_id.to_string(), event.event_type.as_str()])
                                .inc();
                        }
                        Ok(false) => {}
                        Err(e) => {
                            tracing::warn!(chain_id = %chain_id, error = %e, "failed to persist raw event");
                        }
                    }
                }
                Ok(None) => {
                    outcome.events_skipped_unknown += 1;
                    EVENTS_SKIPPED.with_label_values(&["unknown"]).inc();
                }
                Err(malformed) => {
                    outcome.events_malformed += 1;
                    EVENTS_SKIPPED.with_label_values(&["malformed"]).inc();
                    tracing::warn!(chain_id = %chain_id, %malformed, "DECODE_MALFORMED");
                }
            },
            None => {
                outcome.events_skipped_unknown += 1;
                EVENTS_SKIPPED.with_label_values(&["unknown"]).inc();
            }
        }
    }

    progress.last_scanned_block = Some(to + 1);
    progress.latest_network_block = Some(head);
    progress.scan_status = ScanStatus::Running;
    progress.last_error = None;
    progress.current_window = window.current;
    progress_store.save(&progress).await.map_err(|e| ScanError::Store(chain_id, e.to_string()))?;

    outcome.blocks_advanced = to - from + 1;
    BLOCKS_SCANNED.with_label_values(&[&chain_id.to_string()]).inc_by(outcome.blocks_advanced);
    Ok(outcome)
}

fn to_raw_log(log: &Log) -> Option<RawLog> {
    Some(RawLog {
        address: Address::new(log.address()),
        topics: log.topics().to_vec(),
        data: log.data().data.clone(),
        block_number: log.block_number?,
        tx_hash: log.transaction_hash?,
        log_index: log.log_index?,
    })
}

fn build_raw_event(
    chain_id: ChainId,
    raw: &RawLog,
    contract: &TimelockContract,
    decoded: &timelockwatch_decoder::DecodedEvent,
    block_timestamp: i64,
) -> RawEvent {
    use timelockwatch_decoder::DecodedEvent::*;
    use timelockwatch_primitives::EventType;

    let (event_type, from_address, to_address, value, calldata) = match decoded {
        CompoundQueue(e) | CompoundExecute(e) | CompoundCancel(e) => {
            let event_type = match decoded {
                CompoundQueue(_) => EventType::Queue,
                CompoundExecute(_) => EventType::Execute,
                _ => EventType::Cancel,
            };
            (event_type, Some(contract.contract_address), Some(e.target), e.value, e.data.clone())
        }
        OzScheduled(e) => (EventType::Queue, Some(contract.contract_address), Some(e.target), e.value, e.data.clone()),
        OzExecuted(e) => (EventType::Execute, Some(contract.contract_address), Some(e.target), e.value, e.data.clone()),
        OzCancelled(_) => (EventType::Cancel, Some(contract.contract_address), None, Default::default(), Default::default()),
    };

    RawEvent {
        chain_id,
        contract_address: contract.contract_address,
        standard: decoded.standard(),
        tx_hash: raw.tx_hash,
        event_type,
        block_number: raw.block_number,
        log_index: raw.log_index,
        block_timestamp,
        flow_id: decoded.flow_id(),
        from_address,
        to_address,
        value,
        decoded_payload: serde_json::to_value(DecodedEventJson::from(decoded))
            .unwrap_or(serde_json::Value::Null),
        calldata,
        folded: false,
    }
}

/// A serde-friendly mirror of [`timelockwatch_decoder::DecodedEvent`], kept
/// distinct from the wire type so the decoder crate never needs `Serialize`.
#[derive(serde::Serialize)]
#[serde(untagged)]
enum DecodedEventJson {
    Compound { tx_hash: String, target: String, value: String, signature: String, eta: u64 },
    OzScheduled { id: String, index: String, target: String, value: String, predecessor: String, delay: u64 },
    OzExecuted { id: String, index: String, target: String, value: String },
    OzCancelled { id: String },
}

impl From<&timelockwatch_decoder::DecodedEvent> for DecodedEventJson {
    fn from(event: &timelockwatch_decoder::DecodedEvent) -> Self {
        use timelockwatch_decoder::DecodedEvent::*;
        match event {
            CompoundQueue(e) | CompoundExecute(e) | CompoundCancel(e) => Self::Compound {
                tx_hash: e.tx_hash.to_string(),
                target: e.target.to_lowercase_hex(),
                value: e.value.to_string(),
                signature: e.signature.clone(),
                eta: e.eta,
            },
            OzScheduled(e) => Self::OzScheduled {
                id: e.id.to_string(),
                index: e.index.to_string(),
                target: e.target.to_lowercase_hex(),
                value: e.value.to_string(),
                predecessor: e.predecessor.to_string(),
                delay: e.delay,
            },
            OzExecuted(e) => Self::OzExecuted {
                id: e.id.to_string(),
                index: e.index.to_string(),
                target: e.target.to_lowercase_hex(),
                value: e.value.to_string(),
            },
            OzCancelled(e) => Self::OzCancelled { id: e.id.to_string() },
        }
    }
}
