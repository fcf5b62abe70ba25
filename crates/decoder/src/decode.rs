//! The decoder entrypoint: matches `topic[0]` against the six known
//! signatures and decodes indexed + data fields, per `spec.md` §4.1.

use crate::abi::{dynamic_bytes_at, dynamic_string_at, u256_at, u64_at};
use crate::event::{CallExecuted, CallScheduled, CompoundEvent, DecodedEvent, OzCancelled};
use crate::signatures::{self, Signature};
use alloy_primitives::{Address as AlloyAddress, Bytes, B256};
use thiserror::Error;
use timelockwatch_common::{Address, Classify, ErrorClass};

/// A minimal, transport-agnostic view of a log. Built from whatever RPC
/// client type the caller uses so this crate never depends on a particular
/// provider.
#[derive(Debug, Clone)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub tx_hash: B256,
    pub log_index: u64,
}

/// A log that matched a known signature but carries fewer topics than that
/// signature requires — cannot be a well-formed emission of a timelock
/// contract, per `spec.md` §4.1.
#[derive(Debug, Error)]
#[error("malformed {signature} log at block {block_number} tx {tx_hash}: expected >= {expected} topics, got {got}")]
pub struct DecodeMalformed {
    pub signature: &'static str,
    pub block_number: u64,
    pub tx_hash: B256,
    pub expected: usize,
    pub got: usize,
}

impl Classify for DecodeMalformed {
    fn class(&self) -> ErrorClass {
        ErrorClass::DecodeMalformed
    }
}

/// Decodes one log, or reports why it was skipped.
///
/// - `Ok(Some(event))`: decoded, possibly with some non-indexed fields
///   defaulted to zero/empty after a partial decode failure — the event is
///   never dropped once the signature and indexed topics are well-formed.
/// - `Ok(None)`: `topic[0]` matched none of the six signatures.
/// - `Err(DecodeMalformed)`: the signature matched but required topics are
///   missing.
pub fn decode_log(log: &RawLog) -> Result<Option<DecodedEvent>, DecodeMalformed> {
    let Some(topic0) = log.topics.first() else {
        return Ok(None);
    };

    let matched = signatures::ALL.iter().find(|sig| sig.topic0() == *topic0);
    let Some(sig) = matched else {
        return Ok(None);
    };

    if log.topics.len() < sig.min_topics() {
        return Err(DecodeMalformed {
            signature: sig.canonical,
            block_number: log.block_number,
            tx_hash: log.tx_hash,
            expected: sig.min_topics(),
            got: log.topics.len(),
        });
    }

    Ok(Some(decode_matched(*sig, log)))
}

fn topic_address(topic: &B256) -> Address {
    // Addresses are left-padded to 32 bytes when they appear as indexed
    // event topics; the low 20 bytes are the address.
    Address::new(AlloyAddress::from_slice(&topic.as_slice()[12..]))
}

fn decode_matched(sig: Signature, log: &RawLog) -> DecodedEvent {
    let data = log.data.as_ref();
    match sig.canonical {
        s if s == signatures::QUEUE_TRANSACTION.canonical => {
            DecodedEvent::CompoundQueue(decode_compound_body(log, data))
        }
        s if s == signatures::EXECUTE_TRANSACTION.canonical => {
            DecodedEvent::CompoundExecute(decode_compound_body(log, data))
        }
        s if s == signatures::CANCEL_TRANSACTION.canonical => {
            DecodedEvent::CompoundCancel(decode_compound_body(log, data))
        }
        s if s == signatures::CALL_SCHEDULED.canonical => {
            DecodedEvent::OzScheduled(CallScheduled {
                id: log.topics[1],
                index: u256_at(data, 0),
                target: topic_address_from_data(data, 0),
                value: u256_at(data, 1),
                data: dynamic_bytes_at(data, 2),
                predecessor: word_at(data, 3),
                delay: u64_at(data, 4),
            })
        }
        s if s == signatures::CALL_EXECUTED.canonical => DecodedEvent::OzExecuted(CallExecuted {
            id: log.topics[1],
            index: u256_at(data, 0),
            target: topic_address_from_data(data, 0),
            value: u256_at(data, 1),
            data: dynamic_bytes_at(data, 2),
        }),
        _ => DecodedEvent::OzCancelled(OzCancelled { id: log.topics[1] }),
    }
}

fn decode_compound_body(log: &RawLog, data: &[u8]) -> CompoundEvent {
    CompoundEvent {
        tx_hash: log.topics[1],
        target: topic_address(&log.topics[2]),
        value: u256_at(data, 0),
        signature: dynamic_string_at(data, 1),
        data: dynamic_bytes_at(data, 2),
        eta: u64_at(data, 3),
    }
}

fn word_at(data: &[u8], idx: usize) -> B256 {
    B256::from(u256_at(data, idx).to_be_bytes::<32>())
}

/// `target` in `CallScheduled`/`CallExecuted` is a non-indexed `address`,
/// which the ABI still right-aligns within its 32-byte word.
fn topic_address_from_data(data: &[u8], idx: usize) -> Address {
    let word = u256_at(data, idx).to_be_bytes::<32>();
    Address::new(AlloyAddress::from_slice(&word[12..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{keccak256, U256};

    fn pad_word(v: u64) -> [u8; 32] {
        U256::from(v).to_be_bytes::<32>()
    }

    fn address_word(addr: AlloyAddress) -> B256 {
        let mut buf = [0u8; 32];
        buf[12..].copy_from_slice(addr.as_slice());
        B256::from(buf)
    }

    #[test]
    fn unknown_topic_returns_none() {
        let log = RawLog {
            address: "0x0000000000000000000000000000000000000001".parse().unwrap(),
            topics: vec![keccak256(b"SomeOtherEvent(uint256)")],
            data: Bytes::new(),
            block_number: 1,
            tx_hash: B256::ZERO,
            log_index: 0,
        };
        assert!(decode_log(&log).unwrap().is_none());
    }

    #[test]
    fn insufficient_topics_is_malformed() {
        let log = RawLog {
            address: "0x0000000000000000000000000000000000000001".parse().unwrap(),
            topics: vec![signatures::QUEUE_TRANSACTION.topic0()], // missing 2 indexed topics
            data: Bytes::new(),
            block_number: 7,
            tx_hash: B256::repeat_byte(0xAB),
            log_index: 0,
        };
        let err = decode_log(&log).unwrap_err();
        assert_eq!(err.class(), ErrorClass::DecodeMalformed);
        assert_eq!(err.expected, 3);
        assert_eq!(err.got, 1);
    }

    #[test]
    fn decodes_queue_transaction() {
        let target = "0x000000000000000000000000000000000000aa"
            .parse::<AlloyAddress>()
            .unwrap();
        let tx_hash = B256::repeat_byte(0x11);

        let mut data = Vec::new();
        data.extend_from_slice(&pad_word(0)); // value
        data.extend_from_slice(&pad_word(128)); // offset to signature
        data.extend_from_slice(&pad_word(192)); // offset to data (filled below)
        data.extend_from_slice(&pad_word(1_700_000_000)); // eta
        // signature string at offset 128: "setX(uint256)" (13 bytes)
        data.extend_from_slice(&pad_word(13));
        let mut sig_bytes = b"setX(uint256)".to_vec();
        sig_bytes.resize(32, 0);
        data.extend_from_slice(&sig_bytes);
        // data bytes at offset 192: 0xAB (1 byte)
        data.extend_from_slice(&pad_word(1));
        let mut payload = vec![0xABu8];
        payload.resize(32, 0);
        data.extend_from_slice(&payload);

        let log = RawLog {
            address: "0x0000000000000000000000000000000000000001".parse().unwrap(),
            topics: vec![
                signatures::QUEUE_TRANSACTION.topic0(),
                tx_hash,
                address_word(target),
            ],
            data: Bytes::from(data),
            block_number: 100,
            tx_hash,
            log_index: 3,
        };

        let decoded = decode_log(&log).unwrap().unwrap();
        match decoded {
            DecodedEvent::CompoundQueue(ev) => {
                assert_eq!(ev.tx_hash, tx_hash);
                assert_eq!(ev.target.as_alloy(), target);
                assert_eq!(ev.signature, "setX(uint256)");
                assert_eq!(&ev.data[..], &[0xAB]);
                assert_eq!(ev.eta, 1_700_000_000);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn partial_body_failure_defaults_instead_of_dropping() {
        // Only the static head is present; the dynamic sections are missing.
        // The event must still be produced, with the dynamic fields empty.
        let tx_hash = B256::repeat_byte(0x22);
        let data = vec![0u8; 32 * 4]; // zeroed offsets/lengths
        let log = RawLog {
            address: "0x0000000000000000000000000000000000000001".parse().unwrap(),
            topics: vec![
                signatures::CANCEL_TRANSACTION.topic0(),
                tx_hash,
                address_word(AlloyAddress::ZERO),
            ],
            data: Bytes::from(data),
            block_number: 5,
            tx_hash,
            log_index: 0,
        };
        let decoded = decode_log(&log).unwrap().unwrap();
        match decoded {
            DecodedEvent::CompoundCancel(ev) => {
                assert_eq!(ev.signature, "");
                assert_eq!(ev.data.len(), 0);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn decodes_cancelled_with_only_id_topic() {
        let id = B256::repeat_byte(0x33);
        let log = RawLog {
            address: "0x0000000000000000000000000000000000000001".parse().unwrap(),
            topics: vec![signatures::CANCELLED.topic0(), id],
            data: Bytes::new(),
            block_number: 9,
            tx_hash: B256::repeat_byte(0x44),
            log_index: 1,
        };
        let decoded = decode_log(&log).unwrap().unwrap();
        assert_eq!(decoded.flow_id(), id);
        assert_eq!(decoded.event_type(), "cancel");
    }
}
