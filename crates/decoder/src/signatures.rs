//! The six recognized timelock event signatures and their precomputed
//! `topic[0]` hashes (`spec.md` §4.1).

use alloy_primitives::{keccak256, B256};

/// Number of indexed topics a signature requires, *excluding* `topic[0]`
/// (the signature hash itself always occupies `topics[0]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub canonical: &'static str,
    pub indexed_topics: usize,
}

impl Signature {
    /// Total topics (including `topic[0]`) a well-formed log must carry.
    pub const fn min_topics(&self) -> usize {
        self.indexed_topics + 1
    }

    pub fn topic0(&self) -> B256 {
        keccak256(self.canonical.as_bytes())
    }
}

pub const QUEUE_TRANSACTION: Signature = Signature {
    canonical: "QueueTransaction(bytes32,address,uint256,string,bytes,uint256)",
    indexed_topics: 2,
};

pub const EXECUTE_TRANSACTION: Signature = Signature {
    canonical: "ExecuteTransaction(bytes32,address,uint256,string,bytes,uint256)",
    indexed_topics: 2,
};

pub const CANCEL_TRANSACTION: Signature = Signature {
    canonical: "CancelTransaction(bytes32,address,uint256,string,bytes,uint256)",
    indexed_topics: 2,
};

pub const CALL_SCHEDULED: Signature = Signature {
    canonical: "CallScheduled(bytes32,uint256,address,uint256,bytes,bytes32,uint256)",
    indexed_topics: 2,
};

pub const CALL_EXECUTED: Signature = Signature {
    canonical: "CallExecuted(bytes32,uint256,address,uint256,bytes)",
    indexed_topics: 2,
};

pub const CANCELLED: Signature = Signature {
    canonical: "Cancelled(bytes32)",
    indexed_topics: 1,
};

/// All six signatures, used to build both the scanner's topic filter and the
/// decoder's dispatch table.
pub const ALL: [Signature; 6] = [
    QUEUE_TRANSACTION,
    EXECUTE_TRANSACTION,
    CANCEL_TRANSACTION,
    CALL_SCHEDULED,
    CALL_EXECUTED,
    CANCELLED,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic0_hashes_are_stable_and_distinct() {
        let hashes: Vec<B256> = ALL.iter().map(Signature::topic0).collect();
        for i in 0..hashes.len() {
            for j in (i + 1)..hashes.len() {
                assert_ne!(hashes[i], hashes[j], "collision between {i} and {j}");
            }
        }
    }
}
