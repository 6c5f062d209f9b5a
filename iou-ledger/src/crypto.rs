//! Hashing for the in-process ledger
//!
//! This module provides:
//! - SHA-256 hashing for transactions and blocks
//! - Merkle root over the transactions of a block
//!
//! Hashes only need to be unique and deterministic within one ledger
//! instance; they are not compatible with any public chain.

use crate::types::{BlockHash, Identity, TxHash};
use alloy_primitives::B256;
use sha2::{Digest, Sha256};

/// Hash arbitrary bytes using SHA-256
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash a transaction from its sender, destination, input and sender nonce
pub fn hash_transaction(
    from: &Identity,
    to: Option<&Identity>,
    input: &[u8],
    nonce: u64,
) -> TxHash {
    let mut hasher = Sha256::new();
    hasher.update(from.address().as_slice());
    match to {
        Some(to) => {
            hasher.update([1u8]);
            hasher.update(to.address().as_slice());
        }
        None => hasher.update([0u8]),
    }
    hasher.update(nonce.to_be_bytes());
    hasher.update(input);
    B256::from(<[u8; 32]>::from(hasher.finalize()))
}

/// Hash a block header
pub fn hash_block(
    parent_hash: &BlockHash,
    number: u64,
    timestamp: u64,
    transaction_hashes: &[TxHash],
) -> BlockHash {
    let leaves: Vec<[u8; 32]> = transaction_hashes.iter().map(|h| h.0).collect();

    let mut hasher = Sha256::new();
    hasher.update(parent_hash.as_slice());
    hasher.update(number.to_be_bytes());
    hasher.update(timestamp.to_be_bytes());
    hasher.update(merkle_root(&leaves));
    B256::from(<[u8; 32]>::from(hasher.finalize()))
}

/// Create a Merkle root from transaction hashes
///
/// If a level has odd length, the last hash is duplicated.
pub fn merkle_root(hashes: &[[u8; 32]]) -> [u8; 32] {
    if hashes.is_empty() {
        return [0u8; 32];
    }

    let mut current_level: Vec<[u8; 32]> = hashes.to_vec();

    while current_level.len() > 1 {
        current_level = current_level
            .chunks(2)
            .map(|pair| {
                let left = pair[0];
                let right = pair.get(1).copied().unwrap_or(left);

                let mut concat = [0u8; 64];
                concat[..32].copy_from_slice(&left);
                concat[32..].copy_from_slice(&right);
                hash_bytes(&concat)
            })
            .collect();
    }

    current_level[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ORIGIN;

    #[test]
    fn test_hash_bytes_deterministic() {
        assert_eq!(hash_bytes(b"iou"), hash_bytes(b"iou"));
        assert_ne!(hash_bytes(b"iou"), hash_bytes(b"uoi"));
    }

    #[test]
    fn test_transaction_hash_depends_on_nonce() {
        let from = Identity::with_last_byte(1);
        let to = Identity::with_last_byte(2);

        let first = hash_transaction(&from, Some(&to), b"call", 0);
        let second = hash_transaction(&from, Some(&to), b"call", 1);
        assert_ne!(first, second);

        let creation = hash_transaction(&from, None, b"call", 0);
        assert_ne!(first, creation);
    }

    #[test]
    fn test_block_hash_never_origin() {
        let hash = hash_block(&ORIGIN, 0, 0, &[]);
        assert_ne!(hash, ORIGIN);
    }

    #[test]
    fn test_merkle_root() {
        let a = hash_bytes(b"a");
        let b = hash_bytes(b"b");
        let c = hash_bytes(b"c");

        assert_eq!(merkle_root(&[]), [0u8; 32]);
        assert_eq!(merkle_root(&[a]), a);
        assert_ne!(merkle_root(&[a, b]), merkle_root(&[b, a]));
        // Odd level duplicates the last leaf
        assert_eq!(merkle_root(&[a, b, c]), merkle_root(&[a, b, c, c]));
    }
}
