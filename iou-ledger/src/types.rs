//! Core types for the ledger
//!
//! All types are designed for:
//! - Case-insensitive identity (addresses compare by bytes, never by text)
//! - Backward-linked block history terminated by [`ORIGIN`]
//! - Exact integer amounts (uint32 on the wire)

use crate::{Error, Result};
use alloy_primitives::{hex, Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 32-byte block hash
pub type BlockHash = B256;

/// 32-byte transaction hash
pub type TxHash = B256;

/// Parent hash of the first block; terminates backward history walks
pub const ORIGIN: BlockHash = B256::ZERO;

/// Account identifier (20-byte ledger address)
///
/// Parsing accepts any letter case with or without the `0x` prefix. Two
/// identities are equal iff their bytes are equal, so `0xAB..` and `0xab..`
/// are the same account everywhere they are used as keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(Address);

impl Identity {
    /// Wrap a raw address
    pub const fn new(address: Address) -> Self {
        Self(address)
    }

    /// Underlying address
    pub fn address(&self) -> Address {
        self.0
    }

    /// Identity whose address is all zero except the final byte
    pub fn with_last_byte(byte: u8) -> Self {
        Self(Address::with_last_byte(byte))
    }
}

impl From<Address> for Identity {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl From<Identity> for Address {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

impl FromStr for Identity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Address::from_str(trimmed)
            .map(Self)
            .map_err(|e| Error::InvalidIdentity(format!("{}: {}", trimmed, e)))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Always lowercase, never checksummed
        write!(f, "{}", hex::encode_prefixed(self.0))
    }
}

/// Reference to a block by height or by hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockId {
    /// Block height
    Number(u64),
    /// Block hash
    Hash(BlockHash),
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockId::Number(n) => write!(f, "#{}", n),
            BlockId::Hash(h) => write!(f, "{}", h),
        }
    }
}

/// Transaction as recorded in a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Transaction hash
    pub hash: TxHash,

    /// Sender
    pub from: Identity,

    /// Destination (`None` for contract creation)
    pub to: Option<Identity>,

    /// Call data
    pub input: Bytes,
}

/// Block of the ledger history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Block hash
    pub hash: BlockHash,

    /// Parent block hash ([`ORIGIN`] for the first block)
    pub parent_hash: BlockHash,

    /// Block height
    pub number: u64,

    /// Seconds since Unix epoch
    pub timestamp: u64,

    /// Transactions in execution order
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Whether walking further back from this block is possible
    pub fn has_parent(&self) -> bool {
        self.parent_hash != ORIGIN
    }
}

/// Proof that a write was included in a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Hash of the included transaction
    pub transaction_hash: TxHash,

    /// Block that includes it
    pub block_hash: BlockHash,

    /// Height of that block
    pub block_number: u64,
}

/// Arguments of one `add_IOU` write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IouRequest {
    /// Sender of the write; the party taking on the debt
    pub debtor: Identity,

    /// Party being owed
    pub creditor: Identity,

    /// Amount owed
    pub amount: u32,

    /// Existing debt chain `[creditor, .., debtor]` to net against (may be empty)
    pub settlement_path: Vec<Identity>,

    /// Amount cancelled around the cycle (0 when the path is empty)
    pub net_amount: u32,
}

impl IouRequest {
    /// Plain IOU with nothing to net
    pub fn plain(debtor: Identity, creditor: Identity, amount: u32) -> Self {
        Self {
            debtor,
            creditor,
            amount,
            settlement_path: Vec::new(),
            net_amount: 0,
        }
    }
}
