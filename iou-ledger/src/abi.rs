//! Contract call codec
//!
//! The IOU contract is addressed through two functions:
//!
//! ```text
//! add_IOU(address creditor, uint32 amount, address[] cre_to_debt_path, uint32 min_on_cycle)
//! lookup(address debtor, address creditor) returns (uint32)
//! ```
//!
//! Calls are ABI-encoded (4-byte selector followed by head/tail encoded
//! arguments). Decoding never fails loudly: input that is not a call to a
//! known function yields `None`, since the ledger carries unrelated traffic.

use crate::types::{Identity, IouRequest};
use crate::{Error, Result};
use alloy_primitives::Bytes;
use alloy_sol_types::{sol, SolCall, SolInterface};
use serde::{Deserialize, Serialize};

sol! {
    /// IOU ledger contract
    interface IouLedger {
        function add_IOU(address creditor, uint32 amount, address[] cre_to_debt_path, uint32 min_on_cycle) external;
        function lookup(address debtor, address creditor) external view returns (uint32 ret);
    }
}

/// Name of the debt-recording method
pub const ADD_IOU: &str = "add_IOU";

/// Name of the balance lookup method
pub const LOOKUP: &str = "lookup";

/// Decoded parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallValue {
    /// `address`
    Address(Identity),
    /// Any `uintN` that fits in 64 bits
    Uint(u64),
    /// `address[]`
    AddressList(Vec<Identity>),
}

impl CallValue {
    /// Address value, if this is one
    pub fn as_identity(&self) -> Option<Identity> {
        match self {
            CallValue::Address(identity) => Some(*identity),
            _ => None,
        }
    }

    /// Integer value, if this is one
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            CallValue::Uint(value) => Some(*value),
            _ => None,
        }
    }

    /// Address list, if this is one
    pub fn as_identities(&self) -> Option<&[Identity]> {
        match self {
            CallValue::AddressList(list) => Some(list),
            _ => None,
        }
    }
}

/// Call decoded against the contract interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCall {
    /// Method name
    pub method: &'static str,

    /// Parameters in declaration order
    pub params: Vec<CallValue>,
}

/// Decode transaction input; `None` when it is not a known contract call
pub fn decode_call(input: &[u8]) -> Option<DecodedCall> {
    let call = IouLedger::IouLedgerCalls::abi_decode(input).ok()?;

    let decoded = match call {
        IouLedger::IouLedgerCalls::add_IOU(call) => DecodedCall {
            method: ADD_IOU,
            params: vec![
                CallValue::Address(call.creditor.into()),
                CallValue::Uint(u64::from(call.amount)),
                CallValue::AddressList(
                    call.cre_to_debt_path.into_iter().map(Identity::from).collect(),
                ),
                CallValue::Uint(u64::from(call.min_on_cycle)),
            ],
        },
        IouLedger::IouLedgerCalls::lookup(call) => DecodedCall {
            method: LOOKUP,
            params: vec![
                CallValue::Address(call.debtor.into()),
                CallValue::Address(call.creditor.into()),
            ],
        },
    };

    Some(decoded)
}

/// Encode an `add_IOU` call
pub fn encode_add_iou(request: &IouRequest) -> Bytes {
    IouLedger::add_IOUCall {
        creditor: request.creditor.address(),
        amount: request.amount,
        cre_to_debt_path: request
            .settlement_path
            .iter()
            .map(Identity::address)
            .collect(),
        min_on_cycle: request.net_amount,
    }
    .abi_encode()
    .into()
}

/// Encode a `lookup` call
pub fn encode_lookup(debtor: &Identity, creditor: &Identity) -> Bytes {
    IouLedger::lookupCall {
        debtor: debtor.address(),
        creditor: creditor.address(),
    }
    .abi_encode()
    .into()
}

/// Decode the return data of a `lookup` call
pub fn decode_lookup_return(data: &[u8]) -> Result<u32> {
    IouLedger::lookupCall::abi_decode_returns(data)
        .map_err(|e| Error::Decode(format!("lookup return data: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> Identity {
        Identity::with_last_byte(byte)
    }

    #[test]
    fn test_decode_add_iou_params_in_order() {
        let request = IouRequest {
            debtor: id(1),
            creditor: id(2),
            amount: 10,
            settlement_path: vec![id(2), id(3), id(1)],
            net_amount: 4,
        };

        let decoded = decode_call(&encode_add_iou(&request)).unwrap();
        assert_eq!(decoded.method, ADD_IOU);
        assert_eq!(
            decoded.params,
            vec![
                CallValue::Address(id(2)),
                CallValue::Uint(10),
                CallValue::AddressList(vec![id(2), id(3), id(1)]),
                CallValue::Uint(4),
            ]
        );
    }

    #[test]
    fn test_decode_lookup() {
        let decoded = decode_call(&encode_lookup(&id(7), &id(8))).unwrap();
        assert_eq!(decoded.method, LOOKUP);
        assert_eq!(decoded.params[0].as_identity(), Some(id(7)));
        assert_eq!(decoded.params[1].as_identity(), Some(id(8)));
    }

    #[test]
    fn test_undecodable_input() {
        assert!(decode_call(&[]).is_none());
        assert!(decode_call(&[0xde, 0xad, 0xbe, 0xef]).is_none());

        // Known selector, truncated arguments
        let mut truncated = encode_add_iou(&IouRequest::plain(id(1), id(2), 5)).to_vec();
        truncated.truncate(20);
        assert!(decode_call(&truncated).is_none());
    }

    #[test]
    fn test_selector_prefix() {
        let encoded = encode_lookup(&id(1), &id(2));
        assert_eq!(&encoded[..4], IouLedger::lookupCall::SELECTOR.as_slice());
    }

    #[test]
    fn test_lookup_return_roundtrip() {
        let mut word = [0u8; 32];
        word[31] = 42;
        assert_eq!(decode_lookup_return(&word).unwrap(), 42);
        assert!(decode_lookup_return(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_call_value_accessors() {
        let value = CallValue::Uint(3);
        assert_eq!(value.as_uint(), Some(3));
        assert_eq!(value.as_identity(), None);
        assert!(value.as_identities().is_none());
    }
}
