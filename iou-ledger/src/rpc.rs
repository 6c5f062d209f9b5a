//! JSON-RPC ledger adapter
//!
//! Talks to an Ethereum-style node over HTTP JSON-RPC 2.0:
//!
//! | Operation       | RPC method(s)                                          |
//! |-----------------|--------------------------------------------------------|
//! | `head`          | `eth_blockNumber`                                      |
//! | `block`         | `eth_getBlockByNumber` / `eth_getBlockByHash` (full)   |
//! | `lookup_balance`| `eth_call` of `lookup` at `latest`                     |
//! | `record_iou`    | `eth_sendTransaction`, then `eth_getTransactionReceipt`|
//!
//! Reads are retried with exponential backoff on transport failures. Writes
//! are sent exactly once: resubmitting a financial write without the
//! caller's confirmation is unsafe.

use crate::abi::{decode_lookup_return, encode_add_iou, encode_lookup};
use crate::config::Config;
use crate::ledger::Ledger;
use crate::metrics::{record_request, RPC_RETRIES_TOTAL};
use crate::types::{Block, BlockId, Identity, IouRequest, Receipt, Transaction};
use crate::{Error, Result};
use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

/// JSON-RPC error object
#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Block as returned with full transaction objects
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcBlock {
    hash: B256,
    parent_hash: B256,
    #[serde(deserialize_with = "deserialize_quantity")]
    number: u64,
    #[serde(deserialize_with = "deserialize_quantity")]
    timestamp: u64,
    #[serde(default)]
    transactions: Vec<RpcTransaction>,
}

#[derive(Debug, Deserialize)]
struct RpcTransaction {
    hash: B256,
    from: Address,
    to: Option<Address>,
    input: Bytes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: B256,
    block_hash: B256,
    #[serde(deserialize_with = "deserialize_quantity")]
    block_number: u64,
    status: Option<String>,
}

impl From<RpcBlock> for Block {
    fn from(block: RpcBlock) -> Self {
        Block {
            hash: block.hash,
            parent_hash: block.parent_hash,
            number: block.number,
            timestamp: block.timestamp,
            transactions: block
                .transactions
                .into_iter()
                .map(|tx| Transaction {
                    hash: tx.hash,
                    from: tx.from.into(),
                    to: tx.to.map(Identity::from),
                    input: tx.input,
                })
                .collect(),
        }
    }
}

/// Parse a hex quantity such as `0x1b4`
pub fn parse_quantity(text: &str) -> Result<u64> {
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| Error::Decode(format!("quantity without 0x prefix: {}", text)))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| Error::Decode(format!("quantity {}: {}", text, e)))
}

fn deserialize_quantity<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_quantity(&text).map_err(serde::de::Error::custom)
}

fn quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

/// Ledger reached through a node's JSON-RPC endpoint
#[derive(Debug)]
pub struct RpcLedger {
    client: reqwest::Client,
    contract: Identity,
    config: Config,
    next_id: AtomicU64,
}

impl RpcLedger {
    /// Create adapter from configuration
    pub fn new(config: Config) -> Result<Self> {
        let contract: Identity = config.contract_address.parse()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            contract,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    /// Address of the contract
    pub fn contract(&self) -> Identity {
        self.contract
    }

    /// Read request with exponential backoff on transport failures
    async fn read<T: DeserializeOwned>(&self, method: &'static str, params: Value) -> Result<Option<T>> {
        let retry = &self.config.retry;
        let max_delay = Duration::from_millis(retry.max_delay_ms);
        let mut delay = Duration::from_millis(retry.initial_delay_ms);
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.request_once(method, params.clone()).await {
                Ok(result) => {
                    if attempts > 1 {
                        info!(method, attempts, "RPC read succeeded after retry");
                    }
                    return Ok(result);
                }
                Err(e) if e.is_transient() && attempts < retry.max_attempts => {
                    warn!(
                        method,
                        attempt = attempts,
                        ?delay,
                        error = %e,
                        "RPC read failed, retrying"
                    );
                    RPC_RETRIES_TOTAL.with_label_values(&[method]).inc();
                    tokio::time::sleep(delay).await;

                    // Exponential backoff
                    delay = (delay * 2).min(max_delay);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Single JSON-RPC round trip
    async fn request_once<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<Option<T>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let start = Instant::now();
        let result = self.send(&payload).await;
        record_request(method, result.is_ok(), start.elapsed().as_secs_f64());

        debug!(method, id, ok = result.is_ok(), "RPC request");
        result
    }

    async fn send<T: DeserializeOwned>(&self, payload: &Value) -> Result<Option<T>> {
        let response = self
            .client
            .post(&self.config.rpc_url)
            .json(payload)
            .send()
            .await?;

        if let Some(err) = status_error(response.status()) {
            return Err(err);
        }

        let body: RpcResponse<T> = response.json().await?;
        if let Some(err) = body.error {
            return Err(Error::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        Ok(body.result)
    }

    async fn wait_for_receipt(&self, transaction_hash: B256) -> Result<Receipt> {
        let poll_interval = Duration::from_millis(self.config.receipt.poll_interval_ms);
        let deadline = Instant::now() + Duration::from_millis(self.config.receipt.timeout_ms);

        loop {
            let receipt: Option<RpcReceipt> = self
                .read("eth_getTransactionReceipt", json!([transaction_hash]))
                .await?;

            if let Some(receipt) = receipt {
                if receipt.status.as_deref() == Some("0x0") {
                    return Err(Error::Rejected(format!(
                        "transaction {} reverted",
                        receipt.transaction_hash
                    )));
                }

                return Ok(Receipt {
                    transaction_hash: receipt.transaction_hash,
                    block_hash: receipt.block_hash,
                    block_number: receipt.block_number,
                });
            }

            if Instant::now() >= deadline {
                return Err(Error::ReceiptTimeout(transaction_hash.to_string()));
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn head(&self) -> Result<BlockId> {
        let number: Option<String> = self.read("eth_blockNumber", json!([])).await?;
        let number = number.ok_or_else(|| Error::Decode("empty eth_blockNumber".to_string()))?;
        Ok(BlockId::Number(parse_quantity(&number)?))
    }

    async fn block(&self, id: BlockId) -> Result<Block> {
        let block: Option<RpcBlock> = match id {
            BlockId::Number(n) => {
                self.read("eth_getBlockByNumber", json!([quantity(n), true]))
                    .await?
            }
            BlockId::Hash(hash) => self.read("eth_getBlockByHash", json!([hash, true])).await?,
        };

        block
            .map(Block::from)
            .ok_or_else(|| Error::BlockNotFound(id.to_string()))
    }

    async fn lookup_balance(&self, debtor: &Identity, creditor: &Identity) -> Result<u32> {
        let call = json!({
            "to": self.contract,
            "data": encode_lookup(debtor, creditor),
        });

        let data: Option<Bytes> = self.read("eth_call", json!([call, "latest"])).await?;
        let data = data.ok_or_else(|| Error::Decode("empty eth_call result".to_string()))?;
        decode_lookup_return(&data)
    }

    async fn record_iou(&self, request: IouRequest) -> Result<Receipt> {
        let transaction = json!({
            "from": request.debtor,
            "to": self.contract,
            "data": encode_add_iou(&request),
            "gas": quantity(self.config.gas_limit),
        });

        // Never retried
        let hash: Option<B256> = self
            .request_once("eth_sendTransaction", json!([transaction]))
            .await
            .map_err(|e| match e {
                Error::Rpc { message, .. } => Error::Rejected(message),
                other => other,
            })?;
        let hash = hash.ok_or_else(|| Error::Decode("empty transaction hash".to_string()))?;

        info!(
            debtor = %request.debtor,
            creditor = %request.creditor,
            amount = request.amount,
            net_amount = request.net_amount,
            transaction = %hash,
            "IOU submitted"
        );

        self.wait_for_receipt(hash).await
    }
}

/// Non-success HTTP statuses are connectivity failures, never decode errors
fn status_error(status: reqwest::StatusCode) -> Option<Error> {
    if status.is_success() {
        None
    } else {
        Some(Error::Transport(format!("HTTP {}", status)))
    }
}
