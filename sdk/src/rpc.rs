//! Minimal EVM JSON-RPC client
//!
//! Only the two methods the payment flow needs: `eth_call` for view
//! reads and `eth_getTransactionReceipt` for confirmation polling.
//! Requests are hand-built JSON envelopes over reqwest. The read
//! helpers are generic over [`ChainGateway`] so the orchestrator runs
//! against synthetic chains in tests.

use alloy_primitives::{Address, B256, U256};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::abi::{self, OnChainSubscription};
use crate::chains::ChainConfig;
use crate::error::{BeaverError, Result};

/// Transaction receipt, reduced to what confirmation needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    /// Whether the transaction executed without reverting
    pub success: bool,
    pub block_number: Option<u64>,
}

/// Chain reads the payment flow depends on
#[allow(async_fn_in_trait)]
pub trait ChainGateway {
    /// Execute a read-only call against a contract
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>>;

    /// Fetch a transaction receipt, `None` while the transaction is
    /// still pending
    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<TxReceipt>>;
}

/// [`ChainGateway`] over plain JSON-RPC
#[derive(Debug, Clone)]
pub struct EvmRpcClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl EvmRpcClient {
    /// Build a client against an explicit RPC endpoint
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Build a client for a configured chain
    ///
    /// # Errors
    ///
    /// Returns a URL error when the chain's `rpc_url` does not parse.
    pub fn for_chain(chain: &ChainConfig) -> Result<Self> {
        Ok(Self::new(Url::parse(&chain.rpc_url)?))
    }

    /// The endpoint requests are sent to
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn request(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let envelope = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&envelope)
            .send()
            .await?;
        let body: RpcEnvelope = response.json().await?;
        if let Some(error) = body.error {
            tracing::warn!(method, code = error.code, "RPC answered with an error");
            return Err(BeaverError::from_rpc_code(error.code, error.message));
        }
        body.result.ok_or_else(|| {
            BeaverError::Rpc(format!("{method} answered with neither result nor error"))
        })
    }
}

impl ChainGateway for EvmRpcClient {
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>> {
        let params = json!([
            { "to": to, "data": format!("0x{}", hex::encode(&data)) },
            "latest",
        ]);
        let result = self.request("eth_call", params).await?;
        let text = result
            .as_str()
            .ok_or_else(|| BeaverError::Rpc("eth_call result is not a string".to_string()))?;
        decode_hex_bytes(text)
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<TxReceipt>> {
        let result = self
            .request("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let raw: RawReceipt = serde_json::from_value(result)?;
        Ok(Some(raw.into_receipt(tx_hash)?))
    }
}

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: Option<serde_json::Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Receipt as the node serves it, quantities still hex-encoded
#[derive(Debug, Deserialize)]
struct RawReceipt {
    status: Option<String>,
    #[serde(rename = "blockNumber")]
    block_number: Option<String>,
}

impl RawReceipt {
    fn into_receipt(self, tx_hash: B256) -> Result<TxReceipt> {
        let success = match self.status.as_deref() {
            Some(status) => decode_hex_u64(status)? == 1,
            None => false,
        };
        let block_number = match self.block_number.as_deref() {
            Some(number) => Some(decode_hex_u64(number)?),
            None => None,
        };
        Ok(TxReceipt {
            tx_hash,
            success,
            block_number,
        })
    }
}

fn decode_hex_bytes(text: &str) -> Result<Vec<u8>> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(digits)
        .map_err(|err| BeaverError::Rpc(format!("invalid hex in RPC response: {err}")))
}

fn decode_hex_u64(text: &str) -> Result<u64> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    u64::from_str_radix(digits, 16)
        .map_err(|err| BeaverError::Rpc(format!("invalid hex quantity in RPC response: {err}")))
}

/// Whether the router knows a product hash
pub async fn product_exists<G: ChainGateway>(
    gateway: &G,
    router: Address,
    product_hash: B256,
) -> Result<bool> {
    let data = abi::encode_products_probe(product_hash);
    let ret = gateway.call(router, data).await?;
    Ok(abi::decode_product_exists(&ret))
}

/// Current ERC-20 allowance in raw token units
pub async fn erc20_allowance<G: ChainGateway>(
    gateway: &G,
    token: Address,
    owner: Address,
    spender: Address,
) -> Result<U256> {
    let data = abi::encode_allowance(owner, spender);
    let ret = gateway.call(token, data).await?;
    abi::decode_erc20_uint(&ret)
}

/// Current ERC-20 balance in raw token units
pub async fn erc20_balance<G: ChainGateway>(
    gateway: &G,
    token: Address,
    owner: Address,
) -> Result<U256> {
    let data = abi::encode_balance_of(owner);
    let ret = gateway.call(token, data).await?;
    abi::decode_erc20_uint(&ret)
}

/// Full on-chain subscription record from the router
pub async fn subscription_record<G: ChainGateway>(
    gateway: &G,
    router: Address,
    subscription_hash: B256,
) -> Result<OnChainSubscription> {
    let data = abi::encode_subscription_query(subscription_hash);
    let ret = gateway.call(router, data).await?;
    abi::decode_subscription_record(&ret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_bytes_decoding() {
        assert_eq!(decode_hex_bytes("0x").unwrap(), Vec::<u8>::new());
        assert_eq!(decode_hex_bytes("0x0001ff").unwrap(), vec![0, 1, 255]);
        assert_eq!(decode_hex_bytes(" 0xab \n").unwrap(), vec![0xab]);
        assert!(decode_hex_bytes("0xzz").is_err());
    }

    #[test]
    fn test_hex_quantity_decoding() {
        assert_eq!(decode_hex_u64("0x1").unwrap(), 1);
        assert_eq!(decode_hex_u64("0x0").unwrap(), 0);
        assert_eq!(decode_hex_u64("0xabcdef").unwrap(), 11_259_375);
        assert!(decode_hex_u64("0x").is_err());
    }

    #[test]
    fn test_receipt_parsing() {
        let raw: RawReceipt = serde_json::from_value(json!({
            "status": "0x1",
            "blockNumber": "0x10",
            "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111"
        }))
        .unwrap();
        let receipt = raw.into_receipt(B256::repeat_byte(0x11)).unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.block_number, Some(16));
    }

    #[test]
    fn test_reverted_receipt_parsing() {
        let raw: RawReceipt =
            serde_json::from_value(json!({ "status": "0x0", "blockNumber": "0x10" }))
                .unwrap();
        let receipt = raw.into_receipt(B256::ZERO).unwrap();
        assert!(!receipt.success);
    }

    #[test]
    fn test_rpc_envelope_parsing() {
        let envelope: RpcEnvelope = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 4001, "message": "User rejected the request." }
        }))
        .unwrap();
        let error = envelope.error.unwrap();
        assert_eq!(error.code, 4001);
        let mapped = BeaverError::from_rpc_code(error.code, error.message);
        assert!(matches!(mapped, BeaverError::WalletRejected(_)));
    }
}
