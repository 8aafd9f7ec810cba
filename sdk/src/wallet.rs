//! Wallet seam
//!
//! Key management and signing stay outside this crate. A connector
//! exposes the connected account, the chain it is on, and a submit
//! primitive; phase tracking and confirmation are the orchestrator's
//! job.

use alloy_primitives::{Address, B256, U256};

use crate::error::Result;

/// An unsigned transaction, ready for a connector to sign and submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Chain the transaction targets
    pub chain_id: u64,
    /// The connected account
    pub from: Address,
    /// Contract being called
    pub to: Address,
    /// Native value, zero for every payment flow call
    pub value: U256,
    /// ABI-encoded calldata
    pub data: Vec<u8>,
}

/// The connected wallet, as the orchestrator sees it
///
/// A rejection inside the wallet surfaces as
/// [`crate::error::BeaverError::WalletRejected`], which the orchestrator
/// treats as a recoverable failure.
#[allow(async_fn_in_trait)]
pub trait WalletConnector {
    /// The connected account
    fn address(&self) -> Address;

    /// Chain the wallet is currently on
    fn chain_id(&self) -> u64;

    /// Sign and broadcast, returning the transaction hash
    async fn submit(&self, request: TransactionRequest) -> Result<B256>;
}
