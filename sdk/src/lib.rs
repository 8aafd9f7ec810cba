//! Beaver SDK - client engine for recurring crypto payments on EVM chains
//!
//! This crate implements the client side of the Beaver subscription
//! protocol. It includes utilities for:
//!
//! - Resolving checkout prompts from inline parameters or stored shortcuts
//! - Hashing product terms into their canonical on-chain identity
//! - Assessing subscription lifecycle state from indexed records
//! - Driving approve/start/terminate transactions through a wallet seam
//!
//! # Example Usage
//!
//! ```no_run
//! use beaver_sdk::{ChainRegistry, DohResolver, IndexerClient, PromptResolver, RawPromptInput};
//!
//! # #[tokio::main]
//! # async fn main() -> beaver_sdk::Result<()> {
//! // Wire the resolver to public DNS-over-HTTPS and the hosted indexer
//! let resolver = PromptResolver::new(
//!     DohResolver::from_env(),
//!     IndexerClient::from_env(),
//!     ChainRegistry::defaults(),
//! );
//!
//! // Resolve a checkout link into fully validated terms
//! let url = "https://pay.example/checkout?domain=merchant.example&product=Pro%20plan\
//!            &token=USDT&amount=9.99&period=30d&chains=sepolia"
//!     .parse()?;
//! let prompt = resolver.resolve(RawPromptInput::from_url(&url)).await?;
//!
//! println!(
//!     "{} charges {} {} every {}",
//!     prompt.merchant_domain,
//!     prompt.human_amount,
//!     prompt.token_symbol,
//!     prompt.period_human(),
//! );
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod abi;
pub mod chains;
pub mod dns;
pub mod error;
pub mod hashing;
pub mod indexer;
pub mod lifecycle;
pub mod orchestrator;
pub mod period;
pub mod prompt;
pub mod rpc;
pub mod types;
pub mod wallet;

// Re-export commonly used items
pub use chains::{ChainConfig, ChainRegistry, TokenConfig, DEFAULT_PAYMENT_PERIOD_SECS};
pub use error::{BeaverError, Result};
pub use types::{CheckoutPrompt, Product, ShortcutPrompt, Subscription, SubscriptionStatus};

// Re-export the checkout pipeline
pub use dns::{DohResolver, DomainResolver};
pub use indexer::{IndexerClient, MetadataStore};
pub use prompt::{parse_amount, PromptResolver, RawPromptInput};

// Re-export product identity and period codec helpers
pub use hashing::{expand_content_id, minimize_content_id, product_hash};
pub use period::{human_from_seconds, seconds_from_human};

// Re-export lifecycle assessment
pub use lifecycle::{assess, assess_now, LifecycleAssessment, NextAction};

// Re-export the transaction layer
pub use orchestrator::{
    OrchestratorConfig, PreflightReport, StartOutcome, TransactionOrchestrator, TxPhase,
};
pub use rpc::{ChainGateway, EvmRpcClient, TxReceipt};
pub use wallet::{TransactionRequest, WalletConnector};

// Re-export commonly used external types
pub use alloy_primitives::{Address, B256, U256};
