//! Transaction orchestration for the checkout and management flows
//!
//! The orchestrator owns the phase machine around every router
//! transaction: it builds calldata, hands it to the wallet seam, then
//! polls for the receipt with a bounded wait. One orchestrator instance
//! targets one chain; the caller picks the chain from the prompt's
//! available list and constructs accordingly.
//!
//! Failure is never terminal: [`TransactionOrchestrator::reset`] returns
//! to idle and a retried flow starts cleanly. Nothing retries on its
//! own.

use std::num::NonZeroUsize;
use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use lru::LruCache;

use crate::abi;
use crate::chains::{ChainConfig, TokenConfig};
use crate::error::{BeaverError, Result};
use crate::hashing;
use crate::rpc::{self, ChainGateway};
use crate::types::CheckoutPrompt;
use crate::wallet::{TransactionRequest, WalletConnector};

/// Products are immutable once registered, so existence only needs a
/// small positive cache.
const PRODUCT_CACHE_SIZE: usize = 256;

/// Where a transaction currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxPhase {
    /// Nothing in flight
    Idle,
    /// Waiting for the user to sign in their wallet
    AwaitingSignature,
    /// Broadcast, waiting for a receipt
    AwaitingConfirmation { tx_hash: B256 },
    /// Executed successfully
    Confirmed { tx_hash: B256 },
    /// Signing or execution failed; `reset()` clears this
    Failed { reason: String },
}

/// Tunables for confirmation waiting and approval suggestions
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Give up waiting for a receipt after this long
    pub confirmation_timeout: Duration,
    /// How often to poll for the receipt
    pub poll_interval: Duration,
    /// How many payments the suggested approval covers
    pub approval_periods: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(180),
            poll_interval: Duration::from_secs(4),
            approval_periods: 12,
        }
    }
}

/// What [`TransactionOrchestrator::preflight`] learned about the wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightReport {
    /// One payment in raw token units
    pub required: U256,
    /// Wallet balance in raw token units
    pub balance: U256,
    /// Current router allowance in raw token units
    pub allowance: U256,
    /// Whether an approval must land before starting
    pub needs_approval: bool,
    /// Whether the balance covers the first payment; a free trial
    /// waives this
    pub sufficient_balance: bool,
}

/// What a successful start produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOutcome {
    pub tx_hash: B256,
    pub product_hash: B256,
    /// Whether this transaction also registered the product
    pub created_product: bool,
}

/// Drives router and ERC-20 transactions through their phases
#[derive(Debug)]
pub struct TransactionOrchestrator<W, G> {
    wallet: W,
    gateway: G,
    chain: ChainConfig,
    config: OrchestratorConfig,
    phase: TxPhase,
    product_cache: LruCache<B256, ()>,
}

impl<W: WalletConnector, G: ChainGateway> TransactionOrchestrator<W, G> {
    /// Build an orchestrator for one chain with default tunables
    #[must_use]
    pub fn new(wallet: W, gateway: G, chain: ChainConfig) -> Self {
        Self::with_config(wallet, gateway, chain, OrchestratorConfig::default())
    }

    /// Build an orchestrator with explicit tunables
    #[must_use]
    pub fn with_config(
        wallet: W,
        gateway: G,
        chain: ChainConfig,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            wallet,
            gateway,
            chain,
            config,
            phase: TxPhase::Idle,
            product_cache: LruCache::new(
                NonZeroUsize::new(PRODUCT_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
            ),
        }
    }

    /// Current phase of the latest transaction
    #[must_use]
    pub fn phase(&self) -> &TxPhase {
        &self.phase
    }

    /// The chain this orchestrator targets
    #[must_use]
    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    /// Clear a finished or failed transaction back to idle
    pub fn reset(&mut self) {
        self.phase = TxPhase::Idle;
    }

    /// One payment in raw token units for this chain's token config
    pub fn required_amount(&self, prompt: &CheckoutPrompt) -> Result<U256> {
        Ok(self.payment_token(prompt)?.to_raw_units(prompt.human_amount))
    }

    /// The approval the checkout flow suggests, covering several
    /// payments so the user is not prompted every period
    #[must_use]
    pub fn suggested_approval(&self, prompt: &CheckoutPrompt) -> f64 {
        prompt.human_amount * f64::from(self.config.approval_periods)
    }

    /// Read wallet balance and router allowance for the prompt's token
    pub async fn preflight(&self, prompt: &CheckoutPrompt) -> Result<PreflightReport> {
        self.ensure_chain()?;
        let router = self.router()?;
        let token = self.payment_token(prompt)?;
        let required = token.to_raw_units(prompt.human_amount);
        let owner = self.wallet.address();

        let balance = rpc::erc20_balance(&self.gateway, token.address, owner).await?;
        let allowance =
            rpc::erc20_allowance(&self.gateway, token.address, owner, router).await?;

        let sufficient_balance = prompt.free_trial_secs > 0 || balance >= required;
        tracing::debug!(
            %balance,
            %allowance,
            %required,
            sufficient_balance,
            "preflight complete"
        );
        Ok(PreflightReport {
            required,
            balance,
            allowance,
            needs_approval: allowance < required,
            sufficient_balance,
        })
    }

    /// Approve the router to spend the payment token
    ///
    /// `human_amount` is the user's chosen approval; `None` uses the
    /// suggested multi-payment coverage. The approval must cover at
    /// least one payment.
    pub async fn approve(
        &mut self,
        prompt: &CheckoutPrompt,
        human_amount: Option<f64>,
    ) -> Result<B256> {
        self.ensure_chain()?;
        let router = self.router()?;
        let token = self.payment_token(prompt)?.clone();

        let chosen = human_amount.unwrap_or_else(|| self.suggested_approval(prompt));
        if chosen < prompt.human_amount {
            return Err(BeaverError::ApprovalTooLow {
                minimum: prompt.human_amount,
                symbol: token.symbol,
            });
        }

        let raw = token.to_raw_units(chosen);
        let data = abi::encode_approve(router, raw);
        tracing::info!(token = %token.symbol, amount = chosen, "approving spend");
        self.run(token.address, data).await
    }

    /// Start a subscription, registering the product first when the
    /// chain does not know it yet
    ///
    /// Registration and start happen in one atomic call; the user never
    /// signs two transactions for a first-ever subscription.
    pub async fn start_subscription(
        &mut self,
        prompt: &CheckoutPrompt,
    ) -> Result<StartOutcome> {
        self.ensure_chain()?;
        let router = self.router()?;
        let token = self.payment_token(prompt)?.clone();
        let required = token.to_raw_units(prompt.human_amount);

        let report = self.preflight(prompt).await?;
        if !report.sufficient_balance {
            return Err(BeaverError::InsufficientBalance {
                symbol: token.symbol.clone(),
                required: prompt.human_amount,
                available: token.to_human_amount(report.balance),
            });
        }
        if report.needs_approval {
            return Err(BeaverError::ApprovalTooLow {
                minimum: prompt.human_amount,
                symbol: token.symbol.clone(),
            });
        }

        let product_hash = hashing::product_hash(
            self.chain.chain_id,
            prompt.merchant_address,
            token.address,
            required,
            prompt.period_secs,
            prompt.free_trial_secs,
            prompt.payment_period_secs,
            prompt.product_metadata,
        )?;

        let exists = self.product_known(router, product_hash).await?;
        let data = if exists {
            abi::encode_start_subscription(product_hash, prompt.subscription_metadata)
        } else {
            abi::encode_setup_and_start(
                prompt.merchant_address,
                token.address,
                required,
                prompt.period_secs,
                prompt.free_trial_secs,
                prompt.payment_period_secs,
                prompt.product_metadata,
                prompt.subscription_metadata,
            )?
        };

        tracing::info!(%product_hash, product_registered = exists, "starting subscription");
        let tx_hash = self.run(router, data).await?;
        Ok(StartOutcome {
            tx_hash,
            product_hash,
            created_product: !exists,
        })
    }

    /// Terminate a subscription for good
    pub async fn terminate(&mut self, subscription_hash: B256) -> Result<B256> {
        self.ensure_chain()?;
        let router = self.router()?;
        let data = abi::encode_terminate_subscription(subscription_hash);
        tracing::info!(%subscription_hash, "terminating subscription");
        self.run(router, data).await
    }

    /// Probe product existence, consulting the positive cache first
    async fn product_known(&mut self, router: Address, product_hash: B256) -> Result<bool> {
        if self.product_cache.get(&product_hash).is_some() {
            return Ok(true);
        }
        let exists = rpc::product_exists(&self.gateway, router, product_hash).await?;
        if exists {
            // Only existence is cacheable: an absent product may be
            // registered by someone else at any moment.
            self.product_cache.put(product_hash, ());
        }
        Ok(exists)
    }

    /// Submit calldata and drive the phase machine to a terminal state
    async fn run(&mut self, to: Address, data: Vec<u8>) -> Result<B256> {
        self.phase = TxPhase::AwaitingSignature;
        tracing::debug!(%to, "awaiting signature");

        let request = TransactionRequest {
            chain_id: self.chain.chain_id,
            from: self.wallet.address(),
            to,
            value: U256::ZERO,
            data,
        };
        let tx_hash = match self.wallet.submit(request).await {
            Ok(tx_hash) => tx_hash,
            Err(err) => {
                tracing::warn!(error = %err, "signing failed");
                self.phase = TxPhase::Failed {
                    reason: err.to_string(),
                };
                return Err(err);
            }
        };

        self.phase = TxPhase::AwaitingConfirmation { tx_hash };
        tracing::debug!(%tx_hash, "awaiting confirmation");

        match self.await_confirmation(tx_hash).await {
            Ok(()) => {
                self.phase = TxPhase::Confirmed { tx_hash };
                tracing::info!(%tx_hash, "transaction confirmed");
                Ok(tx_hash)
            }
            Err(err) => {
                tracing::warn!(%tx_hash, error = %err, "confirmation failed");
                self.phase = TxPhase::Failed {
                    reason: err.to_string(),
                };
                Err(err)
            }
        }
    }

    /// Poll for the receipt until success, revert, or timeout
    async fn await_confirmation(&self, tx_hash: B256) -> Result<()> {
        let started = tokio::time::Instant::now();
        loop {
            if let Some(receipt) = self.gateway.transaction_receipt(tx_hash).await? {
                if receipt.success {
                    return Ok(());
                }
                return Err(BeaverError::TransactionReverted {
                    tx_hash: tx_hash.to_string(),
                });
            }
            if started.elapsed() >= self.config.confirmation_timeout {
                return Err(BeaverError::ConfirmationTimeout {
                    tx_hash: tx_hash.to_string(),
                    waited_secs: self.config.confirmation_timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    fn ensure_chain(&self) -> Result<()> {
        let connected = self.wallet.chain_id();
        if connected == self.chain.chain_id {
            return Ok(());
        }
        Err(BeaverError::WrongChain {
            connected,
            required: self.chain.chain_id,
        })
    }

    fn router(&self) -> Result<Address> {
        self.chain.router.ok_or_else(|| BeaverError::RouterUnavailable {
            chain: self.chain.name.clone(),
        })
    }

    fn payment_token(&self, prompt: &CheckoutPrompt) -> Result<&TokenConfig> {
        self.chain.token(&prompt.token_symbol).ok_or_else(|| {
            BeaverError::UnsupportedToken {
                symbol: prompt.token_symbol.clone(),
                chains: vec![self.chain.name.clone()],
            }
        })
    }
}
