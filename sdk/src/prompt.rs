//! Checkout prompt resolution
//!
//! Turns the raw parameters a merchant embeds in a checkout link, or
//! stores behind a shortcut id, into a validated [`CheckoutPrompt`]
//! ready for the transaction flow. Resolution proves the merchant's
//! identity through DNS, validates the terms against the chain
//! registry, and persists the two metadata documents the router calls
//! reference.

use alloy_primitives::B256;
use serde_json::json;
use url::Url;

use crate::chains::{ChainRegistry, DEFAULT_PAYMENT_PERIOD_SECS};
use crate::dns::DomainResolver;
use crate::error::{BeaverError, Result};
use crate::hashing;
use crate::indexer::MetadataStore;
use crate::period;
use crate::types::CheckoutPrompt;

/// Checkout parameters exactly as they arrived, nothing validated yet
///
/// Empty values count as absent, matching how checkout links treat
/// `&amount=`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPromptInput {
    pub shortcut_id: Option<String>,
    pub domain: Option<String>,
    pub product: Option<String>,
    pub token: Option<String>,
    pub amount: Option<String>,
    pub period: Option<String>,
    pub chains: Option<String>,
    pub free_trial_length: Option<String>,
    pub on_success_url: Option<String>,
    pub subscription_id: Option<String>,
    pub user_id: Option<String>,
}

impl RawPromptInput {
    /// Build from query pairs using the public camelCase parameter names
    ///
    /// Unknown keys are ignored so checkout links can carry tracking
    /// parameters.
    #[must_use]
    pub fn from_query_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut input = Self::default();
        for (key, value) in pairs {
            let value = value.into();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "shortcutId" => input.shortcut_id = Some(value),
                "domain" => input.domain = Some(value),
                "product" => input.product = Some(value),
                "token" => input.token = Some(value),
                "amount" => input.amount = Some(value),
                "period" => input.period = Some(value),
                "chains" => input.chains = Some(value),
                "freeTrialLength" => input.free_trial_length = Some(value),
                "onSuccessUrl" => input.on_success_url = Some(value),
                "subscriptionId" => input.subscription_id = Some(value),
                "userId" => input.user_id = Some(value),
                _ => {}
            }
        }
        input
    }

    /// Build from a full checkout URL's query string
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        Self::from_query_pairs(url.query_pairs())
    }
}

/// The fields resolution works from, after the shortcut merge
struct PromptFields {
    domain: String,
    product: String,
    token: String,
    amount: String,
    period: String,
    chains: String,
    free_trial_length: String,
    on_success_url: Option<String>,
    subscription_id: Option<String>,
    user_id: Option<String>,
}

/// Resolves raw checkout input into a validated prompt
#[derive(Debug)]
pub struct PromptResolver<D, M> {
    resolver: D,
    store: M,
    registry: ChainRegistry,
}

impl<D: DomainResolver, M: MetadataStore> PromptResolver<D, M> {
    /// Build a resolver over a domain resolver, a metadata store and a
    /// chain registry
    #[must_use]
    pub fn new(resolver: D, store: M, registry: ChainRegistry) -> Self {
        Self {
            resolver,
            store,
            registry,
        }
    }

    /// The registry validation runs against
    #[must_use]
    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// Resolve raw input into a checkout prompt
    ///
    /// # Errors
    ///
    /// Every validation failure maps to a dedicated [`BeaverError`]
    /// variant whose message is safe to relay to the paying user.
    pub async fn resolve(&self, input: RawPromptInput) -> Result<CheckoutPrompt> {
        let fields = self.gather_fields(input).await?;

        let merchant_address = self.resolver.resolve_domain(&fields.domain).await?;
        let chain_ids = self.parse_chains(&fields.chains)?;
        self.check_token(&fields.token, &chain_ids)?;
        let human_amount = parse_amount(&fields.amount)?;
        let period_secs = period::seconds_from_human(&fields.period)?;
        let free_trial_secs = period::seconds_from_human(&fields.free_trial_length)?;
        let on_success_url = fields
            .on_success_url
            .as_deref()
            .map(Url::parse)
            .transpose()?;

        let product_metadata = self
            .save_minimized(json!({
                "merchantDomain": fields.domain,
                "productName": fields.product,
            }))
            .await?;
        let subscription_metadata = self
            .save_minimized(json!({
                "subscriptionId": fields.subscription_id,
                "userId": fields.user_id,
            }))
            .await?;

        tracing::info!(
            domain = %fields.domain,
            product = %fields.product,
            chains = chain_ids.len(),
            "resolved checkout prompt"
        );

        Ok(CheckoutPrompt {
            merchant_domain: fields.domain,
            merchant_address,
            product_name: fields.product,
            token_symbol: fields.token,
            human_amount,
            period_secs,
            free_trial_secs,
            // Checkout links carry no collection window; the protocol
            // default applies until merchants can set their own.
            payment_period_secs: DEFAULT_PAYMENT_PERIOD_SECS,
            available_chains: chain_ids,
            on_success_url,
            subscription_id: fields.subscription_id,
            user_id: fields.user_id,
            product_metadata,
            subscription_metadata,
        })
    }

    /// Merge the shortcut form when an id is present, else require the
    /// inline parameters
    async fn gather_fields(&self, input: RawPromptInput) -> Result<PromptFields> {
        if let Some(shortcut_id) = input.shortcut_id.as_deref() {
            let stored = self
                .store
                .load_shortcut(shortcut_id)
                .await?
                .ok_or_else(|| BeaverError::ShortcutNotFound(shortcut_id.to_string()))?;
            tracing::debug!(shortcut_id, "loaded stored checkout form");

            // Explicit query parameters override only the external ids
            // and the redirect; the commercial terms stay as stored.
            return Ok(PromptFields {
                domain: stored.domain,
                product: stored.product,
                token: stored.token,
                amount: stored.amount,
                period: stored.period,
                chains: stored.chains,
                free_trial_length: stored
                    .free_trial_length
                    .unwrap_or_else(|| "0".to_string()),
                on_success_url: input.on_success_url.or(stored.on_success_url),
                subscription_id: input.subscription_id.or(stored.subscription_id),
                user_id: input.user_id.or(stored.user_id),
            });
        }

        let required = |name: &'static str, value: Option<String>| {
            value.ok_or_else(|| BeaverError::MissingParameter(name.to_string()))
        };
        Ok(PromptFields {
            domain: required("domain", input.domain)?,
            product: required("product", input.product)?,
            token: required("token", input.token)?,
            amount: required("amount", input.amount)?,
            period: required("period", input.period)?,
            chains: required("chains", input.chains)?,
            free_trial_length: input
                .free_trial_length
                .unwrap_or_else(|| "0".to_string()),
            on_success_url: input.on_success_url,
            subscription_id: input.subscription_id,
            user_id: input.user_id,
        })
    }

    /// Split the chain list and resolve every entry against the registry
    fn parse_chains(&self, serialized: &str) -> Result<Vec<u64>> {
        let mut chain_ids = Vec::new();
        for entry in serialized.split(',') {
            let entry = entry.trim().to_lowercase();
            let chain = self
                .registry
                .resolve(&entry)
                .ok_or_else(|| BeaverError::UnsupportedChain(entry.clone()))?;
            chain_ids.push(chain.chain_id);
        }
        Ok(chain_ids)
    }

    /// The token must be configured on every requested chain
    fn check_token(&self, symbol: &str, chain_ids: &[u64]) -> Result<()> {
        let mut missing = Vec::new();
        for chain_id in chain_ids {
            match self.registry.by_id(*chain_id) {
                Some(chain) if chain.token(symbol).is_some() => {}
                Some(chain) => missing.push(chain.name.clone()),
                None => missing.push(chain_id.to_string()),
            }
        }
        if missing.is_empty() {
            return Ok(());
        }
        Err(BeaverError::UnsupportedToken {
            symbol: symbol.to_string(),
            chains: missing,
        })
    }

    async fn save_minimized(&self, metadata: serde_json::Value) -> Result<B256> {
        let cid = self.store.store_metadata(&metadata).await?;
        hashing::minimize_content_id(&cid)
    }
}

/// Parse a human token amount: plain non-negative decimals only
///
/// Scientific notation, signs and thousands separators are rejected so
/// the amount shown to the user is exactly the amount hashed.
pub fn parse_amount(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let frac = parts.next();

    let whole_ok = !whole.is_empty() && whole.bytes().all(|b| b.is_ascii_digit());
    let frac_ok =
        frac.is_none_or(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()));
    if !whole_ok || !frac_ok {
        return Err(BeaverError::InvalidAmount(raw.to_string()));
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| BeaverError::InvalidAmount(raw.to_string()))
}
