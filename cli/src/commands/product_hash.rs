//! Product hash command implementation

use std::fmt::Write;

use alloy_primitives::{Address, B256};
use anyhow::{anyhow, Result};
use beaver_sdk::{hashing, parse_amount, period, ChainRegistry, DEFAULT_PAYMENT_PERIOD_SECS};
use tracing::info;

use crate::utils::formatting::OutputFormat;

/// Explicit product terms to hash
#[derive(Debug)]
pub struct ProductHashRequest<'a> {
    /// Chain name or id
    pub chain: &'a str,
    /// Merchant payout address
    pub merchant: &'a str,
    /// Payment token symbol, resolved against the chain's token list
    pub token: &'a str,
    /// Charge per period in human units
    pub amount: &'a str,
    /// Billing period, e.g. "30d" or "month"
    pub period: &'a str,
    /// Free trial length, "0" for none
    pub free_trial: &'a str,
    /// Collection window; one week when absent
    pub payment_period: Option<&'a str>,
    /// Product metadata CID folded into the identity; zero when absent
    pub metadata: Option<&'a str>,
}

/// Execute the product hash command
///
/// Computes the identity the router would assign these terms, useful
/// for checking whether a product is already registered on chain.
///
/// # Errors
/// Returns an error when any term fails the same validation the
/// checkout resolver applies
pub fn execute(
    registry: &ChainRegistry,
    request: &ProductHashRequest<'_>,
    output_format: &OutputFormat,
) -> Result<String> {
    let chain = registry
        .resolve(request.chain)
        .ok_or_else(|| anyhow!("Chain '{}' is not supported", request.chain))?;

    let merchant: Address = request
        .merchant
        .parse()
        .map_err(|e| anyhow!("Invalid merchant address '{}': {e}", request.merchant))?;

    let token = chain.token(request.token).ok_or_else(|| {
        let configured: Vec<&str> = chain
            .tokens
            .iter()
            .map(|token| token.symbol.as_str())
            .collect();
        anyhow!(
            "Token '{}' is not configured on {}; available: {}",
            request.token,
            chain.name,
            configured.join(", ")
        )
    })?;

    let human_amount = parse_amount(request.amount)?;
    let period_secs = period::seconds_from_human(request.period)?;
    let free_trial_secs = period::seconds_from_human(request.free_trial)?;
    let payment_period_secs = request
        .payment_period
        .map_or(Ok(DEFAULT_PAYMENT_PERIOD_SECS), period::seconds_from_human)?;
    let product_metadata = request
        .metadata
        .map_or(Ok(B256::ZERO), hashing::minimize_content_id)?;

    let uint_amount = token.to_raw_units(human_amount);
    let product_hash = hashing::product_hash(
        chain.chain_id,
        merchant,
        token.address,
        uint_amount,
        period_secs,
        free_trial_secs,
        payment_period_secs,
        product_metadata,
    )?;
    info!("Computed product hash: {}", product_hash);

    match output_format {
        OutputFormat::Human => {
            let mut output = format!("Product hash: {product_hash}\n\n");
            writeln!(&mut output, "  Chain:          {} (id {})", chain.name, chain.chain_id)
                .unwrap();
            writeln!(&mut output, "  Merchant:       {merchant}").unwrap();
            writeln!(
                &mut output,
                "  Token:          {} ({})",
                token.symbol, token.address
            )
            .unwrap();
            writeln!(
                &mut output,
                "  Amount:         {human_amount} ({uint_amount} raw)"
            )
            .unwrap();
            writeln!(
                &mut output,
                "  Period:         {}",
                period::human_from_seconds(period_secs)
            )
            .unwrap();
            writeln!(
                &mut output,
                "  Free trial:     {}",
                period::human_from_seconds(free_trial_secs)
            )
            .unwrap();
            writeln!(
                &mut output,
                "  Payment period: {}",
                period::human_from_seconds(payment_period_secs)
            )
            .unwrap();
            write!(&mut output, "  Metadata:       {product_metadata}").unwrap();
            Ok(output)
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "product_hash": product_hash.to_string(),
            "chain": chain.name,
            "chain_id": chain.chain_id,
            "merchant_address": merchant.to_string(),
            "token_symbol": token.symbol,
            "token_address": token.address.to_string(),
            "human_amount": human_amount,
            "uint_amount": uint_amount.to_string(),
            "period_secs": period_secs,
            "free_trial_secs": free_trial_secs,
            "payment_period_secs": payment_period_secs,
            "product_metadata": product_metadata.to_string(),
        }))?),
    }
}
