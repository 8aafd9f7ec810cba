//! Resolve command implementation

use alloy_primitives::B256;
use anyhow::{anyhow, Result};
use beaver_sdk::{
    hashing, ChainRegistry, CheckoutPrompt, DohResolver, IndexerClient, PromptResolver,
    RawPromptInput,
};
use tracing::info;

use crate::utils::formatting::{format_prompt_human, format_prompt_json, OutputFormat};

/// Execute the resolve command
///
/// Turns a checkout link or its individual parameters into fully
/// validated subscription terms, exactly as a checkout page would before
/// letting the user sign. The output includes the product identity the
/// router would assign on each candidate chain.
///
/// # Errors
/// Returns an error when a required parameter is missing, the merchant
/// domain does not resolve, or any term fails validation
pub async fn execute(
    resolver: &PromptResolver<DohResolver, IndexerClient>,
    input: RawPromptInput,
    output_format: &OutputFormat,
) -> Result<String> {
    if let Some(shortcut_id) = input.shortcut_id.as_deref() {
        info!("Resolving stored checkout form: {}", shortcut_id);
    } else {
        info!(
            "Resolving inline checkout terms for domain: {}",
            input.domain.as_deref().unwrap_or("<missing>")
        );
    }

    let prompt = resolver.resolve(input).await?;
    let product_hashes = per_chain_product_hashes(&prompt, resolver.registry())?;

    match output_format {
        OutputFormat::Human => Ok(format_prompt_human(
            &prompt,
            resolver.registry(),
            &product_hashes,
        )),
        OutputFormat::Json => format_prompt_json(&prompt, &product_hashes),
    }
}

/// The product identity the router would assign on each candidate chain
///
/// The token address and decimals differ per chain, so the same terms
/// hash differently on each one.
fn per_chain_product_hashes(
    prompt: &CheckoutPrompt,
    registry: &ChainRegistry,
) -> Result<Vec<(String, B256)>> {
    let mut hashes = Vec::with_capacity(prompt.available_chains.len());
    for &chain_id in &prompt.available_chains {
        let chain = registry
            .by_id(chain_id)
            .ok_or_else(|| anyhow!("Chain {chain_id} is not in the registry"))?;
        let token = chain.token(&prompt.token_symbol).ok_or_else(|| {
            anyhow!(
                "Token {} is not configured on {}",
                prompt.token_symbol,
                chain.name
            )
        })?;

        let product_hash = hashing::product_hash(
            chain_id,
            prompt.merchant_address,
            token.address,
            token.to_raw_units(prompt.human_amount),
            prompt.period_secs,
            prompt.free_trial_secs,
            prompt.payment_period_secs,
            prompt.product_metadata,
        )?;
        hashes.push((chain.name.clone(), product_hash));
    }
    Ok(hashes)
}
