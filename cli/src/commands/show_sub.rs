//! Show subscription command implementation

use alloy_primitives::B256;
use anyhow::{anyhow, Result};
use beaver_sdk::{lifecycle, IndexerClient};
use tracing::info;

use crate::utils::formatting::{
    format_subscription_detail_human, format_subscription_detail_json, OutputFormat,
};

/// Execute the show subscription command
///
/// # Errors
/// Returns an error if the hash does not parse, the indexer request
/// fails, or no subscription exists under the hash
pub async fn execute(
    indexer: &IndexerClient,
    hash_str: &str,
    output_format: &OutputFormat,
) -> Result<String> {
    let subscription_hash: B256 = hash_str
        .parse()
        .map_err(|e| anyhow!("Invalid subscription hash '{hash_str}': {e}"))?;
    info!("Fetching subscription: {}", subscription_hash);

    let subscription = indexer
        .subscription(subscription_hash)
        .await?
        .ok_or_else(|| anyhow!("No subscription found with hash {subscription_hash}"))?;

    let assessment = lifecycle::assess_now(&subscription);

    match output_format {
        OutputFormat::Human => Ok(format_subscription_detail_human(
            &subscription,
            &assessment,
        )),
        OutputFormat::Json => format_subscription_detail_json(&subscription, &assessment),
    }
}
