//! List subscriptions command implementation

use alloy_primitives::Address;
use anyhow::{anyhow, Result};
use beaver_sdk::{lifecycle, IndexerClient};
use chrono::Utc;
use tracing::info;

use crate::config::BeaverCliConfig;
use crate::utils::formatting::{
    format_subscriptions_human, format_subscriptions_json, OutputFormat,
};

/// Execute the list subscriptions command
///
/// Status is assessed locally from the base fields rather than taken
/// from the indexer, so the output is correct even against a stale
/// server.
///
/// # Errors
/// Returns an error if the wallet address does not parse or the indexer
/// request fails
pub async fn execute(
    indexer: &IndexerClient,
    user_str: &str,
    output_format: &OutputFormat,
    config: &BeaverCliConfig,
) -> Result<String> {
    let user: Address = user_str
        .parse()
        .map_err(|e| anyhow!("Invalid wallet address '{user_str}': {e}"))?;
    info!("Listing subscriptions for wallet: {}", user);

    let mut subscriptions = indexer.subscriptions_for_user(user).await?;
    info!("Found {} subscriptions", subscriptions.len());

    // Sort by start time for consistent output
    subscriptions.sort_by_key(|subscription| subscription.start_ts);

    let now = Utc::now().timestamp();
    let entries: Vec<_> = subscriptions
        .into_iter()
        .map(|subscription| {
            let assessment = lifecycle::assess(&subscription, now);
            (subscription, assessment)
        })
        .collect();

    match output_format {
        OutputFormat::Human => Ok(format_subscriptions_human(&entries, &user, config)),
        OutputFormat::Json => format_subscriptions_json(&entries),
    }
}
