//! Output formatting utilities for the Beaver CLI

use std::fmt::Write;

use alloy_primitives::{Address, B256};
use anyhow::{anyhow, Result};
use beaver_sdk::lifecycle::{LifecycleAssessment, NextAction};
use beaver_sdk::{ChainRegistry, CheckoutPrompt, Subscription};
use chrono::DateTime;

use crate::config::BeaverCliConfig;

/// Output format selector shared by every command
#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Format a resolved checkout prompt for human-readable output
///
/// `product_hashes` carries the product identity the router would
/// assign on each candidate chain, labeled by chain name.
#[must_use]
pub fn format_prompt_human(
    prompt: &CheckoutPrompt,
    registry: &ChainRegistry,
    product_hashes: &[(String, B256)],
) -> String {
    let mut output = format!("Checkout terms for {}\n\n", prompt.merchant_domain);

    writeln!(&mut output, "  Product:       {}", prompt.product_name).unwrap();
    writeln!(&mut output, "  Merchant:      {}", prompt.merchant_address).unwrap();
    writeln!(
        &mut output,
        "  Price:         {} {} every {}",
        prompt.human_amount,
        prompt.token_symbol,
        prompt.period_human()
    )
    .unwrap();
    if let Some(trial) = prompt.free_trial_human() {
        writeln!(&mut output, "  Free trial:    {trial}").unwrap();
    }

    let chain_labels: Vec<String> = prompt
        .available_chains
        .iter()
        .map(|&id| {
            registry
                .by_id(id)
                .map_or_else(|| id.to_string(), |chain| chain.name.clone())
        })
        .collect();
    writeln!(&mut output, "  Chains:        {}", chain_labels.join(", ")).unwrap();

    if let Some(redirect) = &prompt.on_success_url {
        writeln!(&mut output, "  On success:    {redirect}").unwrap();
    }
    if let Some(id) = &prompt.subscription_id {
        writeln!(&mut output, "  External sub:  {id}").unwrap();
    }
    if let Some(id) = &prompt.user_id {
        writeln!(&mut output, "  External user: {id}").unwrap();
    }
    writeln!(
        &mut output,
        "  Product meta:  {}",
        prompt.product_metadata
    )
    .unwrap();
    writeln!(
        &mut output,
        "  Sub meta:      {}",
        prompt.subscription_metadata
    )
    .unwrap();

    write!(&mut output, "\nProduct hash per chain:").unwrap();
    for (chain_name, product_hash) in product_hashes {
        write!(&mut output, "\n  {chain_name}: {product_hash}").unwrap();
    }
    output
}

/// Format a resolved checkout prompt for JSON output
///
/// # Errors
///
/// Returns an error if JSON serialization fails
pub fn format_prompt_json(
    prompt: &CheckoutPrompt,
    product_hashes: &[(String, B256)],
) -> Result<String> {
    let mut value = serde_json::to_value(prompt)
        .map_err(|e| anyhow!("Failed to serialize prompt to JSON: {e}"))?;
    if let Some(map) = value.as_object_mut() {
        let hashes: serde_json::Map<String, serde_json::Value> = product_hashes
            .iter()
            .map(|(chain_name, hash)| {
                (chain_name.clone(), serde_json::json!(hash.to_string()))
            })
            .collect();
        map.insert("product_hashes".to_string(), hashes.into());
    }
    serde_json::to_string_pretty(&value)
        .map_err(|e| anyhow!("Failed to serialize prompt to JSON: {e}"))
}

/// Format a list of subscriptions with their local assessments for
/// human-readable output
#[must_use]
pub fn format_subscriptions_human(
    entries: &[(Subscription, LifecycleAssessment)],
    user: &Address,
    config: &BeaverCliConfig,
) -> String {
    if entries.is_empty() {
        return format!("No subscriptions found for wallet: {user}");
    }

    let mut output = format!("Subscriptions for wallet: {user}\n\n");
    writeln!(
        &mut output,
        "{:<16} {:<24} {:<22} {:<24} {:<16} {:<20}",
        "Hash", "Product", "Merchant", "Price", "Status", "Next Payment"
    )
    .unwrap();
    output.push_str(&"-".repeat(124));
    output.push('\n');

    for (subscription, assessment) in entries {
        let product = &subscription.product;
        let price = format!(
            "{} {} / {}",
            product.human_amount,
            product.token_symbol,
            product.period_human()
        );
        let next_payment = if assessment.next_action == NextAction::Closed {
            "-".to_string()
        } else {
            format_timestamp(assessment.next_payment_due)
        };

        writeln!(
            &mut output,
            "{:<16} {:<24} {:<22} {:<24} {:<16} {:<20}",
            config.short_hash(&subscription.subscription_hash),
            product.product_name,
            product.merchant_domain,
            price,
            assessment.status.to_string(),
            next_payment
        )
        .unwrap();
    }

    write!(&mut output, "\nTotal subscriptions: {}", entries.len()).unwrap();
    output
}

/// Format a list of subscriptions with their local assessments for JSON
/// output
///
/// # Errors
///
/// Returns an error if JSON serialization fails
pub fn format_subscriptions_json(
    entries: &[(Subscription, LifecycleAssessment)],
) -> Result<String> {
    let rows: Vec<serde_json::Value> = entries
        .iter()
        .map(|(subscription, assessment)| subscription_json(subscription, assessment))
        .collect();

    serde_json::to_string_pretty(&rows)
        .map_err(|e| anyhow!("Failed to serialize subscriptions to JSON: {e}"))
}

/// Format one subscription with its full assessment for human-readable
/// output
#[must_use]
pub fn format_subscription_detail_human(
    subscription: &Subscription,
    assessment: &LifecycleAssessment,
) -> String {
    let product = &subscription.product;
    let mut output = format!("Subscription {}\n\n", subscription.subscription_hash);

    writeln!(&mut output, "  Product:       {}", product.product_name).unwrap();
    writeln!(&mut output, "  Merchant:      {}", product.merchant_domain).unwrap();
    writeln!(
        &mut output,
        "  Price:         {} {} every {}",
        product.human_amount,
        product.token_symbol,
        product.period_human()
    )
    .unwrap();
    if let Some(trial) = product.free_trial_human() {
        writeln!(&mut output, "  Free trial:    {trial}").unwrap();
    }
    writeln!(&mut output, "  User:          {}", subscription.user_address).unwrap();
    writeln!(
        &mut output,
        "  Started:       {}",
        format_timestamp(subscription.start_ts)
    )
    .unwrap();
    writeln!(
        &mut output,
        "  Payments made: {}",
        subscription.payments_made
    )
    .unwrap();
    writeln!(&mut output, "  Status:        {}", assessment.status).unwrap();
    writeln!(
        &mut output,
        "  Usable:        {}",
        if assessment.is_active { "yes" } else { "no" }
    )
    .unwrap();
    if let Some(until) = assessment.active_until {
        writeln!(
            &mut output,
            "  Usable until:  {}",
            format_timestamp(until)
        )
        .unwrap();
    }
    writeln!(
        &mut output,
        "  Next payment:  {}",
        format_timestamp(assessment.next_payment_due)
    )
    .unwrap();
    writeln!(
        &mut output,
        "  Must pay by:   {}",
        format_timestamp(assessment.must_pay_by)
    )
    .unwrap();
    write!(
        &mut output,
        "  Next action:   {}",
        action_label(assessment.next_action)
    )
    .unwrap();
    output
}

/// Format one subscription with its full assessment for JSON output
///
/// # Errors
///
/// Returns an error if JSON serialization fails
pub fn format_subscription_detail_json(
    subscription: &Subscription,
    assessment: &LifecycleAssessment,
) -> Result<String> {
    serde_json::to_string_pretty(&subscription_json(subscription, assessment))
        .map_err(|e| anyhow!("Failed to serialize subscription to JSON: {e}"))
}

/// One subscription plus its assessment as a JSON value
fn subscription_json(
    subscription: &Subscription,
    assessment: &LifecycleAssessment,
) -> serde_json::Value {
    let product = &subscription.product;
    serde_json::json!({
        "subscription_hash": subscription.subscription_hash.to_string(),
        "product_hash": product.product_hash.to_string(),
        "product_name": product.product_name,
        "merchant_domain": product.merchant_domain,
        "merchant_address": product.merchant_address.to_string(),
        "token_symbol": product.token_symbol,
        "human_amount": product.human_amount,
        "period": product.period_human(),
        "user_address": subscription.user_address.to_string(),
        "start_ts": subscription.start_ts,
        "started": format_timestamp(subscription.start_ts),
        "payments_made": subscription.payments_made,
        "status": assessment.status.to_string(),
        "is_active": assessment.is_active,
        "active_until": assessment.active_until,
        "next_payment_due": assessment.next_payment_due,
        "next_payment_due_at": format_timestamp(assessment.next_payment_due),
        "must_pay_by": assessment.must_pay_by,
        "must_pay_by_at": format_timestamp(assessment.must_pay_by),
        "next_action": action_label(assessment.next_action),
        "can_terminate": assessment.can_terminate,
    })
}

/// Short label for what the user should do next
#[must_use]
pub const fn action_label(action: NextAction) -> &'static str {
    match action {
        NextAction::Pay => "pay",
        NextAction::Wait => "wait",
        NextAction::Closed => "closed",
    }
}

/// Format a unix timestamp as a UTC date, tolerating the saturated
/// values the lifecycle math produces
#[must_use]
pub fn format_timestamp(timestamp: i64) -> String {
    if timestamp <= 0 {
        return "N/A".to_string();
    }
    DateTime::from_timestamp(timestamp, 0).map_or_else(
        || "never".to_string(),
        |datetime| datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_formatting() {
        assert_eq!(format_timestamp(0), "N/A");
        assert_eq!(format_timestamp(-5), "N/A");
        assert_eq!(format_timestamp(1_700_000_000), "2023-11-14 22:13:20 UTC");
        // Saturated lifecycle deadlines fall outside chrono's range
        assert_eq!(format_timestamp(i64::MAX), "never");
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(action_label(NextAction::Pay), "pay");
        assert_eq!(action_label(NextAction::Wait), "wait");
        assert_eq!(action_label(NextAction::Closed), "closed");
    }
}
