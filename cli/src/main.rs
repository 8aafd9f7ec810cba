//! Beaver CLI - Command-line interface for the Beaver subscription protocol
//!
//! Resolves checkout links, inspects subscriptions with locally assessed
//! lifecycle state, stores reusable checkout forms, and computes product
//! identities for EVM chains.

#![forbid(unsafe_code)]

mod commands;
mod config;
mod utils;

use anyhow::Result;
use beaver_sdk::{ChainRegistry, DohResolver, IndexerClient, PromptResolver, RawPromptInput};
use clap::{Parser, Subcommand};
use config::BeaverCliConfig;
use utils::formatting::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "beaver-cli",
    version,
    about = "Command-line interface for the Beaver subscription protocol",
    author = "Beaver Team"
)]
struct Cli {
    /// Indexer base URL
    #[arg(long)]
    indexer_url: Option<String>,

    /// DNS-over-HTTPS endpoint for merchant domain resolution
    #[arg(long)]
    doh_url: Option<String>,

    /// Output format
    #[arg(long, value_enum)]
    output: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a checkout link into validated subscription terms
    Resolve {
        /// Full checkout link; its query parameters supply the terms
        #[arg(long)]
        url: Option<String>,

        /// Stored checkout form id
        #[arg(long)]
        shortcut: Option<String>,

        /// Merchant domain carrying the payment address TXT record
        #[arg(long)]
        domain: Option<String>,

        /// Product display name
        #[arg(long)]
        product: Option<String>,

        /// Payment token symbol
        #[arg(long)]
        token: Option<String>,

        /// Charge per period in human units, e.g. "9.99"
        #[arg(long)]
        amount: Option<String>,

        /// Billing period, e.g. "30d", "1 month"
        #[arg(long)]
        period: Option<String>,

        /// Comma-separated chain names or ids
        #[arg(long)]
        chains: Option<String>,

        /// Free trial length, e.g. "1w"
        #[arg(long)]
        free_trial: Option<String>,

        /// Redirect target after a successful start
        #[arg(long)]
        on_success_url: Option<String>,

        /// Merchant-side correlation id
        #[arg(long)]
        subscription_id: Option<String>,

        /// Merchant-side user id
        #[arg(long)]
        user_id: Option<String>,
    },

    /// List a wallet's subscriptions with locally assessed status
    ListSubs {
        /// Wallet address
        #[arg(long)]
        user: String,
    },

    /// Show one subscription with its full lifecycle assessment
    ShowSub {
        /// Subscription hash
        #[arg(long)]
        hash: String,
    },

    /// Store a reusable checkout form and print its id
    CreateShortcut {
        /// Merchant domain carrying the payment address TXT record
        #[arg(long)]
        domain: String,

        /// Product display name
        #[arg(long)]
        product: String,

        /// Payment token symbol
        #[arg(long)]
        token: String,

        /// Charge per period in human units
        #[arg(long)]
        amount: String,

        /// Billing period, e.g. "30d", "1 month"
        #[arg(long)]
        period: String,

        /// Comma-separated chain names or ids
        #[arg(long)]
        chains: String,

        /// Free trial length, e.g. "1w"
        #[arg(long)]
        free_trial: Option<String>,

        /// Redirect target after a successful start
        #[arg(long)]
        on_success_url: Option<String>,

        /// Merchant-side correlation id
        #[arg(long)]
        subscription_id: Option<String>,

        /// Merchant-side user id
        #[arg(long)]
        user_id: Option<String>,
    },

    /// Compute the product identity hash for explicit terms
    ProductHash {
        /// Chain name or id
        #[arg(long)]
        chain: String,

        /// Merchant payout address
        #[arg(long)]
        merchant: String,

        /// Payment token symbol
        #[arg(long)]
        token: String,

        /// Charge per period in human units
        #[arg(long)]
        amount: String,

        /// Billing period, e.g. "30d", "1 month"
        #[arg(long)]
        period: String,

        /// Free trial length
        #[arg(long, default_value = "0")]
        free_trial: String,

        /// Collection window; defaults to one week
        #[arg(long)]
        payment_period: Option<String>,

        /// Product metadata CID to fold into the identity
        #[arg(long)]
        metadata: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = BeaverCliConfig::new();

    // Use configuration with CLI overrides
    let default_output_format = parse_output_format(&config.default_output_format)?;
    let output_format = cli.output.as_ref().unwrap_or(&default_output_format);

    // Execute command
    let result = execute_command(&cli, &config, output_format).await;

    // Handle output formatting
    match result {
        Ok(output) => println!("{output}"),
        Err(e) => {
            match output_format {
                OutputFormat::Human => eprintln!("Error: {e}"),
                OutputFormat::Json => {
                    let json_output = serde_json::json!({
                        "success": false,
                        "error": e.to_string()
                    });
                    println!("{}", serde_json::to_string_pretty(&json_output)?);
                }
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Parse output format from string
fn parse_output_format(format_str: &str) -> Result<OutputFormat> {
    match format_str.to_lowercase().as_str() {
        "human" => Ok(OutputFormat::Human),
        "json" => Ok(OutputFormat::Json),
        _ => Err(anyhow::anyhow!("Invalid output format: {}", format_str)),
    }
}

async fn execute_command(
    cli: &Cli,
    config: &BeaverCliConfig,
    output_format: &OutputFormat,
) -> Result<String> {
    let indexer_url = cli
        .indexer_url
        .as_deref()
        .unwrap_or(&config.default_indexer_url);
    let indexer = IndexerClient::new(indexer_url.parse()?);

    match &cli.command {
        Commands::Resolve {
            url,
            shortcut,
            domain,
            product,
            token,
            amount,
            period,
            chains,
            free_trial,
            on_success_url,
            subscription_id,
            user_id,
        } => {
            let doh_url = cli.doh_url.as_deref().unwrap_or(&config.default_doh_url);
            let resolver = PromptResolver::new(
                DohResolver::new(doh_url.parse()?),
                indexer.clone(),
                ChainRegistry::defaults(),
            );

            // A full link carries everything; otherwise assemble the
            // input from the individual flags
            let input = if let Some(url) = url {
                RawPromptInput::from_url(&url.parse()?)
            } else {
                RawPromptInput {
                    shortcut_id: shortcut.clone(),
                    domain: domain.clone(),
                    product: product.clone(),
                    token: token.clone(),
                    amount: amount.clone(),
                    period: period.clone(),
                    chains: chains.clone(),
                    free_trial_length: free_trial.clone(),
                    on_success_url: on_success_url.clone(),
                    subscription_id: subscription_id.clone(),
                    user_id: user_id.clone(),
                }
            };
            commands::execute_resolve(&resolver, input, output_format).await
        }

        Commands::ListSubs { user } => {
            commands::execute_list_subs(&indexer, user, output_format, config).await
        }

        Commands::ShowSub { hash } => {
            commands::execute_show_sub(&indexer, hash, output_format).await
        }

        Commands::CreateShortcut {
            domain,
            product,
            token,
            amount,
            period,
            chains,
            free_trial,
            on_success_url,
            subscription_id,
            user_id,
        } => {
            let prompt = beaver_sdk::ShortcutPrompt {
                domain: domain.clone(),
                product: product.clone(),
                token: token.clone(),
                amount: amount.clone(),
                period: period.clone(),
                chains: chains.clone(),
                free_trial_length: free_trial.clone(),
                on_success_url: on_success_url.clone(),
                subscription_id: subscription_id.clone(),
                user_id: user_id.clone(),
            };
            commands::execute_create_shortcut(&indexer, &prompt, output_format).await
        }

        Commands::ProductHash {
            chain,
            merchant,
            token,
            amount,
            period,
            free_trial,
            payment_period,
            metadata,
        } => {
            let request = commands::product_hash::ProductHashRequest {
                chain,
                merchant,
                token,
                amount,
                period,
                free_trial,
                payment_period: payment_period.as_deref(),
                metadata: metadata.as_deref(),
            };
            commands::execute_product_hash(&ChainRegistry::defaults(), &request, output_format)
        }
    }
}
