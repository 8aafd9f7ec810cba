//! Create shortcut command implementation

use anyhow::Result;
use beaver_sdk::{IndexerClient, ShortcutPrompt};
use tracing::info;

use crate::utils::formatting::OutputFormat;

/// Execute the create shortcut command
///
/// Stores the checkout form exactly as entered; validation happens when
/// a checkout resolves the shortcut, matching how the resolver treats
/// stored terms.
///
/// # Errors
/// Returns an error if the indexer rejects the form
pub async fn execute(
    indexer: &IndexerClient,
    prompt: &ShortcutPrompt,
    output_format: &OutputFormat,
) -> Result<String> {
    info!(
        "Storing checkout form for domain: {} product: {}",
        prompt.domain, prompt.product
    );

    let shortcut_id = indexer.create_shortcut(prompt).await?;

    match output_format {
        OutputFormat::Human => Ok(format!(
            "Created checkout form {shortcut_id}\nResolve it with: beaver-cli resolve --shortcut {shortcut_id}"
        )),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "shortcut_id": shortcut_id,
        }))?),
    }
}
