//! Configuration management for the Beaver CLI
//!
//! Centralizes the endpoint and display settings so they are
//! configurable via environment variables with sensible defaults.

use std::env;

use alloy_primitives::B256;
use beaver_sdk::dns::{DEFAULT_DOH_URL, DOH_URL_ENV};
use beaver_sdk::indexer::{DEFAULT_INDEXER_URL, INDEXER_URL_ENV};

/// Centralized configuration for the Beaver CLI
#[derive(Debug, Clone)]
pub struct BeaverCliConfig {
    /// Default indexer base URL
    pub default_indexer_url: String,

    /// Default DNS-over-HTTPS endpoint for merchant domain resolution
    pub default_doh_url: String,

    /// Default output format for CLI commands
    pub default_output_format: String,

    /// How many hex characters of a hash to keep in table output
    pub short_hash_chars: usize,
}

impl BeaverCliConfig {
    /// Create a new configuration instance with values from environment
    /// variables or sensible defaults if not set
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_indexer_url: env::var(INDEXER_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_INDEXER_URL.to_string()),

            default_doh_url: env::var(DOH_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_DOH_URL.to_string()),

            default_output_format: env::var("BEAVER_DEFAULT_OUTPUT_FORMAT")
                .unwrap_or_else(|_| "human".to_string()),

            short_hash_chars: env::var("BEAVER_SHORT_HASH_CHARS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }

    /// Shorten a 32-byte hash for table display, keeping the 0x prefix
    #[must_use]
    pub fn short_hash(&self, hash: &B256) -> String {
        let full = hash.to_string();
        let keep = self.short_hash_chars.saturating_add(2).min(full.len());
        if keep == full.len() {
            return full;
        }
        format!("{}..", &full[..keep])
    }
}

impl Default for BeaverCliConfig {
    fn default() -> Self {
        Self::new()
    }
}
