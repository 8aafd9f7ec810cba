//! HTTP client for the indexer service
//!
//! The indexer watches router contracts and serves subscription state,
//! stores metadata blobs on IPFS, and keeps shortcut checkout forms. All
//! endpoints speak plain JSON; the two storage endpoints answer with a
//! bare quoted string, which [`unquote`] normalizes.

use alloy_primitives::{Address, B256};
use once_cell::sync::Lazy;
use serde::Serialize;
use url::Url;

use crate::error::{BeaverError, Result};
use crate::types::{ShortcutPrompt, Subscription};

/// Environment variable overriding the indexer base URL
pub const INDEXER_URL_ENV: &str = "BEAVER_INDEXER_URL";

/// Production indexer endpoint
pub const DEFAULT_INDEXER_URL: &str = "https://api.paybeaver.xyz";

static ENV_INDEXER_URL: Lazy<Url> = Lazy::new(|| {
    std::env::var(INDEXER_URL_ENV)
        .ok()
        .and_then(|raw| Url::parse(&raw).ok())
        .unwrap_or_else(|| {
            // The fallback literal always parses
            Url::parse(DEFAULT_INDEXER_URL).unwrap_or_else(|_| unreachable!())
        })
});

/// Metadata and shortcut storage, as prompt resolution sees it
///
/// [`IndexerClient`] is the real implementation; tests substitute an
/// in-memory table.
#[allow(async_fn_in_trait)]
pub trait MetadataStore {
    /// Store a metadata blob, returning its IPFS CID
    async fn store_metadata(&self, metadata: &serde_json::Value) -> Result<String>;

    /// Fetch a stored checkout form by id, `None` when there is none
    async fn load_shortcut(&self, shortcut_id: &str) -> Result<Option<ShortcutPrompt>>;
}

/// Client for one indexer deployment
#[derive(Debug, Clone)]
pub struct IndexerClient {
    http: reqwest::Client,
    base_url: Url,
}

impl IndexerClient {
    /// Build a client against an explicit base URL
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Build a client from `BEAVER_INDEXER_URL`, falling back to the
    /// production endpoint
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ENV_INDEXER_URL.clone())
    }

    /// The base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// All subscriptions a wallet ever started
    pub async fn subscriptions_for_user(&self, user: Address) -> Result<Vec<Subscription>> {
        let url = self.endpoint(&["subscriptions", "user", &user.to_string()])?;
        tracing::debug!(%user, "fetching subscriptions for user");
        let response = self.http.get(url).send().await?;
        Self::expect_success(response).await?.json().await.map_err(Into::into)
    }

    /// One subscription by hash, `None` when the indexer has not seen it
    pub async fn subscription(&self, subscription_hash: B256) -> Result<Option<Subscription>> {
        let url = self.endpoint(&["subscription", &subscription_hash.to_string()])?;
        let response = self.http.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let subscription = Self::expect_success(response).await?.json().await?;
        Ok(Some(subscription))
    }

    /// Every subscription the indexer knows about
    pub async fn all_subscriptions(&self) -> Result<Vec<Subscription>> {
        let url = self.endpoint(&["subscriptions", "all"])?;
        let response = self.http.get(url).send().await?;
        Self::expect_success(response).await?.json().await.map_err(Into::into)
    }

    /// Store a metadata blob, returning its IPFS CID
    pub async fn save_metadata<T: Serialize>(&self, metadata: &T) -> Result<String> {
        let url = self.endpoint(&["save_metadata"])?;
        let response = self.http.post(url).json(metadata).send().await?;
        let body = Self::expect_success(response).await?.text().await?;
        let cid = unquote(&body).to_string();
        tracing::debug!(%cid, "stored metadata");
        Ok(cid)
    }

    /// Store a checkout form, returning its shortcut id
    pub async fn create_shortcut(&self, prompt: &ShortcutPrompt) -> Result<String> {
        let url = self.endpoint(&["shortcut"])?;
        let response = self.http.post(url).json(prompt).send().await?;
        let body = Self::expect_success(response).await?.text().await?;
        Ok(unquote(&body).to_string())
    }

    /// Fetch a stored checkout form by id
    ///
    /// Any non-success answer reads as "no such form", matching how the
    /// checkout flow treats a stale or mistyped id.
    pub async fn shortcut(&self, shortcut_id: &str) -> Result<Option<ShortcutPrompt>> {
        let url = self.endpoint(&["shortcut", shortcut_id])?;
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let prompt = response.json().await?;
        Ok(Some(prompt))
    }

    /// Append path segments to the base URL
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                BeaverError::Generic("indexer URL cannot be a base".to_string())
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    /// Turn a non-success response into a typed error with its body
    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BeaverError::Indexer {
            status: status.as_u16(),
            body,
        })
    }
}

impl Default for IndexerClient {
    fn default() -> Self {
        Self::from_env()
    }
}

impl MetadataStore for IndexerClient {
    async fn store_metadata(&self, metadata: &serde_json::Value) -> Result<String> {
        self.save_metadata(metadata).await
    }

    async fn load_shortcut(&self, shortcut_id: &str) -> Result<Option<ShortcutPrompt>> {
        self.shortcut(shortcut_id).await
    }
}

/// Strip the quotes the storage endpoints wrap their answers in
#[must_use]
pub fn unquote(text: &str) -> &str {
    text.trim().trim_matches('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_segments() {
        let client = IndexerClient::new(Url::parse("https://api.paybeaver.xyz").unwrap());
        let url = client
            .endpoint(&["subscriptions", "user", "0xabc"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.paybeaver.xyz/subscriptions/user/0xabc"
        );
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash() {
        let client = IndexerClient::new(Url::parse("http://127.0.0.1:8000/").unwrap());
        let url = client.endpoint(&["shortcut", "fj3k2"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/shortcut/fj3k2");
    }

    #[test]
    fn test_unquote_strips_wrapping_quotes() {
        assert_eq!(unquote("\"QmYwAPJzv5CZsnA625s3Xf2nemtYg\""), "QmYwAPJzv5CZsnA625s3Xf2nemtYg");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote(" \"fj3k2\"\n"), "fj3k2");
        assert_eq!(unquote(""), "");
    }

    #[test]
    fn test_env_fallback_is_production() {
        assert_eq!(DEFAULT_INDEXER_URL, "https://api.paybeaver.xyz");
    }
}
