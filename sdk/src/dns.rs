//! Merchant identity resolution over DNS
//!
//! A merchant proves control of a domain by publishing a TXT record of
//! the form `beaver-ethereum-address=0x...`. Resolution goes through
//! DNS-over-HTTPS so it works from any environment that can reach an
//! HTTPS endpoint; the record-filtering step is a pure function so the
//! acceptance rules can be tested without the network.

use alloy_primitives::Address;
use serde::Deserialize;
use url::Url;

use crate::error::{BeaverError, Result};

/// TXT record key a merchant publishes to claim an address
pub const DNS_TXT_KEY: &str = "beaver-ethereum-address=";

/// Default DNS-over-HTTPS endpoint (Google JSON API)
pub const DEFAULT_DOH_URL: &str = "https://dns.google/resolve";

/// Environment variable overriding the DoH endpoint
pub const DOH_URL_ENV: &str = "BEAVER_DOH_URL";

/// Resolves a merchant domain to its payment address
///
/// Prompt resolution only needs this seam, so tests substitute a fixed
/// table for the real resolver.
#[allow(async_fn_in_trait)]
pub trait DomainResolver {
    /// Resolve `domain` to the address its TXT record claims
    ///
    /// # Errors
    ///
    /// Returns [`BeaverError::DomainResolution`] when the domain has no
    /// usable claim, and transport errors as [`BeaverError::Http`].
    async fn resolve_domain(&self, domain: &str) -> Result<Address>;
}

/// Google DoH JSON response, reduced to the fields we read
#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Status")]
    status: i64,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    data: String,
}

/// [`DomainResolver`] backed by a DNS-over-HTTPS endpoint
#[derive(Debug, Clone)]
pub struct DohResolver {
    http: reqwest::Client,
    endpoint: Url,
}

impl DohResolver {
    /// Build a resolver against an explicit DoH endpoint
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Build a resolver from `BEAVER_DOH_URL`, falling back to the
    /// default endpoint
    #[must_use]
    pub fn from_env() -> Self {
        let endpoint = std::env::var(DOH_URL_ENV)
            .ok()
            .and_then(|raw| Url::parse(&raw).ok())
            .unwrap_or_else(default_doh_url);
        Self::new(endpoint)
    }

    /// The endpoint queries are sent to
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Default for DohResolver {
    fn default() -> Self {
        Self::from_env()
    }
}

fn default_doh_url() -> Url {
    // The fallback literal always parses
    Url::parse(DEFAULT_DOH_URL).unwrap_or_else(|_| unreachable!())
}

impl DomainResolver for DohResolver {
    async fn resolve_domain(&self, domain: &str) -> Result<Address> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("name", domain)
            .append_pair("type", "txt");

        let response = self.http.get(url).send().await?;
        let http_status = response.status();
        if !http_status.is_success() {
            return Err(BeaverError::DomainResolution {
                domain: domain.to_string(),
                detail: format!("DoH endpoint answered HTTP {http_status}"),
            });
        }

        let body: DohResponse = response.json().await?;
        if body.status != 0 {
            return Err(BeaverError::DomainResolution {
                domain: domain.to_string(),
                detail: format!("DNS answered with status {}", body.status),
            });
        }

        let records: Vec<String> =
            body.answer.into_iter().map(|answer| answer.data).collect();
        tracing::debug!(domain, records = records.len(), "fetched TXT records");
        extract_address_from_txt(domain, &records)
    }
}

/// Pick the claimed address out of a domain's TXT records
///
/// DoH endpoints return TXT data with surrounding quotes, so each record
/// is unquoted before matching. Exactly one record must carry
/// [`DNS_TXT_KEY`]; zero is an unclaimed domain and two or more is
/// ambiguous, which both fail resolution.
///
/// # Errors
///
/// Returns [`BeaverError::DomainResolution`] with a relayable reason.
pub fn extract_address_from_txt(domain: &str, records: &[String]) -> Result<Address> {
    let claims: Vec<&str> = records
        .iter()
        .map(|record| record.trim().trim_matches('"'))
        .filter_map(|record| record.strip_prefix(DNS_TXT_KEY))
        .collect();

    match claims.as_slice() {
        [] => Err(BeaverError::DomainResolution {
            domain: domain.to_string(),
            detail: format!("no TXT record starts with {DNS_TXT_KEY}"),
        }),
        [value] => parse_evm_address(value).ok_or_else(|| BeaverError::DomainResolution {
            domain: domain.to_string(),
            detail: format!("TXT record value {value} is not a valid address"),
        }),
        many => Err(BeaverError::DomainResolution {
            domain: domain.to_string(),
            detail: format!(
                "{} TXT records carry {DNS_TXT_KEY}, expected exactly one",
                many.len()
            ),
        }),
    }
}

/// Parse an EVM address, enforcing EIP-55 only where it carries
/// information
///
/// All-lowercase and all-uppercase hex carry no checksum, so they are
/// accepted as-is. Mixed-case hex must be a valid EIP-55 encoding.
#[must_use]
pub fn parse_evm_address(text: &str) -> Option<Address> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix("0x")?;
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    if has_upper && has_lower {
        return Address::parse_checksummed(trimmed, None).ok();
    }
    trimmed.parse().ok()
}
