//! Error types for the Beaver SDK
//!
//! Errors split into two families. Validation failures (missing checkout
//! parameters, unsupported chains or tokens, malformed amounts and periods)
//! carry messages precise enough to relay to the merchant or end user
//! verbatim. Infrastructure failures (indexer, RPC, DNS transport) wrap the
//! underlying cause and are meant for logs and retries, not end users.
//!
//! # Provider Error Mapping
//!
//! Wallet providers signal rejection and transport problems with EIP-1193
//! numeric codes. [`BeaverError::from_rpc_code`] maps the codes the SDK
//! cares about:
//!
//! - **4001**: `WalletRejected` - the user declined the signature request
//! - **4100/4900/4901**: `Rpc` - provider unauthorized or disconnected
//! - anything else: `Rpc` with the code and message preserved
//!
//! # Example
//!
//! ```rust
//! use beaver_sdk::error::BeaverError;
//!
//! fn relay_text(err: &BeaverError) -> String {
//!     match err {
//!         BeaverError::UnsupportedToken { symbol, chains } => {
//!             format!("{symbol} is not available on: {}", chains.join(", "))
//!         }
//!         other => other.to_string(),
//!     }
//! }
//!
//! let err = BeaverError::UnsupportedToken {
//!     symbol: "EURS".to_string(),
//!     chains: vec!["polygonMumbai".to_string()],
//! };
//! assert!(relay_text(&err).contains("polygonMumbai"));
//! assert!(err.is_validation());
//! ```

use thiserror::Error;

/// Result type for Beaver SDK operations
pub type Result<T> = std::result::Result<T, BeaverError>;

/// Error types that can occur when using the Beaver SDK
#[derive(Error, Debug)]
pub enum BeaverError {
    /// A required checkout parameter was absent from the query and the shortcut
    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    /// The merchant domain did not yield exactly one usable TXT address record
    #[error("could not resolve domain {domain} to a merchant address: {detail}")]
    DomainResolution { domain: String, detail: String },

    /// A requested chain is not in the registry
    #[error("chain '{0}' is not supported")]
    UnsupportedChain(String),

    /// The token symbol is not configured on every requested chain
    #[error("token {symbol} is not available on: {}", .chains.join(", "))]
    UnsupportedToken { symbol: String, chains: Vec<String> },

    /// The amount is not a plain non-negative decimal number
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),

    /// The period text matches none of the accepted notations
    #[error("invalid period '{0}'")]
    InvalidPeriod(String),

    /// No stored checkout form under the given shortcut id
    #[error("there is no checkout form with id {0}")]
    ShortcutNotFound(String),

    /// The IPFS CID could not be packed into a 32-byte slot
    #[error("invalid content id '{cid}': {detail}")]
    InvalidContentId { cid: String, detail: String },

    /// A duration does not fit the on-chain uint40 representation
    #[error("{field} value {value} exceeds the uint40 range")]
    Uint40Overflow { field: &'static str, value: u64 },

    /// The protocol router is not deployed on the selected chain
    #[error("the Beaver router is not deployed on {chain}")]
    RouterUnavailable { chain: String },

    /// The wallet is connected to a different chain than the checkout targets
    #[error("wallet is connected to chain {connected} but chain {required} is required")]
    WrongChain { connected: u64, required: u64 },

    /// The user declined the signature request
    #[error("wallet rejected the transaction: {0}")]
    WalletRejected(String),

    /// The transaction was mined but reverted
    #[error("transaction {tx_hash} reverted on chain")]
    TransactionReverted { tx_hash: String },

    /// No receipt appeared within the configured confirmation window
    #[error("transaction {tx_hash} was not confirmed after {waited_secs}s")]
    ConfirmationTimeout { tx_hash: String, waited_secs: u64 },

    /// The wallet does not hold enough of the payment token
    #[error("insufficient balance: {required} {symbol} required, wallet holds {available}")]
    InsufficientBalance {
        symbol: String,
        required: f64,
        available: f64,
    },

    /// The chosen approval would not even cover the first payment
    #[error("approve at least {minimum} {symbol}")]
    ApprovalTooLow { minimum: f64, symbol: String },

    /// The indexer answered with a non-success status
    #[error("indexer request failed with status {status}: {body}")]
    Indexer { status: u16, body: String },

    /// JSON-RPC level failure from the chain endpoint
    #[error("rpc error: {0}")]
    Rpc(String),

    /// Transport-level HTTP failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Error from serde JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed endpoint or redirect URL
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Generic error with message
    #[error("Beaver SDK error: {0}")]
    Generic(String),
}

impl From<String> for BeaverError {
    fn from(msg: String) -> Self {
        Self::Generic(msg)
    }
}

impl From<&str> for BeaverError {
    fn from(msg: &str) -> Self {
        Self::Generic(msg.to_string())
    }
}

impl From<anyhow::Error> for BeaverError {
    fn from(error: anyhow::Error) -> Self {
        Self::Generic(error.to_string())
    }
}

impl BeaverError {
    /// Map an EIP-1193 provider error code to a specific variant
    ///
    /// Wallet providers report user rejection as code 4001; everything else
    /// is kept as an RPC failure with the code preserved in the message.
    ///
    /// # Arguments
    /// * `code` - The numeric provider/JSON-RPC error code
    /// * `message` - The provider's error message
    ///
    /// # Returns
    /// * `BeaverError` - The mapped specific error variant or generic RPC error
    #[must_use]
    pub fn from_rpc_code(code: i64, message: String) -> Self {
        match code {
            4001 => Self::WalletRejected(message),
            _ => Self::Rpc(format!("code {code}: {message}")),
        }
    }

    /// Whether this error is a user-facing validation failure
    ///
    /// Validation failures are safe and useful to relay verbatim; the
    /// remaining variants describe infrastructure trouble and belong in logs.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter(_)
                | Self::DomainResolution { .. }
                | Self::UnsupportedChain(_)
                | Self::UnsupportedToken { .. }
                | Self::InvalidAmount(_)
                | Self::InvalidPeriod(_)
                | Self::ShortcutNotFound(_)
                | Self::InvalidContentId { .. }
                | Self::Uint40Overflow { .. }
                | Self::InsufficientBalance { .. }
                | Self::ApprovalTooLow { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_code_mapping_user_rejection() {
        let err = BeaverError::from_rpc_code(4001, "User rejected the request.".to_string());
        assert!(matches!(err, BeaverError::WalletRejected(_)));
    }

    #[test]
    fn test_rpc_code_mapping_other_codes_stay_rpc() {
        let err = BeaverError::from_rpc_code(-32000, "header not found".to_string());
        match err {
            BeaverError::Rpc(msg) => {
                assert!(msg.contains("-32000"));
                assert!(msg.contains("header not found"));
            }
            other => panic!("expected Rpc, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_split() {
        assert!(BeaverError::MissingParameter("domain".to_string()).is_validation());
        assert!(BeaverError::InvalidPeriod("fortnight".to_string()).is_validation());
        assert!(!BeaverError::Rpc("boom".to_string()).is_validation());
        assert!(!BeaverError::Indexer {
            status: 500,
            body: "oops".to_string()
        }
        .is_validation());
    }

    #[test]
    fn test_unsupported_token_lists_chains() {
        let err = BeaverError::UnsupportedToken {
            symbol: "AAVE".to_string(),
            chains: vec!["mainnet".to_string(), "polygon".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "token AAVE is not available on: mainnet, polygon"
        );
    }
}
