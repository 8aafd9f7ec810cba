//! Chain and token configuration
//!
//! Everything chain-specific lives in an explicit, immutable registry the
//! caller hands to constructors. The shipped defaults carry the known
//! deployment set; embedders with their own deployments build their own
//! registry and pass it in the same way.

use alloy_primitives::{address, Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Default collection window in seconds. The merchant has this long to
/// take a payment after it comes due before the subscription expires.
pub const DEFAULT_PAYMENT_PERIOD_SECS: u64 = 604_800;

/// Known chain names for the wire format, id-ordered
const KNOWN_CHAINS: [(u64, &str); 4] = [
    (1, "mainnet"),
    (137, "polygon"),
    (11_155_111, "sepolia"),
    (80_001, "polygonMumbai"),
];

/// Map a known chain id to its wire name
#[must_use]
pub fn default_chain_name(chain_id: u64) -> Option<&'static str> {
    KNOWN_CHAINS
        .iter()
        .find(|(id, _)| *id == chain_id)
        .map(|(_, name)| *name)
}

/// Map a wire chain name to its id, case-insensitively
#[must_use]
pub fn default_chain_id(name: &str) -> Option<u64> {
    KNOWN_CHAINS
        .iter()
        .find(|(_, known)| known.eq_ignore_ascii_case(name))
        .map(|(id, _)| *id)
}

/// A payment token deployed on one chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Display symbol, e.g. "USDT"
    pub symbol: String,
    /// The token contract address
    pub address: Address,
    /// Number of decimals in the token's smallest unit
    pub decimals: u8,
}

impl TokenConfig {
    /// Convert a human amount into the token's smallest units
    ///
    /// Negative inputs clamp to zero. Precision follows f64, which is
    /// ample for display-entered amounts.
    #[must_use]
    pub fn to_raw_units(&self, human: f64) -> U256 {
        let scaled = human.max(0.0) * 10f64.powi(i32::from(self.decimals));
        // Float casts saturate, so oversized inputs clamp to u128::MAX
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            U256::from(scaled.round() as u128)
        }
    }

    /// Convert raw token units into a human amount
    #[must_use]
    pub fn to_human_amount(&self, raw: U256) -> f64 {
        let capped: u128 = raw.try_into().unwrap_or(u128::MAX);
        #[allow(clippy::cast_precision_loss)]
        {
            capped as f64 / 10f64.powi(i32::from(self.decimals))
        }
    }
}

/// One chain's deployment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// The EVM chain id
    pub chain_id: u64,
    /// Wire name, e.g. "sepolia"
    pub name: String,
    /// Router contract address, absent where the protocol is not deployed
    pub router: Option<Address>,
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Block explorer base URL
    pub explorer_url: String,
    /// Tokens accepted for payment on this chain
    pub tokens: Vec<TokenConfig>,
}

impl ChainConfig {
    /// Look up a token by symbol, case-insensitively
    #[must_use]
    pub fn token(&self, symbol: &str) -> Option<&TokenConfig> {
        self.tokens
            .iter()
            .find(|token| token.symbol.eq_ignore_ascii_case(symbol))
    }

    /// Build an explorer link for a transaction hash
    #[must_use]
    pub fn tx_url(&self, tx_hash: B256) -> String {
        format!("{}/tx/{tx_hash}", self.explorer_url.trim_end_matches('/'))
    }
}

/// The immutable set of chains a deployment supports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainRegistry {
    chains: Vec<ChainConfig>,
}

impl ChainRegistry {
    /// Build a registry from explicit chain configs
    #[must_use]
    pub fn new(chains: Vec<ChainConfig>) -> Self {
        Self { chains }
    }

    /// Look up a chain by id
    #[must_use]
    pub fn by_id(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.iter().find(|chain| chain.chain_id == chain_id)
    }

    /// Look up a chain by name, case-insensitively
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&ChainConfig> {
        self.chains
            .iter()
            .find(|chain| chain.name.eq_ignore_ascii_case(name))
    }

    /// Resolve a chain-list entry, which may be a numeric id or a name
    #[must_use]
    pub fn resolve(&self, entry: &str) -> Option<&ChainConfig> {
        let trimmed = entry.trim();
        if let Ok(chain_id) = trimmed.parse::<u64>() {
            return self.by_id(chain_id);
        }
        self.by_name(trimmed)
    }

    /// Iterate over the configured chains
    pub fn iter(&self) -> impl Iterator<Item = &ChainConfig> {
        self.chains.iter()
    }

    /// Number of configured chains
    #[must_use]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// The known deployment set
    ///
    /// Routers exist on the sepolia and polygonMumbai testnets; mainnet
    /// and polygon carry token settings only until the router ships there.
    #[must_use]
    pub fn defaults() -> Self {
        Self::new(vec![
            ChainConfig {
                chain_id: 1,
                name: "mainnet".to_string(),
                router: None,
                rpc_url: "https://eth.llamarpc.com".to_string(),
                explorer_url: "https://etherscan.io".to_string(),
                tokens: vec![
                    TokenConfig {
                        symbol: "USDT".to_string(),
                        address: address!("dAC17F958D2ee523a2206206994597C13D831ec7"),
                        decimals: 6,
                    },
                    TokenConfig {
                        symbol: "EURS".to_string(),
                        address: address!("dB25f211AB05b1c97D595516F45794528a807ad8"),
                        decimals: 2,
                    },
                ],
            },
            ChainConfig {
                chain_id: 137,
                name: "polygon".to_string(),
                router: None,
                rpc_url: "https://polygon-rpc.com".to_string(),
                explorer_url: "https://polygonscan.com".to_string(),
                tokens: vec![
                    TokenConfig {
                        symbol: "USDT".to_string(),
                        address: address!("c2132D05D31c914a87C6611C10748AEb04B58e8F"),
                        decimals: 6,
                    },
                    TokenConfig {
                        symbol: "EURS".to_string(),
                        address: address!("E111178A87A3BFf0c8d18DECBa5798827539Ae99"),
                        decimals: 2,
                    },
                ],
            },
            ChainConfig {
                chain_id: 11_155_111,
                name: "sepolia".to_string(),
                router: Some(address!("00d7eA8c8d5e9f488658787Aad2A0C33d33122fC")),
                rpc_url: "https://rpc.sepolia.org".to_string(),
                explorer_url: "https://sepolia.etherscan.io".to_string(),
                tokens: vec![
                    TokenConfig {
                        symbol: "USDT".to_string(),
                        address: address!("aA8E23Fb1079EA71e0a56F48a2aA51851D8433D0"),
                        decimals: 6,
                    },
                    TokenConfig {
                        symbol: "AAVE".to_string(),
                        address: address!("D3B304653E6dFb264212f7dd427F9E926B2EaA05"),
                        decimals: 18,
                    },
                ],
            },
            ChainConfig {
                chain_id: 80_001,
                name: "polygonMumbai".to_string(),
                router: Some(address!("2651Ff0C4025c21d42E4dAaA14d5C41dc3DECD25")),
                rpc_url: "https://rpc-mumbai.maticvigil.com".to_string(),
                explorer_url: "https://mumbai.polygonscan.com".to_string(),
                tokens: vec![TokenConfig {
                    symbol: "USDT".to_string(),
                    address: address!("1fdE0eCc619726f4cD597887C9F3b4c8740e19e2"),
                    decimals: 6,
                }],
            },
        ])
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_known_chains() {
        let registry = ChainRegistry::defaults();
        assert_eq!(registry.len(), 4);
        for (chain_id, name) in KNOWN_CHAINS {
            let chain = registry.by_id(chain_id).unwrap();
            assert_eq!(chain.name, name);
        }
    }

    #[test]
    fn test_routers_only_on_testnets() {
        let registry = ChainRegistry::defaults();
        assert!(registry.by_id(1).unwrap().router.is_none());
        assert!(registry.by_id(137).unwrap().router.is_none());
        assert!(registry.by_id(11_155_111).unwrap().router.is_some());
        assert!(registry.by_id(80_001).unwrap().router.is_some());
    }

    #[test]
    fn test_token_lookup_is_case_insensitive() {
        let registry = ChainRegistry::defaults();
        let sepolia = registry.by_id(11_155_111).unwrap();
        assert_eq!(sepolia.token("usdt").unwrap().decimals, 6);
        assert_eq!(sepolia.token("AAVE").unwrap().decimals, 18);
        assert!(sepolia.token("EURS").is_none());
    }

    #[test]
    fn test_resolve_accepts_id_and_name() {
        let registry = ChainRegistry::defaults();
        assert_eq!(registry.resolve("137").unwrap().name, "polygon");
        assert_eq!(registry.resolve(" sepolia ").unwrap().chain_id, 11_155_111);
        assert_eq!(registry.resolve("polygonmumbai").unwrap().chain_id, 80_001);
        assert!(registry.resolve("999").is_none());
        assert!(registry.resolve("gnosis").is_none());
    }

    #[test]
    fn test_chain_name_tables() {
        assert_eq!(default_chain_name(11_155_111), Some("sepolia"));
        assert_eq!(default_chain_id("POLYGON"), Some(137));
        assert_eq!(default_chain_name(42), None);
        assert_eq!(default_chain_id("unknown"), None);
    }

    #[test]
    fn test_raw_unit_conversion() {
        let usdt = TokenConfig {
            symbol: "USDT".to_string(),
            address: Address::ZERO,
            decimals: 6,
        };
        assert_eq!(usdt.to_raw_units(0.12), U256::from(120_000u64));
        assert_eq!(usdt.to_raw_units(1.0), U256::from(1_000_000u64));
        assert_eq!(usdt.to_raw_units(-5.0), U256::ZERO);

        const EPSILON: f64 = 1e-10;
        assert!((usdt.to_human_amount(U256::from(120_000u64)) - 0.12).abs() < EPSILON);
        assert!((usdt.to_human_amount(U256::ZERO) - 0.0).abs() < EPSILON);
    }

    #[test]
    fn test_tx_url_formatting() {
        let registry = ChainRegistry::defaults();
        let sepolia = registry.by_id(11_155_111).unwrap();
        let url = sepolia.tx_url(B256::repeat_byte(0x11));
        assert!(url.starts_with("https://sepolia.etherscan.io/tx/0x1111"));
    }
}
