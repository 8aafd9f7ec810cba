//! Core data model
//!
//! Wire records served by the indexer plus the resolved checkout prompt.
//! Field names mirror the indexer's snake_case JSON. Two fields need
//! lenient deserializers because the indexer emits them in more than one
//! shape: `chain` arrives as a name or a numeric id, and `uint_amount`
//! arrives as a JSON number or a decimal string.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::period;

/// Lifecycle state of a subscription
///
/// Wire values are the indexer's: "paid", "pending", "expired",
/// "terminated".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// The current period is paid for
    #[serde(rename = "paid")]
    Active,
    /// A payment is due but the collection window is still open
    #[serde(rename = "pending")]
    PendingPayment,
    /// A due payment was not collected within the window
    Expired,
    /// Closed explicitly by the user or the merchant
    Terminated,
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Active => "active",
            Self::PendingPayment => "pending payment",
            Self::Expired => "expired",
            Self::Terminated => "terminated",
        };
        write!(f, "{label}")
    }
}

/// A merchant's product: the terms every subscription to it shares
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Identity hash of the terms, as registered on chain
    pub product_hash: B256,
    /// Chain the product lives on
    #[serde(rename = "chain", with = "chain_flexible")]
    pub chain_id: u64,
    /// Address payments are sent to
    pub merchant_address: Address,
    /// Payment token contract
    pub token_address: Address,
    /// Payment token display symbol
    pub token_symbol: String,
    /// Payment token decimals
    pub token_decimals: u8,
    /// Charge per period in the token's smallest units
    #[serde(with = "u256_flexible")]
    pub uint_amount: U256,
    /// Charge per period in human units
    pub human_amount: f64,
    /// Billing period in seconds
    pub period: u64,
    /// Free trial length in seconds, zero when there is none
    pub free_trial_length: u64,
    /// Collection window in seconds
    pub payment_period: u64,
    /// IPFS CID of the product metadata
    #[serde(alias = "metadata_hash")]
    pub metadata_cid: String,
    /// Domain the merchant proved ownership of
    pub merchant_domain: String,
    /// Display name of the product
    pub product_name: String,
}

impl Product {
    /// The billing period rendered for humans, e.g. "2 weeks"
    #[must_use]
    pub fn period_human(&self) -> String {
        period::human_from_seconds(self.period)
    }

    /// The free trial rendered for humans, or `None` when there is none
    #[must_use]
    pub fn free_trial_human(&self) -> Option<String> {
        if self.free_trial_length == 0 {
            return None;
        }
        Some(period::human_from_seconds(self.free_trial_length))
    }
}

/// One user's subscription to a product
///
/// `status`, `is_active` and `next_payment_at` are the indexer's own
/// assessment at serve time. They are advisory; [`crate::lifecycle`]
/// recomputes them locally from the base fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Identity hash of the subscription, as registered on chain
    pub subscription_hash: B256,
    /// The product subscribed to
    pub product: Product,
    /// The paying wallet
    pub user_address: Address,
    /// Unix second the subscription started at
    pub start_ts: i64,
    /// Number of payments collected so far
    pub payments_made: u32,
    /// Whether the subscription was explicitly closed
    pub terminated: bool,
    /// IPFS CID of the subscription metadata
    #[serde(alias = "metadata_hash")]
    pub metadata_cid: String,
    /// Merchant-side correlation id, if the merchant set one
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// Merchant-side user id, if the merchant set one
    #[serde(default)]
    pub user_id: Option<String>,
    /// Server-computed status at serve time
    #[serde(default)]
    pub status: Option<SubscriptionStatus>,
    /// Server-computed activity flag at serve time
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Server-computed next payment timestamp
    #[serde(default)]
    pub next_payment_at: Option<i64>,
}

/// A checkout prompt after resolution: validated terms ready to sign
///
/// Produced by [`crate::prompt::PromptResolver`]. All durations are in
/// seconds and the metadata CIDs are already minimized to 32 bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutPrompt {
    /// Domain the merchant address was resolved from
    pub merchant_domain: String,
    /// Address payments will be sent to
    pub merchant_address: Address,
    /// Display name of the product
    pub product_name: String,
    /// Payment token display symbol
    pub token_symbol: String,
    /// Charge per period in human units
    pub human_amount: f64,
    /// Billing period in seconds
    pub period_secs: u64,
    /// Free trial length in seconds, zero when there is none
    pub free_trial_secs: u64,
    /// Collection window in seconds the merchant gets per payment
    pub payment_period_secs: u64,
    /// Chain ids the user may pay on, in the merchant's preference order
    pub available_chains: Vec<u64>,
    /// Where to send the user after a successful start
    pub on_success_url: Option<Url>,
    /// Merchant-side correlation id
    pub subscription_id: Option<String>,
    /// Merchant-side user id
    pub user_id: Option<String>,
    /// Minimized CID of the stored product metadata
    pub product_metadata: B256,
    /// Minimized CID of the stored subscription metadata
    pub subscription_metadata: B256,
}

impl CheckoutPrompt {
    /// The billing period rendered for humans
    #[must_use]
    pub fn period_human(&self) -> String {
        period::human_from_seconds(self.period_secs)
    }

    /// The free trial rendered for humans, or `None` when there is none
    #[must_use]
    pub fn free_trial_human(&self) -> Option<String> {
        if self.free_trial_secs == 0 {
            return None;
        }
        Some(period::human_from_seconds(self.free_trial_secs))
    }
}

/// A stored checkout form, addressed by a short id
///
/// All fields are kept as the merchant entered them; validation happens
/// at resolution time. Serialized with camelCase keys for the indexer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutPrompt {
    /// Merchant domain to resolve the payment address from
    pub domain: String,
    /// Display name of the product
    pub product: String,
    /// Payment token symbol
    pub token: String,
    /// Charge per period, human units, as entered
    pub amount: String,
    /// Billing period, as entered, e.g. "30d" or "2 weeks"
    pub period: String,
    /// Comma-separated chain names or ids
    pub chains: String,
    /// Free trial length, as entered; absent means none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_trial_length: Option<String>,
    /// Where to send the user after a successful start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success_url: Option<String>,
    /// Merchant-side correlation id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    /// Merchant-side user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// `chain` field codec: accepts a known name or a numeric id, emits the
/// known name where one exists
mod chain_flexible {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::chains::{default_chain_id, default_chain_name};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Id(u64),
        Name(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Id(chain_id) => Ok(chain_id),
            Raw::Name(name) => {
                let trimmed = name.trim();
                if let Ok(chain_id) = trimmed.parse::<u64>() {
                    return Ok(chain_id);
                }
                default_chain_id(trimmed).ok_or_else(|| {
                    de::Error::custom(format!("unknown chain name: {trimmed}"))
                })
            }
        }
    }

    pub fn serialize<S>(chain_id: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match default_chain_name(*chain_id) {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_u64(*chain_id),
        }
    }
}

/// `uint_amount` field codec: accepts a JSON number or a decimal/hex
/// string, emits a decimal string so large amounts survive JSON
mod u256_flexible {
    use alloy_primitives::U256;
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Num(value) => Ok(U256::from(value)),
            Raw::Text(text) => {
                let trimmed = text.trim();
                let parsed = match trimmed.strip_prefix("0x") {
                    Some(hex_digits) => U256::from_str_radix(hex_digits, 16),
                    None => U256::from_str_radix(trimmed, 10),
                };
                parsed.map_err(de::Error::custom)
            }
        }
    }

    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_subscription_json() -> serde_json::Value {
        json!({
            "subscription_hash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "product": {
                "product_hash": "0x2222222222222222222222222222222222222222222222222222222222222222",
                "chain": "sepolia",
                "merchant_address": "0x0f4be8b548d7e28a7e2f85f1697c5cac7dc9d718",
                "token_address": "0xaA8E23Fb1079EA71e0a56F48a2aA51851D8433D0",
                "token_symbol": "USDT",
                "token_decimals": 6,
                "uint_amount": 10_000_000u64,
                "human_amount": 10.0,
                "period": 2_592_000u64,
                "free_trial_length": 0,
                "payment_period": 604_800u64,
                "metadata_cid": "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG",
                "merchant_domain": "merchant.example",
                "product_name": "Pro plan"
            },
            "user_address": "0x34207c538e39f2600fe672bb84a90eff190ae4c7",
            "start_ts": 1_700_000_000i64,
            "payments_made": 3,
            "terminated": false,
            "metadata_cid": "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG",
            "subscription_id": "order-17",
            "user_id": null,
            "status": "paid",
            "is_active": true,
            "next_payment_at": 1_710_368_000i64
        })
    }

    #[test]
    fn test_subscription_deserializes_from_indexer_shape() {
        let sub: Subscription =
            serde_json::from_value(sample_subscription_json()).unwrap();
        assert_eq!(sub.product.chain_id, 11_155_111);
        assert_eq!(sub.product.uint_amount, U256::from(10_000_000u64));
        assert_eq!(sub.product.token_symbol, "USDT");
        assert_eq!(sub.payments_made, 3);
        assert_eq!(sub.subscription_id.as_deref(), Some("order-17"));
        assert_eq!(sub.user_id, None);
        assert_eq!(sub.status, Some(SubscriptionStatus::Active));
        assert_eq!(sub.is_active, Some(true));
    }

    #[test]
    fn test_chain_accepts_numeric_id() {
        let mut value = sample_subscription_json();
        value["product"]["chain"] = json!(137);
        let sub: Subscription = serde_json::from_value(value).unwrap();
        assert_eq!(sub.product.chain_id, 137);
    }

    #[test]
    fn test_chain_rejects_unknown_name() {
        let mut value = sample_subscription_json();
        value["product"]["chain"] = json!("gnosis");
        assert!(serde_json::from_value::<Subscription>(value).is_err());
    }

    #[test]
    fn test_uint_amount_accepts_string() {
        let mut value = sample_subscription_json();
        value["product"]["uint_amount"] = json!("2500000000000000000");
        let sub: Subscription = serde_json::from_value(value).unwrap();
        assert_eq!(
            sub.product.uint_amount,
            U256::from(2_500_000_000_000_000_000u64)
        );
    }

    #[test]
    fn test_metadata_hash_alias() {
        let mut value = sample_subscription_json();
        let cid = value["product"]
            .as_object_mut()
            .unwrap()
            .remove("metadata_cid")
            .unwrap();
        value["product"]["metadata_hash"] = cid;
        let sub: Subscription = serde_json::from_value(value).unwrap();
        assert_eq!(
            sub.product.metadata_cid,
            "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG"
        );
    }

    #[test]
    fn test_product_serializes_chain_as_name() {
        let sub: Subscription =
            serde_json::from_value(sample_subscription_json()).unwrap();
        let value = serde_json::to_value(&sub.product).unwrap();
        assert_eq!(value["chain"], json!("sepolia"));
        // Large amounts must survive JSON, so the codec emits a string
        assert_eq!(value["uint_amount"], json!("10000000"));
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&SubscriptionStatus::Active).unwrap(),
            "\"paid\""
        );
        assert_eq!(
            serde_json::to_string(&SubscriptionStatus::PendingPayment).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::from_str::<SubscriptionStatus>("\"expired\"").unwrap(),
            SubscriptionStatus::Expired
        );
        assert_eq!(
            serde_json::from_str::<SubscriptionStatus>("\"terminated\"").unwrap(),
            SubscriptionStatus::Terminated
        );
    }

    #[test]
    fn test_shortcut_prompt_uses_camel_case_keys() {
        let prompt = ShortcutPrompt {
            domain: "merchant.example".to_string(),
            product: "Pro plan".to_string(),
            token: "USDT".to_string(),
            amount: "10".to_string(),
            period: "30d".to_string(),
            chains: "sepolia,polygonMumbai".to_string(),
            free_trial_length: Some("7d".to_string()),
            on_success_url: None,
            subscription_id: Some("order-17".to_string()),
            user_id: None,
        };
        let value = serde_json::to_value(&prompt).unwrap();
        assert_eq!(value["freeTrialLength"], json!("7d"));
        assert_eq!(value["subscriptionId"], json!("order-17"));
        assert!(value.get("onSuccessUrl").is_none());
        assert!(value.get("userId").is_none());

        let parsed: ShortcutPrompt = serde_json::from_value(json!({
            "domain": "merchant.example",
            "product": "Pro plan",
            "token": "USDT",
            "amount": "10",
            "period": "30d",
            "chains": "sepolia"
        }))
        .unwrap();
        assert_eq!(parsed.free_trial_length, None);
        assert_eq!(parsed.on_success_url, None);
    }

    #[test]
    fn test_period_rendering_helpers() {
        let sub: Subscription =
            serde_json::from_value(sample_subscription_json()).unwrap();
        assert_eq!(sub.product.period_human(), "month");
        assert_eq!(sub.product.free_trial_human(), None);
    }
}
