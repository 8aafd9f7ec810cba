//! Router and ERC-20 call encoding
//!
//! Typed contract interfaces via [`sol!`] plus the thin encode/decode
//! helpers the orchestrator and CLI go through. The subscription getter
//! mirrors the deployed router's storage layout field for field.

use alloy_primitives::{aliases::U40, Address, B256, U256};
use alloy_sol_types::{sol, SolCall};

use crate::error::{BeaverError, Result};

sol! {
    /// The Beaver router, the single contract every flow goes through
    interface IBeaverRouter {
        /// Start a subscription to an already-registered product
        function startSubscription(
            bytes32 productHash,
            bytes32 subscriptionMetadata
        ) external returns (bytes32 subscriptionHash);

        /// Register the product and start the first subscription to it
        /// in one transaction
        function setupEnvironmentAndStartSubscription(
            address merchant,
            address token,
            uint256 amount,
            uint40 period,
            uint40 freeTrialLength,
            uint40 paymentPeriod,
            bytes32 productMetadata,
            bytes32 subscriptionMetadata
        ) external returns (bytes32 subscriptionHash);

        /// Close a subscription for good
        function terminateSubscription(
            bytes32 subscriptionHash
        ) external returns (bool);

        /// Product registry slot, zero when the product is unknown
        function products(bytes32 productHash) external view returns (uint256);

        /// Full on-chain subscription record
        function subscriptions(bytes32 subscriptionHash) external view returns (
            address user,
            address merchant,
            bytes32 subscriptionId,
            bytes32 merchantDomain,
            bytes32 product,
            address token,
            uint256 amount,
            uint256 period,
            uint256 start,
            uint256 paymentPeriod,
            uint256 paymentsMade,
            bool terminated,
            address initiator
        );
    }

    /// The slice of ERC-20 the payment flow needs
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
    }
}

/// A subscription as the router stores it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnChainSubscription {
    pub user: Address,
    pub merchant: Address,
    pub subscription_id: B256,
    pub merchant_domain: B256,
    pub product: B256,
    pub token: Address,
    pub amount: U256,
    pub period: U256,
    pub start: U256,
    pub payment_period: U256,
    pub payments_made: U256,
    pub terminated: bool,
    pub initiator: Address,
}

fn to_uint40(field: &'static str, value: u64) -> Result<U40> {
    U40::try_from(value).map_err(|_| BeaverError::Uint40Overflow { field, value })
}

/// Calldata for `startSubscription`
#[must_use]
pub fn encode_start_subscription(
    product_hash: B256,
    subscription_metadata: B256,
) -> Vec<u8> {
    IBeaverRouter::startSubscriptionCall {
        productHash: product_hash,
        subscriptionMetadata: subscription_metadata,
    }
    .abi_encode()
}

/// Calldata for `setupEnvironmentAndStartSubscription`
///
/// # Errors
///
/// Returns [`BeaverError::Uint40Overflow`] when a duration does not fit
/// the contract's uint40 term fields.
#[allow(clippy::too_many_arguments)]
pub fn encode_setup_and_start(
    merchant: Address,
    token: Address,
    amount: U256,
    period_secs: u64,
    free_trial_secs: u64,
    payment_period_secs: u64,
    product_metadata: B256,
    subscription_metadata: B256,
) -> Result<Vec<u8>> {
    let call = IBeaverRouter::setupEnvironmentAndStartSubscriptionCall {
        merchant,
        token,
        amount,
        period: to_uint40("period", period_secs)?,
        freeTrialLength: to_uint40("free_trial_length", free_trial_secs)?,
        paymentPeriod: to_uint40("payment_period", payment_period_secs)?,
        productMetadata: product_metadata,
        subscriptionMetadata: subscription_metadata,
    };
    Ok(call.abi_encode())
}

/// Calldata for `terminateSubscription`
#[must_use]
pub fn encode_terminate_subscription(subscription_hash: B256) -> Vec<u8> {
    IBeaverRouter::terminateSubscriptionCall {
        subscriptionHash: subscription_hash,
    }
    .abi_encode()
}

/// Calldata for the `products` existence probe
#[must_use]
pub fn encode_products_probe(product_hash: B256) -> Vec<u8> {
    IBeaverRouter::productsCall {
        productHash: product_hash,
    }
    .abi_encode()
}

/// Calldata for the `subscriptions` getter
#[must_use]
pub fn encode_subscription_query(subscription_hash: B256) -> Vec<u8> {
    IBeaverRouter::subscriptionsCall {
        subscriptionHash: subscription_hash,
    }
    .abi_encode()
}

/// Calldata for ERC-20 `approve`
#[must_use]
pub fn encode_approve(spender: Address, amount: U256) -> Vec<u8> {
    IERC20::approveCall { spender, amount }.abi_encode()
}

/// Calldata for ERC-20 `allowance`
#[must_use]
pub fn encode_allowance(owner: Address, spender: Address) -> Vec<u8> {
    IERC20::allowanceCall { owner, spender }.abi_encode()
}

/// Calldata for ERC-20 `balanceOf`
#[must_use]
pub fn encode_balance_of(owner: Address) -> Vec<u8> {
    IERC20::balanceOfCall { owner }.abi_encode()
}

/// Interpret a `products` probe return: any nonzero word means the
/// product is registered
#[must_use]
pub fn decode_product_exists(data: &[u8]) -> bool {
    data.iter().any(|byte| *byte != 0)
}

/// Decode a single-uint ERC-20 return (`allowance` or `balanceOf`)
pub fn decode_erc20_uint(data: &[u8]) -> Result<U256> {
    IERC20::balanceOfCall::abi_decode_returns(data, true)
        .map(|ret| ret._0)
        .map_err(|err| BeaverError::Rpc(format!("malformed ERC-20 return: {err}")))
}

/// Decode the `subscriptions` getter return
pub fn decode_subscription_record(data: &[u8]) -> Result<OnChainSubscription> {
    let ret = IBeaverRouter::subscriptionsCall::abi_decode_returns(data, true)
        .map_err(|err| {
            BeaverError::Rpc(format!("malformed subscription record: {err}"))
        })?;
    Ok(OnChainSubscription {
        user: ret.user,
        merchant: ret.merchant,
        subscription_id: ret.subscriptionId,
        merchant_domain: ret.merchantDomain,
        product: ret.product,
        token: ret.token,
        amount: ret.amount,
        period: ret.period,
        start: ret.start,
        payment_period: ret.paymentPeriod,
        payments_made: ret.paymentsMade,
        terminated: ret.terminated,
        initiator: ret.initiator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_approve_uses_canonical_selector() {
        // approve(address,uint256) selector is a fixed point of the ABI
        let data = encode_approve(Address::ZERO, U256::from(1u64));
        assert_eq!(&data[..4], &[0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(data.len(), 68);
    }

    #[test]
    fn test_balance_and_allowance_selectors() {
        let balance = encode_balance_of(Address::ZERO);
        assert_eq!(&balance[..4], &[0x70, 0xa0, 0x82, 0x31]);
        let allowance = encode_allowance(Address::ZERO, Address::ZERO);
        assert_eq!(&allowance[..4], &[0xdd, 0x62, 0xed, 0x3e]);
    }

    #[test]
    fn test_setup_call_round_trips_terms() {
        let merchant = address!("0f4be8b548d7e28a7e2f85f1697c5cac7dc9d718");
        let token = address!("aA8E23Fb1079EA71e0a56F48a2aA51851D8433D0");
        let data = encode_setup_and_start(
            merchant,
            token,
            U256::from(10_000_000u64),
            2_592_000,
            604_800,
            604_800,
            B256::repeat_byte(0xAB),
            B256::repeat_byte(0xCD),
        )
        .unwrap();

        let call =
            IBeaverRouter::setupEnvironmentAndStartSubscriptionCall::abi_decode(
                &data, true,
            )
            .unwrap();
        assert_eq!(call.merchant, merchant);
        assert_eq!(call.token, token);
        assert_eq!(call.period, U40::from(2_592_000u64));
        assert_eq!(call.freeTrialLength, U40::from(604_800u64));
        assert_eq!(call.subscriptionMetadata, B256::repeat_byte(0xCD));
    }

    #[test]
    fn test_setup_call_rejects_oversized_duration() {
        let err = encode_setup_and_start(
            Address::ZERO,
            Address::ZERO,
            U256::ZERO,
            1u64 << 40,
            0,
            0,
            B256::ZERO,
            B256::ZERO,
        )
        .unwrap_err();
        match err {
            BeaverError::Uint40Overflow { field, .. } => assert_eq!(field, "period"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_start_call_layout() {
        let data = encode_start_subscription(
            B256::repeat_byte(0x11),
            B256::repeat_byte(0x22),
        );
        // selector + two bytes32 words
        assert_eq!(data.len(), 68);
        assert_eq!(&data[4..36], B256::repeat_byte(0x11).as_slice());
        assert_eq!(&data[36..68], B256::repeat_byte(0x22).as_slice());
    }

    #[test]
    fn test_product_probe_interpretation() {
        assert!(!decode_product_exists(&[]));
        assert!(!decode_product_exists(&[0u8; 32]));
        let mut registered = [0u8; 32];
        registered[31] = 1;
        assert!(decode_product_exists(&registered));
        // Struct-shaped returns longer than a word still count
        assert!(decode_product_exists(&[0x01u8; 160]));
    }

    #[test]
    fn test_erc20_uint_decoding() {
        let word = U256::from(123_456u64).to_be_bytes::<32>();
        assert_eq!(decode_erc20_uint(&word).unwrap(), U256::from(123_456u64));
        assert!(decode_erc20_uint(&[0u8; 3]).is_err());
    }

    #[test]
    fn test_subscription_record_decodes_all_fields() {
        fn address_word(address: Address) -> [u8; 32] {
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(address.as_slice());
            word
        }

        let user = address!("34207C538E39F2600FE672bB84A90efF190ae4C7");
        let merchant = address!("0f4be8b548d7e28a7e2f85f1697c5cac7dc9d718");
        let token = address!("aA8E23Fb1079EA71e0a56F48a2aA51851D8433D0");

        // The getter returns thirteen static words in declaration order
        let mut blob = Vec::with_capacity(13 * 32);
        blob.extend_from_slice(&address_word(user));
        blob.extend_from_slice(&address_word(merchant));
        blob.extend_from_slice(B256::repeat_byte(0x01).as_slice());
        blob.extend_from_slice(B256::repeat_byte(0x02).as_slice());
        blob.extend_from_slice(B256::repeat_byte(0x03).as_slice());
        blob.extend_from_slice(&address_word(token));
        blob.extend_from_slice(&U256::from(10_000_000u64).to_be_bytes::<32>());
        blob.extend_from_slice(&U256::from(2_592_000u64).to_be_bytes::<32>());
        blob.extend_from_slice(&U256::from(1_700_000_000u64).to_be_bytes::<32>());
        blob.extend_from_slice(&U256::from(604_800u64).to_be_bytes::<32>());
        blob.extend_from_slice(&U256::from(3u64).to_be_bytes::<32>());
        blob.extend_from_slice(&U256::from(1u64).to_be_bytes::<32>());
        blob.extend_from_slice(&address_word(Address::ZERO));

        let record = decode_subscription_record(&blob).unwrap();
        assert_eq!(record.user, user);
        assert_eq!(record.merchant, merchant);
        assert_eq!(record.product, B256::repeat_byte(0x03));
        assert_eq!(record.token, token);
        assert_eq!(record.amount, U256::from(10_000_000u64));
        assert_eq!(record.payments_made, U256::from(3u64));
        assert!(record.terminated);
        assert_eq!(record.initiator, Address::ZERO);
    }

    #[test]
    fn test_terminate_call_layout() {
        let data = encode_terminate_subscription(B256::repeat_byte(0x7F));
        assert_eq!(data.len(), 36);
        assert_eq!(&data[4..], B256::repeat_byte(0x7F).as_slice());
    }
}
