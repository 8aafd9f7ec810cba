//! Product identity hashing and content id packing
//!
//! A product is identified on every chain by the keccak-256 hash of its
//! packed terms, so two checkouts with identical terms land on the same
//! on-chain product. IPFS content ids are squeezed into a single 32-byte
//! word the same way the router stores them.

use crate::error::{BeaverError, Result};
use alloy_primitives::{keccak256, Address, B256, U256};

/// Largest value representable as an on-chain `uint40`
pub const UINT40_MAX: u64 = (1 << 40) - 1;

/// Multihash prefix of a CIDv0: sha2-256 code plus 32-byte digest length
const CIDV0_PREFIX: [u8; 2] = [0x12, 0x20];

/// Packed terms are uint256 + address + address + uint256 + three uint40s + bytes32
const PACKED_TERMS_LEN: usize = 151;

fn uint40_be(field: &'static str, value: u64) -> Result<[u8; 5]> {
    if value > UINT40_MAX {
        return Err(BeaverError::Uint40Overflow { field, value });
    }
    let be = value.to_be_bytes();
    let mut out = [0u8; 5];
    out.copy_from_slice(&be[3..8]);
    Ok(out)
}

/// Pack product terms into the router's `encodePacked` layout:
/// chain id (32 B) | merchant (20 B) | token (20 B) | amount (32 B) |
/// period (5 B) | free trial (5 B) | payment period (5 B) | metadata (32 B).
#[allow(clippy::too_many_arguments)]
fn packed_terms(
    chain_id: u64,
    merchant: Address,
    token: Address,
    uint_amount: U256,
    period_secs: u64,
    free_trial_secs: u64,
    payment_period_secs: u64,
    product_metadata: B256,
) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(PACKED_TERMS_LEN);
    buf.extend_from_slice(&U256::from(chain_id).to_be_bytes::<32>());
    buf.extend_from_slice(merchant.as_slice());
    buf.extend_from_slice(token.as_slice());
    buf.extend_from_slice(&uint_amount.to_be_bytes::<32>());
    buf.extend_from_slice(&uint40_be("period", period_secs)?);
    buf.extend_from_slice(&uint40_be("free trial length", free_trial_secs)?);
    buf.extend_from_slice(&uint40_be("payment period", payment_period_secs)?);
    buf.extend_from_slice(product_metadata.as_slice());
    Ok(buf)
}

/// Compute the deterministic product hash for a set of subscription terms
///
/// The hash is keccak-256 over the packed terms in the exact byte layout
/// the router uses, so it matches the on-chain product id. Durations must
/// fit `uint40`; oversized values are rejected rather than truncated.
///
/// # Arguments
/// * `chain_id` - The EVM chain id the product lives on
/// * `merchant` - The merchant's receiving address
/// * `token` - The payment token contract address
/// * `uint_amount` - The per-period amount in the token's smallest units
/// * `period_secs` - Billing period in seconds
/// * `free_trial_secs` - Free trial length in seconds, zero for none
/// * `payment_period_secs` - Collection window in seconds
/// * `product_metadata` - Minimized product metadata content id
///
/// # Returns
/// * `Ok(B256)` - The 32-byte product hash
///
/// # Errors
/// [`BeaverError::Uint40Overflow`] when a duration exceeds the `uint40`
/// range.
///
/// # Examples
/// ```
/// use alloy_primitives::{Address, B256, U256};
/// use beaver_sdk::hashing::product_hash;
///
/// let hash = product_hash(
///     11_155_111,
///     Address::ZERO,
///     Address::ZERO,
///     U256::from(120_000u64),
///     2_592_000,
///     0,
///     604_800,
///     B256::ZERO,
/// )
/// .unwrap();
///
/// // Same terms always produce the same product
/// let again = product_hash(
///     11_155_111,
///     Address::ZERO,
///     Address::ZERO,
///     U256::from(120_000u64),
///     2_592_000,
///     0,
///     604_800,
///     B256::ZERO,
/// )
/// .unwrap();
/// assert_eq!(hash, again);
/// ```
#[allow(clippy::too_many_arguments)]
pub fn product_hash(
    chain_id: u64,
    merchant: Address,
    token: Address,
    uint_amount: U256,
    period_secs: u64,
    free_trial_secs: u64,
    payment_period_secs: u64,
    product_metadata: B256,
) -> Result<B256> {
    let packed = packed_terms(
        chain_id,
        merchant,
        token,
        uint_amount,
        period_secs,
        free_trial_secs,
        payment_period_secs,
        product_metadata,
    )?;
    Ok(keccak256(packed))
}

/// Minimize an IPFS CID into a 32-byte word
///
/// Base58-decodes the CID and strips the 2-byte multihash prefix so the
/// digest fits the `bytes32` slot the router stores. For a CIDv0 the
/// residual is exactly 32 bytes; shorter residuals are left-aligned and
/// zero-padded.
///
/// # Arguments
/// * `cid` - The base58 content id as returned by the indexer
///
/// # Returns
/// * `Ok(B256)` - The packed digest
///
/// # Errors
/// [`BeaverError::InvalidContentId`] when the CID is not valid base58,
/// too short to carry a multihash prefix, or the residual exceeds 32
/// bytes.
pub fn minimize_content_id(cid: &str) -> Result<B256> {
    let invalid = |detail: String| BeaverError::InvalidContentId {
        cid: cid.to_string(),
        detail,
    };

    let bytes = bs58::decode(cid)
        .into_vec()
        .map_err(|e| invalid(e.to_string()))?;
    if bytes.len() < CIDV0_PREFIX.len() {
        return Err(invalid(
            "too short to carry a multihash prefix".to_string(),
        ));
    }

    let digest = &bytes[CIDV0_PREFIX.len()..];
    if digest.len() > B256::len_bytes() {
        return Err(invalid(format!(
            "{} bytes after the multihash prefix do not fit 32",
            digest.len()
        )));
    }

    let mut word = [0u8; 32];
    word[..digest.len()].copy_from_slice(digest);
    Ok(B256::from(word))
}

/// Expand a minimized content id back into a base58 CIDv0
///
/// Re-prepends the sha2-256 multihash prefix and base58-encodes. Only
/// meaningful for digests produced from CIDv0 inputs, which are always a
/// full 32 bytes.
///
/// # Arguments
/// * `digest` - The 32-byte word stored on chain
///
/// # Returns
/// The base58 CID string
#[must_use]
pub fn expand_content_id(digest: B256) -> String {
    let mut bytes = Vec::with_capacity(34);
    bytes.extend_from_slice(&CIDV0_PREFIX);
    bytes.extend_from_slice(digest.as_slice());
    bs58::encode(bytes).into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn sample_hash(tweak: impl FnOnce(&mut SampleTerms)) -> B256 {
        let mut terms = SampleTerms::default();
        tweak(&mut terms);
        product_hash(
            terms.chain_id,
            terms.merchant,
            terms.token,
            terms.uint_amount,
            terms.period_secs,
            terms.free_trial_secs,
            terms.payment_period_secs,
            terms.product_metadata,
        )
        .unwrap()
    }

    struct SampleTerms {
        chain_id: u64,
        merchant: Address,
        token: Address,
        uint_amount: U256,
        period_secs: u64,
        free_trial_secs: u64,
        payment_period_secs: u64,
        product_metadata: B256,
    }

    impl Default for SampleTerms {
        fn default() -> Self {
            Self {
                chain_id: 11_155_111,
                merchant: address!("00d7eA8c8d5e9f488658787Aad2A0C33d33122fC"),
                token: address!("aA8E23Fb1079EA71e0a56F48a2aA51851D8433D0"),
                uint_amount: U256::from(120_000u64),
                period_secs: 2_592_000,
                free_trial_secs: 0,
                payment_period_secs: 604_800,
                product_metadata: B256::repeat_byte(0x42),
            }
        }
    }

    #[test]
    fn test_product_hash_is_deterministic() {
        let first = sample_hash(|_| {});
        let second = sample_hash(|_| {});
        assert_eq!(first, second);
    }

    #[test]
    fn test_product_hash_changes_with_every_field() {
        let base = sample_hash(|_| {});

        let tweaks: [fn(&mut SampleTerms); 8] = [
            |t| t.chain_id = 137,
            |t| t.merchant = Address::repeat_byte(0x11),
            |t| t.token = Address::repeat_byte(0x22),
            |t| t.uint_amount = U256::from(120_001u64),
            |t| t.period_secs = 604_800,
            |t| t.free_trial_secs = 86_400,
            |t| t.payment_period_secs = 86_400,
            |t| t.product_metadata = B256::repeat_byte(0x43),
        ];
        for tweak in tweaks {
            assert_ne!(base, sample_hash(tweak), "field change must move the hash");
        }
    }

    #[test]
    fn test_packed_layout() {
        let terms = SampleTerms::default();
        let packed = packed_terms(
            terms.chain_id,
            terms.merchant,
            terms.token,
            terms.uint_amount,
            terms.period_secs,
            terms.free_trial_secs,
            terms.payment_period_secs,
            terms.product_metadata,
        )
        .unwrap();

        assert_eq!(packed.len(), PACKED_TERMS_LEN);
        assert_eq!(&packed[0..32], U256::from(terms.chain_id).to_be_bytes::<32>());
        assert_eq!(&packed[32..52], terms.merchant.as_slice());
        assert_eq!(&packed[52..72], terms.token.as_slice());
        assert_eq!(&packed[72..104], terms.uint_amount.to_be_bytes::<32>());
        // 2_592_000 = 0x27_8D00 in the low bytes of the 5-byte period field
        assert_eq!(&packed[104..109], &[0x00, 0x00, 0x27, 0x8D, 0x00]);
        assert_eq!(&packed[109..114], &[0u8; 5]);
        // 604_800 = 0x09_3A80 for the payment period
        assert_eq!(&packed[114..119], &[0x00, 0x00, 0x09, 0x3A, 0x80]);
        assert_eq!(&packed[119..151], terms.product_metadata.as_slice());
    }

    #[test]
    fn test_uint40_bounds() {
        assert!(uint40_be("period", UINT40_MAX).is_ok());
        let err = uint40_be("period", UINT40_MAX + 1).unwrap_err();
        match err {
            BeaverError::Uint40Overflow { field, value } => {
                assert_eq!(field, "period");
                assert_eq!(value, UINT40_MAX + 1);
            }
            other => panic!("expected Uint40Overflow, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_period_rejected_by_hash() {
        let result = product_hash(
            1,
            Address::ZERO,
            Address::ZERO,
            U256::ZERO,
            UINT40_MAX + 1,
            0,
            0,
            B256::ZERO,
        );
        assert!(matches!(
            result,
            Err(BeaverError::Uint40Overflow { field: "period", .. })
        ));
    }

    #[test]
    fn test_minimize_round_trips_synthetic_cid() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&CIDV0_PREFIX);
        raw.extend_from_slice(&[0xAB; 32]);
        let cid = bs58::encode(&raw).into_string();

        let word = minimize_content_id(&cid).unwrap();
        assert_eq!(word, B256::repeat_byte(0xAB));
        assert_eq!(expand_content_id(word), cid);
    }

    #[test]
    fn test_minimize_known_cid() {
        // CIDv0 of the IPFS "hello world" example block
        let cid = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";
        let word = minimize_content_id(cid).unwrap();
        assert_eq!(expand_content_id(word), cid);
    }

    #[test]
    fn test_minimize_rejects_invalid_base58() {
        // '0' is not in the base58 alphabet
        let err = minimize_content_id("Qm0invalid").unwrap_err();
        assert!(matches!(err, BeaverError::InvalidContentId { .. }));
    }

    #[test]
    fn test_minimize_rejects_too_short_input() {
        assert!(minimize_content_id("z").is_err());
        assert!(minimize_content_id("").is_err());
    }

    #[test]
    fn test_minimize_rejects_oversized_residual() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&CIDV0_PREFIX);
        raw.extend_from_slice(&[0x01; 40]);
        let cid = bs58::encode(&raw).into_string();

        let err = minimize_content_id(&cid).unwrap_err();
        match err {
            BeaverError::InvalidContentId { detail, .. } => {
                assert!(detail.contains("40 bytes"));
            }
            other => panic!("expected InvalidContentId, got {other:?}"),
        }
    }

    #[test]
    fn test_minimize_pads_short_residual() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&CIDV0_PREFIX);
        raw.extend_from_slice(&[0xCD; 8]);
        let cid = bs58::encode(&raw).into_string();

        let word = minimize_content_id(&cid).unwrap();
        assert_eq!(&word.as_slice()[..8], &[0xCD; 8]);
        assert_eq!(&word.as_slice()[8..], &[0u8; 24]);
    }
}
