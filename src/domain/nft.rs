//! NFT identity helpers — checksummed addresses and composite ids.
//!
//! Every address that enters the system is normalized to its EIP-55
//! checksummed form, and NFTs are referred to by the composite key
//! `"ethereum/{checksummedContract}/{hexTokenId}"` across all
//! components.

use alloy::primitives::{Address, U256};

/// Checksum an Ethereum address regardless of input casing.
///
/// Returns `None` for strings that are not valid 20-byte hex
/// addresses; callers treat such documents as schema failures.
pub fn checksum_address(raw: &str) -> Option<String> {
    raw.trim().parse::<Address>().ok().map(|a| a.to_checksum(None))
}

/// Render a token id (decimal or 0x-hex input) as a 0x-prefixed
/// minimal hex string, the form used inside `nftId` keys.
pub fn token_id_hex(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let value = match raw.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16).ok()?,
        None => U256::from_str_radix(raw, 10).ok()?,
    };
    Some(format!("{value:#x}"))
}

/// Build the composite NFT key `"ethereum/{contract}/{tokenId}"`.
pub fn nft_id(contract: &str, token_id: &str) -> Option<String> {
    let contract = checksum_address(contract)?;
    let token = token_id_hex(token_id)?;
    Some(format!("ethereum/{contract}/{token}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // EIP-55 reference vectors.
    const CHECKSUMMED: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[test]
    fn checksums_lowercase_input() {
        let lower = CHECKSUMMED.to_lowercase();
        assert_eq!(checksum_address(&lower).as_deref(), Some(CHECKSUMMED));
    }

    #[test]
    fn checksum_is_idempotent() {
        assert_eq!(
            checksum_address(CHECKSUMMED).as_deref(),
            Some(CHECKSUMMED)
        );
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert_eq!(checksum_address("0x1234"), None);
        assert_eq!(checksum_address("not-an-address"), None);
    }

    #[test]
    fn token_id_accepts_decimal_and_hex() {
        assert_eq!(token_id_hex("1").as_deref(), Some("0x1"));
        assert_eq!(token_id_hex("255").as_deref(), Some("0xff"));
        assert_eq!(token_id_hex("0xff").as_deref(), Some("0xff"));
    }

    #[test]
    fn nft_id_combines_checksum_and_hex() {
        let id = nft_id(&CHECKSUMMED.to_lowercase(), "1").unwrap();
        assert_eq!(id, format!("ethereum/{CHECKSUMMED}/0x1"));
    }
}
