//! Ethereum address helpers
//!
//! Addresses are carried as raw 20-byte arrays. Parsing accepts any letter case,
//! with or without the `0x` prefix; display uses the EIP-55 checksum form.

use sha3::{Digest, Keccak256};
use thiserror::Error;

/// Standardized 20-byte Ethereum address type
pub type EthAddress = [u8; 20];

/// Sentinel returned by factory contracts when no pool exists
pub const ZERO_ADDRESS: EthAddress = [0u8; 20];

/// Errors raised while parsing a textual address
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address '{input}' has {len} hex digits, expected 40")]
    InvalidLength { input: String, len: usize },

    #[error("address '{input}' is not valid hex")]
    InvalidHex { input: String },
}

/// Parse a hex address string into raw bytes
pub fn parse_address(input: &str) -> Result<EthAddress, AddressError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.len() != 40 {
        return Err(AddressError::InvalidLength {
            input: input.to_string(),
            len: digits.len(),
        });
    }

    let mut address = [0u8; 20];
    hex::decode_to_slice(digits, &mut address).map_err(|_| AddressError::InvalidHex {
        input: input.to_string(),
    })?;
    Ok(address)
}

/// EIP-55 mixed-case checksum encoding
pub fn to_checksum(address: &EthAddress) -> String {
    let lower = hex::encode(address);
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Lowercase `0x`-prefixed hex, used in log fields
pub fn format_address(address: &EthAddress) -> String {
    format!("0x{}", hex::encode(address))
}

pub fn is_zero_address(address: &EthAddress) -> bool {
    *address == ZERO_ADDRESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_prefix_and_case() {
        let a = parse_address("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2").unwrap();
        let b = parse_address("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2").unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0], 0xc0);
        assert_eq!(a[19], 0xc2);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            parse_address("0x1234"),
            Err(AddressError::InvalidLength { len: 4, .. })
        ));
        assert!(matches!(
            parse_address("0xZZ2aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            Err(AddressError::InvalidHex { .. })
        ));
    }

    #[test]
    fn test_checksum_matches_eip55_vectors() {
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let parsed = parse_address(expected).unwrap();
            assert_eq!(to_checksum(&parsed), expected);
        }
    }

    #[test]
    fn test_zero_address() {
        assert!(is_zero_address(&ZERO_ADDRESS));
        assert!(!is_zero_address(&[1u8; 20]));
        assert_eq!(
            format_address(&ZERO_ADDRESS),
            "0x0000000000000000000000000000000000000000"
        );
    }
}
