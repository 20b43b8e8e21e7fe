//! Pool selectors
//!
//! A selector names a pool either by address or by its token pair (plus fee
//! for fee-tiered pools). Which shapes are legal depends on the registry.

use std::fmt;

use types::{format_address, parse_address, EthAddress, FeeTier};

use crate::error::RegistryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolSelector {
    /// Pool contract address
    ByAddress(EthAddress),

    /// Unordered pair of asset identifiers
    ByPair(String, String),

    /// Unordered pair of asset identifiers with a fee tier
    ByPairAndFee(String, String, FeeTier),
}

impl PoolSelector {
    pub fn address(address: EthAddress) -> Self {
        PoolSelector::ByAddress(address)
    }

    pub fn pair(a: impl Into<String>, b: impl Into<String>) -> Self {
        PoolSelector::ByPair(a.into(), b.into())
    }

    pub fn pair_with_fee(a: impl Into<String>, b: impl Into<String>, fee: FeeTier) -> Self {
        PoolSelector::ByPairAndFee(a.into(), b.into(), fee)
    }

    /// Build a selector from loosely typed optional inputs
    ///
    /// Exactly one of `address` or `pair` must be given. A fee is only
    /// accepted alongside a pair.
    pub fn from_parts(
        address: Option<&str>,
        pair: Option<(&str, &str)>,
        fee: Option<u32>,
    ) -> Result<Self, RegistryError> {
        match (address, pair, fee) {
            (Some(address), None, None) => {
                let address = parse_address(address)
                    .map_err(|e| RegistryError::invalid(e.to_string()))?;
                Ok(PoolSelector::ByAddress(address))
            }
            (None, Some((a, b)), None) => Ok(PoolSelector::pair(a, b)),
            (None, Some((a, b)), Some(fee)) => {
                let fee = FeeTier::new(fee).map_err(|e| RegistryError::invalid(e.to_string()))?;
                Ok(PoolSelector::pair_with_fee(a, b, fee))
            }
            (Some(_), Some(_), _) => Err(RegistryError::invalid(
                "pass a pool address or a token pair, not both",
            )),
            (Some(_), None, Some(_)) => Err(RegistryError::invalid(
                "a fee tier cannot be combined with a pool address",
            )),
            (None, None, Some(_)) => Err(RegistryError::invalid(
                "a fee tier requires a token pair",
            )),
            (None, None, None) => Err(RegistryError::invalid(
                "pass a pool address or a token pair",
            )),
        }
    }

    /// Reject selectors that can never name a pool
    pub(crate) fn validate(&self) -> Result<(), RegistryError> {
        match self {
            PoolSelector::ByAddress(address) => {
                if types::is_zero_address(address) {
                    return Err(RegistryError::invalid("zero address is not a pool"));
                }
            }
            PoolSelector::ByPair(a, b) | PoolSelector::ByPairAndFee(a, b, _) => {
                let (a, b) = (normalize_identifier(a), normalize_identifier(b));
                if a.is_empty() || b.is_empty() {
                    return Err(RegistryError::invalid("asset identifier is empty"));
                }
                if a == b {
                    return Err(RegistryError::invalid(format!(
                        "pair requires two distinct assets, got '{}' twice",
                        a
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Trimmed, lowercased, `0x`-prefixed when the identifier is a raw address
pub(crate) fn normalize_identifier(identifier: &str) -> String {
    let trimmed = identifier.trim();
    match parse_address(trimmed) {
        Ok(address) => format_address(&address),
        Err(_) => trimmed.to_ascii_lowercase(),
    }
}

impl fmt::Display for PoolSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolSelector::ByAddress(address) => write!(f, "address {}", format_address(address)),
            PoolSelector::ByPair(a, b) => write!(f, "pair {}/{}", a, b),
            PoolSelector::ByPairAndFee(a, b, fee) => write!(f, "pair {}/{} fee {}", a, b, fee),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";
    const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

    #[test]
    fn test_from_parts_legal_shapes() {
        assert_eq!(
            PoolSelector::from_parts(Some(WETH), None, None).unwrap(),
            PoolSelector::ByAddress(parse_address(WETH).unwrap())
        );
        assert_eq!(
            PoolSelector::from_parts(None, Some((WETH, USDC)), None).unwrap(),
            PoolSelector::pair(WETH, USDC)
        );
        assert_eq!(
            PoolSelector::from_parts(None, Some((WETH, USDC)), Some(500)).unwrap(),
            PoolSelector::pair_with_fee(WETH, USDC, FeeTier::LOW)
        );
    }

    #[test]
    fn test_from_parts_rejects_contradictions() {
        let cases = [
            PoolSelector::from_parts(Some(WETH), Some((WETH, USDC)), None),
            PoolSelector::from_parts(Some(WETH), Some((WETH, USDC)), Some(500)),
            PoolSelector::from_parts(Some(WETH), None, Some(500)),
            PoolSelector::from_parts(None, None, Some(500)),
            PoolSelector::from_parts(None, None, None),
            PoolSelector::from_parts(Some("0x12"), None, None),
            PoolSelector::from_parts(None, Some((WETH, USDC)), Some(5_000_000)),
        ];
        for case in cases {
            assert!(matches!(case, Err(RegistryError::InvalidSelector(_))));
        }
    }

    #[test]
    fn test_validate_same_asset_any_case() {
        let selector = PoolSelector::pair(WETH, WETH.to_lowercase());
        assert!(matches!(
            selector.validate(),
            Err(RegistryError::InvalidSelector(_))
        ));

        let selector = PoolSelector::pair("weth", " WETH ");
        assert!(selector.validate().is_err());

        assert!(PoolSelector::pair(WETH, USDC).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_address_and_empty() {
        assert!(PoolSelector::address([0u8; 20]).validate().is_err());
        assert!(PoolSelector::pair("", USDC).validate().is_err());
    }
}
