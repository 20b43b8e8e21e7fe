//! ERC20 asset handles

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::address::{to_checksum, EthAddress};

/// Immutable description of an on-chain asset
///
/// Identity, ordering and hashing use the address only; display metadata
/// never participates in comparisons.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetHandle {
    /// Token contract address
    pub address: EthAddress,

    /// Ticker symbol (e.g. "WETH")
    pub symbol: String,

    /// Human readable name
    pub name: String,

    /// Token decimals (e.g. 18 for WETH, 6 for USDC)
    pub decimals: u8,
}

impl AssetHandle {
    pub fn new(
        address: EthAddress,
        symbol: impl Into<String>,
        name: impl Into<String>,
        decimals: u8,
    ) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            name: name.into(),
            decimals,
        }
    }
}

impl PartialEq for AssetHandle {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for AssetHandle {}

impl Hash for AssetHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

impl PartialOrd for AssetHandle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AssetHandle {
    fn cmp(&self, other: &Self) -> Ordering {
        self.address.cmp(&other.address)
    }
}

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, to_checksum(&self.address))
    }
}
