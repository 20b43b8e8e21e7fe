//! Pool identity types: fee tiers, canonical pairs and pool handles

use std::fmt;
use std::sync::Arc;

use crate::address::{to_checksum, EthAddress};
use crate::asset::AssetHandle;
use crate::errors::ValidationError;

/// Pool fee in hundredths of a basis point (500 = 0.05%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u32", into = "u32"))]
pub struct FeeTier(u32);

impl FeeTier {
    /// Exclusive upper bound, fees are stored as uint24 and capped at 100%
    pub const MAX: u32 = 1_000_000;

    pub const LOWEST: FeeTier = FeeTier(100);
    pub const LOW: FeeTier = FeeTier(500);
    pub const MEDIUM: FeeTier = FeeTier(3_000);
    pub const HIGH: FeeTier = FeeTier(10_000);

    /// Tiers enabled on the canonical Uniswap V3 factory
    pub const UNISWAP_V3: [FeeTier; 4] = [Self::LOWEST, Self::LOW, Self::MEDIUM, Self::HIGH];

    pub fn new(fee: u32) -> Result<Self, ValidationError> {
        if fee >= Self::MAX {
            return Err(ValidationError::FeeOutOfRange {
                fee,
                max: Self::MAX,
            });
        }
        Ok(Self(fee))
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Fee as a percentage (3000 -> 0.3)
    pub fn as_percent(self) -> f64 {
        self.0 as f64 / 10_000.0
    }
}

impl TryFrom<u32> for FeeTier {
    type Error = ValidationError;

    fn try_from(fee: u32) -> Result<Self, Self::Error> {
        Self::new(fee)
    }
}

impl From<FeeTier> for u32 {
    fn from(fee: FeeTier) -> u32 {
        fee.0
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.as_percent())
    }
}

/// Pool family, which determines the shape of the composite key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PoolVariant {
    /// Constant-product pools keyed by token pair (Uniswap V2 and forks)
    #[cfg_attr(feature = "serde", serde(alias = "v2", alias = "uniswap_v2"))]
    PairOnly,

    /// Concentrated-liquidity pools keyed by token pair and fee (Uniswap V3 and forks)
    #[cfg_attr(feature = "serde", serde(alias = "v3", alias = "uniswap_v3"))]
    FeeTiered,
}

impl PoolVariant {
    pub fn label(self) -> &'static str {
        match self {
            PoolVariant::PairOnly => "V2",
            PoolVariant::FeeTiered => "V3",
        }
    }
}

impl fmt::Display for PoolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unordered token pair stored in canonical order (lower address first)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKeyPair {
    token0: Arc<AssetHandle>,
    token1: Arc<AssetHandle>,
}

impl PoolKeyPair {
    pub fn new(a: Arc<AssetHandle>, b: Arc<AssetHandle>) -> Result<Self, ValidationError> {
        if a.address == b.address {
            return Err(ValidationError::IdenticalAssets { address: a.address });
        }
        let (token0, token1) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { token0, token1 })
    }

    pub fn token0(&self) -> &Arc<AssetHandle> {
        &self.token0
    }

    pub fn token1(&self) -> &Arc<AssetHandle> {
        &self.token1
    }

    /// Canonical address pair used as the cache key
    pub fn addresses(&self) -> (EthAddress, EthAddress) {
        (self.token0.address, self.token1.address)
    }

    pub fn contains(&self, address: &EthAddress) -> bool {
        self.token0.address == *address || self.token1.address == *address
    }
}

impl fmt::Display for PoolKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.token0.symbol, self.token1.symbol)
    }
}

/// Constructed pool, immutable once built
///
/// Only identity lives here. Reserves, ticks and prices belong to whatever
/// state tracker consumes the handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolHandle {
    address: EthAddress,
    factory: EthAddress,
    pair: PoolKeyPair,
    fee_tier: Option<FeeTier>,
    name: String,
}

impl PoolHandle {
    /// Pool from the pair-only family
    pub fn pair_only(address: EthAddress, factory: EthAddress, pair: PoolKeyPair) -> Self {
        let name = format!("{} (V2)", pair);
        Self {
            address,
            factory,
            pair,
            fee_tier: None,
            name,
        }
    }

    /// Pool from the fee-tiered family
    pub fn fee_tiered(
        address: EthAddress,
        factory: EthAddress,
        pair: PoolKeyPair,
        fee: FeeTier,
    ) -> Self {
        let name = format!("{} (V3, {})", pair, fee);
        Self {
            address,
            factory,
            pair,
            fee_tier: Some(fee),
            name,
        }
    }

    /// Override the generated display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn address(&self) -> EthAddress {
        self.address
    }

    pub fn factory(&self) -> EthAddress {
        self.factory
    }

    pub fn pair(&self) -> &PoolKeyPair {
        &self.pair
    }

    pub fn token0(&self) -> &Arc<AssetHandle> {
        self.pair.token0()
    }

    pub fn token1(&self) -> &Arc<AssetHandle> {
        self.pair.token1()
    }

    pub fn fee_tier(&self) -> Option<FeeTier> {
        self.fee_tier
    }

    pub fn variant(&self) -> PoolVariant {
        if self.fee_tier.is_some() {
            PoolVariant::FeeTiered
        } else {
            PoolVariant::PairOnly
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.name, to_checksum(&self.address))
    }
}
