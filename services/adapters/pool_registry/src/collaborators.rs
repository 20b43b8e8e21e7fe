//! Collaborator interfaces
//!
//! The registry never talks to the chain itself. Asset metadata, pool
//! construction and factory lookups go through these traits so they can be
//! backed by web3 ([`crate::rpc_client`]) or by test doubles.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use types::{AssetHandle, EthAddress, FeeTier, PoolHandle, PoolKeyPair, PoolVariant};

use crate::cache::CachedAssetResolver;

/// Resolves an asset identifier (usually a token address) to its handle
#[async_trait]
pub trait AssetResolver: Send + Sync {
    async fn resolve(&self, identifier: &str) -> Result<Arc<AssetHandle>>;
}

/// Everything the registry knows about a pool before building it
#[derive(Debug, Clone)]
pub struct PoolBuildRequest {
    pub address: EthAddress,

    /// Factory the pool is expected to belong to
    pub factory: EthAddress,

    pub variant: PoolVariant,

    /// Assets already resolved by the caller, if the lookup came in by pair
    pub pair: Option<PoolKeyPair>,

    /// Expected fee, if the lookup came in by pair and fee
    pub fee_tier: Option<FeeTier>,
}

/// Builds a pool handle by reading the pool contract
#[async_trait]
pub trait PoolFactory: Send + Sync {
    async fn build(&self, request: PoolBuildRequest) -> Result<PoolHandle>;
}

/// On-chain factory lookups
#[async_trait]
pub trait FactoryContract: Send + Sync {
    /// Pool address for a pair (and fee, for fee-tiered factories).
    /// Returns the zero address when no pool exists.
    ///
    /// Pair-only registries locate pools with this call. Fee-tiered
    /// registries derive addresses locally and only call it from
    /// `verify_derivation`, to check a configured init code hash.
    async fn query_pair_address(
        &self,
        factory: EthAddress,
        token0: EthAddress,
        token1: EthAddress,
        fee: Option<FeeTier>,
    ) -> Result<EthAddress>;
}

/// The three collaborators a registry needs, shared by every registry in a directory
#[derive(Clone)]
pub struct Collaborators {
    pub assets: Arc<dyn AssetResolver>,
    pub pools: Arc<dyn PoolFactory>,
    pub factories: Arc<dyn FactoryContract>,
}

impl Collaborators {
    pub fn new(
        assets: Arc<dyn AssetResolver>,
        pools: Arc<dyn PoolFactory>,
        factories: Arc<dyn FactoryContract>,
    ) -> Self {
        Self {
            assets,
            pools,
            factories,
        }
    }

    /// Put a shared in-memory cache in front of the asset resolver
    pub fn with_asset_cache(self) -> Self {
        Self {
            assets: Arc::new(CachedAssetResolver::new(self.assets)),
            ..self
        }
    }
}
