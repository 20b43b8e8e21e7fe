//! Pool Registry
//!
//! Resolves decentralized-exchange pools to shared, immutable handles, one
//! registry per factory contract. Every call site asking for the same pool
//! gets the same `Arc<PoolHandle>`.
//!
//! Features:
//! - Lookup by pool address or by token pair (plus fee tier for V3-style pools)
//! - Dual index (address and composite key) updated as one atomic insert
//! - Exactly one construction per pool under concurrent misses
//! - CREATE2 address derivation for fee-tiered pools, no factory round-trip
//! - Web3-backed collaborators with endpoint failover
//!
//! ```rust,no_run
//! use pool_registry::{rpc_collaborators, PoolSelector, RegistryDirectory, RpcClient};
//! use registry_config::RegistryConfig;
//! use std::sync::Arc;
//! use types::{parse_address, FeeTier};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = RegistryConfig::default();
//! let rpc = Arc::new(RpcClient::new(config.rpc.clone())?);
//! let deployments = config.deployments()?;
//! let directory = RegistryDirectory::from_deployments(rpc_collaborators(rpc), &deployments);
//!
//! let factory = parse_address("0x1F98431c8aD98523631AE4a59f267346ea31F984")?;
//! let registry = directory.fee_tiered_registry(factory);
//! let pool = registry
//!     .get_pool(&PoolSelector::pair_with_fee(
//!         "0x7ceB23fD6bC0adD59E62ac25578270cFf1b9f619",
//!         "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174",
//!         FeeTier::LOW,
//!     ))
//!     .await?;
//! println!("{}", pool);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod collaborators;
pub mod directory;
pub mod error;
pub mod registry;
pub mod rpc_client;
pub mod selector;

pub use cache::CachedAssetResolver;
pub use collaborators::{
    AssetResolver, Collaborators, FactoryContract, PoolBuildRequest, PoolFactory,
};
pub use directory::{RegistryDirectory, RegistryHandle};
pub use error::RegistryError;
pub use registry::{
    FeeTiered, FeeTieredKey, PairKey, PairOnly, PoolRegistry, RegistryMetrics, RegistryVariant,
};
pub use rpc_client::{rpc_collaborators, OnChainPoolFactory, RpcClient};
pub use selector::PoolSelector;
