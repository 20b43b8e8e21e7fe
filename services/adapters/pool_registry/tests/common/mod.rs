//! In-memory chain used by the registry integration tests
//!
//! Implements all three collaborator traits over a fixed set of tokens and
//! pools, counting every call so tests can assert on I/O.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use pool_registry::{AssetResolver, Collaborators, FactoryContract, PoolBuildRequest, PoolFactory};
use types::{
    format_address, parse_address, AssetHandle, EthAddress, FeeTier, PoolHandle, PoolKeyPair,
    ZERO_ADDRESS,
};

pub const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
pub const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";
pub const WBTC: &str = "0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599";
pub const DAI: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";

pub const UNISWAP_V2_FACTORY: &str = "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f";
pub const UNISWAP_V3_FACTORY: &str = "0x1F98431c8aD98523631AE4a59f267346ea31F984";

/// USDC/WETH 0.05% on mainnet
pub const USDC_WETH_500: &str = "0x88e6A0c2dDD26FEEb64F039a2c41296FcB3f5640";
/// USDC/WETH 0.3% on mainnet
pub const USDC_WETH_3000: &str = "0x8ad599c3A0ff1De082011EFDDc58f1908eb6e6D8";
/// USDC/WETH on Uniswap V2
pub const USDC_WETH_V2: &str = "0xB4e16d0168e52d35CaCD2c6185b44281Ec28C9Dc";

pub fn addr(s: &str) -> EthAddress {
    parse_address(s).unwrap()
}

pub fn asset(address: &str, symbol: &str, decimals: u8) -> Arc<AssetHandle> {
    Arc::new(AssetHandle::new(addr(address), symbol, symbol, decimals))
}

#[derive(Default)]
pub struct CallCounts {
    pub resolves: AtomicUsize,
    pub builds: AtomicUsize,
    pub factory_queries: AtomicUsize,
}

pub struct MockChain {
    assets: HashMap<EthAddress, Arc<AssetHandle>>,
    pools: HashMap<EthAddress, PoolHandle>,
    pairs: HashMap<(EthAddress, EthAddress), EthAddress>,
    fee_pools: HashMap<(EthAddress, EthAddress, FeeTier), EthAddress>,
    pub calls: CallCounts,

    /// Token pairs passed to the factory, in call order
    pub queried_pairs: Mutex<Vec<(EthAddress, EthAddress)>>,

    /// Number of upcoming builds that fail
    pub failing_builds: AtomicUsize,
    pub factory_down: AtomicBool,
    pub build_delay: Duration,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            assets: HashMap::new(),
            pools: HashMap::new(),
            pairs: HashMap::new(),
            fee_pools: HashMap::new(),
            calls: CallCounts::default(),
            queried_pairs: Mutex::new(Vec::new()),
            failing_builds: AtomicUsize::new(0),
            factory_down: AtomicBool::new(false),
            build_delay: Duration::ZERO,
        }
    }

    /// USDC, WETH and WBTC plus the mainnet USDC/WETH pools on both factories
    pub fn mainnet() -> Self {
        let usdc = asset(USDC, "USDC", 6);
        let weth = asset(WETH, "WETH", 18);
        let wbtc = asset(WBTC, "WBTC", 8);
        let usdc_weth = PoolKeyPair::new(usdc.clone(), weth.clone()).unwrap();

        Self::new()
            .with_asset(usdc)
            .with_asset(weth)
            .with_asset(wbtc)
            .with_pool(PoolHandle::pair_only(
                addr(USDC_WETH_V2),
                addr(UNISWAP_V2_FACTORY),
                usdc_weth.clone(),
            ))
            .with_pool(PoolHandle::fee_tiered(
                addr(USDC_WETH_500),
                addr(UNISWAP_V3_FACTORY),
                usdc_weth.clone(),
                FeeTier::LOW,
            ))
            .with_pool(PoolHandle::fee_tiered(
                addr(USDC_WETH_3000),
                addr(UNISWAP_V3_FACTORY),
                usdc_weth,
                FeeTier::MEDIUM,
            ))
    }

    pub fn with_asset(mut self, asset: Arc<AssetHandle>) -> Self {
        self.assets.insert(asset.address, asset);
        self
    }

    /// Deploy a pool and make it visible to `getPair` or `getPool`
    pub fn with_pool(mut self, pool: PoolHandle) -> Self {
        let (token0, token1) = pool.pair().addresses();
        match pool.fee_tier() {
            Some(fee) => {
                self.fee_pools.insert((token0, token1, fee), pool.address());
            }
            None => {
                self.pairs.insert((token0, token1), pool.address());
            }
        }
        self.pools.insert(pool.address(), pool);
        self
    }

    pub fn with_build_delay(mut self, delay: Duration) -> Self {
        self.build_delay = delay;
        self
    }

    pub fn fail_next_builds(&self, n: usize) {
        self.failing_builds.store(n, Ordering::SeqCst);
    }

    pub fn resolves(&self) -> usize {
        self.calls.resolves.load(Ordering::SeqCst)
    }

    pub fn builds(&self) -> usize {
        self.calls.builds.load(Ordering::SeqCst)
    }

    pub fn factory_queries(&self) -> usize {
        self.calls.factory_queries.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.resolves() + self.builds() + self.factory_queries()
    }

    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators::new(self.clone(), self.clone(), self.clone())
    }
}

#[async_trait]
impl AssetResolver for MockChain {
    async fn resolve(&self, identifier: &str) -> Result<Arc<AssetHandle>> {
        self.calls.resolves.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if let Ok(address) = parse_address(identifier) {
            return self
                .assets
                .get(&address)
                .cloned()
                .ok_or_else(|| anyhow!("no token contract at {}", format_address(&address)));
        }

        // Symbols resolve too, case-insensitively
        self.assets
            .values()
            .find(|a| a.symbol.eq_ignore_ascii_case(identifier.trim()))
            .cloned()
            .ok_or_else(|| anyhow!("unknown asset '{}'", identifier))
    }
}

#[async_trait]
impl PoolFactory for MockChain {
    async fn build(&self, request: PoolBuildRequest) -> Result<PoolHandle> {
        self.calls.builds.fetch_add(1, Ordering::SeqCst);
        if !self.build_delay.is_zero() {
            tokio::time::sleep(self.build_delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        let failing = self
            .failing_builds
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            bail!("rpc timeout");
        }

        self.pools
            .get(&request.address)
            .cloned()
            .ok_or_else(|| anyhow!("no contract at {}", format_address(&request.address)))
    }
}

#[async_trait]
impl FactoryContract for MockChain {
    async fn query_pair_address(
        &self,
        _factory: EthAddress,
        token0: EthAddress,
        token1: EthAddress,
        fee: Option<FeeTier>,
    ) -> Result<EthAddress> {
        self.calls.factory_queries.fetch_add(1, Ordering::SeqCst);
        self.queried_pairs.lock().push((token0, token1));
        tokio::task::yield_now().await;

        if self.factory_down.load(Ordering::SeqCst) {
            bail!("connection refused");
        }
        let pool = match fee {
            None => self.pairs.get(&(token0, token1)),
            Some(fee) => self.fee_pools.get(&(token0, token1, fee)),
        };
        Ok(pool.copied().unwrap_or(ZERO_ADDRESS))
    }
}
