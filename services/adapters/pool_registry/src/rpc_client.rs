//! RPC-backed collaborators
//!
//! Handles all communication with blockchain nodes: ERC20 metadata, factory
//! pair lookups and pool immutables. Every call gets a timeout and falls over
//! to the next configured endpoint on failure. No retries beyond that.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use dex::abi::{erc20, uniswap_v2, uniswap_v3};
use registry_config::RpcConfig;
use tracing::{debug, warn};
use types::{
    format_address, parse_address, to_checksum, AssetHandle, EthAddress, FeeTier, PoolHandle,
    PoolKeyPair, PoolVariant,
};
use web3::contract::{Contract, Options};
use web3::transports::Http;
use web3::types::{Address, H160, U256};
use web3::Web3;

use crate::cache::CachedAssetResolver;
use crate::collaborators::{
    AssetResolver, Collaborators, FactoryContract, PoolBuildRequest, PoolFactory,
};

pub struct RpcClient {
    config: RpcConfig,
    web3_clients: Vec<Web3<Http>>,
}

/// Immutable fields read from a pool contract
#[derive(Debug, Clone, Copy)]
struct PoolImmutables {
    token0: EthAddress,
    token1: EthAddress,
    factory: EthAddress,
    fee: Option<u32>,
}

impl RpcClient {
    /// Create new RPC client with configured endpoints
    pub fn new(config: RpcConfig) -> Result<Self> {
        let mut web3_clients = Vec::new();

        // Add primary RPC
        let transport = Http::new(&config.primary_rpc)
            .with_context(|| format!("Invalid primary RPC endpoint {}", config.primary_rpc))?;
        web3_clients.push(Web3::new(transport));

        // Add fallback RPCs
        for rpc_url in &config.fallback_rpcs {
            match Http::new(rpc_url) {
                Ok(transport) => web3_clients.push(Web3::new(transport)),
                Err(e) => warn!("Skipping fallback RPC {}: {}", rpc_url, e),
            }
        }

        Ok(Self {
            config,
            web3_clients,
        })
    }

    pub fn endpoint_count(&self) -> usize {
        self.web3_clients.len()
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.rpc_timeout_ms)
    }

    /// Run `call` against each endpoint in turn until one succeeds
    async fn with_failover<T, F, Fut>(&self, what: &str, call: F) -> Result<T>
    where
        F: Fn(Web3<Http>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = anyhow!("No RPC endpoints configured");

        for (idx, web3) in self.web3_clients.iter().enumerate() {
            match tokio::time::timeout(self.timeout(), call(web3.clone())).await {
                Ok(Ok(value)) => {
                    debug!("{} succeeded via RPC endpoint {}", what, idx);
                    return Ok(value);
                }
                Ok(Err(e)) => {
                    warn!("RPC endpoint {} failed for {}: {:#}", idx, what, e);
                    last_error = e;
                }
                Err(_) => {
                    warn!(
                        "RPC endpoint {} timed out after {}ms for {}",
                        idx, self.config.rpc_timeout_ms, what
                    );
                    last_error =
                        anyhow!("{} timed out after {}ms", what, self.config.rpc_timeout_ms);
                }
            }
        }

        Err(last_error.context(format!("All RPC endpoints failed for {}", what)))
    }

    /// Read ERC20 symbol, name and decimals
    pub async fn erc20_metadata(&self, token: EthAddress) -> Result<AssetHandle> {
        let what = format!("token metadata {}", format_address(&token));
        self.with_failover(&what, |web3| async move {
            let contract = Contract::from_json(
                web3.eth(),
                H160::from(token),
                erc20::METADATA_ABI.as_bytes(),
            )?;

            let decimals: u8 = contract
                .query("decimals", (), None, Options::default(), None)
                .await
                .context("Failed to get decimals")?;

            // Some tokens return bytes32 here; fall back to the address
            let symbol: String = match contract
                .query("symbol", (), None, Options::default(), None)
                .await
            {
                Ok(symbol) => symbol,
                Err(e) => {
                    warn!("No string symbol for {}: {}", format_address(&token), e);
                    to_checksum(&token)
                }
            };
            let name: String = contract
                .query("name", (), None, Options::default(), None)
                .await
                .unwrap_or_else(|_| symbol.clone());

            Ok(AssetHandle::new(token, symbol, name, decimals))
        })
        .await
    }

    async fn pool_immutables(
        &self,
        pool: EthAddress,
        variant: PoolVariant,
    ) -> Result<PoolImmutables> {
        let what = format!("pool immutables {}", format_address(&pool));
        self.with_failover(&what, |web3| async move {
            let abi = match variant {
                PoolVariant::PairOnly => uniswap_v2::PAIR_ABI,
                PoolVariant::FeeTiered => uniswap_v3::POOL_ABI,
            };
            let contract = Contract::from_json(web3.eth(), H160::from(pool), abi.as_bytes())?;

            let token0: Address = contract
                .query("token0", (), None, Options::default(), None)
                .await
                .context("Failed to get token0")?;
            let token1: Address = contract
                .query("token1", (), None, Options::default(), None)
                .await
                .context("Failed to get token1")?;
            let factory: Address = contract
                .query("factory", (), None, Options::default(), None)
                .await
                .context("Failed to get factory")?;

            let fee = match variant {
                PoolVariant::FeeTiered => Some(
                    contract
                        .query::<u32, _, _, _>("fee", (), None, Options::default(), None)
                        .await
                        .context("Failed to get fee")?,
                ),
                PoolVariant::PairOnly => None,
            };

            Ok(PoolImmutables {
                token0: token0.0,
                token1: token1.0,
                factory: factory.0,
                fee,
            })
        })
        .await
    }
}

#[async_trait]
impl AssetResolver for RpcClient {
    async fn resolve(&self, identifier: &str) -> Result<Arc<AssetHandle>> {
        let address = parse_address(identifier)
            .with_context(|| format!("'{}' is not a token address", identifier))?;
        Ok(Arc::new(self.erc20_metadata(address).await?))
    }
}

#[async_trait]
impl FactoryContract for RpcClient {
    async fn query_pair_address(
        &self,
        factory: EthAddress,
        token0: EthAddress,
        token1: EthAddress,
        fee: Option<FeeTier>,
    ) -> Result<EthAddress> {
        let what = format!("factory lookup on {}", format_address(&factory));
        self.with_failover(&what, |web3| async move {
            let pool: Address = match fee {
                None => {
                    let contract = Contract::from_json(
                        web3.eth(),
                        H160::from(factory),
                        uniswap_v2::FACTORY_ABI.as_bytes(),
                    )?;
                    contract
                        .query(
                            "getPair",
                            (H160::from(token0), H160::from(token1)),
                            None,
                            Options::default(),
                            None,
                        )
                        .await
                        .context("getPair call failed")?
                }
                Some(fee) => {
                    let contract = Contract::from_json(
                        web3.eth(),
                        H160::from(factory),
                        uniswap_v3::FACTORY_ABI.as_bytes(),
                    )?;
                    contract
                        .query(
                            "getPool",
                            (
                                H160::from(token0),
                                H160::from(token1),
                                U256::from(fee.as_u32()),
                            ),
                            None,
                            Options::default(),
                            None,
                        )
                        .await
                        .context("getPool call failed")?
                }
            };
            Ok(pool.0)
        })
        .await
    }
}

/// Builds pool handles from on-chain immutables
///
/// Token metadata goes through the shared asset resolver so pools and
/// direct asset lookups see the same handles.
pub struct OnChainPoolFactory {
    rpc: Arc<RpcClient>,
    assets: Arc<dyn AssetResolver>,
}

impl OnChainPoolFactory {
    pub fn new(rpc: Arc<RpcClient>, assets: Arc<dyn AssetResolver>) -> Self {
        Self { rpc, assets }
    }
}

#[async_trait]
impl PoolFactory for OnChainPoolFactory {
    async fn build(&self, request: PoolBuildRequest) -> Result<PoolHandle> {
        let immutables = self
            .rpc
            .pool_immutables(request.address, request.variant)
            .await
            .with_context(|| {
                format!(
                    "No {} pool contract at {}",
                    request.variant,
                    format_address(&request.address)
                )
            })?;

        let handle = handle_from(request, immutables, self.assets.as_ref()).await?;
        debug!("Built pool handle {}", handle);
        Ok(handle)
    }
}

/// Assemble a handle from what the pool contract reports about itself
async fn handle_from(
    request: PoolBuildRequest,
    immutables: PoolImmutables,
    assets: &dyn AssetResolver,
) -> Result<PoolHandle> {
    let pair = match request.pair {
        Some(pair) => {
            if pair.addresses() != (immutables.token0, immutables.token1) {
                bail!("Token addresses do not match tokens recorded at contract");
            }
            pair
        }
        None => {
            let id0 = format_address(&immutables.token0);
            let id1 = format_address(&immutables.token1);
            let (token0, token1) = tokio::try_join!(assets.resolve(&id0), assets.resolve(&id1))?;
            PoolKeyPair::new(token0, token1)?
        }
    };

    Ok(match request.variant {
        PoolVariant::PairOnly => PoolHandle::pair_only(request.address, immutables.factory, pair),
        PoolVariant::FeeTiered => {
            let raw_fee = immutables
                .fee
                .ok_or_else(|| anyhow!("Fee-tiered pool did not report a fee"))?;
            let fee = FeeTier::new(raw_fee)?;
            PoolHandle::fee_tiered(request.address, immutables.factory, pair, fee)
        }
    })
}

/// Collaborators backed by a single RPC client with a shared asset cache
pub fn rpc_collaborators(rpc: Arc<RpcClient>) -> Collaborators {
    let assets: Arc<dyn AssetResolver> = Arc::new(CachedAssetResolver::new(rpc.clone()));
    let pools = Arc::new(OnChainPoolFactory::new(rpc.clone(), assets.clone()));
    Collaborators::new(assets, pools, rpc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const POOL: EthAddress = [0x99; 20];
    const FACTORY: EthAddress = [0xfa; 20];
    const TOKEN_A: EthAddress = [0x01; 20];
    const TOKEN_B: EthAddress = [0x02; 20];

    /// Answers any address with a handle named after its first byte
    #[derive(Default)]
    struct CountingAssets {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AssetResolver for CountingAssets {
        async fn resolve(&self, identifier: &str) -> Result<Arc<AssetHandle>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let address = parse_address(identifier)?;
            let symbol = format!("T{:02x}", address[0]);
            Ok(Arc::new(AssetHandle::new(address, symbol.clone(), symbol, 18)))
        }
    }

    fn token(address: EthAddress, symbol: &str) -> Arc<AssetHandle> {
        Arc::new(AssetHandle::new(address, symbol, symbol, 18))
    }

    fn immutables(fee: Option<u32>) -> PoolImmutables {
        PoolImmutables {
            token0: TOKEN_A,
            token1: TOKEN_B,
            factory: FACTORY,
            fee,
        }
    }

    fn request(variant: PoolVariant, pair: Option<PoolKeyPair>) -> PoolBuildRequest {
        PoolBuildRequest {
            address: POOL,
            factory: FACTORY,
            variant,
            pair,
            fee_tier: None,
        }
    }

    fn local_config() -> RpcConfig {
        RpcConfig {
            primary_rpc: "http://127.0.0.1:8545".to_string(),
            fallback_rpcs: vec!["http://127.0.0.1:8546".to_string()],
            chain_id: 1,
            rpc_timeout_ms: 1_000,
        }
    }

    #[test]
    fn test_client_creation() {
        let client = RpcClient::new(local_config()).unwrap();
        assert_eq!(client.endpoint_count(), 2);
    }

    #[tokio::test]
    async fn test_resolver_rejects_non_address_before_rpc() {
        let client = RpcClient::new(local_config()).unwrap();
        let err = client.resolve("WETH").await.unwrap_err();
        assert!(err.to_string().contains("not a token address"));
    }

    #[tokio::test]
    async fn test_handle_rejects_pair_the_contract_does_not_hold() {
        let assets = CountingAssets::default();
        let wrong = PoolKeyPair::new(token(TOKEN_A, "AAA"), token([0x03; 20], "CCC")).unwrap();

        let err = handle_from(
            request(PoolVariant::PairOnly, Some(wrong)),
            immutables(None),
            &assets,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("do not match"));
        assert_eq!(assets.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handle_reads_fee_back_from_contract() {
        let assets = CountingAssets::default();
        let pair = PoolKeyPair::new(token(TOKEN_B, "WETH"), token(TOKEN_A, "USDC")).unwrap();

        let handle = handle_from(
            request(PoolVariant::FeeTiered, Some(pair)),
            immutables(Some(500)),
            &assets,
        )
        .await
        .unwrap();

        assert_eq!(handle.fee_tier(), Some(FeeTier::LOW));
        assert_eq!(handle.factory(), FACTORY);
        assert_eq!(handle.name(), "USDC-WETH (V3, 0.05%)");
        // Supplied pair is used as is
        assert_eq!(assets.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fee_tiered_handle_needs_a_valid_fee() {
        let assets = CountingAssets::default();

        let missing = handle_from(
            request(PoolVariant::FeeTiered, None),
            immutables(None),
            &assets,
        )
        .await
        .unwrap_err();
        assert!(missing.to_string().contains("did not report a fee"));

        let out_of_range = handle_from(
            request(PoolVariant::FeeTiered, None),
            immutables(Some(FeeTier::MAX)),
            &assets,
        )
        .await;
        assert!(out_of_range.is_err());
    }

    #[tokio::test]
    async fn test_handle_resolves_tokens_when_no_pair_given() {
        let assets = CountingAssets::default();

        let handle = handle_from(
            request(PoolVariant::PairOnly, None),
            immutables(None),
            &assets,
        )
        .await
        .unwrap();

        assert_eq!(assets.calls.load(Ordering::SeqCst), 2);
        assert_eq!(handle.pair().addresses(), (TOKEN_A, TOKEN_B));
        assert_eq!(handle.token0().symbol, "T01");
        assert_eq!(handle.fee_tier(), None);
        assert_eq!(handle.address(), POOL);
    }

    #[tokio::test]
    #[ignore] // Run with --ignored flag to test with real RPC
    async fn test_real_polygon_pool_build() {
        let rpc = Arc::new(RpcClient::new(RpcConfig::default()).unwrap());
        let collaborators = rpc_collaborators(rpc);

        // WMATIC/USDC QuickSwap V2
        let address = parse_address("0x6e7a5FAFcec6BB1e78bAE2A1F0B612012BF14827").unwrap();
        let factory = parse_address("0x5757371414417b8C6CAad45bAeF941aBc7d3Ab32").unwrap();
        let request = PoolBuildRequest {
            address,
            factory,
            variant: PoolVariant::PairOnly,
            pair: None,
            fee_tier: None,
        };

        match collaborators.pools.build(request).await {
            Ok(handle) => {
                assert_eq!(handle.token0().decimals, 18);
                assert_eq!(handle.token1().decimals, 6);
            }
            Err(e) => {
                // This might fail if RPC is unavailable or rate limited
                println!("Pool build failed (expected in CI): {:#}", e);
            }
        }
    }
}
