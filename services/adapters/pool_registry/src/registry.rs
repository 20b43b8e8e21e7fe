//! Per-factory pool registry
//!
//! A registry owns two indices over the same set of pool handles: by pool
//! address and by composite key (sorted token pair, plus fee for fee-tiered
//! pools). Both live behind one lock and are only ever written together, so
//! a reader never sees a pool in one index and not the other.
//!
//! Construction runs outside that lock. Concurrent misses for the same pool
//! address attach to a single in-flight attempt: the first caller builds and
//! everyone attached receives the same outcome, success or failure. The
//! attempt is forgotten once it settles or once every attached caller has
//! gone away, so a later call starts fresh.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::Arc;

use anyhow::{anyhow, bail};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use dex::{compute_pool_address, InitCodeHash};
use parking_lot::RwLock;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use types::{
    format_address, is_zero_address, AssetHandle, EthAddress, FeeTier, PoolHandle, PoolKeyPair,
    PoolVariant,
};

use crate::collaborators::{Collaborators, PoolBuildRequest};
use crate::error::RegistryError;
use crate::selector::PoolSelector;

/// Composite key of a pair-only pool: (token0, token1)
pub type PairKey = (EthAddress, EthAddress);

/// Composite key of a fee-tiered pool: (token0, token1, fee)
pub type FeeTieredKey = (EthAddress, EthAddress, FeeTier);

/// Shape of a registry family
pub trait RegistryVariant: Send + Sync + 'static {
    /// Secondary index key
    type Key: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// Per-registry constants needed to locate pools
    type Params: Clone + Debug + Send + Sync + 'static;

    const VARIANT: PoolVariant;

    /// Composite key read back from a constructed handle
    fn key_of(handle: &PoolHandle) -> Option<Self::Key>;
}

/// Uniswap V2 style factories: one pool per pair, found with `getPair`
#[derive(Debug)]
pub struct PairOnly;

/// Uniswap V3 style factories: one pool per pair and fee, at a CREATE2 address
#[derive(Debug)]
pub struct FeeTiered;

impl RegistryVariant for PairOnly {
    type Key = PairKey;
    type Params = ();

    const VARIANT: PoolVariant = PoolVariant::PairOnly;

    fn key_of(handle: &PoolHandle) -> Option<Self::Key> {
        Some(handle.pair().addresses())
    }
}

impl RegistryVariant for FeeTiered {
    type Key = FeeTieredKey;

    /// Pool init code hash for address derivation
    type Params = InitCodeHash;

    const VARIANT: PoolVariant = PoolVariant::FeeTiered;

    fn key_of(handle: &PoolHandle) -> Option<Self::Key> {
        let (token0, token1) = handle.pair().addresses();
        handle.fee_tier().map(|fee| (token0, token1, fee))
    }
}

/// Registry counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegistryMetrics {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub constructions: u64,
    pub construction_failures: u64,
    pub factory_queries: u64,
    pub derived_addresses: u64,
}

struct PoolIndex<K> {
    by_address: HashMap<EthAddress, Arc<PoolHandle>>,
    by_key: HashMap<K, Arc<PoolHandle>>,
}

impl<K> Default for PoolIndex<K> {
    fn default() -> Self {
        Self {
            by_address: HashMap::new(),
            by_key: HashMap::new(),
        }
    }
}

/// Build failure handed to every caller attached to one attempt
#[derive(Debug, Clone)]
struct SharedFailure(Arc<anyhow::Error>);

impl fmt::Display for SharedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for SharedFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

type BuildOutcome = Result<Arc<PoolHandle>, SharedFailure>;
type AttemptCell = Arc<OnceCell<BuildOutcome>>;

/// One construction attempt and the number of callers attached to it
struct InFlight {
    cell: AttemptCell,
    callers: usize,
}

/// Detaches a caller from an attempt, also when the caller is cancelled
struct AttemptGuard<'a> {
    in_flight: &'a DashMap<EthAddress, InFlight>,
    address: EthAddress,
    cell: AttemptCell,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if let Entry::Occupied(mut entry) = self.in_flight.entry(self.address) {
            if !Arc::ptr_eq(&entry.get().cell, &self.cell) {
                return;
            }
            entry.get_mut().callers -= 1;
            if entry.get().callers == 0 || self.cell.initialized() {
                entry.remove();
            }
        }
    }
}

/// Pool registry for a single factory contract
pub struct PoolRegistry<V: RegistryVariant> {
    factory: EthAddress,
    params: V::Params,
    collaborators: Collaborators,
    index: RwLock<PoolIndex<V::Key>>,
    in_flight: DashMap<EthAddress, InFlight>,
    metrics: RwLock<RegistryMetrics>,
}

impl<V: RegistryVariant> PoolRegistry<V> {
    pub fn new(factory: EthAddress, params: V::Params, collaborators: Collaborators) -> Self {
        Self {
            factory,
            params,
            collaborators,
            index: RwLock::new(PoolIndex::default()),
            in_flight: DashMap::new(),
            metrics: RwLock::new(RegistryMetrics::default()),
        }
    }

    pub fn factory(&self) -> EthAddress {
        self.factory
    }

    pub fn variant(&self) -> PoolVariant {
        V::VARIANT
    }

    /// Number of cached pools
    pub fn len(&self) -> usize {
        self.index.read().by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every cached pool
    pub fn pools(&self) -> Vec<Arc<PoolHandle>> {
        self.index.read().by_address.values().cloned().collect()
    }

    pub fn metrics(&self) -> RegistryMetrics {
        self.metrics.read().clone()
    }

    /// Cached handle for a pool address, without any I/O
    pub fn cached_by_address(&self, address: &EthAddress) -> Option<Arc<PoolHandle>> {
        self.index.read().by_address.get(address).cloned()
    }

    /// Cached handle for a composite key, without any I/O
    pub fn cached_by_key(&self, key: &V::Key) -> Option<Arc<PoolHandle>> {
        self.index.read().by_key.get(key).cloned()
    }

    fn record_hit(&self, handle: &PoolHandle) {
        self.metrics.write().cache_hits += 1;
        debug!("Cache hit for pool {}", handle);
    }

    fn record_miss(&self) {
        self.metrics.write().cache_misses += 1;
    }

    async fn get_by_address(
        &self,
        address: EthAddress,
    ) -> Result<Arc<PoolHandle>, RegistryError> {
        if let Some(handle) = self.cached_by_address(&address) {
            self.record_hit(&handle);
            return Ok(handle);
        }
        self.record_miss();

        self.construct(PoolBuildRequest {
            address,
            factory: self.factory,
            variant: V::VARIANT,
            pair: None,
            fee_tier: None,
        })
        .await
    }

    async fn resolve_asset(&self, identifier: &str) -> Result<Arc<AssetHandle>, RegistryError> {
        self.collaborators
            .assets
            .resolve(identifier)
            .await
            .map_err(|source| {
                warn!("Failed to resolve asset '{}': {:#}", identifier, source);
                RegistryError::ResolutionFailed {
                    identifier: identifier.to_string(),
                    source,
                }
            })
    }

    /// Resolve both identifiers and put them in canonical order
    async fn resolve_pair(&self, a: &str, b: &str) -> Result<PoolKeyPair, RegistryError> {
        let (asset_a, asset_b) = tokio::try_join!(self.resolve_asset(a), self.resolve_asset(b))?;
        PoolKeyPair::new(asset_a, asset_b).map_err(|e| RegistryError::invalid(e.to_string()))
    }

    /// Build the pool at `request.address` once, however many callers ask
    async fn construct(
        &self,
        request: PoolBuildRequest,
    ) -> Result<Arc<PoolHandle>, RegistryError> {
        let address = request.address;
        let guard = {
            let mut attempt = self.in_flight.entry(address).or_insert_with(|| InFlight {
                cell: Arc::new(OnceCell::new()),
                callers: 0,
            });
            attempt.callers += 1;
            AttemptGuard {
                in_flight: &self.in_flight,
                address,
                cell: attempt.cell.clone(),
            }
        };

        let outcome = guard
            .cell
            .get_or_init(|| async {
                self.build_and_install(request)
                    .await
                    .map_err(|e| SharedFailure(Arc::new(e)))
            })
            .await
            .clone();
        drop(guard);

        outcome.map_err(|failure| {
            RegistryError::construction(address, anyhow::Error::new(failure))
        })
    }

    /// Number of construction attempts currently in progress
    pub fn pending_constructions(&self) -> usize {
        self.in_flight.len()
    }

    async fn build_and_install(
        &self,
        request: PoolBuildRequest,
    ) -> anyhow::Result<Arc<PoolHandle>> {
        let address = request.address;

        // Installed by a caller that finished between our miss and taking the cell
        if let Some(existing) = self.cached_by_address(&address) {
            return Ok(existing);
        }

        self.metrics.write().constructions += 1;
        info!(
            "Building {} pool {} for factory {}",
            V::VARIANT,
            format_address(&address),
            format_address(&self.factory)
        );

        let outcome = match self.collaborators.pools.build(request.clone()).await {
            Ok(handle) => self
                .check_built(&request, &handle)
                .and_then(|key| self.install(Arc::new(handle), key)),
            Err(e) => Err(e),
        };

        if let Err(e) = &outcome {
            self.metrics.write().construction_failures += 1;
            warn!("Could not build pool {}: {:#}", format_address(&address), e);
        }
        outcome
    }

    /// Confirm the built handle is the pool that was asked for
    fn check_built(
        &self,
        request: &PoolBuildRequest,
        handle: &PoolHandle,
    ) -> anyhow::Result<V::Key> {
        if handle.address() != request.address {
            bail!(
                "handle reports address {}",
                format_address(&handle.address())
            );
        }
        if handle.factory() != self.factory {
            bail!(
                "pool belongs to factory {}, expected {}",
                format_address(&handle.factory()),
                format_address(&self.factory)
            );
        }
        if handle.variant() != V::VARIANT {
            bail!("expected a {} pool, got {}", V::VARIANT, handle.variant());
        }
        if let Some(pair) = &request.pair {
            if handle.pair() != pair {
                bail!(
                    "pool tokens {} do not match requested pair {}",
                    handle.pair(),
                    pair
                );
            }
        }
        if let Some(fee) = request.fee_tier {
            if handle.fee_tier() != Some(fee) {
                bail!(
                    "pool fee {:?} does not match requested fee {}",
                    handle.fee_tier(),
                    fee
                );
            }
        }

        V::key_of(handle).ok_or_else(|| anyhow!("handle carries no composite key"))
    }

    /// Insert into both indices in one write
    fn install(&self, handle: Arc<PoolHandle>, key: V::Key) -> anyhow::Result<Arc<PoolHandle>> {
        let address = handle.address();
        let mut index = self.index.write();

        if let Some(existing) = index.by_address.get(&address) {
            return Ok(existing.clone());
        }
        if let Some(existing) = index.by_key.get(&key) {
            bail!(
                "key {:?} already maps to pool {}",
                key,
                format_address(&existing.address())
            );
        }

        index.by_address.insert(address, handle.clone());
        index.by_key.insert(key, handle.clone());
        drop(index);

        info!("Registered pool {}", handle);
        Ok(handle)
    }
}

impl PoolRegistry<PairOnly> {
    /// Get a pair-only pool by address or by unordered token pair
    pub async fn get_pool(
        &self,
        selector: &PoolSelector,
    ) -> Result<Arc<PoolHandle>, RegistryError> {
        selector.validate()?;
        match selector {
            PoolSelector::ByAddress(address) => self.get_by_address(*address).await,
            PoolSelector::ByPair(a, b) => self.get_by_pair(a, b).await,
            PoolSelector::ByPairAndFee(..) => Err(RegistryError::invalid(
                "pair-only pools are selected without a fee tier",
            )),
        }
    }

    async fn get_by_pair(&self, a: &str, b: &str) -> Result<Arc<PoolHandle>, RegistryError> {
        let pair = self.resolve_pair(a, b).await?;
        let (token0, token1) = pair.addresses();

        if let Some(handle) = self.cached_by_key(&(token0, token1)) {
            self.record_hit(&handle);
            return Ok(handle);
        }
        self.record_miss();

        self.metrics.write().factory_queries += 1;
        let address = self
            .collaborators
            .factories
            .query_pair_address(self.factory, token0, token1, None)
            .await
            .map_err(|source| RegistryError::FactoryQueryFailed {
                factory: self.factory,
                source,
            })?;

        if is_zero_address(&address) {
            debug!("Factory reports no pool for {}", pair);
            return Err(RegistryError::NoPoolExists { token0, token1 });
        }

        if let Some(handle) = self.cached_by_address(&address) {
            return Ok(handle);
        }

        self.construct(PoolBuildRequest {
            address,
            factory: self.factory,
            variant: PoolVariant::PairOnly,
            pair: Some(pair),
            fee_tier: None,
        })
        .await
    }
}

impl PoolRegistry<FeeTiered> {
    /// Get a fee-tiered pool by address or by unordered token pair and fee
    pub async fn get_pool(
        &self,
        selector: &PoolSelector,
    ) -> Result<Arc<PoolHandle>, RegistryError> {
        selector.validate()?;
        match selector {
            PoolSelector::ByAddress(address) => self.get_by_address(*address).await,
            PoolSelector::ByPairAndFee(a, b, fee) => self.get_by_pair_and_fee(a, b, *fee).await,
            PoolSelector::ByPair(..) => Err(RegistryError::invalid(
                "fee-tiered pools need a fee tier alongside the pair",
            )),
        }
    }

    /// CREATE2 address this factory would deploy the pool at
    pub fn derive_address(
        &self,
        token_a: &EthAddress,
        token_b: &EthAddress,
        fee: FeeTier,
    ) -> EthAddress {
        compute_pool_address(&self.factory, token_a, token_b, fee, &self.params)
    }

    /// Ask the factory's `getPool` where the pool lives and compare it with
    /// the CREATE2 derivation. `false` means the configured init code hash
    /// does not belong to this factory.
    pub async fn verify_derivation(
        &self,
        token_a: EthAddress,
        token_b: EthAddress,
        fee: FeeTier,
    ) -> Result<bool, RegistryError> {
        let (token0, token1) = if token_a <= token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };

        self.metrics.write().factory_queries += 1;
        let reported = self
            .collaborators
            .factories
            .query_pair_address(self.factory, token0, token1, Some(fee))
            .await
            .map_err(|source| RegistryError::FactoryQueryFailed {
                factory: self.factory,
                source,
            })?;

        if is_zero_address(&reported) {
            return Err(RegistryError::NoPoolExists { token0, token1 });
        }

        let derived = self.derive_address(&token0, &token1, fee);
        if reported != derived {
            warn!(
                "Factory {} reports pool {} at {}, derivation gives {}",
                format_address(&self.factory),
                format_address(&reported),
                fee,
                format_address(&derived)
            );
        }
        Ok(reported == derived)
    }

    async fn get_by_pair_and_fee(
        &self,
        a: &str,
        b: &str,
        fee: FeeTier,
    ) -> Result<Arc<PoolHandle>, RegistryError> {
        let pair = self.resolve_pair(a, b).await?;
        let (token0, token1) = pair.addresses();

        if let Some(handle) = self.cached_by_key(&(token0, token1, fee)) {
            self.record_hit(&handle);
            return Ok(handle);
        }
        self.record_miss();

        let address = self.derive_address(&token0, &token1, fee);
        self.metrics.write().derived_addresses += 1;
        debug!(
            "Derived address {} for {} at {}",
            format_address(&address),
            pair,
            fee
        );

        if let Some(handle) = self.cached_by_address(&address) {
            return Ok(handle);
        }

        self.construct(PoolBuildRequest {
            address,
            factory: self.factory,
            variant: PoolVariant::FeeTiered,
            pair: Some(pair),
            fee_tier: Some(fee),
        })
        .await
    }
}
