//! Registry directory
//!
//! Maps `(factory address, variant)` to the one registry serving it. Entries
//! are created on first use and live for the rest of the process.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use dex::{InitCodeHash, UNISWAP_V3_POOL_INIT_CODE_HASH};
use once_cell::sync::OnceCell;
use registry_config::Deployment;
use tracing::{info, warn};
use types::{format_address, EthAddress, PoolHandle, PoolVariant};

use crate::collaborators::Collaborators;
use crate::error::RegistryError;
use crate::registry::{FeeTiered, PairOnly, PoolRegistry};
use crate::selector::PoolSelector;

static GLOBAL_DIRECTORY: OnceCell<RegistryDirectory> = OnceCell::new();

/// A registry of either family
#[derive(Clone)]
pub enum RegistryHandle {
    PairOnly(Arc<PoolRegistry<PairOnly>>),
    FeeTiered(Arc<PoolRegistry<FeeTiered>>),
}

impl RegistryHandle {
    pub async fn get_pool(
        &self,
        selector: &PoolSelector,
    ) -> Result<Arc<PoolHandle>, RegistryError> {
        match self {
            RegistryHandle::PairOnly(registry) => registry.get_pool(selector).await,
            RegistryHandle::FeeTiered(registry) => registry.get_pool(selector).await,
        }
    }

    pub fn factory(&self) -> EthAddress {
        match self {
            RegistryHandle::PairOnly(registry) => registry.factory(),
            RegistryHandle::FeeTiered(registry) => registry.factory(),
        }
    }

    pub fn variant(&self) -> PoolVariant {
        match self {
            RegistryHandle::PairOnly(_) => PoolVariant::PairOnly,
            RegistryHandle::FeeTiered(_) => PoolVariant::FeeTiered,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RegistryHandle::PairOnly(registry) => registry.len(),
            RegistryHandle::FeeTiered(registry) => registry.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_pair_only(&self) -> Option<&Arc<PoolRegistry<PairOnly>>> {
        match self {
            RegistryHandle::PairOnly(registry) => Some(registry),
            RegistryHandle::FeeTiered(_) => None,
        }
    }

    pub fn as_fee_tiered(&self) -> Option<&Arc<PoolRegistry<FeeTiered>>> {
        match self {
            RegistryHandle::FeeTiered(registry) => Some(registry),
            RegistryHandle::PairOnly(_) => None,
        }
    }
}

/// Owner of every registry in the process
pub struct RegistryDirectory {
    collaborators: Collaborators,

    /// Init code hashes for fee-tiered factories that differ from Uniswap V3
    init_code_hashes: HashMap<EthAddress, InitCodeHash>,

    pair_registries: DashMap<EthAddress, Arc<PoolRegistry<PairOnly>>>,
    fee_tiered_registries: DashMap<EthAddress, Arc<PoolRegistry<FeeTiered>>>,
}

impl RegistryDirectory {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            init_code_hashes: HashMap::new(),
            pair_registries: DashMap::new(),
            fee_tiered_registries: DashMap::new(),
        }
    }

    /// Directory knowing the init code hash of every configured fee-tiered factory
    pub fn from_deployments(collaborators: Collaborators, deployments: &[Deployment]) -> Self {
        let mut directory = Self::new(collaborators);
        for deployment in deployments {
            if let (PoolVariant::FeeTiered, Some(hash)) =
                (deployment.variant, deployment.init_code_hash)
            {
                directory.init_code_hashes.insert(deployment.factory, hash);
            }
        }
        directory
    }

    /// Register the init code hash used to derive pool addresses for `factory`
    pub fn with_init_code_hash(mut self, factory: EthAddress, hash: InitCodeHash) -> Self {
        self.init_code_hashes.insert(factory, hash);
        self
    }

    /// Install a process-wide directory. The first installation wins; later
    /// calls get the existing directory back.
    pub fn install_global(directory: RegistryDirectory) -> &'static RegistryDirectory {
        let mut installed = false;
        let global = GLOBAL_DIRECTORY.get_or_init(|| {
            installed = true;
            directory
        });
        if !installed {
            warn!("Global registry directory already installed, keeping the existing one");
        }
        global
    }

    pub fn global() -> Option<&'static RegistryDirectory> {
        GLOBAL_DIRECTORY.get()
    }

    /// Registry for `factory` of the given family, created on first use
    pub fn get_registry(&self, factory: EthAddress, variant: PoolVariant) -> RegistryHandle {
        match variant {
            PoolVariant::PairOnly => RegistryHandle::PairOnly(self.pair_registry(factory)),
            PoolVariant::FeeTiered => RegistryHandle::FeeTiered(self.fee_tiered_registry(factory)),
        }
    }

    pub fn pair_registry(&self, factory: EthAddress) -> Arc<PoolRegistry<PairOnly>> {
        self.pair_registries
            .entry(factory)
            .or_insert_with(|| {
                info!("Creating pair-only registry for factory {}", format_address(&factory));
                Arc::new(PoolRegistry::new(factory, (), self.collaborators.clone()))
            })
            .value()
            .clone()
    }

    pub fn fee_tiered_registry(&self, factory: EthAddress) -> Arc<PoolRegistry<FeeTiered>> {
        self.fee_tiered_registries
            .entry(factory)
            .or_insert_with(|| {
                let hash = self
                    .init_code_hashes
                    .get(&factory)
                    .copied()
                    .unwrap_or(UNISWAP_V3_POOL_INIT_CODE_HASH);
                info!(
                    "Creating fee-tiered registry for factory {} (init code hash 0x{})",
                    format_address(&factory),
                    hex::encode(hash)
                );
                Arc::new(PoolRegistry::new(factory, hash, self.collaborators.clone()))
            })
            .value()
            .clone()
    }

    /// Number of registries created so far
    pub fn registry_count(&self) -> usize {
        self.pair_registries.len() + self.fee_tiered_registries.len()
    }

    /// Every registry created so far
    pub fn registries(&self) -> Vec<RegistryHandle> {
        let pair = self
            .pair_registries
            .iter()
            .map(|entry| RegistryHandle::PairOnly(entry.value().clone()));
        let fee_tiered = self
            .fee_tiered_registries
            .iter()
            .map(|entry| RegistryHandle::FeeTiered(entry.value().clone()));
        pair.chain(fee_tiered).collect()
    }
}
