//! Registry error taxonomy

use thiserror::Error;
use types::{format_address, EthAddress};

/// Failures surfaced by [`crate::PoolRegistry::get_pool`]
///
/// None of these leave anything behind in the registry, so the same call
/// can be repeated later (e.g. once the pool is deployed).
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Contradictory or malformed selector. Raised before any I/O.
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("could not resolve asset '{identifier}'")]
    ResolutionFailed {
        identifier: String,
        #[source]
        source: anyhow::Error,
    },

    /// The factory reported the zero address for this pair
    #[error("no pool exists for {} / {}", format_address(.token0), format_address(.token1))]
    NoPoolExists { token0: EthAddress, token1: EthAddress },

    #[error("pair lookup on factory {} failed", format_address(.factory))]
    FactoryQueryFailed {
        factory: EthAddress,
        #[source]
        source: anyhow::Error,
    },

    #[error("could not build pool at {}", format_address(.address))]
    PoolConstructionFailed {
        address: EthAddress,
        #[source]
        source: anyhow::Error,
    },
}

impl RegistryError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        RegistryError::InvalidSelector(reason.into())
    }

    pub(crate) fn construction(address: EthAddress, source: anyhow::Error) -> Self {
        RegistryError::PoolConstructionFailed { address, source }
    }

    /// Short label for log fields and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryError::InvalidSelector(_) => "invalid_selector",
            RegistryError::ResolutionFailed { .. } => "resolution_failed",
            RegistryError::NoPoolExists { .. } => "no_pool_exists",
            RegistryError::FactoryQueryFailed { .. } => "factory_query_failed",
            RegistryError::PoolConstructionFailed { .. } => "pool_construction_failed",
        }
    }
}
