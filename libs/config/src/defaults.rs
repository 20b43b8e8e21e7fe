//! Default configuration values
//!
//! Used when a field is missing from the config file.

/// RPC defaults (Polygon mainnet)
pub mod rpc {
    pub const PRIMARY_RPC: &str = "https://polygon-rpc.com";

    pub const FALLBACK_RPCS: [&str; 2] = [
        "https://rpc-mainnet.matic.network",
        "https://rpc.ankr.com/polygon",
    ];

    pub const CHAIN_ID: u64 = 137;

    /// Per-call timeout (milliseconds)
    pub const RPC_TIMEOUT_MS: u64 = 10_000;
}

/// Factory deployments enabled out of the box
pub mod deployments {
    /// Uniswap V3 factory, same address on Ethereum and Polygon
    pub const UNISWAP_V3_FACTORY: &str = "0x1F98431c8aD98523631AE4a59f267346ea31F984";

    /// QuickSwap V2 factory on Polygon
    pub const QUICKSWAP_V2_FACTORY: &str = "0x5757371414417b8C6CAad45bAeF941aBc7d3Ab32";
}

pub const LOG_LEVEL: &str = "info";

/// Prefix for environment variable overrides (POOL_REGISTRY__RPC__PRIMARY_RPC=...)
pub const ENV_PREFIX: &str = "POOL_REGISTRY";
