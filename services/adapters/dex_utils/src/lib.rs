//! Shared DEX functionality library
//!
//! Protocol constants and pure helpers used by the pool registry.
//!
//! # Architecture
//!
//! ```text
//! dex_utils/
//! ├── abi/              # JSON ABIs for the contracts the registry reads
//! │   ├── erc20.rs        # symbol / name / decimals
//! │   ├── uniswap_v2.rs   # factory getPair, pair token0/token1
//! │   └── uniswap_v3.rs   # factory getPool, pool token0/token1/fee
//! └── pool_address.rs   # CREATE2 pool address derivation
//! ```
//!
//! # Design Principles
//! - Single canonical source for DEX ABIs
//! - Address derivation is pure and never touches the network

pub mod abi;
pub mod pool_address;

pub use pool_address::{
    compute_pool_address, create2_address, parse_init_code_hash, pool_salt, InitCodeHash,
    InitCodeHashError, UNISWAP_V3_POOL_INIT_CODE_HASH,
};
