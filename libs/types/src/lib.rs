//! # Pool Registry Types
//!
//! Shared type definitions for the pool registry workspace.
//!
//! ## Design Philosophy
//!
//! - **Raw Addresses**: Ethereum addresses are plain `[u8; 20]` arrays, compared bytewise
//! - **Canonical Pairs**: A token pair has exactly one representation, lower address first
//! - **Immutable Handles**: Assets and pools never change after construction and are shared via `Arc`
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use types::{parse_address, AssetHandle, PoolKeyPair};
//!
//! let weth = Arc::new(AssetHandle::new(
//!     parse_address("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2").unwrap(),
//!     "WETH",
//!     "Wrapped Ether",
//!     18,
//! ));
//! let usdc = Arc::new(AssetHandle::new(
//!     parse_address("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48").unwrap(),
//!     "USDC",
//!     "USD Coin",
//!     6,
//! ));
//!
//! // Order of arguments does not matter
//! let pair = PoolKeyPair::new(weth.clone(), usdc.clone()).unwrap();
//! assert_eq!(pair, PoolKeyPair::new(usdc, weth).unwrap());
//! assert_eq!(pair.token0().symbol, "USDC");
//! ```

pub mod address;
pub mod asset;
pub mod errors;
pub mod pool;

pub use address::{
    format_address, is_zero_address, parse_address, to_checksum, AddressError, EthAddress,
    ZERO_ADDRESS,
};
pub use asset::AssetHandle;
pub use errors::ValidationError;
pub use pool::{FeeTier, PoolHandle, PoolKeyPair, PoolVariant};
