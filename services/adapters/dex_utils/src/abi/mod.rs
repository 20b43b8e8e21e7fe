//! ABI definitions for the contracts the registry reads
//!
//! Only the view functions needed to identify a pool are included.
//!
//! # Supported Protocols
//! - Uniswap V2 and forks (Sushiswap, Quickswap V2)
//! - Uniswap V3 and forks (Quickswap V3)

pub mod erc20;
pub mod uniswap_v2;
pub mod uniswap_v3;

/// Parse one of the JSON ABIs in this module
pub fn load(json: &str) -> ethabi::Result<ethabi::Contract> {
    ethabi::Contract::load(json.as_bytes())
}
