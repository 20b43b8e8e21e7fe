//! Uniswap V2 and compatible protocol ABIs
//!
//! Shared by Sushiswap, Quickswap V2 and other forks that keep the
//! original factory/pair interface.

/// Factory `getPair(address,address)`, returns the zero address when no pair exists
pub const FACTORY_ABI: &str = r#"[
    {"constant":true,"inputs":[{"name":"tokenA","type":"address"},{"name":"tokenB","type":"address"}],"name":"getPair","outputs":[{"name":"pair","type":"address"}],"stateMutability":"view","type":"function"}
]"#;

/// Pair `token0()`, `token1()` and `factory()`
pub const PAIR_ABI: &str = r#"[
    {"constant":true,"inputs":[],"name":"token0","outputs":[{"name":"","type":"address"}],"stateMutability":"view","type":"function"},
    {"constant":true,"inputs":[],"name":"token1","outputs":[{"name":"","type":"address"}],"stateMutability":"view","type":"function"},
    {"constant":true,"inputs":[],"name":"factory","outputs":[{"name":"","type":"address"}],"stateMutability":"view","type":"function"}
]"#;
