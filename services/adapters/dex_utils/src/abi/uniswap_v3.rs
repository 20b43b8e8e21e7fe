//! Uniswap V3 and compatible protocol ABIs
//!
//! Covers Uniswap V3 and forks (Quickswap V3) sharing the pool interface.

/// Factory `getPool(address,address,uint24)`
pub const FACTORY_ABI: &str = r#"[
    {"inputs":[{"name":"tokenA","type":"address"},{"name":"tokenB","type":"address"},{"name":"fee","type":"uint24"}],"name":"getPool","outputs":[{"name":"pool","type":"address"}],"stateMutability":"view","type":"function"}
]"#;

/// Pool immutables: `token0()`, `token1()`, `fee()`, `factory()`
pub const POOL_ABI: &str = r#"[
    {"inputs":[],"name":"token0","outputs":[{"name":"","type":"address"}],"stateMutability":"view","type":"function"},
    {"inputs":[],"name":"token1","outputs":[{"name":"","type":"address"}],"stateMutability":"view","type":"function"},
    {"inputs":[],"name":"fee","outputs":[{"name":"","type":"uint24"}],"stateMutability":"view","type":"function"},
    {"inputs":[],"name":"factory","outputs":[{"name":"","type":"address"}],"stateMutability":"view","type":"function"}
]"#;
