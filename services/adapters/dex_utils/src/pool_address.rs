//! Deterministic pool address derivation
//!
//! Uniswap V3 style factories deploy every pool with CREATE2, so the pool
//! address is a pure function of the factory, the sorted token pair, the fee
//! and the pool init code hash:
//!
//! ```text
//! salt    = keccak256(abi.encode(token0, token1, uint24 fee))
//! address = keccak256(0xff ++ factory ++ salt ++ init_code_hash)[12..]
//! ```
//!
//! Derivation says nothing about whether the pool has been deployed. Callers
//! must confirm existence by reading the contract.

use ethabi::Token;
use ethereum_types::{H160, U256};
use sha3::{Digest, Keccak256};
use thiserror::Error;
use types::{EthAddress, FeeTier};

/// keccak256 of a pool contract's creation code
pub type InitCodeHash = [u8; 32];

/// Uniswap V3 `POOL_INIT_CODE_HASH`
/// 0xe34f199b19b2b4f47f68442619d555527d244f78a3297ea89325f843f87b8b54
pub const UNISWAP_V3_POOL_INIT_CODE_HASH: InitCodeHash = [
    0xe3, 0x4f, 0x19, 0x9b, 0x19, 0xb2, 0xb4, 0xf4, 0x7f, 0x68, 0x44, 0x26, 0x19, 0xd5, 0x55, 0x52,
    0x7d, 0x24, 0x4f, 0x78, 0xa3, 0x29, 0x7e, 0xa8, 0x93, 0x25, 0xf8, 0x43, 0xf8, 0x7b, 0x8b, 0x54,
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InitCodeHashError {
    #[error("init code hash '{input}' has {len} hex digits, expected 64")]
    InvalidLength { input: String, len: usize },

    #[error("init code hash '{input}' is not valid hex")]
    InvalidHex { input: String },
}

/// Parse a `0x`-prefixed (or bare) 32-byte hash
pub fn parse_init_code_hash(input: &str) -> Result<InitCodeHash, InitCodeHashError> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if digits.len() != 64 {
        return Err(InitCodeHashError::InvalidLength {
            input: input.to_string(),
            len: digits.len(),
        });
    }
    let mut hash = [0u8; 32];
    hex::decode_to_slice(digits, &mut hash).map_err(|_| InitCodeHashError::InvalidHex {
        input: input.to_string(),
    })?;
    Ok(hash)
}

/// Salt for a V3 pool, sorting the pair first
pub fn pool_salt(token_a: &EthAddress, token_b: &EthAddress, fee: FeeTier) -> [u8; 32] {
    let (token0, token1) = if token_a < token_b {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    };

    let encoded = ethabi::encode(&[
        Token::Address(H160::from(*token0)),
        Token::Address(H160::from(*token1)),
        Token::Uint(U256::from(fee.as_u32())),
    ]);
    Keccak256::digest(&encoded).into()
}

/// Generic CREATE2 address computation
pub fn create2_address(
    deployer: &EthAddress,
    salt: &[u8; 32],
    init_code_hash: &InitCodeHash,
) -> EthAddress {
    let mut hasher = Keccak256::new();
    hasher.update([0xff]);
    hasher.update(deployer);
    hasher.update(salt);
    hasher.update(init_code_hash);
    let digest = hasher.finalize();

    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[12..]);
    address
}

/// Address of the fee-tiered pool for `(token_a, token_b, fee)` under `factory`
///
/// Token order does not matter.
pub fn compute_pool_address(
    factory: &EthAddress,
    token_a: &EthAddress,
    token_b: &EthAddress,
    fee: FeeTier,
    init_code_hash: &InitCodeHash,
) -> EthAddress {
    let salt = pool_salt(token_a, token_b, fee);
    create2_address(factory, &salt, init_code_hash)
}
