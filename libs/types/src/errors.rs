//! Validation errors for pool identity types

use thiserror::Error;

use crate::address::{format_address, EthAddress};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Fee does not fit the on-chain uint24 fee field
    #[error("fee tier {fee} out of range, must be below {max}")]
    FeeOutOfRange { fee: u32, max: u32 },

    /// Both sides of a pair resolved to the same token
    #[error("pair requires two distinct assets, got {} twice", format_address(.address))]
    IdenticalAssets { address: EthAddress },
}
