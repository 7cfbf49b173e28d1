//! Tokenomics error types

use thiserror::Error;

/// Allocation and vesting engine errors
#[derive(Error, Debug)]
pub enum TokenomicsError {
    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),

    #[error("Invalid vesting policy for '{category}': {field} {reason}")]
    InvalidPolicy {
        category: String,
        field: &'static str,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, TokenomicsError>;
