//! Error handling for ChainDB.
//!
//! This module provides the unified error type and result alias used
//! by the storage engine and its callers.

mod chain;

pub use chain::{ChainError, ErrorCode};

/// Result type alias for ChainDB operations.
pub type ChainResult<T> = std::result::Result<T, ChainError>;
