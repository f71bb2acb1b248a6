//! Error types for minefleet
//!
//! Provides a unified error type and domain-specific error variants

use thiserror::Error;

/// Result type alias using MinerError
pub type Result<T> = std::result::Result<T, MinerError>;

/// Unified error type for minefleet operations
#[derive(Debug, Error)]
pub enum MinerError {
    // Wallet identity errors
    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    // Remote accounting API errors
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    // Checkpoint persistence errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    // Earnings sanity errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // Wallet list produced no usable addresses
    #[error("No valid wallets found in {path}")]
    NoWallets { path: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Wallet address parsing errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Missing 0x prefix: {0}")]
    MissingPrefix(String),

    #[error("Invalid address length: expected {expected} hex characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid hex digits in address: {0}")]
    InvalidHex(String),
}

/// Accounting API errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyncError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Wallet {0} is not registered")]
    NotRegistered(String),

    #[error("Balance update rejected by server")]
    Rejected,
}

/// Session checkpoint errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to write session {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode session: {0}")]
    Encode(String),
}

/// Earnings sanity errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} is not a number")]
    NotANumber { field: &'static str },

    #[error("{field} is not finite: {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} is negative: {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("total {total} is below paid {paid}")]
    TotalBelowPaid { total: f64, paid: f64 },
}

// Implement From for common external error types
impl From<serde_json::Error> for MinerError {
    fn from(err: serde_json::Error) -> Self {
        MinerError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for MinerError {
    fn from(err: std::io::Error) -> Self {
        MinerError::Storage(err.to_string())
    }
}

impl From<anyhow::Error> for MinerError {
    fn from(err: anyhow::Error) -> Self {
        MinerError::Internal(err.to_string())
    }
}
