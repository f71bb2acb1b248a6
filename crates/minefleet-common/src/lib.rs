//! # Minefleet Common
//!
//! Shared types, errors, and the earnings accrual model for the minefleet
//! agent fleet.
//!
//! ## Core Types
//!
//! - [`WalletAddress`]: `0x`-prefixed 40 hex character wallet identity
//! - [`EarningsSnapshot`]: `{ total, pending, paid }` earnings triple
//! - [`SessionRecord`]: persisted per-agent checkpoint
//! - [`MiningState`]: activity flag and start time of one agent
//!
//! ## Accrual
//!
//! - [`accrual::accrue`]: synthetic earnings since a start time
//! - [`accrual::validate_amount`]: numeric sanity check for sync payloads

pub mod accrual;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{AddressError, MinerError, Result, SessionError, SyncError, ValidationError};
pub use types::{
    earnings::{EarningsSnapshot, MiningState},
    session::SessionRecord,
    wallet_address::WalletAddress,
};

/// Minefleet version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Synthetic hashrate reported by every agent (MH/s). Doubles as the accrual rate.
pub const HASHRATE_MHS: f64 = 125.0;

/// Scaling factor applied to `rate * elapsed_seconds`
pub const BASE_FACTOR: f64 = 0.000_000_1;

/// Default period between accrual cycles in seconds
pub const DEFAULT_CYCLE_SECS: u64 = 30;

/// Default number of attempts per remote call
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default linear backoff step in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
