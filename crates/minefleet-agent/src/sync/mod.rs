//! Accounting API synchronization
//!
//! - [`AccountingApi`]: the two remote calls an agent makes
//! - [`HttpAccountingClient`]: JSON-over-HTTPS implementation
//! - [`RetryPolicy`]: bounded linear-backoff wrapper around each call

pub mod client;
pub mod retry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use minefleet_common::{EarningsSnapshot, SyncError, WalletAddress};

pub use client::{HttpAccountingClient, REFERER, USER_AGENT};
pub use retry::RetryPolicy;

/// Outcome of a registration check
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Registration {
    pub is_registered: bool,
    pub referral_bonus: Option<f64>,
}

/// Server reply to a balance update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    pub success: bool,
    /// Server-confirmed total
    pub balance: f64,
}

/// Remote accounting API
///
/// Implementations perform a single attempt per call; retrying is the
/// caller's concern.
#[async_trait]
pub trait AccountingApi: Send + Sync {
    /// Ask whether `wallet` is registered and fetch its referral bonus
    async fn check_registration(&self, wallet: &WalletAddress) -> Result<Registration, SyncError>;

    /// Propose a new earnings snapshot for `wallet`
    async fn update_balance(
        &self,
        wallet: &WalletAddress,
        earnings: &EarningsSnapshot,
    ) -> Result<BalanceUpdate, SyncError>;
}
