//! Earnings snapshot and mining state
//!
//! The snapshot is the `{ total, pending, paid }` triple an agent reports to
//! the accounting API. The server is the authority on `total`; the agent
//! owns the `pending`/`paid` split.

use serde::{Deserialize, Serialize};

use crate::accrual::validate_amount;
use crate::error::ValidationError;

/// Earnings triple reported to the accounting API
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EarningsSnapshot {
    /// Server-confirmed balance
    pub total: f64,
    /// Increment computed in the most recent periodic cycle
    pub pending: f64,
    /// Earnings folded in by final updates
    pub paid: f64,
}

impl EarningsSnapshot {
    /// Starting snapshot for a wallet that has never mined before
    pub fn fresh(referral_bonus: f64) -> Self {
        Self {
            total: referral_bonus,
            pending: 0.0,
            paid: 0.0,
        }
    }

    /// Proposal sent to the server for an increment
    ///
    /// A periodic proposal carries the increment as `pending`. A final
    /// proposal zeroes `pending` and folds the increment into `paid`.
    pub fn propose(&self, increment: f64, is_final: bool) -> Self {
        if is_final {
            Self {
                total: self.total + increment,
                pending: 0.0,
                paid: self.paid + increment,
            }
        } else {
            Self {
                total: self.total + increment,
                pending: increment,
                paid: self.paid,
            }
        }
    }

    /// Merge a server-confirmed balance with the locally computed split
    pub fn confirm(&mut self, server_total: f64, increment: f64, is_final: bool) {
        self.total = server_total;
        if is_final {
            self.pending = 0.0;
            self.paid += increment;
        } else {
            self.pending = increment;
        }
    }

    /// Check every field is a non-negative finite number and `total >= paid`
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_amount("total", self.total)?;
        validate_amount("pending", self.pending)?;
        validate_amount("paid", self.paid)?;
        if self.total < self.paid {
            return Err(ValidationError::TotalBelowPaid {
                total: self.total,
                paid: self.paid,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for EarningsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Earnings(total={:.8}, pending={:.8}, paid={:.8})",
            self.total, self.pending, self.paid
        )
    }
}

/// Activity flag and start time of one agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MiningState {
    /// Whether the agent is currently accruing
    pub is_active: bool,
    /// Start of accrual (Unix milliseconds)
    pub start_time: Option<i64>,
}

impl MiningState {
    /// Activate with the given start time, keeping an existing one
    pub fn activate(&mut self, start_time: i64) {
        self.start_time.get_or_insert(start_time);
        self.is_active = true;
    }

    /// Deactivate. Returns `true` only on the first call.
    pub fn deactivate(&mut self) -> bool {
        std::mem::replace(&mut self.is_active, false)
    }

    /// Seconds elapsed since `start_time`, if known
    pub fn uptime_secs(&self, now_ms: i64) -> Option<i64> {
        self.start_time.map(|start| ((now_ms - start) / 1000).max(0))
    }
}
