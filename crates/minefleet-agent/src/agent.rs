//! Mining agent
//!
//! One agent owns one wallet's lifecycle:
//!
//! ```text
//! Uninitialized ──initialize()──▶ Initializing ──▶ Active ──stop()──▶ Stopped
//!                                      │                                 ▲
//!                                      └──── not registered / error ─────┘
//! ```
//!
//! While `Active`, [`MiningAgent::run`] wakes once per cycle period, accrues
//! earnings since the start time, and proposes them to the accounting API.
//! All mutable state sits behind one async mutex that is held for a whole
//! cycle, so cycles of one agent never overlap each other or the final
//! update performed by [`MiningAgent::stop`].

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use minefleet_common::{
    accrual::{validate_amount, AccrualParams},
    EarningsSnapshot, MinerError, MiningState, Result, SessionRecord, SyncError, WalletAddress,
    DEFAULT_CYCLE_SECS, HASHRATE_MHS,
};

use crate::session_store::SessionStore;
use crate::sync::{AccountingApi, BalanceUpdate, Registration, RetryPolicy};

/// Lifecycle phase of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentPhase {
    Uninitialized,
    Initializing,
    Active,
    Stopped,
}

impl std::fmt::Display for AgentPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentPhase::Uninitialized => write!(f, "uninitialized"),
            AgentPhase::Initializing => write!(f, "initializing"),
            AgentPhase::Active => write!(f, "active"),
            AgentPhase::Stopped => write!(f, "stopped"),
        }
    }
}

/// Per-agent tunables
#[derive(Debug, Clone, Copy)]
pub struct AgentSettings {
    /// Idle time between accrual cycles
    pub cycle_period: Duration,
    /// Retry policy for every remote call
    pub retry: RetryPolicy,
    /// Accrual rate
    pub rate: f64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            cycle_period: Duration::from_secs(DEFAULT_CYCLE_SECS),
            retry: RetryPolicy::default(),
            rate: HASHRATE_MHS,
        }
    }
}

/// Point-in-time view of an agent, for reporting
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStatus {
    pub index: usize,
    pub wallet: WalletAddress,
    pub phase: AgentPhase,
    pub earnings: EarningsSnapshot,
    pub referral_bonus: f64,
    pub hashrate_mhs: f64,
    pub uptime_secs: Option<i64>,
    /// Unix millis of the last confirmed sync
    pub last_sync: Option<i64>,
}

struct AgentInner {
    phase: AgentPhase,
    mining: MiningState,
    earnings: EarningsSnapshot,
    referral_bonus: f64,
    last_sync: Option<i64>,
}

/// Simulated mining worker bound to one wallet
pub struct MiningAgent {
    index: usize,
    wallet: WalletAddress,
    api: Arc<dyn AccountingApi>,
    sessions: Arc<dyn SessionStore>,
    settings: AgentSettings,
    inner: Mutex<AgentInner>,
    shutdown: watch::Sender<bool>,
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl MiningAgent {
    /// Create an agent. `index` is the 1-based position used in reports.
    pub fn new(
        index: usize,
        wallet: WalletAddress,
        api: Arc<dyn AccountingApi>,
        sessions: Arc<dyn SessionStore>,
        settings: AgentSettings,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            index,
            wallet,
            api,
            sessions,
            settings,
            inner: Mutex::new(AgentInner {
                phase: AgentPhase::Uninitialized,
                mining: MiningState::default(),
                earnings: EarningsSnapshot::default(),
                referral_bonus: 0.0,
                last_sync: None,
            }),
            shutdown,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn wallet(&self) -> &WalletAddress {
        &self.wallet
    }

    pub async fn phase(&self) -> AgentPhase {
        self.inner.lock().await.phase
    }

    pub async fn earnings(&self) -> EarningsSnapshot {
        self.inner.lock().await.earnings
    }

    /// Snapshot of the agent for reporting
    pub async fn status(&self) -> AgentStatus {
        let inner = self.inner.lock().await;
        self.status_of(&inner, now_ms())
    }

    /// Check registration and resume or create the session
    ///
    /// Any error here is fatal for this agent only: it moves to `Stopped`
    /// and never mines.
    #[instrument(skip(self), fields(agent = self.index, wallet = %self.wallet))]
    pub async fn initialize(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.phase != AgentPhase::Uninitialized {
            warn!(phase = %inner.phase, "Initialize called twice, ignoring");
            return Err(MinerError::Internal(format!(
                "agent {} already {}",
                self.index, inner.phase
            )));
        }
        inner.phase = AgentPhase::Initializing;
        info!("Initializing agent");

        let registration = match self.check_registration().await {
            Ok(registration) => registration,
            Err(e) => {
                inner.phase = AgentPhase::Stopped;
                error!(error = %e, "Registration check failed, agent will not mine");
                return Err(e.into());
            }
        };

        let now = now_ms();
        let resumed = match self.sessions.load(&self.wallet).await {
            Some(record) => match record.validate() {
                Ok(()) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Session checkpoint failed validation, starting fresh");
                    None
                }
            },
            None => None,
        };

        match resumed {
            Some(record) => {
                inner.earnings = record.earnings;
                inner.referral_bonus = record.referral_bonus;
                let start = match record.start_time {
                    Some(start) => start,
                    None => {
                        warn!("Resumed session has no start time, starting the clock now");
                        now
                    }
                };
                inner.mining.activate(start);
                info!(
                    start_time = start,
                    referral_bonus = inner.referral_bonus,
                    earnings = %inner.earnings,
                    "Resumed previous session"
                );
            }
            None => {
                let bonus = match registration.referral_bonus.map(|b| validate_amount("referralBonus", b)) {
                    Some(Ok(bonus)) => bonus,
                    Some(Err(e)) => {
                        warn!(error = %e, "Ignoring invalid referral bonus from server");
                        0.0
                    }
                    None => 0.0,
                };
                inner.referral_bonus = bonus;
                inner.earnings = EarningsSnapshot::fresh(bonus);
                inner.mining.activate(now);
                info!(referral_bonus = bonus, "Starting fresh session");
                self.checkpoint(&inner).await;
            }
        }

        inner.phase = AgentPhase::Active;
        info!(hashrate_mhs = self.settings.rate, "Agent active");
        Ok(())
    }

    /// Accrual loop; returns once the agent is stopped
    ///
    /// Cycle failures are logged and never end the loop.
    pub async fn run(self: Arc<Self>) {
        let mut shutdown = self.shutdown.subscribe();

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = sleep(self.settings.cycle_period) => {}
                _ = shutdown.changed() => break,
            }

            if !self.run_cycle().await {
                break;
            }
        }

        debug!(agent = self.index, wallet = %self.wallet, "Accrual loop exited");
    }

    /// Run one periodic cycle. Returns `false` once the agent is no longer active.
    pub async fn run_cycle(&self) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.phase != AgentPhase::Active || !inner.mining.is_active {
            return false;
        }

        if let Err(e) = self.sync_earnings(&mut inner, false).await {
            match e {
                MinerError::Validation(_) => {
                    error!(agent = self.index, wallet = %self.wallet, error = %e, "Earnings failed validation, skipping cycle");
                }
                _ => {
                    error!(agent = self.index, wallet = %self.wallet, error = %e, "Balance update failed, will retry next cycle");
                }
            }
        }
        true
    }

    /// Stop mining, send the final update, and return the final `paid` total
    ///
    /// Waits for any cycle in flight. Calling it again returns the same total
    /// without contacting the server.
    #[instrument(skip(self), fields(agent = self.index, wallet = %self.wallet))]
    pub async fn stop(&self) -> f64 {
        self.shutdown.send_replace(true);

        let mut inner = self.inner.lock().await;
        match inner.phase {
            AgentPhase::Active => {}
            AgentPhase::Stopped => {
                debug!("Agent already stopped");
                return inner.earnings.paid;
            }
            phase => {
                info!(%phase, "Stopping agent that never became active");
                inner.phase = AgentPhase::Stopped;
                return inner.earnings.paid;
            }
        }

        inner.mining.deactivate();
        inner.phase = AgentPhase::Stopped;
        info!("Stopping agent, sending final update");

        if let Err(e) = self.sync_earnings(&mut inner, true).await {
            error!(error = %e, "Final balance update failed, keeping last confirmed earnings");
            self.checkpoint(&inner).await;
        }

        info!(paid = inner.earnings.paid, total = inner.earnings.total, "Agent stopped");
        inner.earnings.paid
    }

    async fn check_registration(&self) -> std::result::Result<Registration, SyncError> {
        let api = self.api.as_ref();
        let wallet = &self.wallet;

        self.settings
            .retry
            .run("check_registration", || async move {
                let registration = api.check_registration(wallet).await?;
                if !registration.is_registered {
                    return Err(SyncError::NotRegistered(wallet.to_string()));
                }
                Ok(registration)
            })
            .await
    }

    async fn update_balance(
        &self,
        proposal: EarningsSnapshot,
    ) -> std::result::Result<BalanceUpdate, SyncError> {
        let api = self.api.as_ref();
        let wallet = &self.wallet;

        self.settings
            .retry
            .run("update_balance", || async move {
                let update = api.update_balance(wallet, &proposal).await?;
                if !update.success {
                    return Err(SyncError::Rejected);
                }
                Ok(update)
            })
            .await
    }

    /// Accrue, validate, and push one update; on success merge and checkpoint
    async fn sync_earnings(&self, inner: &mut AgentInner, is_final: bool) -> Result<()> {
        let now = now_ms();
        let params = AccrualParams::new(self.settings.rate, inner.referral_bonus);
        let increment =
            validate_amount("increment", params.increment_since(inner.mining.start_time, now))?;

        let proposal = inner.earnings.propose(increment, is_final);
        proposal.validate()?;

        let update = self.update_balance(proposal).await?;
        let balance = validate_amount("balance", update.balance)?;

        let mut confirmed = inner.earnings;
        confirmed.confirm(balance, increment, is_final);
        confirmed.validate()?;

        inner.earnings = confirmed;
        inner.last_sync = Some(now);

        self.checkpoint(inner).await;
        self.report_status(inner, now, is_final);
        Ok(())
    }

    /// Persist the current state; failures are logged and swallowed
    async fn checkpoint(&self, inner: &AgentInner) {
        let record = SessionRecord::new(inner.mining.start_time, inner.earnings, inner.referral_bonus);
        if let Err(e) = self.sessions.save(&self.wallet, &record).await {
            warn!(agent = self.index, wallet = %self.wallet, error = %e, "Failed to write session checkpoint");
        }
    }

    fn report_status(&self, inner: &AgentInner, now: i64, is_final: bool) {
        let status = self.status_of(inner, now);
        info!(
            agent = status.index,
            wallet = %status.wallet.short(),
            hashrate = %format!("{:.2} MH/s", status.hashrate_mhs),
            uptime_secs = status.uptime_secs.unwrap_or_default(),
            total = status.earnings.total,
            pending = status.earnings.pending,
            paid = status.earnings.paid,
            is_final,
            "Balance synced"
        );
    }

    fn status_of(&self, inner: &AgentInner, now: i64) -> AgentStatus {
        AgentStatus {
            index: self.index,
            wallet: self.wallet.clone(),
            phase: inner.phase,
            earnings: inner.earnings,
            referral_bonus: inner.referral_bonus,
            hashrate_mhs: self.settings.rate,
            uptime_secs: inner.mining.uptime_secs(now),
            last_sync: inner.last_sync,
        }
    }
}
