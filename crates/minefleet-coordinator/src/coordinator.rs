//! Fleet coordinator
//!
//! Owns the fleet: one [`MiningAgent`] per wallet, each running as its own
//! task. On interrupt every agent is stopped concurrently and their final
//! `paid` totals are summed into a [`FleetSummary`].
//!
//! There is at most one coordinator per process. [`FleetCoordinator::instance`]
//! and [`FleetCoordinator::instance_with`] construct it on first use and hand
//! back the same instance afterwards.

use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use minefleet_agent::{
    AccountingApi, AgentPhase, FileSessionStore, HttpAccountingClient, InMemorySessionStore,
    MiningAgent, SessionStore,
};
use minefleet_common::{MinerError, Result, WalletAddress};

use crate::config::FleetConfig;
use crate::wallets::load_wallets;

static INSTANCE: OnceLock<Arc<FleetCoordinator>> = OnceLock::new();

/// Final report of one agent
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSummary {
    pub index: usize,
    pub wallet: WalletAddress,
    /// Whether the agent was mining when the drain began
    pub was_active: bool,
    pub paid: f64,
}

/// Aggregate report produced by a drain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetSummary {
    pub agents: usize,
    pub active_at_drain: usize,
    pub total_paid: f64,
    pub per_agent: Vec<AgentSummary>,
}

impl std::fmt::Display for FleetSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FleetSummary(agents={}, active={}, total_paid={:.8})",
            self.agents, self.active_at_drain, self.total_paid
        )
    }
}

/// Supervisor of all mining agents in this process
pub struct FleetCoordinator {
    config: FleetConfig,
    api: Arc<dyn AccountingApi>,
    sessions: Arc<dyn SessionStore>,
    running: AtomicBool,
    drained: AtomicBool,
    agents: Mutex<Vec<Arc<MiningAgent>>>,
    tasks: Mutex<JoinSet<()>>,
}

impl FleetCoordinator {
    /// Process-wide coordinator backed by the HTTP client and the configured session store
    ///
    /// Later calls return the first instance and ignore `config`.
    pub fn instance(config: FleetConfig) -> Result<Arc<Self>> {
        if let Some(existing) = INSTANCE.get() {
            return Ok(existing.clone());
        }

        let api = HttpAccountingClient::with_timeout(
            config.api.base_url.clone(),
            Duration::from_secs(config.api.request_timeout_secs),
        )?;
        let sessions: Arc<dyn SessionStore> = if config.storage.is_in_memory() {
            Arc::new(InMemorySessionStore::new())
        } else {
            Arc::new(FileSessionStore::new(&config.storage.sessions_dir))
        };

        Ok(Self::instance_with(config, Arc::new(api), sessions))
    }

    /// Process-wide coordinator with explicit collaborators
    ///
    /// Later calls return the first instance and ignore their arguments.
    pub fn instance_with(
        config: FleetConfig,
        api: Arc<dyn AccountingApi>,
        sessions: Arc<dyn SessionStore>,
    ) -> Arc<Self> {
        INSTANCE
            .get_or_init(|| Arc::new(Self::build(config, api, sessions)))
            .clone()
    }

    fn build(
        config: FleetConfig,
        api: Arc<dyn AccountingApi>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            api,
            sessions,
            running: AtomicBool::new(false),
            drained: AtomicBool::new(false),
            agents: Mutex::new(Vec::new()),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Agents in wallet-file order
    pub fn agents(&self) -> Vec<Arc<MiningAgent>> {
        self.agents.lock().clone()
    }

    /// Load the wallet list and launch one agent task per wallet
    ///
    /// Returns the number of agents launched. Calling it while already
    /// running only logs a warning. A drained fleet cannot be restarted.
    pub async fn start(&self) -> Result<usize> {
        if self.drained.load(Ordering::SeqCst) {
            warn!("Fleet already drained, refusing to start again");
            return Err(MinerError::Internal("fleet already drained".to_string()));
        }
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Fleet already running, ignoring start");
            return Ok(self.agents.lock().len());
        }

        let path = &self.config.wallets_file;
        let wallets = match load_wallets(path).await {
            Ok(wallets) => wallets,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                error!(error = %e, "Could not load wallet list, fleet not started");
                return Err(e);
            }
        };

        if wallets.is_empty() {
            self.running.store(false, Ordering::SeqCst);
            error!(
                path = %path.display(),
                "No valid wallets found. Add one 0x-prefixed 40 hex character address per line."
            );
            return Err(MinerError::NoWallets {
                path: path.display().to_string(),
            });
        }

        let settings = self.config.agent_settings();
        let agents: Vec<Arc<MiningAgent>> = wallets
            .into_iter()
            .enumerate()
            .map(|(i, wallet)| {
                Arc::new(MiningAgent::new(
                    i + 1,
                    wallet,
                    self.api.clone(),
                    self.sessions.clone(),
                    settings,
                ))
            })
            .collect();

        {
            let mut tasks = self.tasks.lock();
            for agent in &agents {
                let agent = agent.clone();
                tasks.spawn(async move {
                    // initialize() logs its own failure; the agent just never mines
                    if agent.initialize().await.is_ok() {
                        agent.run().await;
                    }
                });
            }
        }

        let count = agents.len();
        *self.agents.lock() = agents;
        info!(agents = count, "Fleet started");
        Ok(count)
    }

    /// Stop every agent concurrently and wait for all agent tasks to finish
    pub async fn drain(&self) -> FleetSummary {
        self.drained.store(true, Ordering::SeqCst);
        let agents = self.agents();
        info!(agents = agents.len(), "Draining fleet");

        let per_agent = join_all(agents.iter().map(|agent| async move {
            let was_active = agent.phase().await == AgentPhase::Active;
            let paid = agent.stop().await;
            AgentSummary {
                index: agent.index(),
                wallet: agent.wallet().clone(),
                was_active,
                paid,
            }
        }))
        .await;

        let mut tasks = std::mem::take(&mut *self.tasks.lock());
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Agent task ended abnormally");
            }
        }

        self.running.store(false, Ordering::SeqCst);

        let summary = FleetSummary {
            agents: per_agent.len(),
            active_at_drain: per_agent.iter().filter(|a| a.was_active).count(),
            total_paid: per_agent.iter().map(|a| a.paid).sum(),
            per_agent,
        };

        for agent in &summary.per_agent {
            info!(
                agent = agent.index,
                wallet = %agent.wallet.short(),
                was_active = agent.was_active,
                paid = agent.paid,
                "Agent final"
            );
        }
        info!(
            agents = summary.agents,
            active = summary.active_at_drain,
            total_paid = summary.total_paid,
            "Fleet drained"
        );

        summary
    }

    /// Start the fleet, wait for Ctrl-C, then drain
    pub async fn run_until_interrupt(&self) -> Result<FleetSummary> {
        self.start().await?;

        tokio::signal::ctrl_c()
            .await
            .map_err(|e| MinerError::Internal(format!("Failed to listen for interrupt: {}", e)))?;
        info!("Interrupt received");

        Ok(self.drain().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use minefleet_agent::{BalanceUpdate, Registration};
    use minefleet_common::{EarningsSnapshot, SyncError};

    const GOOD: &str = "0x00000000000000000000000000000000000000a1";
    const UNREGISTERED: &str = "0x00000000000000000000000000000000000000b2";

    /// Registers every wallet except `UNREGISTERED` and echoes balances
    struct EchoApi;

    #[async_trait]
    impl AccountingApi for EchoApi {
        async fn check_registration(
            &self,
            wallet: &WalletAddress,
        ) -> std::result::Result<Registration, SyncError> {
            Ok(Registration {
                is_registered: wallet.as_str() != UNREGISTERED,
                referral_bonus: Some(0.5),
            })
        }

        async fn update_balance(
            &self,
            _wallet: &WalletAddress,
            earnings: &EarningsSnapshot,
        ) -> std::result::Result<BalanceUpdate, SyncError> {
            Ok(BalanceUpdate {
                success: true,
                balance: earnings.total,
            })
        }
    }

    fn coordinator(wallet_lines: &str) -> (FleetCoordinator, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let wallets_file = dir.path().join("wallets.txt");
        std::fs::write(&wallets_file, wallet_lines).unwrap();

        let mut config = FleetConfig::default();
        config.wallets_file = wallets_file;
        config.api.retry_delay_ms = 1;

        let coordinator = FleetCoordinator::build(
            config,
            Arc::new(EchoApi),
            Arc::new(InMemorySessionStore::new()),
        );
        (coordinator, dir)
    }

    async fn wait_until_settled(coordinator: &FleetCoordinator) {
        for _ in 0..200 {
            let mut settled = true;
            for agent in coordinator.agents() {
                if matches!(
                    agent.phase().await,
                    AgentPhase::Uninitialized | AgentPhase::Initializing
                ) {
                    settled = false;
                }
            }
            if settled {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("agents never settled");
    }

    #[tokio::test]
    async fn test_start_drops_malformed_lines() {
        let (coordinator, _dir) = coordinator(&format!("{}\n{}\n", &GOOD[..41], GOOD));

        assert_eq!(coordinator.start().await.unwrap(), 1);
        assert!(coordinator.is_running());
        assert_eq!(coordinator.agents()[0].index(), 1);
        assert_eq!(coordinator.agents()[0].wallet().as_str(), GOOD);

        coordinator.drain().await;
    }

    #[tokio::test]
    async fn test_start_with_no_valid_wallets() {
        let (coordinator, _dir) = coordinator("nothing here\n0x1234\n");

        let result = coordinator.start().await;

        assert!(matches!(result, Err(MinerError::NoWallets { .. })));
        assert!(coordinator.agents().is_empty());
        assert!(!coordinator.is_running());
    }

    #[tokio::test]
    async fn test_second_start_is_noop() {
        let (coordinator, _dir) = coordinator(&format!("{}\n", GOOD));

        assert_eq!(coordinator.start().await.unwrap(), 1);
        let first = coordinator.agents()[0].clone();
        assert_eq!(coordinator.start().await.unwrap(), 1);
        assert!(Arc::ptr_eq(&first, &coordinator.agents()[0]));

        coordinator.drain().await;
    }

    #[tokio::test]
    async fn test_start_after_drain_is_refused() {
        let (coordinator, _dir) = coordinator(&format!("{}\n", GOOD));

        coordinator.start().await.unwrap();
        let first = coordinator.agents()[0].clone();
        coordinator.drain().await;

        let result = coordinator.start().await;

        assert!(matches!(result, Err(MinerError::Internal(_))));
        assert!(!coordinator.is_running());
        assert_eq!(coordinator.agents().len(), 1);
        assert!(Arc::ptr_eq(&first, &coordinator.agents()[0]));
        assert_eq!(first.phase().await, AgentPhase::Stopped);
    }

    #[tokio::test]
    async fn test_failed_agent_does_not_block_others() {
        let (coordinator, _dir) = coordinator(&format!("{}\n{}\n", UNREGISTERED, GOOD));

        assert_eq!(coordinator.start().await.unwrap(), 2);
        wait_until_settled(&coordinator).await;

        let agents = coordinator.agents();
        assert_eq!(agents[0].phase().await, AgentPhase::Stopped);
        assert_eq!(agents[1].phase().await, AgentPhase::Active);

        let summary = coordinator.drain().await;
        assert_eq!(summary.agents, 2);
        assert_eq!(summary.active_at_drain, 1);
        assert_eq!(summary.per_agent[0].paid, 0.0);
        assert!(!coordinator.is_running());
    }

    #[tokio::test]
    async fn test_drain_sums_paid() {
        let other = "0x00000000000000000000000000000000000000c3";
        let (coordinator, _dir) = coordinator(&format!("{}\n{}\n", GOOD, other));

        coordinator.start().await.unwrap();
        wait_until_settled(&coordinator).await;

        let summary = coordinator.drain().await;

        assert_eq!(summary.agents, 2);
        assert_eq!(summary.active_at_drain, 2);
        let expected: f64 = summary.per_agent.iter().map(|a| a.paid).sum();
        assert_eq!(summary.total_paid, expected);
        for agent in coordinator.agents() {
            assert_eq!(agent.phase().await, AgentPhase::Stopped);
            assert_eq!(agent.earnings().await.pending, 0.0);
        }
    }
}
