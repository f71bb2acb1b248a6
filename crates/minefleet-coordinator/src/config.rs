//! Fleet configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use minefleet_agent::{AgentSettings, RetryPolicy};
use minefleet_common::{
    DEFAULT_CYCLE_SECS, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY_MS, HASHRATE_MHS,
};

/// Sessions directory value that selects the in-memory store
pub const IN_MEMORY_SESSIONS: &str = ":memory:";

/// Fleet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Line-delimited wallet list
    pub wallets_file: PathBuf,
    /// Accounting API configuration
    pub api: ApiSettings,
    /// Accrual cycle configuration
    pub cycle: CycleSettings,
    /// Checkpoint storage configuration
    pub storage: StorageSettings,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            wallets_file: PathBuf::from("wallets.txt"),
            api: ApiSettings::default(),
            cycle: CycleSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl FleetConfig {
    /// Load configuration from environment and `.env`
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();

        if let Ok(path) = std::env::var("MINEFLEET_WALLETS_FILE") {
            cfg.wallets_file = PathBuf::from(path);
        }

        // API settings
        if let Ok(url) = std::env::var("MINEFLEET_API_URL") {
            cfg.api.base_url = url;
        }
        override_from_env("MINEFLEET_REQUEST_TIMEOUT_SECS", &mut cfg.api.request_timeout_secs);
        override_from_env("MINEFLEET_RETRY_ATTEMPTS", &mut cfg.api.retry_attempts);
        override_from_env("MINEFLEET_RETRY_DELAY_MS", &mut cfg.api.retry_delay_ms);

        // Cycle settings
        override_from_env("MINEFLEET_CYCLE_SECS", &mut cfg.cycle.cycle_secs);

        // Storage settings
        if let Ok(dir) = std::env::var("MINEFLEET_SESSIONS_DIR") {
            cfg.storage.sessions_dir = dir;
        }

        Ok(cfg)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.api.retry_attempts,
            Duration::from_millis(self.api.retry_delay_ms),
        )
    }

    /// Per-agent settings derived from this configuration
    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            cycle_period: Duration::from_secs(self.cycle.cycle_secs),
            retry: self.retry_policy(),
            rate: self.cycle.hashrate_mhs,
        }
    }
}

fn override_from_env<T: FromStr>(key: &str, field: &mut T) {
    if let Ok(val) = std::env::var(key) {
        match val.parse() {
            Ok(v) => *field = v,
            Err(_) => warn!(key, value = %val, "Ignoring unparseable setting, keeping default"),
        }
    }
}

/// Accounting API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL, e.g. `https://api.minefleet.app/api`
    pub base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Attempts per remote call
    pub retry_attempts: u32,
    /// Linear backoff step in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.minefleet.app/api".to_string(),
            request_timeout_secs: 15,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

/// Accrual cycle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSettings {
    /// Seconds between accrual cycles
    pub cycle_secs: u64,
    /// Synthetic hashrate, used as the accrual rate
    pub hashrate_mhs: f64,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            cycle_secs: DEFAULT_CYCLE_SECS,
            hashrate_mhs: HASHRATE_MHS,
        }
    }
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory for session checkpoints, or `:memory:`
    pub sessions_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            sessions_dir: "sessions".to_string(),
        }
    }
}

impl StorageSettings {
    pub fn is_in_memory(&self) -> bool {
        self.sessions_dir == IN_MEMORY_SESSIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = FleetConfig::default();
        assert_eq!(cfg.wallets_file, PathBuf::from("wallets.txt"));
        assert_eq!(cfg.cycle.cycle_secs, 30);
        assert_eq!(cfg.api.retry_attempts, 3);
        assert!(!cfg.storage.is_in_memory());
    }

    #[test]
    fn test_agent_settings() {
        let mut cfg = FleetConfig::default();
        cfg.cycle.cycle_secs = 5;
        cfg.api.retry_attempts = 4;
        cfg.api.retry_delay_ms = 250;

        let settings = cfg.agent_settings();
        assert_eq!(settings.cycle_period, Duration::from_secs(5));
        assert_eq!(settings.retry.max_attempts, 4);
        assert_eq!(settings.retry.delay_after(2), Duration::from_millis(500));
        assert_eq!(settings.rate, HASHRATE_MHS);
    }

    #[test]
    fn test_override_from_env() {
        let mut value = 30u64;

        std::env::set_var("MINEFLEET_TEST_OVERRIDE_OK", "45");
        override_from_env("MINEFLEET_TEST_OVERRIDE_OK", &mut value);
        assert_eq!(value, 45);

        std::env::set_var("MINEFLEET_TEST_OVERRIDE_BAD", "soon");
        override_from_env("MINEFLEET_TEST_OVERRIDE_BAD", &mut value);
        assert_eq!(value, 45);

        override_from_env("MINEFLEET_TEST_OVERRIDE_UNSET", &mut value);
        assert_eq!(value, 45);
    }

    #[test]
    fn test_in_memory_marker() {
        let storage = StorageSettings {
            sessions_dir: IN_MEMORY_SESSIONS.to_string(),
        };
        assert!(storage.is_in_memory());
    }
}
