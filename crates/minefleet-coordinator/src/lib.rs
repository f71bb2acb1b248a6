//! # Minefleet Coordinator
//!
//! Supervises a fleet of [`MiningAgent`](minefleet_agent::MiningAgent)s,
//! one per wallet in the wallet list, and drains them on interrupt.
//!
//! ## Configuration
//!
//! Read from the environment (and `.env`) by [`FleetConfig::load`]:
//!
//! | variable | default |
//! |---|---|
//! | `MINEFLEET_WALLETS_FILE` | `wallets.txt` |
//! | `MINEFLEET_SESSIONS_DIR` | `sessions` (`:memory:` keeps nothing on disk) |
//! | `MINEFLEET_API_URL` | `https://api.minefleet.app/api` |
//! | `MINEFLEET_CYCLE_SECS` | `30` |
//! | `MINEFLEET_RETRY_ATTEMPTS` | `3` |
//! | `MINEFLEET_RETRY_DELAY_MS` | `1000` |
//! | `MINEFLEET_REQUEST_TIMEOUT_SECS` | `15` |

pub mod config;
pub mod coordinator;
pub mod wallets;

pub use config::FleetConfig;
pub use coordinator::{AgentSummary, FleetCoordinator, FleetSummary};
pub use wallets::{load_wallets, parse_wallets};
