//! # Minefleet Agent
//!
//! The per-wallet mining agent and the collaborators it depends on.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     MiningAgent                         │
//! │   initialize() ──▶ run() loop ──▶ stop() final update   │
//! │         │                │                  │           │
//! │  ┌──────┴──────┐  ┌──────┴──────┐  ┌────────┴──────┐    │
//! │  │ AccrualModel│  │ RetryPolicy │  │ SessionStore  │    │
//! │  │ (common)    │  │ + Accounting│  │ (JSON files)  │    │
//! │  │             │  │   Api       │  │               │    │
//! │  └─────────────┘  └─────────────┘  └───────────────┘    │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod agent;
pub mod session_store;
pub mod sync;

pub use agent::{AgentPhase, AgentSettings, AgentStatus, MiningAgent};
pub use session_store::{FileSessionStore, InMemorySessionStore, SessionStore};
pub use sync::{AccountingApi, BalanceUpdate, HttpAccountingClient, Registration, RetryPolicy};
