//! Session checkpoint storage
//!
//! Storage backends for per-agent session records.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use minefleet_common::{SessionError, SessionRecord, WalletAddress};

/// Trait for session storage backends
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the checkpoint for a wallet
    ///
    /// Missing, unreadable, and malformed records all read as `None`.
    async fn load(&self, wallet: &WalletAddress) -> Option<SessionRecord>;

    /// Replace the checkpoint for a wallet
    async fn save(&self, wallet: &WalletAddress, record: &SessionRecord) -> Result<(), SessionError>;
}

/// Sequence for temp file names, unique within the process
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// One pretty-printed JSON file per wallet
///
/// Every write goes to its own sibling temp file and is renamed into place,
/// so a concurrent `load` or `save` sees either the old record or a new one.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the session files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Checkpoint path for a wallet
    pub fn path_for(&self, wallet: &WalletAddress) -> PathBuf {
        self.dir.join(format!("session_{}.json", wallet.as_str()))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, wallet: &WalletAddress) -> Option<SessionRecord> {
        let path = self.path_for(wallet);

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(wallet = %wallet, path = %path.display(), "No session file");
                return None;
            }
            Err(e) => {
                warn!(wallet = %wallet, path = %path.display(), error = %e, "Session file unreadable, starting fresh");
                return None;
            }
        };

        match serde_json::from_slice::<SessionRecord>(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(wallet = %wallet, path = %path.display(), error = %e, "Session file malformed, starting fresh");
                None
            }
        }
    }

    async fn save(&self, wallet: &WalletAddress, record: &SessionRecord) -> Result<(), SessionError> {
        let path = self.path_for(wallet);
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("json.{}.{}.tmp", std::process::id(), seq));
        let write_err = |source: std::io::Error| SessionError::Write {
            path: path.display().to_string(),
            source,
        };

        let body =
            serde_json::to_vec_pretty(record).map_err(|e| SessionError::Encode(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(write_err)?;
        tokio::fs::write(&tmp, &body).await.map_err(write_err)?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(write_err(e));
        }

        debug!(wallet = %wallet, path = %path.display(), "Session checkpoint written");
        Ok(())
    }
}

/// In-memory storage implementation
///
/// Used by tests and by dry runs that should leave nothing on disk.
#[derive(Default)]
pub struct InMemorySessionStore {
    records: RwLock<HashMap<WalletAddress, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored checkpoints
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, wallet: &WalletAddress) -> Option<SessionRecord> {
        self.records.read().get(wallet).cloned()
    }

    async fn save(&self, wallet: &WalletAddress, record: &SessionRecord) -> Result<(), SessionError> {
        self.records.write().insert(wallet.clone(), record.clone());
        Ok(())
    }
}
