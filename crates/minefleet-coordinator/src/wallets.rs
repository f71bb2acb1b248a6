//! Wallet list loading
//!
//! The list is UTF-8 text with one candidate address per line. Lines are
//! trimmed, and anything that is not a valid wallet address is dropped
//! without error.

use std::path::Path;
use tracing::debug;

use minefleet_common::{MinerError, Result, WalletAddress};

/// Extract the valid addresses from wallet list text, in file order
pub fn parse_wallets(text: &str) -> Vec<WalletAddress> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match WalletAddress::parse(line) {
            Ok(addr) => Some(addr),
            Err(e) => {
                debug!(error = %e, "Dropping wallet line");
                None
            }
        })
        .collect()
}

/// Read and parse the wallet list at `path`
pub async fn load_wallets(path: &Path) -> Result<Vec<WalletAddress>> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        MinerError::Storage(format!("Failed to read wallet list {}: {}", path.display(), e))
    })?;
    Ok(parse_wallets(&text))
}
