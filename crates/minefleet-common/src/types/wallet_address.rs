//! WalletAddress - identity of one mining agent
//!
//! A wallet address is `0x` followed by exactly 40 hexadecimal characters.
//! It keys the agent's session checkpoint and correlates every call made
//! to the accounting API.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AddressError;

/// Number of hex characters after the `0x` prefix
pub const ADDRESS_HEX_LEN: usize = 40;

/// Validated wallet address
///
/// Casing is kept as given. The accounting API matches on the exact string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse and validate an address
    ///
    /// # Example
    /// ```
    /// use minefleet_common::WalletAddress;
    ///
    /// let addr = WalletAddress::parse("0x52908400098527886E0F7030069857D2E4169EE7").unwrap();
    /// assert_eq!(addr.as_str().len(), 42);
    /// assert!(WalletAddress::parse("0x1234").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let hex_part = raw
            .strip_prefix("0x")
            .ok_or_else(|| AddressError::MissingPrefix(raw.to_string()))?;

        if hex_part.len() != ADDRESS_HEX_LEN {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_HEX_LEN,
                actual: hex_part.len(),
            });
        }

        hex::decode(hex_part).map_err(|_| AddressError::InvalidHex(raw.to_string()))?;

        Ok(Self(raw.to_string()))
    }

    /// Borrow the address string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines, e.g. `0x5290…9ee7`
    pub fn short(&self) -> String {
        format!("{}…{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl FromStr for WalletAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(addr: WalletAddress) -> Self {
        addr.0
    }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
