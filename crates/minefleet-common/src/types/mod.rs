//! Core data types for minefleet

pub mod earnings;
pub mod session;
pub mod wallet_address;
