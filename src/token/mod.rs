//! Administered fungible token, usable as a vault call target
//!
//! Provides:
//! - Balances per address
//! - Admin-only mint, pause and unpause
//! - Holder burn and transfer
//!
//! # Example
//!
//! ```ignore
//! use multisig_vault::token::{TokenCall, TokenManager};
//!
//! let mut manager = TokenManager::new();
//!
//! // The vault administers the token
//! let token = manager.create_token("Vault Token".into(), "VLT".into(), 18, vault.address())?;
//!
//! // Minting is only reachable through an executed proposal
//! let payload = TokenCall::Mint { to: treasury, amount: 100 }.encode();
//! let index = vault.submit(alice, token.address, payload)?;
//! ```

pub mod manager;
pub mod token;

pub use manager::TokenManager;
pub use token::{Token, TokenAction, TokenCall, TokenError, TokenEvent, TokenMetadata};
