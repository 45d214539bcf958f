//! Multisig Vault: an M-of-N owner vault in Rust
//!
//! This crate provides a shared-custody authorization vault featuring:
//! - A fixed owner set with a confirmation threshold
//! - Proposals that dispatch an opaque payload to a target exactly once
//! - Atomic execution with rollback on dispatch failure
//! - Owner and threshold changes gated behind quorum (self-targeted proposals)
//! - ECDSA-signed requests (secp256k1) with per-owner replay nonces
//! - An administered token usable as a call target
//! - JSON persistence with backups, a CLI and a REST/WebSocket API
//!
//! # Example
//!
//! ```rust
//! use multisig_vault::token::{TokenCall, TokenManager};
//! use multisig_vault::vault::{Address, Vault, VaultConfig};
//!
//! let alice = Address::from_data(b"alice");
//! let bob = Address::from_data(b"bob");
//! let carol = Address::from_data(b"carol");
//!
//! // Create a 2-of-3 vault and a token it administers
//! let mut vault = Vault::new(VaultConfig::new(vec![alice, bob, carol], 2)).unwrap();
//! let mut tokens = TokenManager::new();
//! let token = tokens
//!     .create_token("Vault Token".into(), "VLT".into(), 18, vault.address())
//!     .unwrap();
//!
//! // Propose a mint, confirm twice, execute
//! let payload = TokenCall::Mint { to: carol, amount: 100 }.encode();
//! let index = vault.submit(alice, token.address, payload).unwrap();
//! vault.confirm(alice, index).unwrap();
//! vault.confirm(bob, index).unwrap();
//! vault.execute(carol, index, &mut tokens).unwrap();
//!
//! assert_eq!(tokens.balance_of(&token.address, &carol), Ok(100));
//! ```

pub mod api;
pub mod cli;
pub mod crypto;
pub mod deployment;
pub mod storage;
pub mod token;
pub mod vault;
pub mod wallet;

// Re-export commonly used types
pub use api::{create_router, ApiState};
pub use crypto::KeyPair;
pub use deployment::Deployment;
pub use storage::Storage;
pub use token::{Token, TokenCall, TokenManager};
pub use vault::{
    Address, GovernanceCall, GovernanceMode, Operation, Outcome, SignedRequest, Vault,
    VaultConfig, VaultError,
};
pub use wallet::Wallet;
