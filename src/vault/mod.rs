//! Multi-owner authorization vault
//!
//! A fixed set of owners jointly gate outbound calls. An owner submits a
//! proposal (target + opaque payload), owners confirm it one at a time, and
//! once the confirmation count reaches the threshold any owner may execute
//! it, which dispatches the payload exactly once.
//!
//! # Example
//!
//! ```ignore
//! use multisig_vault::vault::{Vault, VaultConfig, GovernanceCall, NoTargets};
//!
//! // Create a 2-of-3 vault
//! let mut vault = Vault::new(VaultConfig::new(vec![alice, bob, carol], 2))?;
//!
//! // Propose raising the threshold, through the vault itself
//! let payload = GovernanceCall::UpdateThreshold { threshold: 3 }.encode();
//! let index = vault.submit(alice, vault.address(), payload)?;
//!
//! // Collect confirmations, then execute
//! vault.confirm(alice, index)?;
//! vault.confirm(bob, index)?;
//! vault.execute(carol, index, &mut NoTargets)?;
//! ```

pub mod address;
pub mod confirmations;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod events;
pub mod governance;
pub mod owners;
pub mod proposal;
pub mod quorum;
pub mod request;

pub use address::{Address, AddressError};
pub use confirmations::ConfirmationTracker;
pub use dispatch::{CallError, Dispatcher, NoTargets};
pub use engine::Vault;
pub use error::{VaultError, VaultResult};
pub use events::{EventLog, EventRecord, VaultEvent};
pub use governance::{Governance, GovernanceCall, GovernanceMode, VaultConfig};
pub use owners::OwnerRegistry;
pub use proposal::{Proposal, ProposalLedger};
pub use quorum::QuorumPolicy;
pub use request::{Operation, Outcome, SignedRequest};
