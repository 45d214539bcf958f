//! Vault error taxonomy

use crate::vault::Address;
use thiserror::Error;

/// Errors surfaced by vault operations
///
/// Every error aborts the operation that produced it; the vault is left
/// exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("Caller is not authorized: {0}")]
    Unauthorized(Address),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Invalid owner: {0}")]
    InvalidOwner(Address),
    #[error("Owner not found: {0}")]
    OwnerNotFound(Address),
    #[error("Proposal not found: {0}")]
    ProposalNotFound(u64),
    #[error("Proposal {0} already executed")]
    AlreadyExecuted(u64),
    #[error("Proposal {index} already confirmed by {owner}")]
    AlreadyConfirmed { index: u64, owner: Address },
    #[error("Quorum not met: have {have}, need {need}")]
    QuorumNotMet { have: u32, need: u32 },
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Stale nonce for {caller}: expected {expected}, got {got}")]
    StaleNonce {
        caller: Address,
        expected: u64,
        got: u64,
    },
}

/// Result alias for vault operations
pub type VaultResult<T> = Result<T, VaultError>;
