//! The seam between the engine and the targets it calls into
//!
//! The engine hands a [`Dispatcher`] the vault itself along with the target
//! and payload. A dispatcher may call back into the vault before returning;
//! the proposal being executed is already marked executed by then.

use crate::vault::engine::Vault;
use crate::vault::Address;
use thiserror::Error;

/// Failure reported by a dispatched call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("No target at {0}")]
    UnknownTarget(Address),
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    #[error("Call rejected: {0}")]
    Rejected(String),
}

/// Forwards proposal payloads to their targets
pub trait Dispatcher {
    /// Deliver `payload` to `target` on behalf of `vault`, with no value
    /// attached
    fn dispatch(
        &mut self,
        vault: &mut Vault,
        target: Address,
        payload: &[u8],
    ) -> Result<(), CallError>;
}

/// Dispatcher with no targets; every external call fails
///
/// Useful for vaults that only ever execute governance calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTargets;

impl Dispatcher for NoTargets {
    fn dispatch(
        &mut self,
        _vault: &mut Vault,
        target: Address,
        _payload: &[u8],
    ) -> Result<(), CallError> {
        Err(CallError::UnknownTarget(target))
    }
}
