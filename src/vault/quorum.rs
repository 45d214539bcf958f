//! Quorum threshold

use crate::vault::error::{VaultError, VaultResult};
use serde::{Deserialize, Serialize};

/// Number of confirmations a proposal needs before it may execute
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuorumPolicy {
    threshold: u32,
}

impl QuorumPolicy {
    /// Create a policy for a registry of `owner_count` owners
    ///
    /// # Errors
    /// `InvalidConfiguration` unless `1 <= threshold <= owner_count`
    pub fn new(threshold: u32, owner_count: usize) -> VaultResult<Self> {
        Self::validate(threshold, owner_count)?;
        Ok(Self { threshold })
    }

    /// Current threshold
    pub fn required_confirmations(&self) -> u32 {
        self.threshold
    }

    /// Replace the threshold, checking the new value against the owner count
    pub fn update(&mut self, threshold: u32, owner_count: usize) -> VaultResult<()> {
        Self::validate(threshold, owner_count)?;
        self.threshold = threshold;
        Ok(())
    }

    /// Whether `confirmations` satisfies the policy
    pub fn is_met(&self, confirmations: u32) -> bool {
        confirmations >= self.threshold
    }

    /// Description like "2-of-3"
    pub fn description(&self, owner_count: usize) -> String {
        format!("{}-of-{}", self.threshold, owner_count)
    }

    fn validate(threshold: u32, owner_count: usize) -> VaultResult<()> {
        if threshold == 0 {
            return Err(VaultError::InvalidConfiguration(
                "threshold must be at least 1".to_string(),
            ));
        }

        if threshold as usize > owner_count {
            return Err(VaultError::InvalidConfiguration(format!(
                "threshold {} exceeds owner count {}",
                threshold, owner_count
            )));
        }

        Ok(())
    }
}
