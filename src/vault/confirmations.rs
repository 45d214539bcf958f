//! Per-proposal, per-owner confirmation record
//!
//! Pairs are only ever inserted. A recorded pair permanently blocks a second
//! confirmation by the same owner on the same proposal.

use crate::vault::error::{VaultError, VaultResult};
use crate::vault::Address;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Sparse relation of (proposal index, owner) pairs
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfirmationTracker {
    confirmed: BTreeMap<u64, BTreeSet<Address>>,
}

impl ConfirmationTracker {
    pub fn new() -> Self {
        Self {
            confirmed: BTreeMap::new(),
        }
    }

    /// Whether `owner` has confirmed proposal `index`
    pub fn is_confirmed(&self, index: u64, owner: &Address) -> bool {
        self.confirmed
            .get(&index)
            .map(|owners| owners.contains(owner))
            .unwrap_or(false)
    }

    /// Fail with `AlreadyConfirmed` if the pair is recorded
    pub fn ensure_unconfirmed(&self, index: u64, owner: &Address) -> VaultResult<()> {
        if self.is_confirmed(index, owner) {
            return Err(VaultError::AlreadyConfirmed {
                index,
                owner: *owner,
            });
        }
        Ok(())
    }

    /// Record the pair
    pub fn record(&mut self, index: u64, owner: Address) -> VaultResult<()> {
        self.ensure_unconfirmed(index, &owner)?;
        self.confirmed.entry(index).or_default().insert(owner);
        Ok(())
    }

    /// Proposal indices with at least one confirmation
    pub fn indices(&self) -> impl Iterator<Item = u64> + '_ {
        self.confirmed.keys().copied()
    }

    /// Owners that confirmed `index`, in address order
    pub fn confirmers(&self, index: u64) -> Vec<Address> {
        self.confirmed
            .get(&index)
            .map(|owners| owners.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(name: &str) -> Address {
        Address::from_data(name.as_bytes())
    }

    #[test]
    fn test_record_and_lookup() {
        let mut tracker = ConfirmationTracker::new();

        tracker.record(0, addr("a")).unwrap();
        tracker.record(0, addr("b")).unwrap();
        tracker.record(1, addr("a")).unwrap();

        assert!(tracker.is_confirmed(0, &addr("a")));
        assert!(tracker.is_confirmed(1, &addr("a")));
        assert!(!tracker.is_confirmed(1, &addr("b")));
        assert!(!tracker.is_confirmed(7, &addr("a")));
        assert_eq!(tracker.confirmers(0).len(), 2);
        assert!(tracker.confirmers(5).is_empty());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut tracker = ConfirmationTracker::new();
        tracker.record(3, addr("a")).unwrap();

        assert_eq!(
            tracker.record(3, addr("a")),
            Err(VaultError::AlreadyConfirmed {
                index: 3,
                owner: addr("a")
            })
        );
        assert_eq!(tracker.confirmers(3), vec![addr("a")]);
    }

    #[test]
    fn test_serde_roundtrip_keeps_relation() {
        let mut tracker = ConfirmationTracker::new();
        tracker.record(2, addr("a")).unwrap();
        tracker.record(10, addr("b")).unwrap();

        let json = serde_json::to_string(&tracker).unwrap();
        let back: ConfirmationTracker = serde_json::from_str(&json).unwrap();

        assert!(back.is_confirmed(2, &addr("a")));
        assert!(back.is_confirmed(10, &addr("b")));
    }
}
