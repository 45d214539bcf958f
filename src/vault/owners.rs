//! Owner registry
//!
//! Holds the ordered owner sequence together with a membership set. The two
//! are always updated together, so `is_member` and `owners` never disagree.
//! Only the sequence is serialized; deserializing rebuilds the set through
//! [`OwnerRegistry::new`].

use crate::vault::error::{VaultError, VaultResult};
use crate::vault::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The set of parties allowed to propose, confirm and execute
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "Vec<Address>", into = "Vec<Address>")]
pub struct OwnerRegistry {
    /// Owners in registration order
    owners: Vec<Address>,
    /// Membership lookup
    members: BTreeSet<Address>,
}

impl OwnerRegistry {
    /// Build a registry from an initial owner list
    ///
    /// # Errors
    /// `InvalidConfiguration` if the list is empty, contains the null
    /// identity, or contains duplicates. Nothing is constructed on error.
    pub fn new(owners: Vec<Address>) -> VaultResult<Self> {
        if owners.is_empty() {
            return Err(VaultError::InvalidConfiguration(
                "owner set must not be empty".to_string(),
            ));
        }

        let mut members = BTreeSet::new();
        for owner in &owners {
            if owner.is_zero() {
                return Err(VaultError::InvalidConfiguration(
                    "owner set contains the null address".to_string(),
                ));
            }
            if !members.insert(*owner) {
                return Err(VaultError::InvalidConfiguration(format!(
                    "duplicate owner {}",
                    owner
                )));
            }
        }

        Ok(Self { owners, members })
    }

    /// Whether `identity` is currently an owner
    pub fn is_member(&self, identity: &Address) -> bool {
        self.members.contains(identity)
    }

    /// Owners in registration order
    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    /// Number of owners
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Always false for a constructed registry, kept for API symmetry
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Append a new owner
    pub fn add(&mut self, owner: Address) -> VaultResult<()> {
        self.check_candidate(&owner)?;

        self.owners.push(owner);
        self.members.insert(owner);
        Ok(())
    }

    /// Replace `old_owner` with `new_owner`, keeping its position
    ///
    /// The replaced owner loses membership.
    pub fn swap(&mut self, new_owner: Address, old_owner: Address) -> VaultResult<()> {
        self.check_candidate(&new_owner)?;

        let position = self
            .owners
            .iter()
            .position(|o| *o == old_owner)
            .ok_or(VaultError::OwnerNotFound(old_owner))?;

        self.owners[position] = new_owner;
        self.members.remove(&old_owner);
        self.members.insert(new_owner);
        Ok(())
    }

    fn check_candidate(&self, owner: &Address) -> VaultResult<()> {
        if owner.is_zero() || self.is_member(owner) {
            return Err(VaultError::InvalidOwner(*owner));
        }
        Ok(())
    }
}

impl TryFrom<Vec<Address>> for OwnerRegistry {
    type Error = VaultError;

    fn try_from(owners: Vec<Address>) -> Result<Self, Self::Error> {
        Self::new(owners)
    }
}

impl From<OwnerRegistry> for Vec<Address> {
    fn from(registry: OwnerRegistry) -> Self {
        registry.owners
    }
}
