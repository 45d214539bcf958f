//! Authorization context: owners, quorum and who may change them
//!
//! All capability checks go through [`Governance`]; nothing about
//! membership lives outside it.

use crate::vault::error::{VaultError, VaultResult};
use crate::vault::owners::OwnerRegistry;
use crate::vault::quorum::QuorumPolicy;
use crate::vault::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who may mutate the owner set and threshold
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GovernanceMode {
    /// Only the vault itself, i.e. an executed self-targeted proposal
    #[default]
    Quorum,
    /// Any single owner, directly
    Owner,
}

impl fmt::Display for GovernanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GovernanceMode::Quorum => write!(f, "quorum"),
            GovernanceMode::Owner => write!(f, "owner"),
        }
    }
}

impl FromStr for GovernanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quorum" => Ok(GovernanceMode::Quorum),
            "owner" => Ok(GovernanceMode::Owner),
            other => Err(format!("unknown governance mode: {}", other)),
        }
    }
}

/// Initial vault configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VaultConfig {
    /// Initial owners, in order
    pub owners: Vec<Address>,
    /// Confirmations required to execute
    pub threshold: u32,
    /// Registry mutation policy
    pub governance: GovernanceMode,
    /// Optional human-readable label
    pub label: Option<String>,
}

impl VaultConfig {
    /// Create a configuration with the default (quorum) governance mode
    pub fn new(owners: Vec<Address>, threshold: u32) -> Self {
        Self {
            owners,
            threshold,
            governance: GovernanceMode::default(),
            label: None,
        }
    }

    /// Set the governance mode
    pub fn with_governance(mut self, governance: GovernanceMode) -> Self {
        self.governance = governance;
        self
    }

    /// Set the label
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    /// Deterministic vault address for this configuration
    ///
    /// Address = HASH160("vault" || threshold || sorted owners)
    pub fn derive_address(&self) -> Address {
        let mut sorted = self.owners.clone();
        sorted.sort();

        let mut data = b"vault".to_vec();
        data.extend_from_slice(&self.threshold.to_be_bytes());
        for owner in &sorted {
            data.extend_from_slice(owner.as_bytes());
        }

        Address::from_data(&data)
    }
}

/// Registry mutations carried in the payload of a self-targeted proposal
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum GovernanceCall {
    AddOwner {
        owner: Address,
    },
    SwapOwner {
        new_owner: Address,
        old_owner: Address,
    },
    UpdateThreshold {
        threshold: u32,
    },
}

impl GovernanceCall {
    /// Encode as a proposal payload
    pub fn encode(&self) -> Vec<u8> {
        // Serializing a plain enum of addresses and integers cannot fail
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Decode from a proposal payload
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

/// Owners, threshold and mutation policy, held as one value
///
/// Deserializing re-checks the threshold against the owner count.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "GovernanceData")]
pub struct Governance {
    owners: OwnerRegistry,
    quorum: QuorumPolicy,
    mode: GovernanceMode,
}

/// Unchecked wire form of [`Governance`]
#[derive(Deserialize)]
struct GovernanceData {
    owners: OwnerRegistry,
    quorum: QuorumPolicy,
    mode: GovernanceMode,
}

impl TryFrom<GovernanceData> for Governance {
    type Error = VaultError;

    fn try_from(data: GovernanceData) -> Result<Self, Self::Error> {
        let quorum = QuorumPolicy::new(data.quorum.required_confirmations(), data.owners.len())?;

        Ok(Self {
            owners: data.owners,
            quorum,
            mode: data.mode,
        })
    }
}

impl Governance {
    /// Validate a configuration and build the context
    pub fn from_config(config: &VaultConfig) -> VaultResult<Self> {
        let owners = OwnerRegistry::new(config.owners.clone())?;
        let quorum = QuorumPolicy::new(config.threshold, owners.len())?;

        Ok(Self {
            owners,
            quorum,
            mode: config.governance,
        })
    }

    pub fn owners(&self) -> &OwnerRegistry {
        &self.owners
    }

    pub fn quorum(&self) -> &QuorumPolicy {
        &self.quorum
    }

    pub fn mode(&self) -> GovernanceMode {
        self.mode
    }

    pub fn is_owner(&self, identity: &Address) -> bool {
        self.owners.is_member(identity)
    }

    /// The `onlyOwner` gate
    pub fn authorize_member(&self, caller: &Address) -> VaultResult<()> {
        if self.owners.is_member(caller) {
            Ok(())
        } else {
            Err(VaultError::Unauthorized(*caller))
        }
    }

    /// Gate for registry and threshold mutation
    ///
    /// The vault itself is always allowed; owners only in `Owner` mode.
    pub fn authorize_mutation(&self, caller: &Address, vault: &Address) -> VaultResult<()> {
        if caller == vault {
            return Ok(());
        }

        match self.mode {
            GovernanceMode::Owner => self.authorize_member(caller),
            GovernanceMode::Quorum => Err(VaultError::Unauthorized(*caller)),
        }
    }

    pub fn add_owner(&mut self, owner: Address) -> VaultResult<()> {
        self.owners.add(owner)
    }

    pub fn swap_owner(&mut self, new_owner: Address, old_owner: Address) -> VaultResult<()> {
        self.owners.swap(new_owner, old_owner)
    }

    pub fn update_threshold(&mut self, threshold: u32) -> VaultResult<()> {
        self.quorum.update(threshold, self.owners.len())
    }
}
