//! Proposal records and the append-only ledger that owns them

use crate::vault::error::{VaultError, VaultResult};
use crate::vault::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Serde helper that renders payload bytes as a hex string
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}

/// A request to dispatch `payload` to `target`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Proposal {
    /// Call target
    pub target: Address,
    /// Opaque call payload, forwarded verbatim
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
    /// Terminal flag
    pub executed: bool,
    /// Distinct owners that confirmed
    pub confirmations: u32,
    /// Owner that submitted the proposal
    pub submitter: Address,
    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,
}

impl Proposal {
    fn new(submitter: Address, target: Address, payload: Vec<u8>) -> Self {
        Self {
            target,
            payload,
            executed: false,
            confirmations: 0,
            submitter,
            submitted_at: Utc::now(),
        }
    }
}

/// Index-addressed store of every proposal ever submitted
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProposalLedger {
    proposals: Vec<Proposal>,
}

impl ProposalLedger {
    pub fn new() -> Self {
        Self {
            proposals: Vec::new(),
        }
    }

    /// Append a proposal and return its index
    pub fn append(&mut self, submitter: Address, target: Address, payload: Vec<u8>) -> u64 {
        let index = self.proposals.len() as u64;
        self.proposals.push(Proposal::new(submitter, target, payload));
        index
    }

    /// Look up a proposal
    pub fn get(&self, index: u64) -> VaultResult<&Proposal> {
        self.proposals
            .get(index as usize)
            .ok_or(VaultError::ProposalNotFound(index))
    }

    /// Look up a proposal that is still open for confirmation or execution
    pub fn get_open(&self, index: u64) -> VaultResult<&Proposal> {
        let proposal = self.get(index)?;
        if proposal.executed {
            return Err(VaultError::AlreadyExecuted(index));
        }
        Ok(proposal)
    }

    /// Number of proposals ever submitted
    pub fn count(&self) -> u64 {
        self.proposals.len() as u64
    }

    /// Increment a proposal's confirmation counter, returning the new count
    pub fn record_confirmation(&mut self, index: u64) -> VaultResult<u32> {
        self.get_open(index)?;
        let proposal = &mut self.proposals[index as usize];
        proposal.confirmations += 1;
        Ok(proposal.confirmations)
    }

    /// Set the terminal flag
    pub fn mark_executed(&mut self, index: u64) -> VaultResult<()> {
        self.get_open(index)?;
        self.proposals[index as usize].executed = true;
        Ok(())
    }

    /// Indices of proposals not yet executed, ascending
    pub fn pending(&self) -> Vec<u64> {
        self.proposals
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.executed)
            .map(|(i, _)| i as u64)
            .collect()
    }

    /// All proposals in index order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Proposal)> {
        self.proposals
            .iter()
            .enumerate()
            .map(|(i, p)| (i as u64, p))
    }
}
