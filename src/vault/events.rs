//! Notifications emitted by vault operations

use crate::vault::proposal::hex_bytes;
use crate::vault::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A state change worth telling the outside world about
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum VaultEvent {
    Submitted {
        submitter: Address,
        index: u64,
        target: Address,
        #[serde(with = "hex_bytes")]
        payload: Vec<u8>,
    },
    Confirmed {
        confirmer: Address,
        index: u64,
    },
    Executed {
        executor: Address,
        index: u64,
    },
    OwnershipChanged {
        owner: Address,
    },
    ThresholdChanged {
        threshold: u32,
    },
}

/// An event with its position in the log
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventRecord {
    pub sequence: u64,
    pub event: VaultEvent,
    pub recorded_at: DateTime<Utc>,
}

/// Ordered, append-only event log
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append an event
    pub fn emit(&mut self, event: VaultEvent) {
        let record = EventRecord {
            sequence: self.records.len() as u64,
            event,
            recorded_at: Utc::now(),
        };
        self.records.push(record);
    }

    /// Number of events recorded
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records with `sequence >= since`
    pub fn since(&self, since: u64) -> &[EventRecord] {
        let start = (since as usize).min(self.records.len());
        &self.records[start..]
    }

    /// The most recent record
    pub fn last(&self) -> Option<&EventRecord> {
        self.records.last()
    }
}
