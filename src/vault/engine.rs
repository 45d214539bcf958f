//! The vault: proposal, confirmation and execution state machine
//!
//! Every public mutation is all-or-nothing. Validation runs before any
//! state is touched, and `execute` additionally snapshots the whole vault
//! so that a failed dispatch (including anything a re-entrant call did in
//! the meantime) leaves no trace.

use crate::vault::confirmations::ConfirmationTracker;
use crate::vault::dispatch::{CallError, Dispatcher};
use crate::vault::error::{VaultError, VaultResult};
use crate::vault::events::{EventLog, VaultEvent};
use crate::vault::governance::{Governance, GovernanceCall, GovernanceMode, VaultConfig};
use crate::vault::proposal::{Proposal, ProposalLedger};
use crate::vault::request::{Operation, Outcome, SignedRequest};
use crate::vault::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An M-of-N owner vault
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vault {
    /// The vault's own identity; proposals targeting it are governance calls
    address: Address,
    label: Option<String>,
    governance: Governance,
    ledger: ProposalLedger,
    confirmations: ConfirmationTracker,
    /// Next expected signed-request nonce per caller
    nonces: BTreeMap<Address, u64>,
    events: EventLog,
    created_at: DateTime<Utc>,
}

impl Vault {
    /// Create a vault from a validated configuration
    ///
    /// # Errors
    /// `InvalidConfiguration` for an empty, null-containing or duplicated
    /// owner set, or a threshold outside `[1, owners]`.
    pub fn new(config: VaultConfig) -> VaultResult<Self> {
        let governance = Governance::from_config(&config)?;
        let address = config.derive_address();

        log::info!(
            "Vault created at {} ({}, {} governance)",
            address,
            governance.quorum().description(governance.owners().len()),
            governance.mode()
        );

        Ok(Self {
            address,
            label: config.label,
            governance,
            ledger: ProposalLedger::new(),
            confirmations: ConfirmationTracker::new(),
            nonces: BTreeMap::new(),
            events: EventLog::new(),
            created_at: Utc::now(),
        })
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn governance_mode(&self) -> GovernanceMode {
        self.governance.mode()
    }

    /// Owners in order
    pub fn owners(&self) -> &[Address] {
        self.governance.owners().owners()
    }

    pub fn is_owner(&self, identity: &Address) -> bool {
        self.governance.is_owner(identity)
    }

    pub fn required_confirmations(&self) -> u32 {
        self.governance.quorum().required_confirmations()
    }

    /// Description like "2-of-3"
    pub fn description(&self) -> String {
        self.governance
            .quorum()
            .description(self.governance.owners().len())
    }

    /// Number of proposals ever submitted
    pub fn transaction_count(&self) -> u64 {
        self.ledger.count()
    }

    /// Proposal at `index`
    pub fn transaction(&self, index: u64) -> VaultResult<&Proposal> {
        self.ledger.get(index)
    }

    /// All proposals in index order
    pub fn transactions(&self) -> impl Iterator<Item = (u64, &Proposal)> {
        self.ledger.iter()
    }

    /// Indices of proposals not yet executed
    pub fn pending(&self) -> Vec<u64> {
        self.ledger.pending()
    }

    pub fn is_confirmed(&self, index: u64, owner: &Address) -> bool {
        self.confirmations.is_confirmed(index, owner)
    }

    /// Owners that confirmed `index`
    pub fn confirmers(&self, index: u64) -> Vec<Address> {
        self.confirmations.confirmers(index)
    }

    /// Next signed-request nonce expected from `caller`
    pub fn nonce(&self, caller: &Address) -> u64 {
        self.nonces.get(caller).copied().unwrap_or(0)
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    // =========================================================================
    // Proposal lifecycle
    // =========================================================================

    /// Record a new proposal and return its index
    pub fn submit(
        &mut self,
        caller: Address,
        target: Address,
        payload: Vec<u8>,
    ) -> VaultResult<u64> {
        self.governance.authorize_member(&caller)?;

        let index = self.ledger.append(caller, target, payload.clone());
        self.events.emit(VaultEvent::Submitted {
            submitter: caller,
            index,
            target,
            payload,
        });

        log::info!(
            "Proposal {} submitted by {} targeting {}",
            index,
            caller,
            target
        );
        Ok(index)
    }

    /// Add the caller's confirmation, returning the new count
    pub fn confirm(&mut self, caller: Address, index: u64) -> VaultResult<u32> {
        self.governance.authorize_member(&caller)?;
        self.ledger.get_open(index)?;
        self.confirmations.ensure_unconfirmed(index, &caller)?;

        self.confirmations.record(index, caller)?;
        let count = self.ledger.record_confirmation(index)?;
        self.events.emit(VaultEvent::Confirmed {
            confirmer: caller,
            index,
        });

        log::debug!(
            "Proposal {} confirmed by {} ({}/{})",
            index,
            caller,
            count,
            self.required_confirmations()
        );
        Ok(count)
    }

    /// Execute an approved proposal
    ///
    /// The proposal is marked executed before its payload is dispatched, so
    /// a dispatcher that calls back into the vault cannot execute it again.
    /// If dispatch fails, the vault is restored to its state before the call.
    pub fn execute(
        &mut self,
        caller: Address,
        index: u64,
        dispatcher: &mut dyn Dispatcher,
    ) -> VaultResult<()> {
        let result = self.atomically(|vault| vault.execute_in_place(caller, index, dispatcher));

        if let Err(VaultError::ExecutionFailed(reason)) = &result {
            log::warn!("Proposal {} rolled back: {}", index, reason);
        }
        result
    }

    fn execute_in_place(
        &mut self,
        caller: Address,
        index: u64,
        dispatcher: &mut dyn Dispatcher,
    ) -> VaultResult<()> {
        self.governance.authorize_member(&caller)?;

        let proposal = self.ledger.get_open(index)?;
        let quorum = self.governance.quorum();
        if !quorum.is_met(proposal.confirmations) {
            return Err(VaultError::QuorumNotMet {
                have: proposal.confirmations,
                need: quorum.required_confirmations(),
            });
        }
        let target = proposal.target;
        let payload = proposal.payload.clone();

        // Reentrancy guard: terminal before the call goes out
        self.ledger.mark_executed(index)?;

        let dispatched = if target == self.address {
            self.apply_governance_call(&payload)
        } else {
            log::debug!("Dispatching proposal {} to {}", index, target);
            dispatcher.dispatch(self, target, &payload)
        };
        dispatched.map_err(|e| VaultError::ExecutionFailed(e.to_string()))?;

        self.events.emit(VaultEvent::Executed {
            executor: caller,
            index,
        });
        log::info!("Proposal {} executed by {}", index, caller);
        Ok(())
    }

    /// Run a self-targeted payload with the vault as caller
    fn apply_governance_call(&mut self, payload: &[u8]) -> Result<(), CallError> {
        let call = GovernanceCall::decode(payload)
            .map_err(|e| CallError::MalformedPayload(e.to_string()))?;
        let vault = self.address;

        let result = match call {
            GovernanceCall::AddOwner { owner } => self.add_owner(vault, owner),
            GovernanceCall::SwapOwner {
                new_owner,
                old_owner,
            } => self.swap_owner(vault, new_owner, old_owner),
            GovernanceCall::UpdateThreshold { threshold } => {
                self.update_threshold(vault, threshold)
            }
        };
        result.map_err(|e| CallError::Rejected(e.to_string()))
    }

    // =========================================================================
    // Governance
    // =========================================================================

    /// Register a new owner
    pub fn add_owner(&mut self, caller: Address, owner: Address) -> VaultResult<()> {
        self.governance.authorize_mutation(&caller, &self.address)?;
        self.governance.add_owner(owner)?;

        self.events.emit(VaultEvent::OwnershipChanged { owner });
        log::info!("Owner {} added by {}", owner, caller);
        Ok(())
    }

    /// Replace `old_owner` with `new_owner`
    pub fn swap_owner(
        &mut self,
        caller: Address,
        new_owner: Address,
        old_owner: Address,
    ) -> VaultResult<()> {
        self.governance.authorize_mutation(&caller, &self.address)?;
        self.governance.swap_owner(new_owner, old_owner)?;

        self.events
            .emit(VaultEvent::OwnershipChanged { owner: new_owner });
        log::info!("Owner {} replaced by {} ({})", old_owner, new_owner, caller);
        Ok(())
    }

    /// Change the confirmation threshold
    pub fn update_threshold(&mut self, caller: Address, threshold: u32) -> VaultResult<()> {
        self.governance.authorize_mutation(&caller, &self.address)?;
        self.governance.update_threshold(threshold)?;

        self.events.emit(VaultEvent::ThresholdChanged { threshold });
        log::info!("Threshold set to {} by {}", threshold, caller);
        Ok(())
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Run `operation` as `caller`
    pub fn perform(
        &mut self,
        caller: Address,
        operation: &Operation,
        dispatcher: &mut dyn Dispatcher,
    ) -> VaultResult<Outcome> {
        match operation {
            Operation::Submit { target, payload } => {
                let index = self.submit(caller, *target, payload.clone())?;
                Ok(Outcome::Submitted { index })
            }
            Operation::Confirm { index } => {
                let confirmations = self.confirm(caller, *index)?;
                Ok(Outcome::Confirmed {
                    index: *index,
                    confirmations,
                })
            }
            Operation::Execute { index } => {
                self.execute(caller, *index, dispatcher)?;
                Ok(Outcome::Executed { index: *index })
            }
            Operation::AddOwner { owner } => {
                self.add_owner(caller, *owner)?;
                Ok(Outcome::OwnersChanged {
                    owners: self.owners().to_vec(),
                })
            }
            Operation::SwapOwner {
                new_owner,
                old_owner,
            } => {
                self.swap_owner(caller, *new_owner, *old_owner)?;
                Ok(Outcome::OwnersChanged {
                    owners: self.owners().to_vec(),
                })
            }
            Operation::UpdateThreshold { threshold } => {
                self.update_threshold(caller, *threshold)?;
                Ok(Outcome::ThresholdUpdated {
                    threshold: *threshold,
                })
            }
        }
    }

    /// Verify a signed request and run it as its signer
    ///
    /// The caller's nonce advances only if the operation succeeds.
    pub fn apply(
        &mut self,
        request: &SignedRequest,
        dispatcher: &mut dyn Dispatcher,
    ) -> VaultResult<Outcome> {
        if request.vault != self.address {
            return Err(VaultError::InvalidRequest(format!(
                "request is for vault {}, this is {}",
                request.vault, self.address
            )));
        }

        let caller = request.verify()?;
        let expected = self.nonce(&caller);
        if request.nonce != expected {
            return Err(VaultError::StaleNonce {
                caller,
                expected,
                got: request.nonce,
            });
        }

        self.atomically(|vault| {
            let outcome = vault.perform(caller, &request.operation, dispatcher)?;
            vault.nonces.insert(caller, expected + 1);
            Ok(outcome)
        })
    }

    /// Check that per-proposal counters agree with the confirmation record
    ///
    /// Owners and threshold are already validated when a vault is
    /// deserialized; this covers the ledger, which is stored separately.
    pub fn check_integrity(&self) -> VaultResult<()> {
        for (index, proposal) in self.ledger.iter() {
            let recorded = self.confirmations.confirmers(index).len();
            if proposal.confirmations as usize != recorded {
                return Err(VaultError::InvalidConfiguration(format!(
                    "proposal {} counts {} confirmations but {} are recorded",
                    index, proposal.confirmations, recorded
                )));
            }
        }

        let count = self.ledger.count();
        if let Some(index) = self.confirmations.indices().find(|&i| i >= count) {
            return Err(VaultError::InvalidConfiguration(format!(
                "confirmations recorded for missing proposal {}",
                index
            )));
        }

        Ok(())
    }

    /// Run `op`, restoring the vault if it fails
    ///
    /// The snapshot is a full clone, so the cost grows with the ledger and
    /// event log. TODO: keep an undo journal instead once histories get long.
    fn atomically<T>(&mut self, op: impl FnOnce(&mut Self) -> VaultResult<T>) -> VaultResult<T> {
        let snapshot = self.clone();
        let result = op(self);
        if result.is_err() {
            *self = snapshot;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::vault::NoTargets;

    fn addr(name: &str) -> Address {
        Address::from_data(name.as_bytes())
    }

    fn owners() -> Vec<Address> {
        vec![addr("alice"), addr("bob"), addr("carol")]
    }

    fn vault_2_of_3() -> Vault {
        Vault::new(VaultConfig::new(owners(), 2)).unwrap()
    }

    /// Records every call and optionally fails
    #[derive(Default)]
    struct Recorder {
        calls: Vec<(Address, Vec<u8>)>,
        fail: bool,
    }

    impl Dispatcher for Recorder {
        fn dispatch(
            &mut self,
            _vault: &mut Vault,
            target: Address,
            payload: &[u8],
        ) -> Result<(), CallError> {
            if self.fail {
                return Err(CallError::Rejected("target reverted".to_string()));
            }
            self.calls.push((target, payload.to_vec()));
            Ok(())
        }
    }

    /// Tries to execute the same proposal again from inside the call
    struct Reentrant {
        attacker: Address,
        index: u64,
        calls: usize,
        inner: Option<VaultResult<()>>,
    }

    impl Dispatcher for Reentrant {
        fn dispatch(
            &mut self,
            vault: &mut Vault,
            _target: Address,
            _payload: &[u8],
        ) -> Result<(), CallError> {
            self.calls += 1;
            let (attacker, index) = (self.attacker, self.index);
            let inner = vault.execute(attacker, index, self);
            self.inner = Some(inner);
            Ok(())
        }
    }

    /// Submits a new proposal through the vault, then fails
    struct SubmitThenFail;

    impl Dispatcher for SubmitThenFail {
        fn dispatch(
            &mut self,
            vault: &mut Vault,
            target: Address,
            _payload: &[u8],
        ) -> Result<(), CallError> {
            vault
                .submit(addr("alice"), target, vec![0xff])
                .map_err(|e| CallError::Rejected(e.to_string()))?;
            Err(CallError::Rejected("out of gas".to_string()))
        }
    }

    fn approved(vault: &mut Vault, target: Address, payload: Vec<u8>) -> u64 {
        let index = vault.submit(addr("alice"), target, payload).unwrap();
        vault.confirm(addr("alice"), index).unwrap();
        vault.confirm(addr("bob"), index).unwrap();
        index
    }

    #[test]
    fn test_construction_for_all_valid_thresholds() {
        for n in 1..=6u32 {
            let set: Vec<Address> = (0..n).map(|i| addr(&format!("owner{}", i))).collect();
            for t in 1..=n {
                let vault = Vault::new(VaultConfig::new(set.clone(), t)).unwrap();
                assert_eq!(vault.owners(), set.as_slice());
                assert_eq!(vault.required_confirmations(), t);
            }
            assert!(Vault::new(VaultConfig::new(set.clone(), 0)).is_err());
            assert!(Vault::new(VaultConfig::new(set.clone(), n + 1)).is_err());
        }
    }

    #[test]
    fn test_construction_rejects_bad_owner_sets() {
        let cases = vec![
            vec![],
            vec![addr("alice"), Address::ZERO],
            vec![addr("alice"), addr("bob"), addr("alice")],
        ];

        for set in cases {
            assert!(matches!(
                Vault::new(VaultConfig::new(set, 1)),
                Err(VaultError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_submit_appends_and_emits() {
        let mut vault = vault_2_of_3();

        let index = vault.submit(addr("alice"), addr("token"), vec![1, 2]).unwrap();
        assert_eq!(index, 0);
        assert_eq!(vault.transaction_count(), 1);

        let proposal = vault.transaction(0).unwrap();
        assert_eq!(proposal.target, addr("token"));
        assert_eq!(proposal.payload, vec![1, 2]);
        assert!(!proposal.executed);
        assert_eq!(proposal.confirmations, 0);

        assert_eq!(
            vault.events().last().map(|r| r.event.clone()),
            Some(VaultEvent::Submitted {
                submitter: addr("alice"),
                index: 0,
                target: addr("token"),
                payload: vec![1, 2],
            })
        );
    }

    #[test]
    fn test_submit_requires_owner() {
        let mut vault = vault_2_of_3();

        assert_eq!(
            vault.submit(addr("mallory"), addr("token"), vec![]),
            Err(VaultError::Unauthorized(addr("mallory")))
        );
        assert_eq!(vault.transaction_count(), 0);
        assert!(vault.events().is_empty());
    }

    #[test]
    fn test_confirm_counts_distinct_owners() {
        let mut vault = vault_2_of_3();
        let index = vault.submit(addr("alice"), addr("token"), vec![]).unwrap();

        assert_eq!(vault.confirm(addr("alice"), index), Ok(1));
        assert_eq!(
            vault.confirm(addr("alice"), index),
            Err(VaultError::AlreadyConfirmed {
                index,
                owner: addr("alice")
            })
        );
        assert_eq!(vault.confirm(addr("bob"), index), Ok(2));
        assert_eq!(vault.confirm(addr("carol"), index), Ok(3));

        assert_eq!(vault.transaction(index).unwrap().confirmations, 3);
        assert!(vault.is_confirmed(index, &addr("bob")));
        assert_eq!(vault.confirmers(index).len(), 3);
    }

    #[test]
    fn test_confirm_by_non_owner_leaves_state_unchanged() {
        let mut vault = vault_2_of_3();
        let index = vault.submit(addr("alice"), addr("token"), vec![]).unwrap();
        let events_before = vault.events().len();

        assert_eq!(
            vault.confirm(addr("mallory"), index),
            Err(VaultError::Unauthorized(addr("mallory")))
        );
        assert_eq!(vault.transaction(index).unwrap().confirmations, 0);
        assert!(!vault.is_confirmed(index, &addr("mallory")));
        assert_eq!(vault.events().len(), events_before);
    }

    #[test]
    fn test_confirm_unknown_index() {
        let mut vault = vault_2_of_3();
        assert_eq!(
            vault.confirm(addr("alice"), 0),
            Err(VaultError::ProposalNotFound(0))
        );
    }

    #[test]
    fn test_execute_requires_quorum() {
        let mut vault = vault_2_of_3();
        let mut target = Recorder::default();
        let index = vault.submit(addr("alice"), addr("token"), vec![7]).unwrap();

        vault.confirm(addr("alice"), index).unwrap();
        assert_eq!(
            vault.execute(addr("alice"), index, &mut target),
            Err(VaultError::QuorumNotMet { have: 1, need: 2 })
        );
        assert!(target.calls.is_empty());

        vault.confirm(addr("bob"), index).unwrap();
        vault.execute(addr("carol"), index, &mut target).unwrap();

        assert!(vault.transaction(index).unwrap().executed);
        assert_eq!(target.calls, vec![(addr("token"), vec![7])]);
        assert_eq!(
            vault.events().last().map(|r| r.event.clone()),
            Some(VaultEvent::Executed {
                executor: addr("carol"),
                index
            })
        );
    }

    #[test]
    fn test_execute_twice_fails() {
        let mut vault = vault_2_of_3();
        let mut target = Recorder::default();
        let index = approved(&mut vault, addr("token"), vec![]);

        vault.execute(addr("alice"), index, &mut target).unwrap();
        assert_eq!(
            vault.execute(addr("alice"), index, &mut target),
            Err(VaultError::AlreadyExecuted(index))
        );
        assert_eq!(
            vault.confirm(addr("carol"), index),
            Err(VaultError::AlreadyExecuted(index))
        );
        assert_eq!(target.calls.len(), 1);
    }

    #[test]
    fn test_execute_checks_caller_and_index() {
        let mut vault = vault_2_of_3();
        let mut target = Recorder::default();
        let index = approved(&mut vault, addr("token"), vec![]);

        assert_eq!(
            vault.execute(addr("mallory"), index, &mut target),
            Err(VaultError::Unauthorized(addr("mallory")))
        );
        assert_eq!(
            vault.execute(addr("alice"), index + 1, &mut target),
            Err(VaultError::ProposalNotFound(index + 1))
        );
        assert!(!vault.transaction(index).unwrap().executed);
    }

    #[test]
    fn test_failed_dispatch_rolls_back() {
        let mut vault = vault_2_of_3();
        let index = approved(&mut vault, addr("token"), vec![1]);
        let events_before = vault.events().len();

        let mut target = Recorder {
            fail: true,
            ..Default::default()
        };
        let result = vault.execute(addr("alice"), index, &mut target);

        assert!(matches!(result, Err(VaultError::ExecutionFailed(_))));
        let proposal = vault.transaction(index).unwrap();
        assert!(!proposal.executed);
        assert_eq!(proposal.confirmations, 2);
        assert_eq!(vault.events().len(), events_before);

        // Still executable once the target behaves
        target.fail = false;
        vault.execute(addr("alice"), index, &mut target).unwrap();
        assert!(vault.transaction(index).unwrap().executed);
    }

    #[test]
    fn test_failed_dispatch_discards_reentrant_changes() {
        let mut vault = vault_2_of_3();
        let index = approved(&mut vault, addr("token"), vec![]);
        let count_before = vault.transaction_count();

        let result = vault.execute(addr("alice"), index, &mut SubmitThenFail);

        assert!(matches!(result, Err(VaultError::ExecutionFailed(_))));
        assert_eq!(vault.transaction_count(), count_before);
        assert!(!vault.transaction(index).unwrap().executed);
    }

    #[test]
    fn test_reentrant_execute_is_blocked() {
        let mut vault = vault_2_of_3();
        let index = approved(&mut vault, addr("token"), vec![]);

        let mut attacker = Reentrant {
            attacker: addr("bob"),
            index,
            calls: 0,
            inner: None,
        };
        vault.execute(addr("alice"), index, &mut attacker).unwrap();

        assert_eq!(attacker.calls, 1);
        assert_eq!(attacker.inner, Some(Err(VaultError::AlreadyExecuted(index))));
        assert!(vault.transaction(index).unwrap().executed);

        let executed_events = vault
            .events()
            .since(0)
            .iter()
            .filter(|r| matches!(r.event, VaultEvent::Executed { .. }))
            .count();
        assert_eq!(executed_events, 1);
    }

    #[test]
    fn test_get_transaction_bounds() {
        let mut vault = vault_2_of_3();
        vault.submit(addr("alice"), addr("t1"), vec![1]).unwrap();
        vault.submit(addr("bob"), addr("t2"), vec![2]).unwrap();

        let count = vault.transaction_count();
        assert_eq!(
            vault.transaction(count),
            Err(VaultError::ProposalNotFound(count))
        );
        assert_eq!(vault.transaction(count - 1).unwrap().target, addr("t2"));
    }

    #[test]
    fn test_reads_are_idempotent() {
        let mut vault = vault_2_of_3();
        vault.submit(addr("alice"), addr("t"), vec![]).unwrap();

        assert_eq!(vault.owners().to_vec(), vault.owners().to_vec());
        assert_eq!(vault.transaction_count(), vault.transaction_count());
        assert_eq!(vault.pending(), vec![0]);
        assert_eq!(vault.pending(), vec![0]);
    }

    #[test]
    fn test_direct_governance_rejected_in_quorum_mode() {
        let mut vault = vault_2_of_3();

        assert_eq!(
            vault.add_owner(addr("alice"), addr("dave")),
            Err(VaultError::Unauthorized(addr("alice")))
        );
        assert_eq!(
            vault.update_threshold(addr("alice"), 1),
            Err(VaultError::Unauthorized(addr("alice")))
        );
        assert_eq!(vault.owners(), owners().as_slice());
        assert_eq!(vault.required_confirmations(), 2);
    }

    #[test]
    fn test_governance_through_quorum() {
        let mut vault = vault_2_of_3();
        let self_address = vault.address();

        let add = GovernanceCall::AddOwner {
            owner: addr("dave"),
        };
        let index = approved(&mut vault, self_address, add.encode());
        vault.execute(addr("alice"), index, &mut NoTargets).unwrap();
        assert!(vault.is_owner(&addr("dave")));

        let raise = GovernanceCall::UpdateThreshold { threshold: 3 };
        let index = approved(&mut vault, self_address, raise.encode());
        vault.execute(addr("bob"), index, &mut NoTargets).unwrap();
        assert_eq!(vault.required_confirmations(), 3);

        let swap = GovernanceCall::SwapOwner {
            new_owner: addr("erin"),
            old_owner: addr("carol"),
        };
        let index = vault.submit(addr("alice"), self_address, swap.encode()).unwrap();
        vault.confirm(addr("alice"), index).unwrap();
        vault.confirm(addr("bob"), index).unwrap();
        assert!(matches!(
            vault.execute(addr("alice"), index, &mut NoTargets),
            Err(VaultError::QuorumNotMet { have: 2, need: 3 })
        ));
        vault.confirm(addr("dave"), index).unwrap();
        vault.execute(addr("alice"), index, &mut NoTargets).unwrap();

        assert_eq!(
            vault.owners(),
            &[addr("alice"), addr("bob"), addr("erin"), addr("dave")]
        );
        assert!(!vault.is_owner(&addr("carol")));
    }

    #[test]
    fn test_invalid_governance_call_fails_execution() {
        let mut vault = vault_2_of_3();
        let self_address = vault.address();

        let too_high = GovernanceCall::UpdateThreshold { threshold: 9 };
        let index = approved(&mut vault, self_address, too_high.encode());
        assert!(matches!(
            vault.execute(addr("alice"), index, &mut NoTargets),
            Err(VaultError::ExecutionFailed(_))
        ));
        assert!(!vault.transaction(index).unwrap().executed);

        let garbage = approved(&mut vault, self_address, b"garbage".to_vec());
        assert!(matches!(
            vault.execute(addr("alice"), garbage, &mut NoTargets),
            Err(VaultError::ExecutionFailed(_))
        ));
        assert_eq!(vault.required_confirmations(), 2);
    }

    #[test]
    fn test_owner_mode_single_signer_governance() {
        let config = VaultConfig::new(owners(), 2).with_governance(GovernanceMode::Owner);
        let mut vault = Vault::new(config).unwrap();

        vault.add_owner(addr("alice"), addr("dave")).unwrap();
        vault
            .swap_owner(addr("bob"), addr("erin"), addr("carol"))
            .unwrap();
        vault.update_threshold(addr("dave"), 4).unwrap();

        assert_eq!(
            vault.owners(),
            &[addr("alice"), addr("bob"), addr("erin"), addr("dave")]
        );
        assert_eq!(vault.required_confirmations(), 4);

        // Removed owner lost its capability
        assert_eq!(
            vault.submit(addr("carol"), addr("t"), vec![]),
            Err(VaultError::Unauthorized(addr("carol")))
        );
        assert_eq!(
            vault.update_threshold(addr("alice"), 5),
            Err(VaultError::InvalidConfiguration(
                "threshold 5 exceeds owner count 4".to_string()
            ))
        );
        assert_eq!(
            vault.add_owner(addr("mallory"), addr("mallory")),
            Err(VaultError::Unauthorized(addr("mallory")))
        );
    }

    #[test]
    fn test_governance_events() {
        let config = VaultConfig::new(owners(), 2).with_governance(GovernanceMode::Owner);
        let mut vault = Vault::new(config).unwrap();

        vault.add_owner(addr("alice"), addr("dave")).unwrap();
        vault.swap_owner(addr("bob"), addr("erin"), addr("carol")).unwrap();
        vault.update_threshold(addr("alice"), 3).unwrap();

        let events: Vec<VaultEvent> = vault
            .events()
            .since(0)
            .iter()
            .map(|r| r.event.clone())
            .collect();
        assert_eq!(
            events,
            vec![
                VaultEvent::OwnershipChanged {
                    owner: addr("dave")
                },
                VaultEvent::OwnershipChanged {
                    owner: addr("erin")
                },
                VaultEvent::ThresholdChanged { threshold: 3 },
            ]
        );
    }

    #[test]
    fn test_apply_signed_requests() {
        let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let set: Vec<Address> = keys.iter().map(|k| k.address()).collect();
        let mut vault = Vault::new(VaultConfig::new(set, 2)).unwrap();
        let mut target = Recorder::default();
        let vault_address = vault.address();

        let submit = SignedRequest::sign(
            vault_address,
            Operation::Submit {
                target: addr("token"),
                payload: vec![5],
            },
            0,
            &keys[0],
        )
        .unwrap();
        assert_eq!(
            vault.apply(&submit, &mut target),
            Ok(Outcome::Submitted { index: 0 })
        );
        assert_eq!(vault.nonce(&keys[0].address()), 1);

        // Replay
        assert!(matches!(
            vault.apply(&submit, &mut target),
            Err(VaultError::StaleNonce {
                expected: 1,
                got: 0,
                ..
            })
        ));
        assert_eq!(vault.transaction_count(), 1);

        for key in &keys[..2] {
            let nonce = vault.nonce(&key.address());
            let confirm =
                SignedRequest::sign(vault_address, Operation::Confirm { index: 0 }, nonce, key)
                    .unwrap();
            vault.apply(&confirm, &mut target).unwrap();
        }

        let execute = SignedRequest::sign(
            vault_address,
            Operation::Execute { index: 0 },
            0,
            &keys[2],
        )
        .unwrap();
        assert_eq!(
            vault.apply(&execute, &mut target),
            Ok(Outcome::Executed { index: 0 })
        );
        assert_eq!(target.calls.len(), 1);
    }

    #[test]
    fn test_apply_failure_keeps_nonce() {
        let key = KeyPair::generate();
        let mut vault = Vault::new(VaultConfig::new(vec![key.address()], 1)).unwrap();
        let vault_address = vault.address();

        let confirm =
            SignedRequest::sign(vault_address, Operation::Confirm { index: 3 }, 0, &key).unwrap();
        assert_eq!(
            vault.apply(&confirm, &mut NoTargets),
            Err(VaultError::ProposalNotFound(3))
        );
        assert_eq!(vault.nonce(&key.address()), 0);
    }

    #[test]
    fn test_apply_rejects_other_vault() {
        let key = KeyPair::generate();
        let mut vault = Vault::new(VaultConfig::new(vec![key.address()], 1)).unwrap();

        let request =
            SignedRequest::sign(addr("elsewhere"), Operation::Confirm { index: 0 }, 0, &key)
                .unwrap();
        assert!(matches!(
            vault.apply(&request, &mut NoTargets),
            Err(VaultError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_vault_serde_roundtrip() {
        let mut vault = vault_2_of_3();
        let index = approved(&mut vault, addr("token"), vec![3, 4]);

        let json = serde_json::to_string(&vault).unwrap();
        let back: Vault = serde_json::from_str(&json).unwrap();

        assert_eq!(back.address(), vault.address());
        assert_eq!(back.owners(), vault.owners());
        assert_eq!(back.transaction(index), vault.transaction(index));
        assert!(back.is_confirmed(index, &addr("bob")));
        assert_eq!(back.events().len(), vault.events().len());
    }

    #[test]
    fn test_check_integrity() {
        let mut vault = vault_2_of_3();
        let index = approved(&mut vault, addr("token"), vec![1]);
        assert_eq!(vault.check_integrity(), Ok(()));

        let mut json = serde_json::to_value(&vault).unwrap();
        json["ledger"]["proposals"][index as usize]["confirmations"] = serde_json::json!(3);
        let inflated: Vault = serde_json::from_value(json.clone()).unwrap();
        assert!(matches!(
            inflated.check_integrity(),
            Err(VaultError::InvalidConfiguration(_))
        ));

        json["ledger"]["proposals"] = serde_json::json!([]);
        let orphaned: Vault = serde_json::from_value(json).unwrap();
        assert!(matches!(
            orphaned.check_integrity(),
            Err(VaultError::InvalidConfiguration(_))
        ));
    }
}
