//! CLI commands for the vault
//!
//! Implements all command handlers for the CLI interface. Every state change
//! goes through a request signed by one of the locally stored owner keys.

use crate::deployment::Deployment;
use crate::storage::{Storage, StorageConfig};
use crate::token::TokenCall;
use crate::vault::{
    Address, GovernanceCall, GovernanceMode, Operation, Outcome, Proposal, VaultConfig,
    VaultEvent,
};
use crate::wallet::WalletManager;
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub deployment: Deployment,
    pub storage: Storage,
    pub wallet_manager: WalletManager,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load application state from an initialized data directory
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let storage = open_storage(&data_dir)?;
        let wallet_manager = WalletManager::new(&data_dir.join("wallets"))?;

        if !storage.exists() {
            return Err(format!(
                "no vault found in {:?}; create one with: vault init",
                data_dir
            )
            .into());
        }

        let deployment = storage.load()?;

        Ok(Self {
            deployment,
            storage,
            wallet_manager,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.deployment)?;
        Ok(())
    }

    /// Sign `operation` with the stored key of `from` and apply it
    pub fn sign_and_apply(&mut self, from: &Address, operation: Operation) -> CliResult<Outcome> {
        let wallet = self.wallet_manager.load_wallet(from)?;
        let vault = self.deployment.vault.address();
        let nonce = self.deployment.vault.nonce(from);

        let request = wallet.sign_request(vault, operation, nonce)?;
        let outcome = self.deployment.apply(&request)?;
        self.save()?;

        Ok(outcome)
    }
}

fn open_storage(data_dir: &Path) -> CliResult<Storage> {
    let storage_config = StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };
    Ok(Storage::new(storage_config)?)
}

/// Create a new vault
///
/// `generate` fresh owner keys are created in the keystore and appended to
/// `owners`.
pub fn cmd_init(
    data_dir: &Path,
    mut owners: Vec<Address>,
    generate: usize,
    threshold: u32,
    governance: GovernanceMode,
    label: Option<&str>,
) -> CliResult<()> {
    let storage = open_storage(data_dir)?;

    if storage.exists() {
        println!("⚠️  Vault already exists at {:?}", data_dir);
        println!("   Remove the data directory to start over");
        return Ok(());
    }

    let wallet_manager = WalletManager::new(&data_dir.join("wallets"))?;
    for i in 0..generate {
        let wallet = wallet_manager.create_wallet(Some(&format!("owner-{}", i + 1)))?;
        println!("🔐 Generated owner key {}", wallet.address());
        owners.push(wallet.address());
    }

    let mut config = VaultConfig::new(owners, threshold).with_governance(governance);
    if let Some(label) = label {
        config = config.with_label(label);
    }

    let deployment = Deployment::new(config)?;
    storage.save(&deployment)?;

    let vault = &deployment.vault;
    println!("✅ Vault initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   📍 Address: {}", vault.address());
    println!("   🔧 Policy: {}", vault.description());
    println!("   🏛️  Governance: {}", vault.governance_mode());

    Ok(())
}

/// Display vault information
pub fn cmd_info(state: &AppState) -> CliResult<()> {
    let vault = &state.deployment.vault;

    println!("🏦 Vault Info");
    println!("   ├─ Address: {}", vault.address());
    if let Some(label) = vault.label() {
        println!("   ├─ Label: {}", label);
    }
    println!("   ├─ Policy: {}", vault.description());
    println!("   ├─ Governance: {}", vault.governance_mode());
    println!("   ├─ Proposals: {}", vault.transaction_count());
    println!("   ├─ Pending: {}", vault.pending().len());
    println!("   ├─ Events: {}", vault.events().len());
    println!("   ├─ Tokens: {}", state.deployment.tokens.count());
    println!(
        "   └─ Created: {}",
        vault.created_at().format("%Y-%m-%d %H:%M:%S")
    );

    println!("\n   Owners:");
    for owner in vault.owners() {
        let local = if state.wallet_manager.load_wallet(owner).is_ok() {
            " (local key)"
        } else {
            ""
        };
        println!("   └─ {}{}", owner, local);
    }

    let stats = state.storage.stats()?;
    println!(
        "\n   💾 {} bytes on disk, {} backup(s)",
        stats.file_size, stats.backup_count
    );

    Ok(())
}

/// Create a new owner key
pub fn cmd_key_new(data_dir: &Path, label: Option<&str>) -> CliResult<()> {
    let wallet_manager = WalletManager::new(&data_dir.join("wallets"))?;
    let wallet = wallet_manager.create_wallet(label)?;

    println!("🔐 New owner key created!");
    println!("   📍 Address: {}", wallet.address());
    println!("   🔑 Public Key: {}...", &wallet.public_key()[..32]);
    if let Some(l) = &wallet.label {
        println!("   🏷️  Label: {}", l);
    }
    println!("\n   ⚠️  IMPORTANT: Your private key is stored in the wallets directory.");
    println!("   Back up this directory to avoid losing access to the vault!");

    Ok(())
}

/// List all owner keys
pub fn cmd_key_list(data_dir: &Path) -> CliResult<()> {
    let wallet_manager = WalletManager::new(&data_dir.join("wallets"))?;
    let wallets = wallet_manager.list_wallets()?;

    if wallets.is_empty() {
        println!("📭 No keys found. Create one with: vault key new");
        return Ok(());
    }

    let vault = open_storage(data_dir)?
        .load()
        .ok()
        .map(|deployment| deployment.vault);

    println!("📋 Keys:");
    for info in &wallets {
        let label = info.label.as_deref().unwrap_or("-");
        let role = match &vault {
            Some(vault) if vault.is_owner(&info.address) => "owner",
            Some(_) => "not an owner",
            None => "-",
        };
        println!("   {} ({}) - {}", info.address, label, role);
    }

    Ok(())
}

/// Deploy a token administered by the vault (or `admin`)
pub fn cmd_token_deploy(
    state: &mut AppState,
    name: &str,
    symbol: &str,
    decimals: u8,
    admin: Option<Address>,
) -> CliResult<()> {
    let admin = admin.unwrap_or_else(|| state.deployment.vault.address());
    let token = state.deployment.tokens.create_token(
        name.to_string(),
        symbol.to_string(),
        decimals,
        admin,
    )?;
    state.save()?;

    println!("🪙 Token deployed!");
    println!("   📍 Address: {}", token.address);
    println!("   🏷️  {} ({})", token.name(), token.symbol());
    println!("   👑 Admin: {}", admin);

    Ok(())
}

/// Show token details
pub fn cmd_token_info(state: &AppState, address: &Address) -> CliResult<()> {
    let token = state
        .deployment
        .tokens
        .get(address)
        .ok_or_else(|| format!("token not found: {}", address))?;

    println!("🪙 Token: {}", token.address);
    println!("   ├─ Name: {}", token.name());
    println!("   ├─ Symbol: {}", token.symbol());
    println!("   ├─ Decimals: {}", token.decimals());
    println!("   ├─ Admin: {}", token.admin());
    println!("   ├─ Total supply: {}", token.total_supply());
    println!("   ├─ Holders: {}", token.holder_count());
    println!("   └─ Paused: {}", token.is_paused());

    Ok(())
}

/// Show a holder's balance of a token
pub fn cmd_token_balance(state: &AppState, token: &Address, holder: &Address) -> CliResult<()> {
    let balance = state.deployment.tokens.balance_of(token, holder)?;

    println!("💰 Balance of {}", holder);
    println!("   {} units of {}", balance, token);

    Ok(())
}

/// Submit a proposal
pub fn cmd_propose(
    state: &mut AppState,
    from: &Address,
    target: Address,
    payload: Vec<u8>,
) -> CliResult<()> {
    let outcome = state.sign_and_apply(from, Operation::Submit { target, payload })?;

    if let Outcome::Submitted { index } = outcome {
        println!("📝 Proposal #{} submitted", index);
        println!("   Target: {}", target);
        println!(
            "   Needs {} confirmation(s)",
            state.deployment.vault.required_confirmations()
        );
    }

    Ok(())
}

/// Submit a governance proposal targeting the vault itself
pub fn cmd_propose_governance(
    state: &mut AppState,
    from: &Address,
    call: GovernanceCall,
) -> CliResult<()> {
    let vault = state.deployment.vault.address();
    cmd_propose(state, from, vault, call.encode())
}

/// Submit a token call proposal
pub fn cmd_propose_token(
    state: &mut AppState,
    from: &Address,
    token: Address,
    call: TokenCall,
) -> CliResult<()> {
    if !state.deployment.tokens.exists(&token) {
        println!("⚠️  {} is not a known token; the proposal cannot execute", token);
    }
    cmd_propose(state, from, token, call.encode())
}

/// Confirm a proposal
pub fn cmd_confirm(state: &mut AppState, from: &Address, index: u64) -> CliResult<()> {
    let outcome = state.sign_and_apply(from, Operation::Confirm { index })?;

    if let Outcome::Confirmed {
        index,
        confirmations,
    } = outcome
    {
        let need = state.deployment.vault.required_confirmations();
        println!("✍️  Proposal #{} confirmed by {}", index, from);
        println!("   {}/{} confirmations", confirmations, need);
        if confirmations >= need {
            println!("   ✅ Ready to execute");
        }
    }

    Ok(())
}

/// Execute a proposal
pub fn cmd_execute(state: &mut AppState, from: &Address, index: u64) -> CliResult<()> {
    state.sign_and_apply(from, Operation::Execute { index })?;

    println!("🚀 Proposal #{} executed", index);

    Ok(())
}

/// Add an owner directly (owner-governed vaults only)
pub fn cmd_owner_add(state: &mut AppState, from: &Address, owner: Address) -> CliResult<()> {
    state.sign_and_apply(from, Operation::AddOwner { owner })?;

    println!("👥 Owner {} added", owner);
    println!("   Policy: {}", state.deployment.vault.description());

    Ok(())
}

/// Swap an owner directly (owner-governed vaults only)
pub fn cmd_owner_swap(
    state: &mut AppState,
    from: &Address,
    new_owner: Address,
    old_owner: Address,
) -> CliResult<()> {
    state.sign_and_apply(
        from,
        Operation::SwapOwner {
            new_owner,
            old_owner,
        },
    )?;

    println!("🔁 Owner {} replaced by {}", old_owner, new_owner);

    Ok(())
}

/// Change the threshold directly (owner-governed vaults only)
pub fn cmd_threshold_set(state: &mut AppState, from: &Address, threshold: u32) -> CliResult<()> {
    state.sign_and_apply(from, Operation::UpdateThreshold { threshold })?;

    println!("🔧 Policy is now {}", state.deployment.vault.description());

    Ok(())
}

/// List proposals
pub fn cmd_tx_list(state: &AppState, pending_only: bool) -> CliResult<()> {
    let vault = &state.deployment.vault;
    let need = vault.required_confirmations();

    if vault.transaction_count() == 0 {
        println!("📭 No proposals yet. Submit one with: vault propose");
        return Ok(());
    }

    println!("📋 Proposals:");
    for (index, proposal) in vault.transactions() {
        if pending_only && proposal.executed {
            continue;
        }
        let status = if proposal.executed {
            "executed".to_string()
        } else {
            format!("{}/{}", proposal.confirmations, need)
        };
        println!(
            "   #{} | {} | {} | {}",
            index,
            status,
            proposal.target,
            describe_payload(state, proposal)
        );
    }

    Ok(())
}

/// Show one proposal
pub fn cmd_tx_show(state: &AppState, index: u64) -> CliResult<()> {
    let vault = &state.deployment.vault;
    let proposal = vault.transaction(index)?;

    println!("📝 Proposal #{}", index);
    println!("   ├─ Target: {}", proposal.target);
    println!("   ├─ Call: {}", describe_payload(state, proposal));
    println!("   ├─ Payload: {}", hex::encode(&proposal.payload));
    println!("   ├─ Submitter: {}", proposal.submitter);
    println!(
        "   ├─ Submitted: {}",
        proposal.submitted_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "   ├─ Confirmations: {}/{}",
        proposal.confirmations,
        vault.required_confirmations()
    );
    println!("   └─ Executed: {}", proposal.executed);

    for owner in vault.confirmers(index) {
        println!("      ✍️  {}", owner);
    }

    Ok(())
}

fn describe_payload(state: &AppState, proposal: &Proposal) -> String {
    if proposal.target == state.deployment.vault.address() {
        if let Ok(call) = GovernanceCall::decode(&proposal.payload) {
            return format!("{:?}", call);
        }
    } else if state.deployment.tokens.exists(&proposal.target) {
        if let Ok(call) = TokenCall::decode(&proposal.payload) {
            return format!("{:?}", call);
        }
    }
    format!("{} raw bytes", proposal.payload.len())
}

/// Show the event log
pub fn cmd_events(state: &AppState, since: u64) -> CliResult<()> {
    let records = state.deployment.vault.events().since(since);

    if records.is_empty() {
        println!("📭 No events since #{}", since);
        return Ok(());
    }

    println!("📜 Events:");
    for record in records {
        let line = match &record.event {
            VaultEvent::Submitted {
                submitter,
                index,
                target,
                ..
            } => format!("Submitted #{} to {} by {}", index, target, submitter),
            VaultEvent::Confirmed { confirmer, index } => {
                format!("Confirmed #{} by {}", index, confirmer)
            }
            VaultEvent::Executed { executor, index } => {
                format!("Executed #{} by {}", index, executor)
            }
            VaultEvent::OwnershipChanged { owner } => format!("Ownership changed: {}", owner),
            VaultEvent::ThresholdChanged { threshold } => {
                format!("Threshold changed to {}", threshold)
            }
        };
        println!(
            "   #{} {} | {}",
            record.sequence,
            record.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            line
        );
    }

    Ok(())
}

/// Export the deployment to a file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    crate::storage::save_to_file(&state.deployment, path)?;
    println!("📦 Vault exported to {:?}", path);
    Ok(())
}

/// Import a deployment from a file
pub fn cmd_import(data_dir: &Path, path: &Path) -> CliResult<()> {
    let deployment = crate::storage::load_from_file(path)?;
    let storage = open_storage(data_dir)?;
    storage.save(&deployment)?;

    println!("📥 Vault imported from {:?}", path);
    println!("   Address: {}", deployment.vault.address());
    println!("   Proposals: {}", deployment.vault.transaction_count());

    Ok(())
}
