//! Multisig Vault CLI Application
//!
//! A command-line interface for operating an M-of-N owner vault.

use clap::{Parser, Subcommand};
use multisig_vault::api::{create_router, ApiState, WsBroadcaster};
use multisig_vault::cli::{self, AppState};
use multisig_vault::storage::{Storage, StorageConfig};
use multisig_vault::token::TokenCall;
use multisig_vault::vault::{Address, GovernanceCall, GovernanceMode};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Parser)]
#[command(name = "vault")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "An M-of-N owner vault that gates calls behind quorum", long_about = None)]
struct Cli {
    /// Data directory for vault storage
    #[arg(short, long, default_value = ".vault_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new vault
    Init {
        /// Owner address (repeatable)
        #[arg(short, long = "owner")]
        owners: Vec<Address>,

        /// Number of fresh owner keys to generate
        #[arg(short, long, default_value = "0")]
        generate: usize,

        /// Confirmations required to execute
        #[arg(short, long)]
        threshold: u32,

        /// Who may change owners and threshold (quorum | owner)
        #[arg(long, default_value = "quorum")]
        governance: GovernanceMode,

        /// Optional label for the vault
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Display vault information
    Info,

    /// Owner key operations
    Key {
        #[command(subcommand)]
        action: KeyCommands,
    },

    /// Token operations
    Token {
        #[command(subcommand)]
        action: TokenCommands,
    },

    /// Submit a proposal
    Propose {
        /// Submitting owner's address
        #[arg(short, long)]
        from: Address,

        #[command(subcommand)]
        action: ProposeCommands,
    },

    /// Confirm a proposal
    Confirm {
        /// Confirming owner's address
        #[arg(short, long)]
        from: Address,

        /// Proposal index
        #[arg(short, long)]
        index: u64,
    },

    /// Execute a confirmed proposal
    Execute {
        /// Executing owner's address
        #[arg(short, long)]
        from: Address,

        /// Proposal index
        #[arg(short, long)]
        index: u64,
    },

    /// Direct owner changes (owner-governed vaults)
    Owner {
        #[command(subcommand)]
        action: OwnerCommands,
    },

    /// Direct threshold changes (owner-governed vaults)
    Threshold {
        #[command(subcommand)]
        action: ThresholdCommands,
    },

    /// Inspect proposals
    Tx {
        #[command(subcommand)]
        action: TxCommands,
    },

    /// Show the event log
    Events {
        /// First sequence number to show
        #[arg(short, long, default_value = "0")]
        since: u64,
    },

    /// Export vault state to file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import vault state from file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// REST API server
    Api {
        #[command(subcommand)]
        action: ApiCommands,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Create a new owner key
    New {
        /// Optional label for the key
        #[arg(short, long)]
        label: Option<String>,
    },

    /// List all owner keys
    List,
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Deploy a token (administered by the vault unless --admin is given)
    Deploy {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        symbol: String,

        #[arg(short, long, default_value = "18")]
        decimals: u8,

        #[arg(long)]
        admin: Option<Address>,
    },

    /// Show token details
    Info {
        #[arg(short, long)]
        address: Address,
    },

    /// Show a holder's balance
    Balance {
        #[arg(short, long)]
        token: Address,

        #[arg(long)]
        holder: Address,
    },
}

#[derive(Subcommand)]
enum ProposeCommands {
    /// Arbitrary call
    Raw {
        #[arg(short, long)]
        target: Address,

        /// Payload bytes (hex)
        #[arg(short, long, default_value = "")]
        payload: String,
    },

    /// Mint tokens
    Mint {
        #[arg(short, long)]
        token: Address,

        #[arg(long)]
        to: Address,

        #[arg(short, long)]
        amount: u128,
    },

    /// Burn the vault's own tokens
    Burn {
        #[arg(short, long)]
        token: Address,

        #[arg(short, long)]
        amount: u128,
    },

    /// Pause a token
    Pause {
        #[arg(short, long)]
        token: Address,
    },

    /// Unpause a token
    Unpause {
        #[arg(short, long)]
        token: Address,
    },

    /// Add an owner
    AddOwner {
        #[arg(short, long)]
        owner: Address,
    },

    /// Replace an owner
    SwapOwner {
        #[arg(long = "new")]
        new_owner: Address,

        #[arg(long = "old")]
        old_owner: Address,
    },

    /// Change the threshold
    Threshold {
        #[arg(short, long)]
        value: u32,
    },
}

#[derive(Subcommand)]
enum OwnerCommands {
    /// Add an owner
    Add {
        #[arg(short, long)]
        from: Address,

        #[arg(short, long)]
        owner: Address,
    },

    /// Replace an owner
    Swap {
        #[arg(short, long)]
        from: Address,

        #[arg(long = "new")]
        new_owner: Address,

        #[arg(long = "old")]
        old_owner: Address,
    },
}

#[derive(Subcommand)]
enum ThresholdCommands {
    /// Set the threshold
    Set {
        #[arg(short, long)]
        from: Address,

        #[arg(short, long)]
        value: u32,
    },
}

#[derive(Subcommand)]
enum TxCommands {
    /// List proposals
    List {
        /// Only show proposals that have not executed
        #[arg(short, long)]
        pending: bool,
    },

    /// Show one proposal
    Show {
        #[arg(short, long)]
        index: u64,
    },
}

#[derive(Subcommand)]
enum ApiCommands {
    /// Start the REST API server
    Start {
        /// Port to listen on for REST API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Commands that don't need a loaded vault
    match &cli.command {
        Commands::Init {
            owners,
            generate,
            threshold,
            governance,
            label,
        } => {
            return cli::cmd_init(
                &cli.data_dir,
                owners.clone(),
                *generate,
                *threshold,
                *governance,
                label.as_deref(),
            );
        }
        Commands::Key { action } => {
            return match action {
                KeyCommands::New { label } => cli::cmd_key_new(&cli.data_dir, label.as_deref()),
                KeyCommands::List => cli::cmd_key_list(&cli.data_dir),
            };
        }
        Commands::Import { input } => return cli::cmd_import(&cli.data_dir, input),
        Commands::Api { action } => return run_api_command(action, &cli.data_dir),
        _ => {}
    }

    let mut state = AppState::new(cli.data_dir.clone())?;

    match cli.command {
        Commands::Init { .. }
        | Commands::Key { .. }
        | Commands::Import { .. }
        | Commands::Api { .. } => unreachable!(),

        Commands::Info => cli::cmd_info(&state)?,

        Commands::Token { action } => match action {
            TokenCommands::Deploy {
                name,
                symbol,
                decimals,
                admin,
            } => cli::cmd_token_deploy(&mut state, &name, &symbol, decimals, admin)?,
            TokenCommands::Info { address } => cli::cmd_token_info(&state, &address)?,
            TokenCommands::Balance { token, holder } => {
                cli::cmd_token_balance(&state, &token, &holder)?
            }
        },

        Commands::Propose { from, action } => match action {
            ProposeCommands::Raw { target, payload } => {
                let payload = hex::decode(payload.trim_start_matches("0x"))?;
                cli::cmd_propose(&mut state, &from, target, payload)?
            }
            ProposeCommands::Mint { token, to, amount } => {
                cli::cmd_propose_token(&mut state, &from, token, TokenCall::Mint { to, amount })?
            }
            ProposeCommands::Burn { token, amount } => {
                cli::cmd_propose_token(&mut state, &from, token, TokenCall::Burn { amount })?
            }
            ProposeCommands::Pause { token } => {
                cli::cmd_propose_token(&mut state, &from, token, TokenCall::Pause)?
            }
            ProposeCommands::Unpause { token } => {
                cli::cmd_propose_token(&mut state, &from, token, TokenCall::Unpause)?
            }
            ProposeCommands::AddOwner { owner } => cli::cmd_propose_governance(
                &mut state,
                &from,
                GovernanceCall::AddOwner { owner },
            )?,
            ProposeCommands::SwapOwner {
                new_owner,
                old_owner,
            } => cli::cmd_propose_governance(
                &mut state,
                &from,
                GovernanceCall::SwapOwner {
                    new_owner,
                    old_owner,
                },
            )?,
            ProposeCommands::Threshold { value } => cli::cmd_propose_governance(
                &mut state,
                &from,
                GovernanceCall::UpdateThreshold { threshold: value },
            )?,
        },

        Commands::Confirm { from, index } => cli::cmd_confirm(&mut state, &from, index)?,

        Commands::Execute { from, index } => cli::cmd_execute(&mut state, &from, index)?,

        Commands::Owner { action } => match action {
            OwnerCommands::Add { from, owner } => cli::cmd_owner_add(&mut state, &from, owner)?,
            OwnerCommands::Swap {
                from,
                new_owner,
                old_owner,
            } => cli::cmd_owner_swap(&mut state, &from, new_owner, old_owner)?,
        },

        Commands::Threshold { action } => match action {
            ThresholdCommands::Set { from, value } => {
                cli::cmd_threshold_set(&mut state, &from, value)?
            }
        },

        Commands::Tx { action } => match action {
            TxCommands::List { pending } => cli::cmd_tx_list(&state, pending)?,
            TxCommands::Show { index } => cli::cmd_tx_show(&state, index)?,
        },

        Commands::Events { since } => cli::cmd_events(&state, since)?,

        Commands::Export { output } => cli::cmd_export(&state, &output)?,
    }

    Ok(())
}

fn run_api_command(action: &ApiCommands, data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        match action {
            ApiCommands::Start { port } => {
                let storage_config = StorageConfig {
                    data_dir: data_dir.to_path_buf(),
                    ..Default::default()
                };
                let storage = Arc::new(Storage::new(storage_config)?);

                if !storage.exists() {
                    return Err(format!(
                        "no vault found in {:?}; create one with: vault init",
                        data_dir
                    )
                    .into());
                }

                println!("📂 Loading vault...");
                let deployment = storage.load()?;
                println!(
                    "   {} ({})",
                    deployment.vault.address(),
                    deployment.vault.description()
                );

                let state = ApiState {
                    deployment: Arc::new(RwLock::new(deployment)),
                    storage: storage.clone(),
                    ws_broadcaster: Arc::new(WsBroadcaster::new()),
                };

                let shutdown_state = state.clone();
                let app = create_router(state);

                let addr = format!("0.0.0.0:{}", port);
                println!("🚀 REST API server starting on http://localhost:{}", port);
                println!();
                println!("📖 Available endpoints:");
                println!("   GET  /health                                   - Health check");
                println!("   GET  /ws                                       - WebSocket events");
                println!("   GET  /api/vault                                - Vault info");
                println!("   GET  /api/vault/owners                         - Owners");
                println!("   GET  /api/vault/transactions                   - List proposals");
                println!("   GET  /api/vault/transactions/{{i}}               - Get proposal");
                println!("   GET  /api/vault/transactions/{{i}}/confirmations - Confirmers");
                println!("   GET  /api/vault/nonce/{{addr}}                   - Request nonce");
                println!("   GET  /api/vault/events?since=N                 - Event log");
                println!("   POST /api/vault/requests                       - Signed request");
                println!("   GET  /api/tokens                               - List tokens");
                println!("   GET  /api/tokens/{{addr}}                        - Get token");
                println!("   GET  /api/tokens/{{addr}}/balance/{{h}}            - Token balance");
                println!();

                // Handle Ctrl+C with graceful shutdown
                tokio::spawn(async move {
                    tokio::signal::ctrl_c().await.ok();
                    println!("\n📴 Shutting down API server...");

                    println!("💾 Saving data...");
                    let deployment = shutdown_state.deployment.read().await;
                    if let Err(e) = shutdown_state.storage.save(&deployment) {
                        log::error!("Failed to save vault state: {}", e);
                    } else {
                        println!("✅ Data saved successfully!");
                    }
                    std::process::exit(0);
                });

                let listener = tokio::net::TcpListener::bind(&addr).await?;
                axum::serve(listener, app).await?;
            }
        }

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}
