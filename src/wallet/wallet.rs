//! Owner keystore
//!
//! An owner's identity is a secp256k1 key; the wallet holds it on disk and
//! signs vault requests with it.

use crate::crypto::KeyPair;
use crate::vault::{Address, Operation, SignedRequest, VaultError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Wallet not found: {0}")]
    NotFound(Address),
    #[error("Signing error: {0}")]
    SigningError(#[from] VaultError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] crate::crypto::KeyError),
}

/// Serializable wallet data for persistence
#[derive(Debug, Serialize, Deserialize)]
struct WalletData {
    private_key_hex: String,
    address: Address,
    label: Option<String>,
}

/// An owner key with an optional label
pub struct Wallet {
    key_pair: KeyPair,
    pub label: Option<String>,
}

impl Wallet {
    /// Create a new wallet with a fresh key pair
    pub fn new() -> Self {
        Self {
            key_pair: KeyPair::generate(),
            label: None,
        }
    }

    /// Create a wallet with a label
    pub fn with_label(label: &str) -> Self {
        Self {
            key_pair: KeyPair::generate(),
            label: Some(label.to_string()),
        }
    }

    /// Import a wallet from a private key
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, WalletError> {
        let key_pair = KeyPair::from_private_key_hex(private_key_hex)?;
        Ok(Self {
            key_pair,
            label: None,
        })
    }

    /// Owner address of this key
    pub fn address(&self) -> Address {
        self.key_pair.address()
    }

    /// Get the wallet's public key (hex)
    pub fn public_key(&self) -> String {
        self.key_pair.public_key_hex()
    }

    /// Get the wallet's private key (hex)
    /// WARNING: Keep this secret!
    pub fn private_key(&self) -> String {
        self.key_pair.private_key_hex()
    }

    /// Sign `operation` for `vault` at the given nonce
    pub fn sign_request(
        &self,
        vault: Address,
        operation: Operation,
        nonce: u64,
    ) -> Result<SignedRequest, WalletError> {
        Ok(SignedRequest::sign(vault, operation, nonce, &self.key_pair)?)
    }

    /// Save wallet to file
    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        let data = WalletData {
            private_key_hex: self.private_key(),
            address: self.address(),
            label: self.label.clone(),
        };

        let json = serde_json::to_string_pretty(&data)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load wallet from file
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let json = fs::read_to_string(path)?;
        let data: WalletData = serde_json::from_str(&json)?;

        let mut wallet = Self::from_private_key(&data.private_key_hex)?;
        wallet.label = data.label;
        Ok(wallet)
    }

    /// Export wallet info (without private key)
    pub fn export_public_info(&self) -> WalletInfo {
        WalletInfo {
            address: self.address(),
            public_key: self.public_key(),
            label: self.label.clone(),
        }
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

/// Public wallet information (safe to share)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletInfo {
    pub address: Address,
    pub public_key: String,
    pub label: Option<String>,
}

/// Directory of owner wallets, one `<address>.json` per key
pub struct WalletManager {
    wallets_dir: PathBuf,
}

impl WalletManager {
    /// Create a new wallet manager
    pub fn new(wallets_dir: &Path) -> Result<Self, WalletError> {
        fs::create_dir_all(wallets_dir)?;
        Ok(Self {
            wallets_dir: wallets_dir.to_path_buf(),
        })
    }

    fn wallet_path(&self, address: &Address) -> PathBuf {
        self.wallets_dir.join(format!("{}.json", address))
    }

    /// Create and save a new wallet
    pub fn create_wallet(&self, label: Option<&str>) -> Result<Wallet, WalletError> {
        let wallet = match label {
            Some(l) => Wallet::with_label(l),
            None => Wallet::new(),
        };

        wallet.save(&self.wallet_path(&wallet.address()))?;
        log::info!("Created owner key {}", wallet.address());

        Ok(wallet)
    }

    /// List public info for every stored wallet
    pub fn list_wallets(&self) -> Result<Vec<WalletInfo>, WalletError> {
        let mut wallets = Vec::new();

        for entry in fs::read_dir(&self.wallets_dir)? {
            let path = entry?.path();

            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match Wallet::load(&path) {
                    Ok(wallet) => wallets.push(wallet.export_public_info()),
                    Err(e) => log::warn!("Skipping unreadable wallet {}: {}", path.display(), e),
                }
            }
        }

        wallets.sort_by_key(|w| w.address);
        Ok(wallets)
    }

    /// Load a specific wallet by address
    pub fn load_wallet(&self, address: &Address) -> Result<Wallet, WalletError> {
        let path = self.wallet_path(address);
        if !path.exists() {
            return Err(WalletError::NotFound(*address));
        }
        Wallet::load(&path)
    }

    /// Delete a wallet
    pub fn delete_wallet(&self, address: &Address) -> Result<(), WalletError> {
        fs::remove_file(self.wallet_path(address))?;
        Ok(())
    }
}
