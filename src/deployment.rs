//! A vault together with the tokens it can call
//!
//! This is the unit that gets persisted, served by the API and driven by the
//! CLI.

use crate::token::TokenManager;
use crate::vault::{Outcome, SignedRequest, Vault, VaultConfig, VaultResult};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Deployment {
    pub vault: Vault,
    pub tokens: TokenManager,
}

impl Deployment {
    /// Create a deployment with a fresh vault and no tokens
    pub fn new(config: VaultConfig) -> VaultResult<Self> {
        Ok(Self {
            vault: Vault::new(config)?,
            tokens: TokenManager::new(),
        })
    }

    /// Run a signed request, dispatching executed proposals to the tokens
    pub fn apply(&mut self, request: &SignedRequest) -> VaultResult<Outcome> {
        self.vault.apply(request, &mut self.tokens)
    }
}
