//! Token manager for deploying tokens and routing vault calls to them

use crate::crypto::sha256;
use crate::token::token::{Token, TokenCall, TokenError, TokenMetadata};
use crate::vault::{Address, CallError, Dispatcher, Vault};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Manages all tokens in a deployment
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenManager {
    /// All tokens by address
    tokens: HashMap<Address, Token>,
    /// Deployment counter for address generation
    nonce: u64,
}

impl TokenManager {
    /// Create a new token manager
    pub fn new() -> Self {
        Self {
            tokens: HashMap::new(),
            nonce: 0,
        }
    }

    /// Deploy a new token administered by `admin`
    pub fn create_token(
        &mut self,
        name: String,
        symbol: String,
        decimals: u8,
        admin: Address,
    ) -> Result<Token, TokenError> {
        let metadata = TokenMetadata::new(name, symbol, decimals, admin)?;

        let address = self.generate_address(&admin, &metadata.symbol);
        self.nonce += 1;

        if self.tokens.contains_key(&address) {
            return Err(TokenError::TokenAlreadyExists(address));
        }

        let token = Token::new(address, metadata);
        self.tokens.insert(address, token.clone());

        log::info!(
            "Token created: {} ({}) at {}, admin {}",
            token.name(),
            token.symbol(),
            address,
            admin
        );

        Ok(token)
    }

    /// Token address = first 20 bytes of SHA256(admin:symbol:nonce)
    fn generate_address(&self, admin: &Address, symbol: &str) -> Address {
        let input = format!("{}:{}:{}", admin, symbol, self.nonce);
        let hash = sha256(input.as_bytes());
        Address::from_digest(&hash).unwrap_or_default()
    }

    /// Get a token by address
    pub fn get(&self, address: &Address) -> Option<&Token> {
        self.tokens.get(address)
    }

    /// Get mutable reference to a token
    pub fn get_mut(&mut self, address: &Address) -> Option<&mut Token> {
        self.tokens.get_mut(address)
    }

    /// List all tokens
    pub fn list(&self) -> Vec<&Token> {
        self.tokens.values().collect()
    }

    /// Get token count
    pub fn count(&self) -> usize {
        self.tokens.len()
    }

    /// Check if a token exists
    pub fn exists(&self, address: &Address) -> bool {
        self.tokens.contains_key(address)
    }

    /// Get balance of `holder` for a specific token
    pub fn balance_of(&self, token_address: &Address, holder: &Address) -> Result<u128, TokenError> {
        let token = self
            .tokens
            .get(token_address)
            .ok_or(TokenError::TokenNotFound(*token_address))?;

        Ok(token.balance_of(holder))
    }

    /// Apply a call to a token with `sender` as caller
    pub fn call(
        &mut self,
        token_address: &Address,
        sender: Address,
        call: TokenCall,
    ) -> Result<(), TokenError> {
        let token = self
            .tokens
            .get_mut(token_address)
            .ok_or(TokenError::TokenNotFound(*token_address))?;

        token.handle(sender, call)
    }
}

impl Dispatcher for TokenManager {
    fn dispatch(
        &mut self,
        vault: &mut Vault,
        target: Address,
        payload: &[u8],
    ) -> Result<(), CallError> {
        if !self.exists(&target) {
            return Err(CallError::UnknownTarget(target));
        }

        let call =
            TokenCall::decode(payload).map_err(|e| CallError::MalformedPayload(e.to_string()))?;
        log::debug!("Token {} called by vault {}: {:?}", target, vault.address(), call);

        self.call(&target, vault.address(), call)
            .map_err(|e| CallError::Rejected(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::{VaultConfig, VaultError};

    fn addr(name: &str) -> Address {
        Address::from_data(name.as_bytes())
    }

    #[test]
    fn test_manager_creation() {
        let manager = TokenManager::new();
        assert_eq!(manager.count(), 0);
    }

    #[test]
    fn test_token_creation() {
        let mut manager = TokenManager::new();

        let token = manager
            .create_token("Test Token".to_string(), "TST".to_string(), 18, addr("admin"))
            .unwrap();

        assert!(!token.address.is_zero());
        assert!(manager.exists(&token.address));
        assert_eq!(manager.count(), 1);

        // Same admin and symbol still get distinct addresses
        let second = manager
            .create_token("Test Token".to_string(), "TST".to_string(), 18, addr("admin"))
            .unwrap();
        assert_ne!(token.address, second.address);
    }

    #[test]
    fn test_call_nonexistent_token() {
        let mut manager = TokenManager::new();

        let result = manager.call(&addr("nowhere"), addr("admin"), TokenCall::Pause);
        assert_eq!(result, Err(TokenError::TokenNotFound(addr("nowhere"))));
    }

    #[test]
    fn test_vault_mint_scenario() {
        let owners = vec![addr("alice"), addr("bob"), addr("carol")];
        let mut vault = Vault::new(VaultConfig::new(owners, 2)).unwrap();
        let mut manager = TokenManager::new();
        let token = manager
            .create_token("Vault Token".to_string(), "VLT".to_string(), 18, vault.address())
            .unwrap();

        let payload = TokenCall::Mint {
            to: addr("treasury"),
            amount: 100,
        }
        .encode();
        let index = vault.submit(addr("alice"), token.address, payload).unwrap();

        vault.confirm(addr("alice"), index).unwrap();
        assert_eq!(
            vault.execute(addr("alice"), index, &mut manager),
            Err(VaultError::QuorumNotMet { have: 1, need: 2 })
        );

        vault.confirm(addr("bob"), index).unwrap();
        vault.execute(addr("alice"), index, &mut manager).unwrap();

        assert!(vault.transaction(index).unwrap().executed);
        let minted = manager.get(&token.address).unwrap();
        assert_eq!(minted.balance_of(&addr("treasury")), 100);
        assert_eq!(minted.total_supply(), 100);
        assert_eq!(minted.history.len(), 1);
    }

    #[test]
    fn test_rejected_token_call_rolls_back_vault() {
        let owners = vec![addr("alice"), addr("bob")];
        let mut vault = Vault::new(VaultConfig::new(owners, 1)).unwrap();
        let mut manager = TokenManager::new();
        let token = manager
            .create_token("Vault Token".to_string(), "VLT".to_string(), 18, vault.address())
            .unwrap();

        // Nothing to burn yet
        let index = vault
            .submit(
                addr("alice"),
                token.address,
                TokenCall::Burn { amount: 5 }.encode(),
            )
            .unwrap();
        vault.confirm(addr("bob"), index).unwrap();

        assert!(matches!(
            vault.execute(addr("bob"), index, &mut manager),
            Err(VaultError::ExecutionFailed(_))
        ));
        assert!(!vault.transaction(index).unwrap().executed);
        assert_eq!(vault.transaction(index).unwrap().confirmations, 1);
    }

    #[test]
    fn test_dispatch_unknown_target_and_bad_payload() {
        let mut vault = Vault::new(VaultConfig::new(vec![addr("alice")], 1)).unwrap();
        let mut manager = TokenManager::new();
        let token = manager
            .create_token("Vault Token".to_string(), "VLT".to_string(), 0, vault.address())
            .unwrap();

        assert_eq!(
            manager.dispatch(&mut vault, addr("ghost"), &TokenCall::Pause.encode()),
            Err(CallError::UnknownTarget(addr("ghost")))
        );
        assert!(matches!(
            manager.dispatch(&mut vault, token.address, b"{}"),
            Err(CallError::MalformedPayload(_))
        ));
        assert_eq!(
            manager.dispatch(&mut vault, token.address, &TokenCall::Pause.encode()),
            Ok(())
        );
        assert!(manager.get(&token.address).unwrap().is_paused());
    }
}
