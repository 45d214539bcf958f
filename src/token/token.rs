//! Administered fungible token
//!
//! A minimal target for the vault: balances plus admin-only mint, pause and
//! unpause. The admin is normally the vault's own address, so every
//! administrative action has to pass quorum first.

use crate::vault::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Maximum number of events kept in a token's history
const HISTORY_LIMIT: usize = 100;

/// Token-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },
    #[error("Invalid amount: amount must be greater than 0")]
    InvalidAmount,
    #[error("Caller is not the token admin: {0}")]
    NotAdmin(Address),
    #[error("Token is paused")]
    Paused,
    #[error("Token is not paused")]
    NotPaused,
    #[error("Supply overflow")]
    SupplyOverflow,
    #[error("Invalid address: cannot transfer to self")]
    SelfTransfer,
    #[error("Token not found: {0}")]
    TokenNotFound(Address),
    #[error("Token already exists: {0}")]
    TokenAlreadyExists(Address),
    #[error("Invalid symbol: must be 1-10 characters")]
    InvalidSymbol,
    #[error("Invalid name: must be 1-50 characters")]
    InvalidName,
    #[error("Invalid decimals: must be 0-18")]
    InvalidDecimals,
}

/// Token metadata (immutable after creation)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenMetadata {
    /// Token name (e.g., "Vault Token")
    pub name: String,
    /// Token symbol (e.g., "VLT")
    pub symbol: String,
    /// Decimal places
    pub decimals: u8,
    /// Address allowed to mint and pause
    pub admin: Address,
    /// Timestamp when created
    pub created_at: DateTime<Utc>,
}

impl TokenMetadata {
    /// Create new token metadata with validation
    pub fn new(
        name: String,
        symbol: String,
        decimals: u8,
        admin: Address,
    ) -> Result<Self, TokenError> {
        if name.is_empty() || name.len() > 50 {
            return Err(TokenError::InvalidName);
        }

        if symbol.is_empty() || symbol.len() > 10 {
            return Err(TokenError::InvalidSymbol);
        }

        if decimals > 18 {
            return Err(TokenError::InvalidDecimals);
        }

        Ok(Self {
            name,
            symbol,
            decimals,
            admin,
            created_at: Utc::now(),
        })
    }
}

/// A state change on a token
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TokenAction {
    Mint { to: Address, amount: u128 },
    Burn { from: Address, amount: u128 },
    Transfer { from: Address, to: Address, amount: u128 },
    Pause,
    Unpause,
}

/// A recorded token action
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenEvent {
    pub token: Address,
    pub action: TokenAction,
    pub timestamp: DateTime<Utc>,
}

/// Calls a token accepts as a vault payload
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TokenCall {
    Mint { to: Address, amount: u128 },
    Burn { amount: u128 },
    Transfer { to: Address, amount: u128 },
    Pause,
    Unpause,
}

impl TokenCall {
    /// Encode as a proposal payload
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Decode from a proposal payload
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

/// A fungible token with an administrator
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    /// Unique token address
    pub address: Address,
    /// Token metadata
    pub metadata: TokenMetadata,
    /// Current supply
    total_supply: u128,
    /// Balances: address -> amount
    balances: HashMap<Address, u128>,
    /// Whether balance-moving calls are blocked
    paused: bool,
    /// Recent actions (last 100)
    pub history: Vec<TokenEvent>,
}

impl Token {
    /// Create a token with zero supply
    pub fn new(address: Address, metadata: TokenMetadata) -> Self {
        Self {
            address,
            metadata,
            total_supply: 0,
            balances: HashMap::new(),
            paused: false,
            history: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    pub fn admin(&self) -> Address {
        self.metadata.admin
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Get balance of an address
    pub fn balance_of(&self, holder: &Address) -> u128 {
        *self.balances.get(holder).unwrap_or(&0)
    }

    /// Holder count (non-zero balances)
    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|&&b| b > 0).count()
    }

    /// Create `amount` new tokens for `to`
    pub fn mint(&mut self, caller: Address, to: Address, amount: u128) -> Result<(), TokenError> {
        self.require_admin(caller)?;
        self.require_active()?;
        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }

        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow)?;

        self.total_supply = supply;
        *self.balances.entry(to).or_insert(0) += amount;
        self.record(TokenAction::Mint { to, amount });
        Ok(())
    }

    /// Destroy `amount` of the holder's own tokens
    pub fn burn(&mut self, holder: Address, amount: u128) -> Result<(), TokenError> {
        self.require_active()?;
        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }

        let balance = self.balance_of(&holder);
        if balance < amount {
            return Err(TokenError::InsufficientBalance {
                have: balance,
                need: amount,
            });
        }

        self.balances.insert(holder, balance - amount);
        self.total_supply -= amount;
        self.record(TokenAction::Burn {
            from: holder,
            amount,
        });
        Ok(())
    }

    /// Move tokens between holders
    pub fn transfer(&mut self, from: Address, to: Address, amount: u128) -> Result<(), TokenError> {
        self.require_active()?;
        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }

        if from == to {
            return Err(TokenError::SelfTransfer);
        }

        let from_balance = self.balance_of(&from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                have: from_balance,
                need: amount,
            });
        }

        self.balances.insert(from, from_balance - amount);
        *self.balances.entry(to).or_insert(0) += amount;
        self.record(TokenAction::Transfer { from, to, amount });
        Ok(())
    }

    /// Block mint, burn and transfer
    pub fn pause(&mut self, caller: Address) -> Result<(), TokenError> {
        self.require_admin(caller)?;
        self.require_active()?;

        self.paused = true;
        self.record(TokenAction::Pause);
        Ok(())
    }

    /// Lift a pause
    pub fn unpause(&mut self, caller: Address) -> Result<(), TokenError> {
        self.require_admin(caller)?;
        if !self.paused {
            return Err(TokenError::NotPaused);
        }

        self.paused = false;
        self.record(TokenAction::Unpause);
        Ok(())
    }

    /// Apply a decoded call with `sender` as caller
    pub fn handle(&mut self, sender: Address, call: TokenCall) -> Result<(), TokenError> {
        match call {
            TokenCall::Mint { to, amount } => self.mint(sender, to, amount),
            TokenCall::Burn { amount } => self.burn(sender, amount),
            TokenCall::Transfer { to, amount } => self.transfer(sender, to, amount),
            TokenCall::Pause => self.pause(sender),
            TokenCall::Unpause => self.unpause(sender),
        }
    }

    fn require_admin(&self, caller: Address) -> Result<(), TokenError> {
        if caller != self.metadata.admin {
            return Err(TokenError::NotAdmin(caller));
        }
        Ok(())
    }

    fn require_active(&self) -> Result<(), TokenError> {
        if self.paused {
            return Err(TokenError::Paused);
        }
        Ok(())
    }

    fn record(&mut self, action: TokenAction) {
        self.history.push(TokenEvent {
            token: self.address,
            action,
            timestamp: Utc::now(),
        });
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(name: &str) -> Address {
        Address::from_data(name.as_bytes())
    }

    fn create_test_token() -> Token {
        let metadata =
            TokenMetadata::new("Test Token".to_string(), "TST".to_string(), 18, addr("admin"))
                .unwrap();

        Token::new(addr("token"), metadata)
    }

    #[test]
    fn test_token_creation() {
        let token = create_test_token();

        assert_eq!(token.name(), "Test Token");
        assert_eq!(token.symbol(), "TST");
        assert_eq!(token.decimals(), 18);
        assert_eq!(token.total_supply(), 0);
        assert_eq!(token.admin(), addr("admin"));
        assert!(!token.is_paused());
    }

    #[test]
    fn test_metadata_validation() {
        assert_eq!(
            TokenMetadata::new("".to_string(), "TST".to_string(), 18, addr("a")),
            Err(TokenError::InvalidName)
        );
        assert_eq!(
            TokenMetadata::new("Test".to_string(), "TOOLONGSYMBOL".to_string(), 18, addr("a")),
            Err(TokenError::InvalidSymbol)
        );
        assert_eq!(
            TokenMetadata::new("Test".to_string(), "TST".to_string(), 19, addr("a")),
            Err(TokenError::InvalidDecimals)
        );
    }

    #[test]
    fn test_mint_admin_only() {
        let mut token = create_test_token();

        token.mint(addr("admin"), addr("alice"), 100).unwrap();
        assert_eq!(token.balance_of(&addr("alice")), 100);
        assert_eq!(token.total_supply(), 100);

        assert_eq!(
            token.mint(addr("alice"), addr("alice"), 100),
            Err(TokenError::NotAdmin(addr("alice")))
        );
        assert_eq!(
            token.mint(addr("admin"), addr("alice"), 0),
            Err(TokenError::InvalidAmount)
        );
        assert_eq!(token.total_supply(), 100);
    }

    #[test]
    fn test_burn_and_transfer() {
        let mut token = create_test_token();
        token.mint(addr("admin"), addr("alice"), 1000).unwrap();

        token.transfer(addr("alice"), addr("bob"), 400).unwrap();
        assert_eq!(token.balance_of(&addr("alice")), 600);
        assert_eq!(token.balance_of(&addr("bob")), 400);
        assert_eq!(token.holder_count(), 2);

        token.burn(addr("bob"), 150).unwrap();
        assert_eq!(token.balance_of(&addr("bob")), 250);
        assert_eq!(token.total_supply(), 850);

        assert!(matches!(
            token.burn(addr("bob"), 1000),
            Err(TokenError::InsufficientBalance { have: 250, need: 1000 })
        ));
        assert_eq!(
            token.transfer(addr("alice"), addr("alice"), 1),
            Err(TokenError::SelfTransfer)
        );
    }

    #[test]
    fn test_pause_blocks_balance_changes() {
        let mut token = create_test_token();
        token.mint(addr("admin"), addr("alice"), 10).unwrap();

        assert_eq!(
            token.pause(addr("alice")),
            Err(TokenError::NotAdmin(addr("alice")))
        );
        token.pause(addr("admin")).unwrap();
        assert!(token.is_paused());

        assert_eq!(
            token.mint(addr("admin"), addr("alice"), 1),
            Err(TokenError::Paused)
        );
        assert_eq!(
            token.transfer(addr("alice"), addr("bob"), 1),
            Err(TokenError::Paused)
        );
        assert_eq!(token.burn(addr("alice"), 1), Err(TokenError::Paused));
        assert_eq!(token.pause(addr("admin")), Err(TokenError::Paused));

        token.unpause(addr("admin")).unwrap();
        assert_eq!(token.unpause(addr("admin")), Err(TokenError::NotPaused));
        token.transfer(addr("alice"), addr("bob"), 1).unwrap();
    }

    #[test]
    fn test_handle_decoded_call() {
        let mut token = create_test_token();
        let call = TokenCall::decode(
            &TokenCall::Mint {
                to: addr("alice"),
                amount: 100,
            }
            .encode(),
        )
        .unwrap();

        token.handle(addr("admin"), call).unwrap();
        assert_eq!(token.balance_of(&addr("alice")), 100);
        assert_eq!(
            token.history.last().map(|e| e.action.clone()),
            Some(TokenAction::Mint {
                to: addr("alice"),
                amount: 100
            })
        );
    }
}
