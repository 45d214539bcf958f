//! Owner keystore and request signing

pub mod wallet;

pub use wallet::{Wallet, WalletError, WalletInfo, WalletManager};
