//! Cryptographic utilities for the vault
//!
//! This module provides:
//! - SHA-256 / HASH160 digests
//! - ECDSA key management (secp256k1) for owner identities

pub mod hash;
pub mod keys;

pub use hash::{hash160, sha256};
pub use keys::{
    public_key_from_hex, public_key_to_address, sign_message, verify_signature, KeyError, KeyPair,
};
