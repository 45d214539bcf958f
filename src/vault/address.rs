//! Principal identities
//!
//! Owners, targets and the vault itself are all named by a 20-byte
//! [`Address`]. The all-zero address is the null identity and is never a
//! valid owner.

use crate::crypto::hash160;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing an address string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Address must start with 0x: {0}")]
    MissingPrefix(String),
    #[error("Address must be 40 hex characters: {0}")]
    InvalidLength(String),
    #[error("Address contains invalid hex: {0}")]
    InvalidHex(String),
}

/// An opaque 20-byte principal identity, rendered as `0x` + 40 hex chars
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// The null identity
    pub const ZERO: Address = Address([0u8; 20]);

    /// Wrap raw bytes
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive an address by hashing arbitrary data (HASH160)
    pub fn from_data(data: &[u8]) -> Self {
        Self(hash160(data))
    }

    /// Build an address from the first 20 bytes of a digest
    pub fn from_digest(digest: &[u8]) -> Option<Self> {
        if digest.len() < 20 {
            return None;
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        Some(Self(bytes))
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is the null identity
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(s.to_string()))?;

        if body.len() != 40 {
            return Err(AddressError::InvalidLength(s.to_string()));
        }

        let bytes = hex::decode(body).map_err(|_| AddressError::InvalidHex(s.to_string()))?;
        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let address = Address::from_data(b"alice");
        let text = address.to_string();

        assert!(text.starts_with("0x"));
        assert_eq!(text.len(), 42);
        assert_eq!(text.parse::<Address>().unwrap(), address);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            "1234".parse::<Address>(),
            Err(AddressError::MissingPrefix(_))
        ));
        assert!(matches!(
            "0x1234".parse::<Address>(),
            Err(AddressError::InvalidLength(_))
        ));
        assert!(matches!(
            format!("0x{}", "zz".repeat(20)).parse::<Address>(),
            Err(AddressError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::from_data(b"bob").is_zero());
        assert_eq!(Address::default(), Address::ZERO);
    }

    #[test]
    fn test_serde_as_string() {
        let address = Address::from_data(b"carol");
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", address));

        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }
}
