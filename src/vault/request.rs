//! Signed operation envelopes
//!
//! Out-of-process callers (CLI, API clients) prove who they are by signing
//! the operation with their owner key. The signature covers the vault
//! address and a per-caller nonce, so a request cannot be replayed against
//! the same vault or carried to another one.

use crate::crypto::{public_key_from_hex, public_key_to_address, sha256, verify_signature, KeyPair};
use crate::vault::error::{VaultError, VaultResult};
use crate::vault::proposal::hex_bytes;
use crate::vault::Address;
use serde::{Deserialize, Serialize};

/// An operation a caller asks the vault to perform
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Submit {
        target: Address,
        #[serde(with = "hex_bytes")]
        payload: Vec<u8>,
    },
    Confirm {
        index: u64,
    },
    Execute {
        index: u64,
    },
    AddOwner {
        owner: Address,
    },
    SwapOwner {
        new_owner: Address,
        old_owner: Address,
    },
    UpdateThreshold {
        threshold: u32,
    },
}

/// What a successful operation produced
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Submitted { index: u64 },
    Confirmed { index: u64, confirmations: u32 },
    Executed { index: u64 },
    OwnersChanged { owners: Vec<Address> },
    ThresholdUpdated { threshold: u32 },
}

#[derive(Serialize)]
struct SigningPayload<'a> {
    vault: &'a Address,
    operation: &'a Operation,
    nonce: u64,
}

/// An operation signed by its caller
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedRequest {
    /// Vault the request is meant for
    pub vault: Address,
    pub operation: Operation,
    /// Caller's next nonce at the vault
    pub nonce: u64,
    /// Caller public key (hex, compressed)
    pub public_key: String,
    /// Compact ECDSA signature over [`SignedRequest::signing_data`] (hex)
    pub signature: String,
}

impl SignedRequest {
    /// Sign an operation with `key_pair`
    pub fn sign(
        vault: Address,
        operation: Operation,
        nonce: u64,
        key_pair: &KeyPair,
    ) -> VaultResult<Self> {
        let digest = Self::digest(&vault, &operation, nonce);
        let signature = key_pair
            .sign(&digest)
            .map_err(|e| VaultError::InvalidRequest(format!("signing failed: {}", e)))?;

        Ok(Self {
            vault,
            operation,
            nonce,
            public_key: key_pair.public_key_hex(),
            signature: hex::encode(signature),
        })
    }

    /// The digest the signature covers
    pub fn signing_data(&self) -> Vec<u8> {
        Self::digest(&self.vault, &self.operation, self.nonce)
    }

    fn digest(vault: &Address, operation: &Operation, nonce: u64) -> Vec<u8> {
        let payload = SigningPayload {
            vault,
            operation,
            nonce,
        };
        // Plain data with string keys; serialization cannot fail
        let bytes = serde_json::to_vec(&payload).unwrap_or_default();
        sha256(&bytes)
    }

    /// Verify the signature and return the caller's address
    pub fn verify(&self) -> VaultResult<Address> {
        let public_key = public_key_from_hex(&self.public_key)
            .map_err(|_| VaultError::InvalidRequest("malformed public key".to_string()))?;
        let signature = hex::decode(&self.signature)
            .map_err(|_| VaultError::InvalidRequest("malformed signature".to_string()))?;

        let valid = verify_signature(&public_key, &self.signing_data(), &signature)
            .map_err(|e| VaultError::InvalidRequest(e.to_string()))?;
        if !valid {
            return Err(VaultError::InvalidRequest(
                "signature does not match request".to_string(),
            ));
        }

        Ok(public_key_to_address(&public_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault_address() -> Address {
        Address::from_data(b"vault")
    }

    #[test]
    fn test_sign_and_verify() {
        let key = KeyPair::generate();
        let request =
            SignedRequest::sign(vault_address(), Operation::Confirm { index: 0 }, 0, &key).unwrap();

        assert_eq!(request.verify().unwrap(), key.address());
    }

    #[test]
    fn test_tampered_operation_rejected() {
        let key = KeyPair::generate();
        let mut request =
            SignedRequest::sign(vault_address(), Operation::Confirm { index: 0 }, 0, &key).unwrap();

        request.operation = Operation::Execute { index: 0 };
        assert!(matches!(
            request.verify(),
            Err(VaultError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_tampered_nonce_rejected() {
        let key = KeyPair::generate();
        let mut request =
            SignedRequest::sign(vault_address(), Operation::Execute { index: 1 }, 4, &key).unwrap();

        request.nonce = 5;
        assert!(request.verify().is_err());
    }

    #[test]
    fn test_malformed_fields_rejected() {
        let key = KeyPair::generate();
        let mut request =
            SignedRequest::sign(vault_address(), Operation::Confirm { index: 0 }, 0, &key).unwrap();

        request.signature = "zz".to_string();
        assert!(matches!(
            request.verify(),
            Err(VaultError::InvalidRequest(_))
        ));

        request.public_key = "00".to_string();
        assert!(matches!(
            request.verify(),
            Err(VaultError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_request_json_shape() {
        let key = KeyPair::generate();
        let request = SignedRequest::sign(
            vault_address(),
            Operation::Submit {
                target: Address::from_data(b"token"),
                payload: vec![1, 2, 3],
            },
            0,
            &key,
        )
        .unwrap();

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"op\":\"submit\""));
        assert!(json.contains("\"010203\""));

        let back: SignedRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.verify().unwrap(), key.address());
    }
}
