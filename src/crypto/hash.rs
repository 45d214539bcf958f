//! Hashing helpers used for identities and request digests
//!
//! Owner and vault addresses are HASH160 digests (RIPEMD160 over SHA-256),
//! signed requests are bound to a SHA-256 digest of their contents.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// RIPEMD160(SHA256(data)), the 20-byte digest behind every address
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let mut ripemd = Ripemd160::new();
    ripemd.update(sha256(data));
    let digest = ripemd.finalize();

    let mut out = [0u8; 20];
    out.copy_from_slice(&digest);
    out
}
