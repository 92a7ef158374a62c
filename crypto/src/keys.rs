//! Key management for Agora
//!
//! Handles signer key generation and address derivation.

use agora_core::{Address, AgoraError, AgoraResult, PublicKey};
use ed25519_dalek::{
    SigningKey as Ed25519SigningKey, VerifyingKey as Ed25519VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::hashing::blake3_hash;

/// A keypair for signing and verification
#[derive(Clone)]
pub struct KeyPair {
    signing_key: Ed25519SigningKey,
}

impl KeyPair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = Ed25519SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Create keypair from seed bytes
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = Ed25519SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Create keypair from secret key bytes
    pub fn from_secret_bytes(bytes: &[u8]) -> AgoraResult<Self> {
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(AgoraError::InvalidPrivateKey);
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(bytes);
        Ok(Self::from_seed(&seed))
    }

    /// Get the public key
    pub fn public_key(&self) -> PublicKey {
        let verifying_key = self.signing_key.verifying_key();
        PublicKey::from_bytes(verifying_key.to_bytes())
    }

    /// Get the address (hash of public key)
    pub fn address(&self) -> Address {
        address_from_public_key(&self.public_key())
    }

    /// Get the secret key bytes (BE CAREFUL with this!)
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    pub(crate) fn signing_key(&self) -> &Ed25519SigningKey {
        &self.signing_key
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair({})", self.address())
    }
}

/// Derive address from public key using BLAKE3 hash
pub fn address_from_public_key(public_key: &PublicKey) -> Address {
    let hash = blake3_hash(public_key.as_bytes());
    Address::from_bytes(*hash.as_bytes())
}

/// Verify that an address matches a public key
pub fn verify_address(address: &Address, public_key: &PublicKey) -> bool {
    let derived = address_from_public_key(public_key);
    address == &derived
}

/// Convert our PublicKey type to Ed25519 verifying key
pub fn public_key_to_ed25519(key: &PublicKey) -> AgoraResult<Ed25519VerifyingKey> {
    Ed25519VerifyingKey::from_bytes(key.as_bytes()).map_err(|_| AgoraError::InvalidPublicKey)
}

/// Whether 32 bytes decode to a point on the Ed25519 curve
///
/// Off-curve bytes have no corresponding secret key.
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    Ed25519VerifyingKey::from_bytes(bytes).is_ok()
}

/// Serializable public key info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKeyInfo {
    pub public_key: String,
    pub address: String,
}

impl From<&KeyPair> for PublicKeyInfo {
    fn from(keypair: &KeyPair) -> Self {
        Self {
            public_key: keypair.public_key().to_hex(),
            address: keypair.address().to_hex(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let kp = KeyPair::generate();
        assert!(verify_address(&kp.address(), &kp.public_key()));
    }

    #[test]
    fn test_keypair_from_seed() {
        let seed = [42u8; 32];
        let kp1 = KeyPair::from_seed(&seed);
        let kp2 = KeyPair::from_seed(&seed);

        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.address(), kp2.address());
    }

    #[test]
    fn test_from_secret_bytes_length() {
        assert!(matches!(
            KeyPair::from_secret_bytes(&[1u8; 31]),
            Err(AgoraError::InvalidPrivateKey)
        ));
        let kp = KeyPair::generate();
        let restored = KeyPair::from_secret_bytes(&kp.secret_bytes()).unwrap();
        assert_eq!(kp.address(), restored.address());
    }

    #[test]
    fn test_public_keys_are_on_curve() {
        let kp = KeyPair::generate();
        assert!(is_on_curve(kp.public_key().as_bytes()));
    }
}
