//! Digital signature operations using Ed25519

use agora_core::{AgoraError, AgoraResult, PublicKey, Signature};
use ed25519_dalek::{Signer, Verifier};

use crate::keys::{public_key_to_ed25519, KeyPair};

/// Sign a message using Ed25519
pub fn sign(keypair: &KeyPair, message: &[u8]) -> Signature {
    let signature = keypair.signing_key().sign(message);
    Signature::from_bytes(signature.to_bytes())
}

/// Verify a signature using Ed25519
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> AgoraResult<()> {
    let verifying_key = public_key_to_ed25519(public_key)?;
    let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());

    verifying_key
        .verify(message, &sig)
        .map_err(|_| AgoraError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let keypair = KeyPair::generate();
        let message = b"initialise voting";

        let signature = sign(&keypair, message);
        assert!(verify(&keypair.public_key(), message, &signature).is_ok());
    }

    #[test]
    fn test_invalid_signature() {
        let keypair1 = KeyPair::generate();
        let keypair2 = KeyPair::generate();
        let message = b"initialise voting";

        let signature = sign(&keypair1, message);

        // Wrong public key should fail
        assert!(verify(&keypair2.public_key(), message, &signature).is_err());

        // Wrong message should fail
        assert!(verify(&keypair1.public_key(), b"add proposal", &signature).is_err());
    }
}
