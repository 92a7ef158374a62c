//! Signed ballot transactions

use agora_core::{
    Address, AgoraError, AgoraResult, Hash, Hashable, Nonce, PublicKey, Signable, Signature,
    Timestamp, Transaction as TransactionTrait,
};
use agora_crypto::hashing::hash;
use agora_crypto::keys::{verify_address, KeyPair};
use agora_crypto::signing::{sign, verify};
use serde::{Deserialize, Serialize};

use crate::instruction::BallotInstruction;

const SIGNING_DOMAIN: &[u8] = b"AGORA_BALLOT_TX:";

/// Ballot transaction
///
/// Format:
/// - signer: address of the signing key
/// - public_key: key the signature verifies under
/// - nonce: sequential per signer, guards against replay
/// - timestamp: creation time, bounds the validity window
/// - instruction: the program call
/// - signature: Ed25519 signature over the fields above
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotTransaction {
    pub signer: Address,
    pub public_key: PublicKey,
    pub nonce: Nonce,
    pub timestamp: Timestamp,
    pub instruction: BallotInstruction,
    pub signature: Signature,
}

impl BallotTransaction {
    /// Create and sign a transaction stamped with the current time
    pub fn new(instruction: BallotInstruction, nonce: Nonce, keypair: &KeyPair) -> Self {
        Self::new_at(instruction, nonce, Timestamp::now(), keypair)
    }

    /// Create and sign a transaction with an explicit timestamp
    pub fn new_at(
        instruction: BallotInstruction,
        nonce: Nonce,
        timestamp: Timestamp,
        keypair: &KeyPair,
    ) -> Self {
        let signer = keypair.address();
        let public_key = keypair.public_key();
        let signing_bytes =
            Self::compute_signing_bytes(&signer, &public_key, nonce, timestamp, &instruction);
        let signature = sign(keypair, &signing_bytes);

        Self {
            signer,
            public_key,
            nonce,
            timestamp,
            instruction,
            signature,
        }
    }

    fn compute_signing_bytes(
        signer: &Address,
        public_key: &PublicKey,
        nonce: Nonce,
        timestamp: Timestamp,
        instruction: &BallotInstruction,
    ) -> Vec<u8> {
        let body = bincode::serialize(&(signer, public_key, nonce, timestamp, instruction))
            .unwrap_or_default();

        let mut bytes = Vec::with_capacity(SIGNING_DOMAIN.len() + body.len());
        bytes.extend_from_slice(SIGNING_DOMAIN);
        bytes.extend_from_slice(&body);
        bytes
    }

    /// Verify that the signer owns the key and the signature covers the contents
    pub fn verify_signature(&self) -> AgoraResult<()> {
        if !verify_address(&self.signer, &self.public_key) {
            return Err(AgoraError::InvalidAddress(
                "Signer does not match public key".into(),
            ));
        }

        verify(&self.public_key, &self.signing_bytes(), &self.signature)
    }

    /// Check if the transaction is older than `expiry_seconds` at `now`
    pub fn is_expired(&self, expiry_seconds: u64, now: Timestamp) -> bool {
        let expiry_ms = expiry_seconds.saturating_mul(1000);
        now.as_millis().saturating_sub(self.timestamp.as_millis()) > expiry_ms
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> AgoraResult<Self> {
        bincode::deserialize(bytes).map_err(|e| AgoraError::DeserializationError(e.to_string()))
    }

    /// Hex form used by the HTTP API
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_hex(s: &str) -> AgoraResult<Self> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|e| AgoraError::DeserializationError(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl Hashable for BallotTransaction {
    fn hash(&self) -> Hash {
        hash(&self.to_bytes())
    }
}

impl Signable for BallotTransaction {
    fn signing_bytes(&self) -> Vec<u8> {
        Self::compute_signing_bytes(
            &self.signer,
            &self.public_key,
            self.nonce,
            self.timestamp,
            &self.instruction,
        )
    }
}

impl TransactionTrait for BallotTransaction {
    fn signer(&self) -> Address {
        self.signer
    }

    fn nonce(&self) -> Nonce {
        self.nonce
    }

    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Signed transaction with verification status
#[derive(Debug, Clone)]
pub struct VerifiedTransaction {
    pub tx: BallotTransaction,
    pub tx_id: Hash,
}

impl VerifiedTransaction {
    /// Verify a transaction
    pub fn new(tx: BallotTransaction) -> AgoraResult<Self> {
        tx.verify_signature()?;
        let tx_id = tx.hash();
        Ok(Self { tx, tx_id })
    }
}
