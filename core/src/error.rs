//! Error types for Agora

use thiserror::Error;

/// Main error type for Agora
#[derive(Error, Debug)]
pub enum AgoraError {
    // ============ Cryptography Errors ============
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Invalid private key")]
    InvalidPrivateKey,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // ============ Transaction Errors ============
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },

    #[error("Transaction expired")]
    TransactionExpired,

    // ============ State Errors ============
    #[error("Record already exists at {0}")]
    AlreadyExists(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    // ============ Ballot Program Errors ============
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Voter {voter} already voted on proposal {proposal}")]
    DuplicateVote { voter: String, proposal: String },

    #[error("Incomplete proposal set: expected {expected}, got {got}")]
    IncompleteProposalSet { expected: u32, got: u32 },

    #[error("Invalid proposal reference at index {index}")]
    InvalidProposalReference { index: u32 },

    #[error("Winner already selected")]
    AlreadyTallied,

    #[error("Voting closed")]
    VotingClosed,

    #[error("Voting session not found: {0}")]
    SessionNotFound(String),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(String),

    // ============ Serialization Errors ============
    #[error("Serialization failed: {0}")]
    SerializationError(String),

    #[error("Deserialization failed: {0}")]
    DeserializationError(String),

    // ============ Configuration Errors ============
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // ============ General Errors ============
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AgoraError {
    /// Whether the error is a rejection by the ballot program itself,
    /// as opposed to a malformed transaction or an infrastructure failure
    pub fn is_program_error(&self) -> bool {
        matches!(
            self,
            AgoraError::AlreadyExists(_)
                | AgoraError::Unauthorized(_)
                | AgoraError::DuplicateVote { .. }
                | AgoraError::IncompleteProposalSet { .. }
                | AgoraError::InvalidProposalReference { .. }
                | AgoraError::AlreadyTallied
                | AgoraError::VotingClosed
        )
    }

    /// Whether the error reports a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AgoraError::SessionNotFound(_) | AgoraError::ProposalNotFound(_)
        )
    }
}

impl From<std::io::Error> for AgoraError {
    fn from(err: std::io::Error) -> Self {
        AgoraError::StorageError(err.to_string())
    }
}

impl From<bincode::Error> for AgoraError {
    fn from(err: bincode::Error) -> Self {
        AgoraError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for AgoraError {
    fn from(err: serde_json::Error) -> Self {
        AgoraError::SerializationError(err.to_string())
    }
}
