//! Core traits defining Agora interfaces
//!
//! These traits are the contract between a program and the ledger that hosts it.

use crate::types::*;
use async_trait::async_trait;
use std::fmt::Debug;

/// Result type for Agora operations
pub type AgoraResult<T> = Result<T, crate::error::AgoraError>;

/// Trait for hashable types
pub trait Hashable {
    /// Compute the hash of this object
    fn hash(&self) -> Hash;
}

/// Trait for signable types
pub trait Signable: Hashable {
    /// Get the bytes to be signed
    fn signing_bytes(&self) -> Vec<u8>;
}

/// Transaction trait for all transaction types
pub trait Transaction: Hashable + Signable + Debug + Clone + Send + Sync {
    /// Get the transaction ID
    fn id(&self) -> TxId {
        self.hash()
    }

    /// Get the signer address
    fn signer(&self) -> Address;

    /// Get the nonce
    fn nonce(&self) -> Nonce;

    /// Get the timestamp
    fn timestamp(&self) -> Timestamp;
}

/// State provider trait
#[async_trait]
pub trait StateProvider: Send + Sync {
    /// Get the current state version
    async fn version(&self) -> StateVersion;

    /// Get the state root hash
    async fn root(&self) -> StateRoot;

    /// Get a value by key
    async fn get(&self, key: &[u8]) -> AgoraResult<Option<Vec<u8>>>;

    /// Check if a key exists
    async fn exists(&self, key: &[u8]) -> AgoraResult<bool>;
}

/// State mutator trait
#[async_trait]
pub trait StateMutator: StateProvider {
    /// Set a value
    async fn set(&self, key: &[u8], value: &[u8]) -> AgoraResult<()>;

    /// Create a value only if the key is vacant
    async fn create_if_absent(&self, key: &[u8], value: &[u8]) -> AgoraResult<()> {
        self.apply_batch(vec![StateChange::Create {
            key: key.to_vec(),
            value: value.to_vec(),
        }])
        .await
        .map(|_| ())
    }

    /// Delete a key
    async fn delete(&self, key: &[u8]) -> AgoraResult<()>;

    /// Apply a batch of changes atomically: either every change lands or none does
    async fn apply_batch(&self, changes: Vec<StateChange>) -> AgoraResult<StateVersion>;
}

/// State change operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    /// Fails the whole batch with `AlreadyExists` if the key is occupied
    Create { key: Vec<u8>, value: Vec<u8> },
    Set { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// Transaction validator trait
#[async_trait]
pub trait TransactionValidator<T: Transaction>: Send + Sync {
    /// Validate a transaction against current state at ledger time `now`
    async fn validate(&self, tx: &T, state: &dyn StateProvider, now: Timestamp)
        -> AgoraResult<()>;
}

/// A program hosted on the ledger
pub trait ProgramModule: Send + Sync {
    /// Program name
    fn name(&self) -> &str;

    /// Program version
    fn version(&self) -> &str;

    /// Namespace its derived addresses are bound to
    fn program_id(&self) -> ProgramId;
}
