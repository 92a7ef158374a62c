//! Core state store traits and types

use agora_core::{
    Address, AgoraError, AgoraResult, Hash, Nonce, StateMutator, StateProvider, StateRoot,
};
use agora_crypto::hashing::{hash_multiple, merkle_root};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Per-signer account state kept by the ledger
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AccountState {
    pub nonce: u64,
}

impl AccountState {
    pub fn new(nonce: u64) -> Self {
        Self { nonce }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> AgoraResult<Self> {
        bincode::deserialize(bytes).map_err(|e| AgoraError::DeserializationError(e.to_string()))
    }
}

/// State entry for merkle tree computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl StateEntry {
    pub fn hash(&self) -> Hash {
        hash_multiple(&[&self.key, &self.value])
    }
}

/// Compute state root from entries
pub fn compute_state_root(entries: &[StateEntry]) -> StateRoot {
    if entries.is_empty() {
        return Hash::ZERO;
    }

    // Sort entries by key for deterministic ordering
    let mut sorted: Vec<_> = entries.iter().collect();
    sorted.sort_by(|a, b| a.key.cmp(&b.key));

    let leaves: Vec<Hash> = sorted.iter().map(|e| e.hash()).collect();

    merkle_root(&leaves)
}

/// Abstract state store interface
#[async_trait]
pub trait StateStore: StateProvider + StateMutator {
    /// Get account state
    async fn get_account(&self, address: &Address) -> AgoraResult<Option<AccountState>> {
        match self.get(&account_key(address)).await? {
            Some(bytes) => Ok(Some(AccountState::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Set account state
    async fn set_account(&self, address: &Address, state: &AccountState) -> AgoraResult<()> {
        self.set(&account_key(address), &state.to_bytes()).await
    }

    /// Get nonce, zero for an unknown signer
    async fn get_nonce(&self, address: &Address) -> AgoraResult<Nonce> {
        Ok(Nonce::new(
            self.get_account(address)
                .await?
                .map(|a| a.nonce)
                .unwrap_or(0),
        ))
    }

    /// Raw bytes of the record stored at a program address
    async fn get_record(&self, address: &Address) -> AgoraResult<Option<Vec<u8>>> {
        self.get(&record_key(address)).await
    }

    /// Get all entries for state root computation
    async fn all_entries(&self) -> AgoraResult<Vec<StateEntry>>;

    /// Compute current state root
    async fn compute_root(&self) -> AgoraResult<StateRoot> {
        let entries = self.all_entries().await?;
        Ok(compute_state_root(&entries))
    }
}

/// Key prefix for signer accounts
const ACCOUNT_PREFIX: &[u8] = b"account:";

/// Key prefix for program records
const RECORD_PREFIX: &[u8] = b"record:";

/// Build account key
pub fn account_key(address: &Address) -> Vec<u8> {
    let mut key = ACCOUNT_PREFIX.to_vec();
    key.extend_from_slice(address.as_bytes());
    key
}

/// Build record key
pub fn record_key(address: &Address) -> Vec<u8> {
    let mut key = RECORD_PREFIX.to_vec();
    key.extend_from_slice(address.as_bytes());
    key
}

/// Parse record key back into the program address
pub fn parse_record_key(key: &[u8]) -> Option<Address> {
    let rest = key.strip_prefix(RECORD_PREFIX)?;
    let bytes: [u8; 32] = rest.try_into().ok()?;
    Some(Address::from_bytes(bytes))
}

/// Human-readable form of a store key for error messages
pub fn describe_key(key: &[u8]) -> String {
    match parse_record_key(key) {
        Some(address) => format!("record {}", address),
        None => hex::encode(&key[..key.len().min(16)]),
    }
}
