//! In-memory state store for testing and light nodes

use agora_core::{
    AgoraError, AgoraResult, Hash, StateChange, StateMutator, StateProvider, StateRoot,
    StateVersion,
};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::trace;

use crate::store::{describe_key, StateEntry, StateStore};

/// In-memory state store
pub struct MemoryStateStore {
    data: DashMap<Vec<u8>, Vec<u8>>,
    version: RwLock<StateVersion>,
    // Held for the whole check-then-write of a batch
    commit_lock: Mutex<()>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            version: RwLock::new(StateVersion::new(0)),
            commit_lock: Mutex::new(()),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateProvider for MemoryStateStore {
    async fn version(&self) -> StateVersion {
        *self.version.read()
    }

    async fn root(&self) -> StateRoot {
        self.compute_root().await.unwrap_or(Hash::ZERO)
    }

    async fn get(&self, key: &[u8]) -> AgoraResult<Option<Vec<u8>>> {
        Ok(self.data.get(key).map(|v| v.value().clone()))
    }

    async fn exists(&self, key: &[u8]) -> AgoraResult<bool> {
        Ok(self.data.contains_key(key))
    }
}

#[async_trait]
impl StateMutator for MemoryStateStore {
    async fn set(&self, key: &[u8], value: &[u8]) -> AgoraResult<()> {
        let _guard = self.commit_lock.lock();
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> AgoraResult<()> {
        let _guard = self.commit_lock.lock();
        self.data.remove(key);
        Ok(())
    }

    async fn apply_batch(&self, changes: Vec<StateChange>) -> AgoraResult<StateVersion> {
        let _guard = self.commit_lock.lock();

        // Preconditions first, so a failed batch leaves nothing behind
        let mut created = HashSet::new();
        for change in &changes {
            if let StateChange::Create { key, .. } = change {
                if self.data.contains_key(key) || !created.insert(key.as_slice()) {
                    return Err(AgoraError::AlreadyExists(describe_key(key)));
                }
            }
        }

        for change in changes {
            match change {
                StateChange::Create { key, value } | StateChange::Set { key, value } => {
                    self.data.insert(key, value);
                }
                StateChange::Delete { key } => {
                    self.data.remove(&key);
                }
            }
        }

        let mut version = self.version.write();
        *version = version.next();
        trace!("Memory store advanced to {}", *version);

        Ok(*version)
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn all_entries(&self) -> AgoraResult<Vec<StateEntry>> {
        let entries: Vec<StateEntry> = self
            .data
            .iter()
            .map(|entry| StateEntry {
                key: entry.key().clone(),
                value: entry.value().clone(),
            })
            .collect();
        Ok(entries)
    }
}

/// Thread-safe memory store wrapper
pub type SharedMemoryStateStore = Arc<MemoryStateStore>;

/// Create a shared memory state store
pub fn create_memory_store() -> SharedMemoryStateStore {
    Arc::new(MemoryStateStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AccountState;
    use agora_core::Address;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStateStore::new();

        store.set(b"key1", b"value1").await.unwrap();
        let value = store.get(b"key1").await.unwrap();
        assert_eq!(value, Some(b"value1".to_vec()));

        store.delete(b"key1").await.unwrap();
        let value = store.get(b"key1").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_memory_store_batch() {
        let store = MemoryStateStore::new();

        let changes = vec![
            StateChange::Set {
                key: b"k1".to_vec(),
                value: b"v1".to_vec(),
            },
            StateChange::Create {
                key: b"k2".to_vec(),
                value: b"v2".to_vec(),
            },
        ];

        let version = store.apply_batch(changes).await.unwrap();
        assert_eq!(version.0, 1);

        assert!(store.exists(b"k1").await.unwrap());
        assert!(store.exists(b"k2").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_if_absent() {
        let store = MemoryStateStore::new();

        store.create_if_absent(b"marker", b"first").await.unwrap();
        let second = store.create_if_absent(b"marker", b"second").await;

        assert!(matches!(second, Err(AgoraError::AlreadyExists(_))));
        assert_eq!(store.get(b"marker").await.unwrap(), Some(b"first".to_vec()));
    }

    #[tokio::test]
    async fn test_failed_batch_is_all_or_nothing() {
        let store = MemoryStateStore::new();
        store.set(b"occupied", b"x").await.unwrap();

        let changes = vec![
            StateChange::Set {
                key: b"counter".to_vec(),
                value: b"1".to_vec(),
            },
            StateChange::Create {
                key: b"occupied".to_vec(),
                value: b"y".to_vec(),
            },
        ];

        let result = store.apply_batch(changes).await;
        assert!(matches!(result, Err(AgoraError::AlreadyExists(_))));
        assert!(!store.exists(b"counter").await.unwrap());
        assert_eq!(store.get(b"occupied").await.unwrap(), Some(b"x".to_vec()));
        assert_eq!(store.version().await.0, 0);
    }

    #[tokio::test]
    async fn test_duplicate_create_within_batch() {
        let store = MemoryStateStore::new();
        let create = StateChange::Create {
            key: b"k".to_vec(),
            value: b"v".to_vec(),
        };

        let result = store.apply_batch(vec![create.clone(), create]).await;
        assert!(matches!(result, Err(AgoraError::AlreadyExists(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_creates_single_winner() {
        let store = create_memory_store();
        let mut handles = Vec::new();

        for i in 0..16u8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create_if_absent(b"guard", &[i]).await.is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_memory_store_account() {
        let store = MemoryStateStore::new();
        let address = Address([1u8; 32]);

        assert_eq!(store.get_nonce(&address).await.unwrap().0, 0);

        store
            .set_account(&address, &AccountState::new(3))
            .await
            .unwrap();
        assert_eq!(store.get_nonce(&address).await.unwrap().0, 3);
    }
}
