//! Persistent state store using sled database

use agora_core::{
    AgoraError, AgoraResult, Hash, StateChange, StateMutator, StateProvider, StateRoot,
    StateVersion,
};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use sled::{Db, Transactional, Tree};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::store::{describe_key, StateEntry, StateStore};

const STATE_TREE: &str = "state";
const META_TREE: &str = "meta";
const VERSION_KEY: &[u8] = b"version";

fn storage_error(e: impl std::fmt::Display) -> AgoraError {
    AgoraError::StorageError(e.to_string())
}

/// Persistent state store backed by sled database
pub struct PersistentStateStore {
    db: Db,
    state: Tree,
    meta: Tree,
    version: RwLock<StateVersion>,
    commit_lock: Mutex<()>,
}

impl PersistentStateStore {
    pub fn open<P: AsRef<Path>>(path: P) -> AgoraResult<Self> {
        let db = sled::open(path).map_err(storage_error)?;
        let state = db.open_tree(STATE_TREE).map_err(storage_error)?;
        let meta = db.open_tree(META_TREE).map_err(storage_error)?;

        // Load version from disk or start at 0
        let version = match meta.get(VERSION_KEY).map_err(storage_error)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_ref().try_into().map_err(|_| {
                    AgoraError::StorageError("corrupt version entry".into())
                })?;
                StateVersion::new(u64::from_le_bytes(raw))
            }
            None => StateVersion::new(0),
        };

        debug!("Opened sled store at {}", version);

        Ok(Self {
            db,
            state,
            meta,
            version: RwLock::new(version),
            commit_lock: Mutex::new(()),
        })
    }

    /// Apply changes inside one sled transaction spanning state and version
    fn commit(&self, changes: &[StateChange]) -> AgoraResult<StateVersion> {
        let _guard = self.commit_lock.lock();
        let new_version = self.version.read().next();

        let result = (&self.state, &self.meta).transaction(
            |(state, meta)| -> ConflictableTransactionResult<(), Vec<u8>> {
                let mut created = HashSet::new();
                for change in changes {
                    match change {
                        StateChange::Create { key, value } => {
                            let occupied = state.get(key.as_slice())?.is_some();
                            if !created.insert(key.as_slice()) || occupied {
                                return Err(ConflictableTransactionError::Abort(key.clone()));
                            }
                            state.insert(key.as_slice(), value.as_slice())?;
                        }
                        StateChange::Set { key, value } => {
                            state.insert(key.as_slice(), value.as_slice())?;
                        }
                        StateChange::Delete { key } => {
                            state.remove(key.as_slice())?;
                        }
                    }
                }
                meta.insert(VERSION_KEY, new_version.0.to_le_bytes().to_vec())?;
                Ok(())
            },
        );

        match result {
            Ok(()) => {}
            Err(TransactionError::Abort(key)) => {
                return Err(AgoraError::AlreadyExists(describe_key(&key)))
            }
            Err(TransactionError::Storage(e)) => return Err(storage_error(e)),
        }

        self.db.flush().map_err(storage_error)?;
        *self.version.write() = new_version;

        Ok(new_version)
    }
}

#[async_trait]
impl StateProvider for PersistentStateStore {
    async fn version(&self) -> StateVersion {
        *self.version.read()
    }

    async fn root(&self) -> StateRoot {
        self.compute_root().await.unwrap_or(Hash::ZERO)
    }

    async fn get(&self, key: &[u8]) -> AgoraResult<Option<Vec<u8>>> {
        self.state
            .get(key)
            .map(|opt| opt.map(|v| v.to_vec()))
            .map_err(storage_error)
    }

    async fn exists(&self, key: &[u8]) -> AgoraResult<bool> {
        self.state.contains_key(key).map_err(storage_error)
    }
}

#[async_trait]
impl StateMutator for PersistentStateStore {
    async fn set(&self, key: &[u8], value: &[u8]) -> AgoraResult<()> {
        self.commit(&[StateChange::Set {
            key: key.to_vec(),
            value: value.to_vec(),
        }])
        .map(|_| ())
    }

    async fn delete(&self, key: &[u8]) -> AgoraResult<()> {
        self.commit(&[StateChange::Delete { key: key.to_vec() }])
            .map(|_| ())
    }

    async fn apply_batch(&self, changes: Vec<StateChange>) -> AgoraResult<StateVersion> {
        self.commit(&changes)
    }
}

#[async_trait]
impl StateStore for PersistentStateStore {
    async fn all_entries(&self) -> AgoraResult<Vec<StateEntry>> {
        self.state
            .iter()
            .map(|result| {
                result
                    .map(|(key, value)| StateEntry {
                        key: key.to_vec(),
                        value: value.to_vec(),
                    })
                    .map_err(storage_error)
            })
            .collect()
    }
}

/// Thread-safe persistent store wrapper
pub type SharedPersistentStateStore = Arc<PersistentStateStore>;

/// Create a shared persistent state store
pub fn create_persistent_store<P: AsRef<Path>>(path: P) -> AgoraResult<SharedPersistentStateStore> {
    Ok(Arc::new(PersistentStateStore::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_persistent_store_basic() {
        let tmp = TempDir::new().unwrap();
        let store = PersistentStateStore::open(tmp.path()).unwrap();

        store.set(b"key1", b"value1").await.unwrap();
        let value = store.get(b"key1").await.unwrap();
        assert_eq!(value, Some(b"value1".to_vec()));

        store.delete(b"key1").await.unwrap();
        let value = store.get(b"key1").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_persistent_store_reopen() {
        let tmp = TempDir::new().unwrap();

        {
            let store = PersistentStateStore::open(tmp.path()).unwrap();
            let changes = vec![StateChange::Create {
                key: b"k2".to_vec(),
                value: b"v2".to_vec(),
            }];
            store.apply_batch(changes).await.unwrap();
        }

        {
            let store = PersistentStateStore::open(tmp.path()).unwrap();
            assert_eq!(store.get(b"k2").await.unwrap(), Some(b"v2".to_vec()));
            assert_eq!(store.version().await.0, 1);
        }
    }

    #[tokio::test]
    async fn test_persistent_create_collision_rolls_back() {
        let tmp = TempDir::new().unwrap();
        let store = PersistentStateStore::open(tmp.path()).unwrap();
        store.create_if_absent(b"guard", b"1").await.unwrap();

        let changes = vec![
            StateChange::Set {
                key: b"counter".to_vec(),
                value: b"1".to_vec(),
            },
            StateChange::Create {
                key: b"guard".to_vec(),
                value: b"2".to_vec(),
            },
        ];

        let result = store.apply_batch(changes).await;
        assert!(matches!(result, Err(AgoraError::AlreadyExists(_))));
        assert!(!store.exists(b"counter").await.unwrap());
        assert_eq!(store.get(b"guard").await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.version().await.0, 1);
    }
}
