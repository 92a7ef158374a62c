//! Configuration types for Agora

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AgoraError;
use crate::traits::AgoraResult;

/// Main node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node name for logging
    pub name: String,

    /// Data directory
    pub data_dir: PathBuf,

    /// Storage configuration
    pub storage: StorageConfig,

    /// API configuration
    pub api: ApiConfig,

    /// Ballot program configuration
    pub ballot: BallotConfig,

    /// Logging level, overridden by RUST_LOG
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "agora-node".to_string(),
            data_dir: PathBuf::from("./data"),
            storage: StorageConfig::default(),
            api: ApiConfig::default(),
            ballot: BallotConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> AgoraResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AgoraError::ConfigError(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> AgoraResult<Self> {
        let config: NodeConfig =
            serde_json::from_str(json).map_err(|e| AgoraError::ConfigError(e.to_string()))?;
        config.ballot.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> AgoraResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-memory, lost on restart
    Memory,
    /// sled database under `data_dir`
    Sled,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
        }
    }
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Enable HTTP API
    pub enabled: bool,

    /// API listen address
    pub listen_addr: String,

    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: "127.0.0.1:8080".to_string(),
            enable_cors: true,
        }
    }
}

/// Ballot program configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BallotConfig {
    /// Maximum session seed length in bytes (a derivation seed is at most 32 bytes)
    pub max_seed_len: usize,

    /// Maximum proposal text length in bytes
    pub max_proposal_text_len: usize,

    /// Transaction expiry time in seconds
    pub tx_expiry_seconds: u64,
}

impl Default for BallotConfig {
    fn default() -> Self {
        Self {
            max_seed_len: 32,
            max_proposal_text_len: 164,
            tx_expiry_seconds: 3600, // 1 hour
        }
    }
}

impl BallotConfig {
    pub fn validate(&self) -> AgoraResult<()> {
        if self.max_seed_len == 0 || self.max_seed_len > 32 {
            return Err(AgoraError::ConfigError(format!(
                "max_seed_len must be in 1..=32, got {}",
                self.max_seed_len
            )));
        }
        if self.max_proposal_text_len == 0 {
            return Err(AgoraError::ConfigError(
                "max_proposal_text_len must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = NodeConfig::from_json(r#"{"name": "n1", "storage": {"backend": "sled"}}"#)
            .unwrap();
        assert_eq!(config.name, "n1");
        assert_eq!(config.storage.backend, StorageBackend::Sled);
        assert_eq!(config.ballot.max_seed_len, 32);
        assert_eq!(config.api.listen_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = NodeConfig::default();
        let json = config.to_json().unwrap();
        let restored = NodeConfig::from_json(&json).unwrap();
        assert_eq!(restored.ballot.max_proposal_text_len, 164);
    }

    #[test]
    fn test_invalid_seed_len_rejected() {
        let result = NodeConfig::from_json(r#"{"ballot": {"max_seed_len": 64}}"#);
        assert!(matches!(result, Err(AgoraError::ConfigError(_))));
    }
}
