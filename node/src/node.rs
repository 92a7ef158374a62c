//! Full node implementation

use crate::api::start_api_server;
use crate::runtime::NodeRuntime;
use agora_core::{NodeConfig, StorageBackend};
use agora_state::{create_memory_store, create_persistent_store, StateStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Directory under `data_dir` holding the sled database
const STATE_DIR: &str = "state";

/// Full Agora node
pub struct AgoraNode {
    config: NodeConfig,
}

impl AgoraNode {
    /// Create a new node
    pub fn new(config: NodeConfig) -> Self {
        Self { config }
    }

    /// Open the configured store and serve until interrupted
    pub async fn start(&self) -> anyhow::Result<()> {
        info!("Starting Agora node {}...", self.config.name);

        match self.config.storage.backend {
            StorageBackend::Memory => {
                warn!("Using in-memory storage, state is lost on shutdown");
                self.run(create_memory_store()).await
            }
            StorageBackend::Sled => {
                let path = self.config.data_dir.join(STATE_DIR);
                std::fs::create_dir_all(&path)?;
                info!("Opening sled store at {}", path.display());
                self.run(create_persistent_store(&path)?).await
            }
        }
    }

    async fn run<S: StateStore + 'static>(&self, state: Arc<S>) -> anyhow::Result<()> {
        let runtime = Arc::new(NodeRuntime::new(self.config.clone(), state));

        info!("Ballot program id: {}", runtime.program_id().to_hex());
        info!("State version: {}", runtime.state_version().await);

        let api_handle = if self.config.api.enabled {
            let api_runtime = runtime.clone();
            let api_addr = self.config.api.listen_addr.clone();
            Some(tokio::spawn(async move {
                if let Err(e) = start_api_server(api_runtime, &api_addr).await {
                    error!("API server error: {}", e);
                }
            }))
        } else {
            warn!("HTTP API disabled");
            None
        };

        info!("Node started successfully");

        // Wait for shutdown signal
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, stopping node...");
            }
            Err(e) => {
                error!("Error waiting for shutdown signal: {}", e);
            }
        }

        if let Some(handle) = api_handle {
            handle.abort();
        }

        info!("Node stopped");

        Ok(())
    }

    /// Get config reference
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }
}

/// Node builder for easier configuration
pub struct NodeBuilder {
    config: NodeConfig,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self {
            config: NodeConfig::default(),
        }
    }

    pub fn config(mut self, config: NodeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn api_addr(mut self, addr: &str) -> Self {
        self.config.api.listen_addr = addr.to_string();
        self
    }

    pub fn data_dir(mut self, dir: PathBuf) -> Self {
        self.config.data_dir = dir;
        self
    }

    pub fn storage(mut self, backend: StorageBackend) -> Self {
        self.config.storage.backend = backend;
        self
    }

    pub fn build(self) -> AgoraNode {
        AgoraNode::new(self.config)
    }
}

impl Default for NodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
