//! Node runtime: the ballot ledger over the configured state store

use agora_ballot::{
    BallotLedger, BallotTransaction, ExecutionReceipt, Proposal, VotingSession,
};
use agora_core::{Address, AgoraResult, NodeConfig, Nonce, ProgramId, StateRoot, StateVersion};
use agora_state::StateStore;
use std::sync::Arc;

/// Node runtime managing the ledger
pub struct NodeRuntime<S: StateStore> {
    config: NodeConfig,
    ledger: Arc<BallotLedger<S>>,
}

impl<S: StateStore + 'static> NodeRuntime<S> {
    /// Create a runtime over an opened state store
    pub fn new(config: NodeConfig, state: Arc<S>) -> Self {
        let ledger = Arc::new(BallotLedger::new(state, config.ballot.clone()));
        Self { config, ledger }
    }

    /// Submit a transaction to the ledger
    pub async fn submit_transaction(&self, tx: BallotTransaction) -> AgoraResult<ExecutionReceipt> {
        self.ledger.submit(tx).await
    }

    pub async fn get_session(&self, address: &Address) -> AgoraResult<VotingSession> {
        self.ledger.get_session(address).await
    }

    pub async fn session_proposals(
        &self,
        session: &Address,
    ) -> AgoraResult<Vec<(Address, Proposal)>> {
        self.ledger.proposals(session).await
    }

    pub async fn get_proposal(&self, address: &Address) -> AgoraResult<Proposal> {
        self.ledger.get_proposal(address).await
    }

    pub async fn get_nonce(&self, address: &Address) -> AgoraResult<Nonce> {
        self.ledger.get_nonce(address).await
    }

    pub async fn has_voted(&self, voter: &Address, proposal: &Address) -> AgoraResult<bool> {
        self.ledger.has_voted(voter, proposal).await
    }

    /// Get current state version
    pub async fn state_version(&self) -> StateVersion {
        self.ledger.state_version().await
    }

    /// Get current state root
    pub async fn state_root(&self) -> AgoraResult<StateRoot> {
        self.ledger.state_root().await
    }

    pub fn program_id(&self) -> ProgramId {
        self.ledger.program_id()
    }

    /// Get config reference
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Get ledger reference
    pub fn ledger(&self) -> &Arc<BallotLedger<S>> {
        &self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_ballot::BallotInstruction;
    use agora_core::{Hash, Timestamp};
    use agora_crypto::keys::KeyPair;
    use agora_state::{create_memory_store, create_persistent_store, MemoryStateStore};
    use tempfile::TempDir;

    fn create_test_runtime() -> NodeRuntime<MemoryStateStore> {
        NodeRuntime::new(NodeConfig::default(), create_memory_store())
    }

    #[tokio::test]
    async fn test_runtime_creation() {
        let runtime = create_test_runtime();

        assert_eq!(runtime.state_version().await.0, 0);
        assert_eq!(runtime.state_root().await.unwrap(), Hash::ZERO);
    }

    #[tokio::test]
    async fn test_transaction_submission() {
        let runtime = create_test_runtime();
        let chair = KeyPair::generate();

        let tx = BallotTransaction::new(
            BallotInstruction::InitialiseVoting {
                seed: "board".into(),
                deadline: Timestamp::now().saturating_add_millis(60_000),
            },
            Nonce::new(0),
            &chair,
        );

        let receipt = runtime.submit_transaction(tx).await.unwrap();
        assert_ne!(receipt.tx_id, Hash::ZERO);
        assert_eq!(receipt.version.0, 1);

        let session = runtime.get_session(&receipt.address).await.unwrap();
        assert_eq!(session.chairperson, chair.address());
        assert_eq!(runtime.get_nonce(&chair.address()).await.unwrap().0, 1);
        assert_ne!(runtime.state_root().await.unwrap(), Hash::ZERO);
    }

    #[tokio::test]
    async fn test_runtime_over_sled_survives_restart() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state");
        let chair = KeyPair::generate();

        let (session, root) = {
            let store = create_persistent_store(&path).unwrap();
            let runtime = NodeRuntime::new(NodeConfig::default(), store);
            let tx = BallotTransaction::new(
                BallotInstruction::InitialiseVoting {
                    seed: "board".into(),
                    deadline: Timestamp::now().saturating_add_millis(60_000),
                },
                Nonce::new(0),
                &chair,
            );
            let receipt = runtime.submit_transaction(tx).await.unwrap();
            (receipt.address, runtime.state_root().await.unwrap())
        };

        let store = create_persistent_store(&path).unwrap();
        let runtime = NodeRuntime::new(NodeConfig::default(), store);
        assert_eq!(runtime.state_version().await.0, 1);
        assert_eq!(runtime.state_root().await.unwrap(), root);
        assert_eq!(runtime.get_nonce(&chair.address()).await.unwrap().0, 1);
        assert_eq!(
            runtime.get_session(&session).await.unwrap().chairperson,
            chair.address()
        );
    }
}
