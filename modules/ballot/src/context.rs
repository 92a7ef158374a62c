//! Execution context shared by the program operations

use agora_core::{
    Address, AgoraError, AgoraResult, ProgramId, StateChange, StateProvider, Timestamp,
};
use agora_state::record_key;

use crate::records::{Proposal, Record, VotingSession};

/// Read-only view an operation executes against
pub struct ExecutionContext<'a> {
    pub state: &'a dyn StateProvider,
    pub program_id: ProgramId,
    /// Verified signer of the transaction
    pub signer: Address,
    /// Current ledger time
    pub now: Timestamp,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        state: &'a dyn StateProvider,
        program_id: ProgramId,
        signer: Address,
        now: Timestamp,
    ) -> Self {
        Self {
            state,
            program_id,
            signer,
            now,
        }
    }

    async fn load_record(&self, address: &Address) -> AgoraResult<Option<Record>> {
        match self.state.get(&record_key(address)).await? {
            Some(bytes) => Ok(Some(Record::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn load_session(&self, address: &Address) -> AgoraResult<VotingSession> {
        self.load_record(address)
            .await?
            .ok_or_else(|| AgoraError::SessionNotFound(address.to_string()))?
            .into_session()
    }

    pub async fn load_proposal(&self, address: &Address) -> AgoraResult<Proposal> {
        self.load_record(address)
            .await?
            .ok_or_else(|| AgoraError::ProposalNotFound(address.to_string()))?
            .into_proposal()
    }

    pub async fn record_exists(&self, address: &Address) -> AgoraResult<bool> {
        self.state.exists(&record_key(address)).await
    }
}

/// Changes produced by one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramOutput {
    /// Record the operation created or decided: the session, the new
    /// proposal, the vote guard, or the tallied session
    pub address: Address,
    /// Applied as one atomic batch
    pub changes: Vec<StateChange>,
}
