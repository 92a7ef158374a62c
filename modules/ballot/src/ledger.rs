//! Ballot ledger: verifies, executes and commits ballot transactions
//!
//! Execution is serialized: the vote-guard and nonce checks, the program's
//! reads and the batch commit all happen under one execution lock, so
//! concurrent votes on the same proposal never lose an increment.

use agora_core::{
    Address, AgoraError, AgoraResult, BallotConfig, Hash, Nonce, ProgramId, ProgramModule,
    StateChange, StateRoot, StateVersion, Timestamp, TransactionValidator,
};
use agora_state::{account_key, AccountState, StateStore};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::address::{proposal_address, vote_guard_address};
use crate::instruction::BallotInstruction;
use crate::processor::BallotProgram;
use crate::records::{Proposal, Record, VotingSession};
use crate::transaction::{BallotTransaction, VerifiedTransaction};
use crate::validator::BallotTransactionValidator;
use crate::vote::duplicate_vote;

/// Outcome of a committed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReceipt {
    pub tx_id: Hash,
    /// Record the instruction created or decided
    pub address: Address,
    pub version: StateVersion,
}

/// Ledger hosting the ballot program over a state store
pub struct BallotLedger<S: StateStore> {
    state: Arc<S>,
    program: BallotProgram,
    validator: BallotTransactionValidator,
    execution_lock: Mutex<()>,
}

impl<S: StateStore + 'static> BallotLedger<S> {
    pub fn new(state: Arc<S>, config: BallotConfig) -> Self {
        Self::with_program(state, config, BallotProgram::new())
    }

    pub fn with_program(state: Arc<S>, config: BallotConfig, program: BallotProgram) -> Self {
        Self {
            state,
            program,
            validator: BallotTransactionValidator::new(config),
            execution_lock: Mutex::new(()),
        }
    }

    /// Submit a transaction at the current wall-clock time
    pub async fn submit(&self, tx: BallotTransaction) -> AgoraResult<ExecutionReceipt> {
        self.submit_at(tx, Timestamp::now()).await
    }

    /// Submit a transaction at ledger time `now`
    pub async fn submit_at(
        &self,
        tx: BallotTransaction,
        now: Timestamp,
    ) -> AgoraResult<ExecutionReceipt> {
        let instruction = tx.instruction.name();
        let signer = tx.signer;

        let result = self.execute(tx, now).await;
        match &result {
            Ok(receipt) => info!(
                "{} by {} committed: {} at {}",
                instruction, signer, receipt.address, receipt.version
            ),
            Err(e) if e.is_program_error() => {
                info!("{} by {} refused: {}", instruction, signer, e)
            }
            Err(e) => warn!("{} by {} rejected: {}", instruction, signer, e),
        }
        result
    }

    async fn execute(
        &self,
        tx: BallotTransaction,
        now: Timestamp,
    ) -> AgoraResult<ExecutionReceipt> {
        let verified = VerifiedTransaction::new(tx)?;
        let tx = &verified.tx;

        let _guard = self.execution_lock.lock().await;
        // A cast vote outranks the stale nonce of a racing repeat
        if let BallotInstruction::Vote { proposal, .. } = &tx.instruction {
            if self.has_voted(&tx.signer, proposal).await? {
                return Err(duplicate_vote(&tx.signer, proposal));
            }
        }
        self.validator.validate(tx, &*self.state, now).await?;

        let output = self.program.process(tx, &*self.state, now).await?;

        let mut changes = output.changes;
        changes.push(StateChange::Set {
            key: account_key(&tx.signer),
            value: AccountState::new(tx.nonce.next().0).to_bytes(),
        });
        debug!("Applying {} changes for tx {}", changes.len(), verified.tx_id);

        let version = self
            .state
            .apply_batch(changes)
            .await
            .map_err(|e| match (&tx.instruction, e) {
                (BallotInstruction::Vote { proposal, .. }, AgoraError::AlreadyExists(_)) => {
                    duplicate_vote(&tx.signer, proposal)
                }
                (_, e) => e,
            })?;

        Ok(ExecutionReceipt {
            tx_id: verified.tx_id,
            address: output.address,
            version,
        })
    }

    async fn load_record(&self, address: &Address) -> AgoraResult<Option<Record>> {
        match self.state.get_record(address).await? {
            Some(bytes) => Ok(Some(Record::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Get a voting session
    pub async fn get_session(&self, address: &Address) -> AgoraResult<VotingSession> {
        self.load_record(address)
            .await?
            .ok_or_else(|| AgoraError::SessionNotFound(address.to_string()))?
            .into_session()
    }

    /// Get a proposal
    pub async fn get_proposal(&self, address: &Address) -> AgoraResult<Proposal> {
        self.load_record(address)
            .await?
            .ok_or_else(|| AgoraError::ProposalNotFound(address.to_string()))?
            .into_proposal()
    }

    /// All proposals of a session in index order, with their addresses
    pub async fn proposals(&self, session: &Address) -> AgoraResult<Vec<(Address, Proposal)>> {
        let voting = self.get_session(session).await?;
        let program_id = self.program_id();

        let mut proposals = Vec::with_capacity(voting.proposal_count as usize);
        for index in 0..voting.proposal_count {
            let (address, _) = proposal_address(&program_id, session, index)?;
            proposals.push((address, self.get_proposal(&address).await?));
        }
        Ok(proposals)
    }

    /// Whether `voter` already voted on `proposal`
    pub async fn has_voted(&self, voter: &Address, proposal: &Address) -> AgoraResult<bool> {
        let (guard, _) = vote_guard_address(&self.program_id(), voter, proposal)?;
        Ok(self.state.get_record(&guard).await?.is_some())
    }

    /// Winning proposal of a tallied session, `None` before tally
    pub async fn winner(&self, session: &Address) -> AgoraResult<Option<(Address, Proposal)>> {
        let voting = self.get_session(session).await?;
        if !voting.winner_selected {
            return Ok(None);
        }

        let (address, _) = proposal_address(&self.program_id(), session, voting.winner_idx)?;
        Ok(Some((address, self.get_proposal(&address).await?)))
    }

    /// Next nonce expected from `signer`
    pub async fn get_nonce(&self, signer: &Address) -> AgoraResult<Nonce> {
        self.state.get_nonce(signer).await
    }

    pub async fn state_version(&self) -> StateVersion {
        self.state.version().await
    }

    pub async fn state_root(&self) -> AgoraResult<StateRoot> {
        self.state.compute_root().await
    }

    pub fn program(&self) -> &BallotProgram {
        &self.program
    }

    pub fn program_id(&self) -> ProgramId {
        self.program.program_id()
    }

    pub fn config(&self) -> &BallotConfig {
        self.validator.config()
    }
}

/// Shared ledger type
pub type SharedLedger<S> = Arc<BallotLedger<S>>;
