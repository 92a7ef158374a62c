//! Ballot program: dispatches instructions to their operations

use agora_core::{AgoraResult, ProgramId, ProgramModule, StateProvider, Timestamp};

use crate::address::default_program_id;
use crate::context::{ExecutionContext, ProgramOutput};
use crate::instruction::BallotInstruction;
use crate::session::{add_proposal, initialise_voting};
use crate::tally::tally;
use crate::transaction::BallotTransaction;
use crate::vote::vote;

const PROGRAM_NAME: &str = "ballot";

/// The ballot program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallotProgram {
    program_id: ProgramId,
}

impl BallotProgram {
    pub fn new() -> Self {
        Self::with_program_id(default_program_id())
    }

    /// Program deployed under a different namespace
    pub fn with_program_id(program_id: ProgramId) -> Self {
        Self { program_id }
    }

    /// Execute the transaction's instruction without touching state
    pub async fn process(
        &self,
        tx: &BallotTransaction,
        state: &dyn StateProvider,
        now: Timestamp,
    ) -> AgoraResult<ProgramOutput> {
        let ctx = ExecutionContext::new(state, self.program_id, tx.signer, now);

        match &tx.instruction {
            BallotInstruction::InitialiseVoting { seed, deadline } => {
                initialise_voting(&ctx, seed, *deadline).await
            }
            BallotInstruction::AddProposal { session, text } => {
                add_proposal(&ctx, session, text).await
            }
            BallotInstruction::Vote {
                session,
                index,
                proposal,
            } => vote(&ctx, session, *index, proposal).await,
            BallotInstruction::Tally { session, proposals } => {
                tally(&ctx, session, proposals).await
            }
        }
    }
}

impl Default for BallotProgram {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramModule for BallotProgram {
    fn name(&self) -> &str {
        PROGRAM_NAME
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn program_id(&self) -> ProgramId {
        self.program_id
    }
}
