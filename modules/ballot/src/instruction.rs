//! Instructions accepted by the ballot program

use agora_core::{Address, Timestamp};
use serde::{Deserialize, Serialize};

/// One program call, carried inside a signed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallotInstruction {
    /// Open a session at the address derived from `seed` and the signer
    InitialiseVoting { seed: String, deadline: Timestamp },
    /// Register the next proposal of `session` (chairperson only)
    AddProposal { session: Address, text: String },
    /// Cast the signer's vote for proposal `index` of `session`
    Vote {
        session: Address,
        index: u32,
        proposal: Address,
    },
    /// Pick the winner; `proposals` must list every proposal in index order
    Tally {
        session: Address,
        proposals: Vec<Address>,
    },
}

impl BallotInstruction {
    pub fn name(&self) -> &'static str {
        match self {
            BallotInstruction::InitialiseVoting { .. } => "initialise_voting",
            BallotInstruction::AddProposal { .. } => "add_proposal",
            BallotInstruction::Vote { .. } => "vote",
            BallotInstruction::Tally { .. } => "tally",
        }
    }
}
