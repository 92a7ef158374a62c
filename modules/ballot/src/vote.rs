//! Casting votes
//!
//! A vote creates a guard record keyed by (voter, proposal) and bumps the
//! proposal's counter in the same batch. The guard can only be created once,
//! so a repeat vote collides with it and is rejected.

use agora_core::{Address, AgoraError, AgoraResult};
use tracing::debug;

use crate::address::{proposal_address, vote_guard_address};
use crate::context::{ExecutionContext, ProgramOutput};
use crate::records::{Record, VoteGuard};

/// Cast the signer's vote for proposal `index` of `session`
pub async fn vote(
    ctx: &ExecutionContext<'_>,
    session: &Address,
    index: u32,
    proposal: &Address,
) -> AgoraResult<ProgramOutput> {
    let voting = ctx.load_session(session).await?;

    if !voting.is_open(ctx.now) {
        return Err(AgoraError::VotingClosed);
    }
    if index >= voting.proposal_count {
        return Err(AgoraError::InvalidProposalReference { index });
    }

    let (expected, _) = proposal_address(&ctx.program_id, session, index)?;
    if expected != *proposal {
        return Err(AgoraError::InvalidProposalReference { index });
    }

    let mut target = ctx.load_proposal(proposal).await?;
    if target.session != *session || target.index != index {
        return Err(AgoraError::InvalidProposalReference { index });
    }

    let (guard, bump) = vote_guard_address(&ctx.program_id, &ctx.signer, proposal)?;
    if ctx.record_exists(&guard).await? {
        return Err(duplicate_vote(&ctx.signer, proposal));
    }

    target.vote_counter = target
        .vote_counter
        .checked_add(1)
        .ok_or_else(|| AgoraError::Internal("vote counter overflow".into()))?;

    debug!(
        "Vote by {} on proposal {} ({} votes)",
        ctx.signer, proposal, target.vote_counter
    );

    Ok(ProgramOutput {
        address: guard,
        changes: vec![
            Record::from(VoteGuard { bump }).create_at(&guard)?,
            Record::from(target).set_at(proposal)?,
        ],
    })
}

/// Error for a second vote by `voter` on `proposal`
pub fn duplicate_vote(voter: &Address, proposal: &Address) -> AgoraError {
    AgoraError::DuplicateVote {
        voter: voter.to_string(),
        proposal: proposal.to_string(),
    }
}
