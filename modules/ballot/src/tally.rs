//! Tally: choosing the winning proposal of a session

use agora_core::{Address, AgoraError, AgoraResult};
use tracing::debug;

use crate::address::proposal_address;
use crate::context::{ExecutionContext, ProgramOutput};
use crate::records::Record;

/// Index and count of the proposal with the most votes
///
/// Scans in index order and only replaces the leader on a strictly greater
/// count, so ties go to the lowest index.
pub fn select_winner(counts: &[u32]) -> Option<(u32, u32)> {
    let (&first, rest) = counts.split_first()?;
    let mut best = (0u32, first);

    for (offset, &count) in rest.iter().enumerate() {
        if count > best.1 {
            best = (offset as u32 + 1, count);
        }
    }

    Some(best)
}

/// Record the winner of `session`; `proposals` must list all of its proposals in index order
pub async fn tally(
    ctx: &ExecutionContext<'_>,
    session: &Address,
    proposals: &[Address],
) -> AgoraResult<ProgramOutput> {
    let mut voting = ctx.load_session(session).await?;

    if ctx.signer != voting.chairperson {
        return Err(AgoraError::Unauthorized(
            "only the chairperson can tally".into(),
        ));
    }
    if voting.winner_selected {
        return Err(AgoraError::AlreadyTallied);
    }

    let supplied = u32::try_from(proposals.len()).unwrap_or(u32::MAX);
    if voting.proposal_count == 0 || supplied != voting.proposal_count {
        return Err(AgoraError::IncompleteProposalSet {
            expected: voting.proposal_count,
            got: supplied,
        });
    }

    let mut counts = Vec::with_capacity(proposals.len());
    for (index, address) in (0u32..).zip(proposals) {
        let (expected, _) = proposal_address(&ctx.program_id, session, index)?;
        if expected != *address {
            return Err(AgoraError::InvalidProposalReference { index });
        }

        let proposal = ctx.load_proposal(address).await?;
        if proposal.session != *session || proposal.index != index {
            return Err(AgoraError::InvalidProposalReference { index });
        }
        counts.push(proposal.vote_counter);
    }

    let (winner_idx, votes) = select_winner(&counts).ok_or(AgoraError::IncompleteProposalSet {
        expected: voting.proposal_count,
        got: 0,
    })?;

    voting.winner_idx = winner_idx;
    voting.winner_selected = true;
    debug!("Session {} won by proposal {} with {} votes", session, winner_idx, votes);

    Ok(ProgramOutput {
        address: *session,
        changes: vec![Record::from(voting).set_at(session)?],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_winner_strict_max() {
        assert_eq!(select_winner(&[1, 4, 2]), Some((1, 4)));
        assert_eq!(select_winner(&[0, 0, 3]), Some((2, 3)));
    }

    #[test]
    fn test_select_winner_tie_keeps_lowest_index() {
        assert_eq!(select_winner(&[2, 2]), Some((0, 2)));
        assert_eq!(select_winner(&[1, 5, 5, 5]), Some((1, 5)));
        assert_eq!(select_winner(&[0, 0, 0]), Some((0, 0)));
    }

    #[test]
    fn test_select_winner_empty() {
        assert_eq!(select_winner(&[]), None);
        assert_eq!(select_winner(&[7]), Some((0, 7)));
    }
}
