//! Voting session lifecycle: opening a session and registering proposals

use agora_core::{Address, AgoraError, AgoraResult, Timestamp};
use tracing::debug;

use crate::address::{proposal_address, session_address};
use crate::context::{ExecutionContext, ProgramOutput};
use crate::records::{Proposal, Record, VotingSession};

/// Open a session owned by the signer at the address derived from `seed`
pub async fn initialise_voting(
    ctx: &ExecutionContext<'_>,
    seed: &str,
    deadline: Timestamp,
) -> AgoraResult<ProgramOutput> {
    let (address, bump) = session_address(&ctx.program_id, seed, &ctx.signer)?;

    if ctx.record_exists(&address).await? {
        return Err(AgoraError::AlreadyExists(format!("voting session {}", address)));
    }

    let session = VotingSession::new(ctx.signer, deadline, bump);
    debug!("Opening session {} with deadline {}", address, deadline);

    Ok(ProgramOutput {
        address,
        changes: vec![Record::from(session).create_at(&address)?],
    })
}

/// Register the next proposal of a session and bump its proposal count
pub async fn add_proposal(
    ctx: &ExecutionContext<'_>,
    session_address: &Address,
    text: &str,
) -> AgoraResult<ProgramOutput> {
    let mut session = ctx.load_session(session_address).await?;

    if ctx.signer != session.chairperson {
        return Err(AgoraError::Unauthorized(
            "only the chairperson can add proposals".into(),
        ));
    }
    if session.winner_selected {
        return Err(AgoraError::AlreadyTallied);
    }

    let index = session.proposal_count;
    let (address, bump) = proposal_address(&ctx.program_id, session_address, index)?;

    if ctx.record_exists(&address).await? {
        return Err(AgoraError::AlreadyExists(format!("proposal {}", address)));
    }

    session.proposal_count = index
        .checked_add(1)
        .ok_or_else(|| AgoraError::Internal("proposal count overflow".into()))?;

    let proposal = Proposal::new(*session_address, index, text.to_string(), bump);
    debug!("Proposal {} registered at index {}", address, index);

    Ok(ProgramOutput {
        address,
        changes: vec![
            Record::from(proposal).create_at(&address)?,
            Record::from(session).set_at(session_address)?,
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::default_program_id;
    use agora_core::StateMutator;
    use agora_state::MemoryStateStore;

    const CHAIR: Address = Address([1u8; 32]);

    fn ctx(state: &MemoryStateStore, signer: Address) -> ExecutionContext<'_> {
        ExecutionContext::new(state, default_program_id(), signer, Timestamp::from_millis(0))
    }

    #[tokio::test]
    async fn test_initialise_then_reinitialise() {
        let state = MemoryStateStore::new();
        let deadline = Timestamp::from_millis(10_000);

        let output = initialise_voting(&ctx(&state, CHAIR), "board", deadline)
            .await
            .unwrap();
        state.apply_batch(output.changes).await.unwrap();

        let session = ctx(&state, CHAIR).load_session(&output.address).await.unwrap();
        assert_eq!(session.chairperson, CHAIR);
        assert_eq!(session.deadline, deadline);

        let again = initialise_voting(&ctx(&state, CHAIR), "board", deadline).await;
        assert!(matches!(again, Err(AgoraError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_add_proposal_changes_are_paired() {
        let state = MemoryStateStore::new();
        let opened = initialise_voting(&ctx(&state, CHAIR), "board", Timestamp::from_millis(1))
            .await
            .unwrap();
        state.apply_batch(opened.changes).await.unwrap();

        let output = add_proposal(&ctx(&state, CHAIR), &opened.address, "proposal1")
            .await
            .unwrap();

        // Nothing is visible until the batch is applied
        assert_eq!(output.changes.len(), 2);
        assert!(!ctx(&state, CHAIR).record_exists(&output.address).await.unwrap());

        state.apply_batch(output.changes).await.unwrap();
        let proposal = ctx(&state, CHAIR).load_proposal(&output.address).await.unwrap();
        assert_eq!(proposal.index, 0);
        assert_eq!(proposal.session, opened.address);
    }

    #[tokio::test]
    async fn test_add_proposal_requires_chairperson() {
        let state = MemoryStateStore::new();
        let opened = initialise_voting(&ctx(&state, CHAIR), "board", Timestamp::from_millis(1))
            .await
            .unwrap();
        state.apply_batch(opened.changes).await.unwrap();

        let result = add_proposal(&ctx(&state, Address([2u8; 32])), &opened.address, "p").await;
        assert!(matches!(result, Err(AgoraError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_add_proposal_unknown_session() {
        let state = MemoryStateStore::new();
        let result = add_proposal(&ctx(&state, CHAIR), &Address([3u8; 32]), "p").await;
        assert!(matches!(result, Err(AgoraError::SessionNotFound(_))));
    }
}
