//! Records owned by the ballot program

use agora_core::{Address, AgoraError, AgoraResult, StateChange, Timestamp};
use agora_state::record_key;
use serde::{Deserialize, Serialize};

/// A voting session opened by its chairperson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingSession {
    /// Sole authority allowed to add proposals and tally
    pub chairperson: Address,
    /// Votes are accepted strictly before this time
    pub deadline: Timestamp,
    /// Number of registered proposals, also the next proposal index
    pub proposal_count: u32,
    pub winner_selected: bool,
    /// Only meaningful once `winner_selected` is set
    pub winner_idx: u32,
    pub bump: u8,
}

impl VotingSession {
    pub fn new(chairperson: Address, deadline: Timestamp, bump: u8) -> Self {
        Self {
            chairperson,
            deadline,
            proposal_count: 0,
            winner_selected: false,
            winner_idx: 0,
            bump,
        }
    }

    /// Whether a vote arriving at `now` is still accepted
    pub fn is_open(&self, now: Timestamp) -> bool {
        !self.winner_selected && now < self.deadline
    }
}

/// A proposal registered under a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub session: Address,
    pub index: u32,
    pub text: String,
    pub vote_counter: u32,
    pub bump: u8,
}

impl Proposal {
    pub fn new(session: Address, index: u32, text: String, bump: u8) -> Self {
        Self {
            session,
            index,
            text,
            vote_counter: 0,
            bump,
        }
    }
}

/// Marker that one voter has voted on one proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteGuard {
    pub bump: u8,
}

/// Every record kind the program stores, as written to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    Session(VotingSession),
    Proposal(Proposal),
    VoteGuard(VoteGuard),
}

impl Record {
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Session(_) => "session",
            Record::Proposal(_) => "proposal",
            Record::VoteGuard(_) => "vote guard",
        }
    }

    pub fn to_bytes(&self) -> AgoraResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| AgoraError::SerializationError(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> AgoraResult<Self> {
        bincode::deserialize(bytes).map_err(|e| AgoraError::InvalidRecord(e.to_string()))
    }

    pub fn into_session(self) -> AgoraResult<VotingSession> {
        match self {
            Record::Session(session) => Ok(session),
            other => Err(AgoraError::InvalidRecord(format!(
                "expected session, found {}",
                other.kind()
            ))),
        }
    }

    pub fn into_proposal(self) -> AgoraResult<Proposal> {
        match self {
            Record::Proposal(proposal) => Ok(proposal),
            other => Err(AgoraError::InvalidRecord(format!(
                "expected proposal, found {}",
                other.kind()
            ))),
        }
    }

    /// Change creating this record at `address`, failing if it is occupied
    pub fn create_at(&self, address: &Address) -> AgoraResult<StateChange> {
        Ok(StateChange::Create {
            key: record_key(address),
            value: self.to_bytes()?,
        })
    }

    /// Change overwriting the record at `address`
    pub fn set_at(&self, address: &Address) -> AgoraResult<StateChange> {
        Ok(StateChange::Set {
            key: record_key(address),
            value: self.to_bytes()?,
        })
    }
}

impl From<VotingSession> for Record {
    fn from(session: VotingSession) -> Self {
        Record::Session(session)
    }
}

impl From<Proposal> for Record {
    fn from(proposal: Proposal) -> Self {
        Record::Proposal(proposal)
    }
}

impl From<VoteGuard> for Record {
    fn from(guard: VoteGuard) -> Self {
        Record::VoteGuard(guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_defaults() {
        let chair = Address([1u8; 32]);
        let session = VotingSession::new(chair, Timestamp::from_millis(10_000), 254);

        assert_eq!(session.chairperson, chair);
        assert_eq!(session.proposal_count, 0);
        assert!(!session.winner_selected);
        assert_eq!(session.winner_idx, 0);
    }

    #[test]
    fn test_session_open_window() {
        let mut session = VotingSession::new(Address::ZERO, Timestamp::from_millis(100), 255);

        assert!(session.is_open(Timestamp::from_millis(99)));
        assert!(!session.is_open(Timestamp::from_millis(100)));

        session.winner_selected = true;
        assert!(!session.is_open(Timestamp::from_millis(0)));
    }

    #[test]
    fn test_wrong_record_kind() {
        let record = Record::from(VoteGuard { bump: 3 });
        let bytes = record.to_bytes().unwrap();

        let decoded = Record::from_bytes(&bytes).unwrap();
        assert!(matches!(
            decoded.into_session(),
            Err(AgoraError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_garbage_is_invalid_record() {
        assert!(matches!(
            Record::from_bytes(&[0xff, 0xff, 0xff, 0xff, 0x01]),
            Err(AgoraError::InvalidRecord(_))
        ));
    }
}
