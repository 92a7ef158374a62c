//! Deterministic addresses for ballot records
//!
//! Every record the program owns sits at a program address derived from
//! stable seeds, so any party can recompute where a session, proposal or
//! vote guard lives without a directory.

use agora_core::{Address, AgoraResult, ProgramId};
use agora_crypto::derivation::derive_program_address;
use agora_crypto::hashing::hash;

/// Namespace tag the default program id is hashed from
const PROGRAM_TAG: &[u8] = b"agora/ballot/v1";

/// Program id of the ballot program as deployed by default
pub fn default_program_id() -> ProgramId {
    Address::from_bytes(hash(PROGRAM_TAG).0)
}

/// Address and bump of the voting session `seed` opened by `chairperson`
pub fn session_address(
    program_id: &ProgramId,
    seed: &str,
    chairperson: &Address,
) -> AgoraResult<(Address, u8)> {
    derive_program_address(&[seed.as_bytes(), chairperson.as_bytes()], program_id)
}

/// Address and bump of proposal `index` of `session`
pub fn proposal_address(
    program_id: &ProgramId,
    session: &Address,
    index: u32,
) -> AgoraResult<(Address, u8)> {
    derive_program_address(&[session.as_bytes(), &index.to_be_bytes()], program_id)
}

/// Address and bump of the marker recording that `voter` voted on `proposal`
pub fn vote_guard_address(
    program_id: &ProgramId,
    voter: &Address,
    proposal: &Address,
) -> AgoraResult<(Address, u8)> {
    derive_program_address(&[voter.as_bytes(), proposal.as_bytes()], program_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_address_per_chairperson() {
        let program = default_program_id();
        let alice = Address([1u8; 32]);
        let bob = Address([2u8; 32]);

        let (a1, _) = session_address(&program, "board-2024", &alice).unwrap();
        let (a2, _) = session_address(&program, "board-2024", &alice).unwrap();
        let (b, _) = session_address(&program, "board-2024", &bob).unwrap();
        let (other, _) = session_address(&program, "board-2025", &alice).unwrap();

        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert_ne!(a1, other);
    }

    #[test]
    fn test_proposal_addresses_distinct_per_index() {
        let program = default_program_id();
        let session = Address([7u8; 32]);

        let addresses: Vec<Address> = (0..8)
            .map(|i| proposal_address(&program, &session, i).unwrap().0)
            .collect();

        for (i, a) in addresses.iter().enumerate() {
            for b in &addresses[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_vote_guard_is_ordered() {
        let program = default_program_id();
        let x = Address([3u8; 32]);
        let y = Address([4u8; 32]);

        let (xy, _) = vote_guard_address(&program, &x, &y).unwrap();
        let (yx, _) = vote_guard_address(&program, &y, &x).unwrap();
        assert_ne!(xy, yx);
    }

    #[test]
    fn test_program_id_scopes_addresses() {
        let chair = Address([5u8; 32]);
        let (default, _) = session_address(&default_program_id(), "s", &chair).unwrap();
        let (other, _) = session_address(&Address([6u8; 32]), "s", &chair).unwrap();
        assert_ne!(default, other);
    }
}
