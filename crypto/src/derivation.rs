//! Key derivation using HKDF
//!
//! Derives *program addresses*: storage addresses computed purely from seed
//! bytes and a program namespace. A program address is always off the
//! Ed25519 curve, so no secret key exists for it and only the owning program
//! can create a record there.

use agora_core::{Address, AgoraError, AgoraResult, ProgramId};
use hkdf::Hkdf;
use sha2::Sha256;

use crate::keys::is_on_curve;

/// Maximum number of seeds in a program address derivation
pub const MAX_SEEDS: usize = 16;

/// Maximum length of a single seed in bytes
pub const MAX_SEED_LEN: usize = 32;

const PROGRAM_ADDRESS_INFO: &[u8] = b"agora/program-address";

/// Derive a key using HKDF-SHA256
pub fn derive_key(
    input_key_material: &[u8],
    salt: Option<&[u8]>,
    info: &[u8],
    output_length: usize,
) -> AgoraResult<Vec<u8>> {
    let hk = Hkdf::<Sha256>::new(salt, input_key_material);
    let mut output = vec![0u8; output_length];

    hk.expand(info, &mut output)
        .map_err(|e| AgoraError::KeyDerivationFailed(e.to_string()))?;

    Ok(output)
}

/// Derive a 32-byte key
pub fn derive_key_32(
    input_key_material: &[u8],
    salt: Option<&[u8]>,
    info: &[u8],
) -> AgoraResult<[u8; 32]> {
    let key = derive_key(input_key_material, salt, info, 32)?;
    let mut result = [0u8; 32];
    result.copy_from_slice(&key);
    Ok(result)
}

/// Compute the program address for `seeds` and a given `bump`
///
/// Fails if the seeds are out of bounds or the resulting bytes land on the
/// curve; callers normally go through [`derive_program_address`].
pub fn create_program_address(
    seeds: &[&[u8]],
    bump: u8,
    program_id: &ProgramId,
) -> AgoraResult<Address> {
    let ikm = seed_material(seeds)?;
    off_curve_address(&ikm, bump, program_id)?.ok_or_else(|| {
        AgoraError::KeyDerivationFailed("derived address lies on the curve".into())
    })
}

/// Find the canonical program address for `seeds`, returning it with its bump
///
/// Bumps are tried from 255 downwards; the first off-curve result wins, so the
/// same seeds and program always give the same `(address, bump)`.
pub fn derive_program_address(
    seeds: &[&[u8]],
    program_id: &ProgramId,
) -> AgoraResult<(Address, u8)> {
    let ikm = seed_material(seeds)?;
    for bump in (0..=u8::MAX).rev() {
        if let Some(address) = off_curve_address(&ikm, bump, program_id)? {
            return Ok((address, bump));
        }
    }

    Err(AgoraError::KeyDerivationFailed(
        "no viable bump for seeds".into(),
    ))
}

/// Length-prefixed concatenation of the seeds
fn seed_material(seeds: &[&[u8]]) -> AgoraResult<Vec<u8>> {
    if seeds.len() > MAX_SEEDS {
        return Err(AgoraError::KeyDerivationFailed(format!(
            "too many seeds: {} > {}",
            seeds.len(),
            MAX_SEEDS
        )));
    }

    let mut ikm = Vec::with_capacity(seeds.len() * (MAX_SEED_LEN + 1));
    for seed in seeds {
        if seed.len() > MAX_SEED_LEN {
            return Err(AgoraError::KeyDerivationFailed(format!(
                "seed of {} bytes exceeds {}",
                seed.len(),
                MAX_SEED_LEN
            )));
        }
        ikm.push(seed.len() as u8);
        ikm.extend_from_slice(seed);
    }
    Ok(ikm)
}

fn off_curve_address(ikm: &[u8], bump: u8, program_id: &ProgramId) -> AgoraResult<Option<Address>> {
    let mut info = PROGRAM_ADDRESS_INFO.to_vec();
    info.push(bump);

    let bytes = derive_key_32(ikm, Some(program_id.as_bytes()), &info)?;
    if is_on_curve(&bytes) {
        return Ok(None);
    }
    Ok(Some(Address::from_bytes(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: ProgramId = Address([9u8; 32]);

    #[test]
    fn test_derive_key() {
        let ikm = b"input key material";
        let salt = b"salt";
        let info = b"context info";

        let key1 = derive_key(ikm, Some(salt), info, 32).unwrap();
        let key2 = derive_key(ikm, Some(salt), info, 32).unwrap();

        assert_eq!(key1, key2);
        assert_eq!(key1.len(), 32);
    }

    #[test]
    fn test_program_address_deterministic() {
        let seeds: &[&[u8]] = &[b"voting", &[1u8; 32]];
        let (a1, b1) = derive_program_address(seeds, &PROGRAM).unwrap();
        let (a2, b2) = derive_program_address(seeds, &PROGRAM).unwrap();

        assert_eq!(a1, a2);
        assert_eq!(b1, b2);
        assert!(!is_on_curve(a1.as_bytes()));
    }

    #[test]
    fn test_program_address_bump_is_proof() {
        let seeds: &[&[u8]] = &[b"voting", &[2u8; 32]];
        let (address, bump) = derive_program_address(seeds, &PROGRAM).unwrap();
        assert_eq!(create_program_address(seeds, bump, &PROGRAM).unwrap(), address);
    }

    #[test]
    fn test_program_address_separates_inputs() {
        let base_seeds: &[&[u8]] = &[b"voting", &[1u8; 32]];
        let other_seeds: &[&[u8]] = &[b"voting", &[2u8; 32]];
        let regrouped_seeds: &[&[u8]] = &[b"vot", b"ing", &[1u8; 32]];

        let (base, _) = derive_program_address(base_seeds, &PROGRAM).unwrap();
        let (other_seed, _) = derive_program_address(other_seeds, &PROGRAM).unwrap();
        let (other_program, _) = derive_program_address(base_seeds, &Address([8u8; 32])).unwrap();
        let (regrouped, _) = derive_program_address(regrouped_seeds, &PROGRAM).unwrap();

        assert_ne!(base, other_seed);
        assert_ne!(base, other_program);
        assert_ne!(base, regrouped);
    }

    #[test]
    fn test_program_address_seed_limits() {
        let long = [0u8; MAX_SEED_LEN + 1];
        assert!(matches!(
            derive_program_address(&[long.as_slice()], &PROGRAM),
            Err(AgoraError::KeyDerivationFailed(_))
        ));

        let seeds: Vec<&[u8]> = vec![b"s".as_slice(); MAX_SEEDS + 1];
        assert!(matches!(
            derive_program_address(&seeds, &PROGRAM),
            Err(AgoraError::KeyDerivationFailed(_))
        ));
    }
}
