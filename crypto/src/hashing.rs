//! Hashing functions using BLAKE3

use agora_core::Hash;

/// Compute BLAKE3 hash of data
pub fn blake3_hash(data: &[u8]) -> Hash {
    let hash = blake3::hash(data);
    Hash::from_bytes(*hash.as_bytes())
}

/// Default hash function (BLAKE3)
pub fn hash(data: &[u8]) -> Hash {
    blake3_hash(data)
}

/// Hash multiple pieces of data, each prefixed with its length
///
/// The prefix keeps `["ab", "c"]` and `["a", "bc"]` apart.
pub fn hash_multiple(parts: &[&[u8]]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    let hash = hasher.finalize();
    Hash::from_bytes(*hash.as_bytes())
}

/// Merkle tree root computation
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return Hash::ZERO;
    }

    let mut current_level: Vec<Hash> = leaves.to_vec();

    while current_level.len() > 1 {
        current_level = current_level
            .chunks(2)
            .map(|chunk| {
                // Odd number: hash with itself
                let right = chunk.get(1).unwrap_or(&chunk[0]);
                hash_multiple(&[chunk[0].as_bytes(), right.as_bytes()])
            })
            .collect();
    }

    current_level[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake3_hash() {
        let data = b"Hello, Agora!";
        let hash1 = blake3_hash(data);
        let hash2 = blake3_hash(data);

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, Hash::ZERO);
    }

    #[test]
    fn test_hash_multiple_is_boundary_sensitive() {
        let a = hash_multiple(&[b"ab", b"c"]);
        let b = hash_multiple(&[b"a", b"bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_merkle_root() {
        let leaves = vec![
            hash(b"leaf1"),
            hash(b"leaf2"),
            hash(b"leaf3"),
            hash(b"leaf4"),
        ];

        let root = merkle_root(&leaves);
        assert_ne!(root, Hash::ZERO);
        assert_eq!(root, merkle_root(&leaves));

        let mut reordered = leaves.clone();
        reordered.swap(0, 1);
        assert_ne!(root, merkle_root(&reordered));
    }

    #[test]
    fn test_merkle_root_single_and_empty() {
        let leaf = hash(b"only");
        assert_eq!(merkle_root(&[leaf]), leaf);
        assert_eq!(merkle_root(&[]), Hash::ZERO);
    }
}
