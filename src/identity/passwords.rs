//! Salted password hashing.

use sha2::{Digest, Sha256};

/// Hash stretching rounds.
const ROUNDS: u32 = 10_000;

/// A fresh random salt, hex encoded.
pub fn new_salt() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub fn hash_password(password: &str, salt: &str) -> String {
    let mut digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    for _ in 1..ROUNDS {
        digest = Sha256::new()
            .chain_update(digest)
            .chain_update(salt.as_bytes())
            .finalize();
    }
    hex::encode(digest)
}

/// Compare without short-circuiting on the first differing byte.
pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    let actual = hash_password(password, salt);
    actual.len() == expected_hash.len()
        && actual
            .bytes()
            .zip(expected_hash.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_round_trip() {
        let salt = new_salt();
        let hash = hash_password("Pass@word1", &salt);
        assert!(verify_password("Pass@word1", &salt, &hash));
        assert!(!verify_password("pass@word1", &salt, &hash));
    }

    #[test]
    fn test_salt_changes_hash() {
        assert_ne!(hash_password("Pass@word1", "a"), hash_password("Pass@word1", "b"));
        assert_eq!(hash_password("Pass@word1", "a").len(), 64);
    }
}
