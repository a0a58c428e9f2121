//! Salted password hashing for admin and storefront accounts.
//!
//! Stored form is `salt$digest` where both halves are lowercase hex and the
//! digest is SHA-256 over `salt_bytes || password_bytes`.

use rand::RngCore;
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;

#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = digest_with_salt(&salt, password);
    format!("{}${}", hex::encode(salt), digest)
}

/// Constant shape check first so malformed stored hashes never match.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    digest_with_salt(&salt, password) == digest_hex
}

fn digest_with_salt(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_round_trips() {
        let stored = hash_password("hunter22");
        assert!(verify_password("hunter22", &stored));
        assert!(!verify_password("hunter23", &stored));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("secret-pw");
        let b = hash_password("secret-pw");
        assert_ne!(a, b);
        assert!(verify_password("secret-pw", &a));
        assert!(verify_password("secret-pw", &b));
    }

    #[test]
    fn malformed_stored_hash_never_matches() {
        assert!(!verify_password("anything", "no-dollar-sign"));
        assert!(!verify_password("anything", "nothex$abcdef"));
        assert!(!verify_password("anything", ""));
    }
}
