//! Credential hashing.
//!
//! Stored form is `salt$hex(sha256(salt || password))` with a fresh UUIDv4
//! salt per user. Verification recomputes the digest over the stored salt
//! and compares; the plaintext never touches a table.

use sha2::{Digest, Sha256};
use uuid::Uuid;

pub(crate) fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = salted_digest(&salt, password);
    format!("{salt}${digest}")
}

pub(crate) fn verify_password(stored: &str, password: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => salted_digest(salt, password) == digest,
        // Malformed stored hash never verifies.
        None => false,
    }
}

fn salted_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let stored = hash_password("hunter2");
        assert!(verify_password(&stored, "hunter2"));
    }

    #[test]
    fn wrong_password_fails() {
        let stored = hash_password("hunter2");
        assert!(!verify_password(&stored, "hunter3"));
    }

    #[test]
    fn salts_differ_per_user() {
        // Same password, two registrations, two distinct stored forms.
        assert_ne!(hash_password("pw"), hash_password("pw"));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("no-dollar-sign", "pw"));
        assert!(!verify_password("", "pw"));
    }
}
