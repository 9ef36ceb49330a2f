use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(pub String);

/// One-way password hash plus constant-time verification.
pub trait PasswordVerifier: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    /// False for a wrong password and for an unparseable stored hash alike.
    fn verify(&self, password: &str, hashword: &str) -> bool;
}

/// Argon2id with the crate's default parameters and a random 16-byte salt.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Passwords;

fn salt() -> Result<SaltString, PasswordError> {
    use rand::Rng;
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    SaltString::encode_b64(&bytes).map_err(|e| PasswordError(e.to_string()))
}

impl PasswordVerifier for Argon2Passwords {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        Argon2::default()
            .hash_password(password.as_bytes(), &salt()?)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError(e.to_string()))
    }

    fn verify(&self, password: &str, hashword: &str) -> bool {
        use argon2::PasswordVerifier as _;
        PasswordHash::new(hashword)
            .map(|hash| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &hash)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let pw = Argon2Passwords;
        let hashed = pw.hash("correct horse").unwrap();
        assert!(hashed.starts_with("$argon2"));
        assert!(pw.verify("correct horse", &hashed));
        assert!(!pw.verify("battery staple", &hashed));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let pw = Argon2Passwords;
        assert_ne!(pw.hash("same").unwrap(), pw.hash("same").unwrap());
    }

    #[test]
    fn unparseable_hash_never_verifies() {
        assert!(!Argon2Passwords.verify("anything", "plaintext-in-db"));
    }
}
