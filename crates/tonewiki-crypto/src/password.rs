use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

/// Fixed infix between password and username in the legacy pre-hash.
const PREHASH_INFIX: &str = "hi";

/// Hashes and verifies passwords in the legacy user-record format:
/// `bcrypt(base64(sha256(password + "hi" + username_key)))`.
///
/// bcrypt generates a fresh random salt on every [`PasswordHasher::hash`]
/// call, so hashing the same password twice yields different strings that
/// both verify.
#[derive(Clone, Copy, Debug)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Lowest and highest work factors bcrypt accepts.
    pub const MIN_COST: u32 = 4;
    pub const MAX_COST: u32 = 31;

    pub fn new(cost: u32) -> Result<Self, CryptoError> {
        if !(Self::MIN_COST..=Self::MAX_COST).contains(&cost) {
            return Err(CryptoError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// The SHA-256/base64 step applied before bcrypt.
    ///
    /// `username_key` must already be lowercased.
    pub fn prehash(username_key: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hasher.update(PREHASH_INFIX.as_bytes());
        hasher.update(username_key.as_bytes());
        STANDARD.encode(hasher.finalize())
    }

    /// Produce a salted hash suitable for storing in a user record.
    pub fn hash(&self, username_key: &str, password: &str) -> Result<String, CryptoError> {
        let prehash = Self::prehash(username_key, password);
        bcrypt::hash(prehash, self.cost).map_err(|e| CryptoError::Hash(e.to_string()))
    }

    /// Check a password against a stored hash.
    ///
    /// bcrypt compares the recomputed digest in constant time.
    pub fn verify(
        &self,
        username_key: &str,
        password: &str,
        stored_hash: &str,
    ) -> Result<bool, CryptoError> {
        let prehash = Self::prehash(username_key, password);
        bcrypt::verify(prehash, stored_hash).map_err(|e| CryptoError::MalformedHash(e.to_string()))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Errors from password hashing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("bcrypt cost {0} outside 4..=31")]
    InvalidCost(u32),

    #[error("hashing failed: {0}")]
    Hash(String),

    #[error("stored hash is malformed: {0}")]
    MalformedHash(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> PasswordHasher {
        PasswordHasher::new(PasswordHasher::MIN_COST).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let hasher = fast();
        let stored = hasher.hash("tim3line", "su4wirf-").unwrap();
        assert!(stored.starts_with("$2"));
        assert!(hasher.verify("tim3line", "su4wirf-", &stored).unwrap());
    }

    #[test]
    fn wrong_password_fails() {
        let hasher = fast();
        let stored = hasher.hash("tim3line", "su4wirf-").unwrap();
        assert!(!hasher.verify("tim3line", "wrong", &stored).unwrap());
    }

    #[test]
    fn username_is_part_of_the_hash() {
        let hasher = fast();
        let stored = hasher.hash("alice", "secret").unwrap();
        assert!(!hasher.verify("bob", "secret", &stored).unwrap());
    }

    #[test]
    fn salts_differ_per_call() {
        let hasher = fast();
        let a = hasher.hash("sandy", "pw").unwrap();
        let b = hasher.hash("sandy", "pw").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("sandy", "pw", &a).unwrap());
        assert!(hasher.verify("sandy", "pw", &b).unwrap());
    }

    #[test]
    fn prehash_is_base64_sha256() {
        let pre = PasswordHasher::prehash("sandy", "pw");
        // 32 digest bytes encode to 44 base64 characters.
        assert_eq!(pre.len(), 44);
        assert_eq!(pre, PasswordHasher::prehash("sandy", "pw"));
        assert_ne!(pre, PasswordHasher::prehash("sandy", "pw2"));
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let err = fast().verify("sandy", "pw", "not-a-bcrypt-hash").unwrap_err();
        assert!(matches!(err, CryptoError::MalformedHash(_)));
    }

    #[test]
    fn cost_bounds() {
        assert_eq!(PasswordHasher::new(3).unwrap_err(), CryptoError::InvalidCost(3));
        assert!(PasswordHasher::new(32).is_err());
        assert_eq!(PasswordHasher::default().cost(), bcrypt::DEFAULT_COST);
    }
}
