// Credential hashing - one-way salted hashes, never plaintext
//
// bcrypt salts every hash and compares in constant time, so neither the
// stored value nor the verification leaks the password.

use crate::error::{GymError, Result};
use bcrypt::BcryptError;

/// Lowest work factor bcrypt accepts
pub const MIN_BCRYPT_COST: u32 = 4;

/// Highest work factor bcrypt accepts
pub const MAX_BCRYPT_COST: u32 = 31;

/// bcrypt only reads this many bytes of a password
pub const MAX_PASSWORD_BYTES: usize = 72;

/// One-way hash + verify capability used by the account directory
pub trait PasswordHasher {
    /// Hash a plaintext password with a fresh salt
    fn hash(&self, plain: &str) -> Result<String>;

    /// Check a plaintext password against a stored hash.
    /// A hash that cannot be parsed never verifies.
    fn verify(&self, plain: &str, hash: &str) -> Result<bool>;

    /// Spend the same work as `verify` when there is no stored hash,
    /// so an unknown username is not distinguishable by timing
    fn verify_missing(&self, plain: &str);
}

/// bcrypt-backed hasher with a configurable work factor
pub struct BcryptHasher {
    cost: u32,
    // Built up front so the first unknown-username login costs one verify
    dummy: Option<String>,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        BcryptHasher {
            cost,
            dummy: bcrypt::hash("gym-records-dummy", cost).ok(),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        BcryptHasher::new(bcrypt::DEFAULT_COST)
    }
}

fn hashing_error(err: BcryptError) -> GymError {
    match err {
        BcryptError::Truncation(len) => GymError::PasswordTooLong(len),
        other => GymError::Hashing(other),
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plain: &str) -> Result<String> {
        bcrypt::non_truncating_hash(plain, self.cost).map_err(hashing_error)
    }

    fn verify(&self, plain: &str, hash: &str) -> Result<bool> {
        match bcrypt::non_truncating_verify(plain, hash) {
            Ok(matched) => Ok(matched),
            Err(BcryptError::Truncation(len)) => Err(GymError::PasswordTooLong(len)),
            Err(_) => Ok(false),
        }
    }

    fn verify_missing(&self, plain: &str) {
        if let Some(dummy) = &self.dummy {
            let _ = bcrypt::non_truncating_verify(plain, dummy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> BcryptHasher {
        BcryptHasher::new(MIN_BCRYPT_COST)
    }

    #[test]
    fn test_hash_is_salted_and_verifies() {
        let hasher = hasher();

        let h1 = hasher.hash("pw1").unwrap();
        let h2 = hasher.hash("pw1").unwrap();

        assert_ne!(h1, "pw1", "hash must never be the plaintext");
        assert_ne!(h1, h2, "two hashes of the same password use different salts");
        assert!(hasher.verify("pw1", &h1).unwrap());
        assert!(hasher.verify("pw1", &h2).unwrap());
        assert!(!hasher.verify("wrong", &h1).unwrap());
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        let hasher = hasher();
        assert!(!hasher.verify("pw1", "pw1").unwrap());
        assert!(!hasher.verify("", "").unwrap());
    }

    #[test]
    fn test_dummy_hash_is_ready_before_first_lookup() {
        let hasher = hasher();
        assert!(hasher.dummy.as_deref().is_some_and(|d| d.starts_with("$2")));

        hasher.verify_missing("anything");
        hasher.verify_missing("anything again");
        assert_eq!(hasher.cost(), MIN_BCRYPT_COST);
    }

    #[test]
    fn test_long_passwords_are_rejected_not_truncated() {
        let hasher = hasher();
        let limit = "a".repeat(MAX_PASSWORD_BYTES);
        let longer = format!("{}b", limit);

        let hash = hasher.hash(&limit).unwrap();
        assert!(hasher.verify(&limit, &hash).unwrap());

        assert!(matches!(
            hasher.hash(&longer),
            Err(GymError::PasswordTooLong(73))
        ));
        assert!(matches!(
            hasher.verify(&longer, &hash),
            Err(GymError::PasswordTooLong(73))
        ));
    }
}
