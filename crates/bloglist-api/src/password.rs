use anyhow::{Result, anyhow};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, Version,
    password_hash::{self, SaltString},
};
use argon2::{PasswordHasher as _, PasswordVerifier as _};
use rand_core::OsRng;

/// Salted Argon2id hashing for stored passwords.
///
/// Hashes are PHC strings, so the salt and cost parameters travel with the
/// hash and `verify` keeps working after the configured cost changes.
#[derive(Clone, Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn with_cost(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| anyhow!("Invalid Argon2 cost: {}", e))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| anyhow!("Password hashing failed: {}", e))?;
        Ok(hash.to_string())
    }

    /// `Ok(false)` on mismatch; `Err` only if `hashed` is not a valid PHC string.
    pub fn verify(&self, plaintext: &str, hashed: &str) -> Result<bool> {
        let parsed =
            PasswordHash::new(hashed).map_err(|e| anyhow!("Malformed password hash: {}", e))?;

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(anyhow!("Password verification failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::with_cost(8, 1, 1).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let hasher = hasher();
        let hash = hasher.hash("sekret").unwrap();

        assert!(!hash.contains("sekret"));
        assert!(hasher.verify("sekret", &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn same_input_is_salted_differently() {
        let hasher = hasher();
        let a = hasher.hash("sekret").unwrap();
        let b = hasher.hash("sekret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn verify_uses_cost_embedded_in_hash() {
        let hash = hasher().hash("sekret").unwrap();
        let other = PasswordHasher::with_cost(16, 2, 1).unwrap();
        assert!(other.verify("sekret", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(hasher().verify("sekret", "plaintext-in-db").is_err());
    }

    #[test]
    fn rejects_impossible_cost() {
        assert!(PasswordHasher::with_cost(1, 1, 1).is_err());
    }
}
