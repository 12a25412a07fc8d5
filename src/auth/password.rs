use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::config::PasswordConfig;

/// Argon2id hasher with configured cost. Verification reads the cost from the
/// stored PHC string, so older hashes keep verifying after a cost change.
#[derive(Clone)]
pub struct Passwords {
    argon2: Argon2<'static>,
    min_length: usize,
    /// Hash at the configured cost, verified when the account does not exist.
    dummy_hash: String,
}

impl Passwords {
    pub fn from_config(cfg: &PasswordConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))?;
        let mut passwords = Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            min_length: cfg.min_length,
            dummy_hash: String::new(),
        };
        passwords.dummy_hash = passwords.hash("wizknowledge-absent-user")?;
        Ok(passwords)
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    pub fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            anyhow::anyhow!(e.to_string())
        })?;
        Ok(self
            .argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }

    /// Same Argon2 work as `verify` for a login whose username is unknown.
    /// Always false.
    pub fn verify_absent(&self, plain: &str) -> bool {
        let _ = self.verify(plain, &self.dummy_hash);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Passwords {
        Passwords::from_config(&PasswordConfig {
            min_length: 3,
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .expect("valid params")
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let p = cheap();
        let password = "Secur3P@ssw0rd!";
        let hash = p.hash(password).expect("hashing should succeed");
        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, password);
        assert!(p.verify(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let p = cheap();
        let hash = p.hash("correct-horse-battery-staple").expect("hashing should succeed");
        assert!(!p.verify("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = cheap().verify("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn hashes_from_other_cost_still_verify() {
        let hash = cheap().hash("pw1").unwrap();
        let stronger = Passwords::from_config(&PasswordConfig {
            min_length: 12,
            memory_kib: 16,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        assert!(stronger.verify("pw1", &hash).unwrap());
    }

    #[test]
    fn rejects_invalid_params() {
        let cfg = PasswordConfig {
            min_length: 3,
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        };
        assert!(Passwords::from_config(&cfg).is_err());
    }

    #[test]
    fn absent_user_check_uses_configured_cost() {
        let p = cheap();
        assert!(p.dummy_hash.starts_with("$argon2id$v=19$m=8,t=1,p=1$"));
        assert!(!p.verify_absent("wizknowledge-absent-user"));
        assert!(!p.verify_absent("pw1"));
    }
}
