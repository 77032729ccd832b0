use crate::domain::auth::driven_ports::PasswordHasher;
use anyhow::anyhow;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, SaltString};
use argon2::{Argon2, PasswordHash, PasswordVerifier};

/// Hashes passwords with Argon2id and a fresh random salt, producing PHC strings
/// (`$argon2id$v=19$...`) which carry their own parameters
pub struct Argon2PasswordHasher;

impl PasswordHasher for Argon2PasswordHasher {
    fn hash_password(&self, password: &str) -> Result<String, anyhow::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = argon2::PasswordHasher::hash_password(
            &Argon2::default(),
            password.as_bytes(),
            &salt,
        )
        .map_err(|err| anyhow!("hashing password: {err}"))?;

        Ok(hash.to_string())
    }

    fn password_matches(&self, password: &str, hash: &str) -> Result<bool, anyhow::Error> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|err| anyhow!("parsing stored password hash: {err}"))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(anyhow!("verifying password: {err}")),
        }
    }
}
