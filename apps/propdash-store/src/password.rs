//! Credential checks, Argon2 password hashes and session tokens

use argon2::{
    password_hash::{
        rand_core::{OsRng, RngCore},
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Password should be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,

    #[error("Unable to validate email address: invalid format")]
    InvalidEmail,

    #[error("could not hash password: {0}")]
    Hash(String),
}

/// Email and password accepted for a new account
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password_hash: String,
}

impl Credentials {
    /// Check a signup request and hash its password
    pub fn for_signup(email: &str, password: &str) -> Result<Self, CredentialError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CredentialError::PasswordTooShort);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hash(e.to_string()))?
            .to_string();

        Ok(Self {
            email,
            password_hash,
        })
    }
}

/// Whether `password` matches a stored PHC hash. A corrupt hash never
/// matches.
pub fn matches(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .and_then(|hash| Argon2::default().verify_password(password.as_bytes(), &hash))
        .is_ok()
}

/// Lowercased, trimmed email if it looks like one
pub fn normalize_email(email: &str) -> Result<String, CredentialError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(CredentialError::InvalidEmail),
    }
}

/// 32 random bytes, hex encoded
pub fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
