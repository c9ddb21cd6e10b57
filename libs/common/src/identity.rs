//! Identity rules shared by every user store
//!
//! Users are identified by their email address. Addresses are compared
//! case-insensitively: they are trimmed and lower-cased before they are
//! stored or looked up, so `Ada@Example.com` and `ada@example.com` name the
//! same account.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use regex::Regex;
use std::sync::OnceLock;

use crate::error::{IdentityError, IdentityResult};

/// Field name used as the login identifier
pub const USERNAME_FIELD: &str = "email";

const MAX_EMAIL_LEN: usize = 254;

/// Normalize an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email
pub fn validate_email(email: &str) -> IdentityResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(IdentityError::InvalidEmail("Email is required".to_string()));
    }

    if email.len() > MAX_EMAIL_LEN {
        return Err(IdentityError::InvalidEmail(
            "Email must be at most 254 characters long".to_string(),
        ));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(IdentityError::InvalidEmail(
            "Enter a valid email address".to_string(),
        ));
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> IdentityResult<()> {
    let weak = |msg: &str| Err(IdentityError::WeakPassword(msg.to_string()));

    if password.is_empty() {
        return weak("Password is required");
    }

    if password.len() < 8 {
        return weak("Password must be at least 8 characters long");
    }

    if password.len() > 128 {
        return weak("Password must be at most 128 characters long");
    }

    let mut has_upper = false;
    let mut has_lower = false;
    let mut has_digit = false;
    let mut has_special = false;

    for c in password.chars() {
        if c.is_ascii_uppercase() {
            has_upper = true;
        } else if c.is_ascii_lowercase() {
            has_lower = true;
        } else if c.is_ascii_digit() {
            has_digit = true;
        } else if !c.is_alphanumeric() {
            has_special = true;
        }
    }

    if !has_upper {
        return weak("Password must contain at least one uppercase letter");
    }

    if !has_lower {
        return weak("Password must contain at least one lowercase letter");
    }

    if !has_digit {
        return weak("Password must contain at least one digit");
    }

    if !has_special {
        return weak("Password must contain at least one special character");
    }

    Ok(())
}

/// Hash a plain-text password into an Argon2 PHC string
pub fn hash_password(password: &str) -> IdentityResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::PasswordHash(e.to_string()))
}

/// Check a plain-text password against a stored Argon2 hash
pub fn verify_password(password_hash: &str, password: &str) -> IdentityResult<bool> {
    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|e| IdentityError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
