//! Authentication and password hashing.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Password verification
//! - Credential validation for registration

mod password;

pub use password::{PasswordError, hash_password, verify_password};

/// Minimum username length accepted at registration.
pub const MIN_USERNAME_LEN: usize = 3;
/// Maximum username length accepted at registration.
pub const MAX_USERNAME_LEN: usize = 100;
/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Validates registration credentials.
///
/// Field presence is enforced by the request deserializer; this step checks
/// field *content* and returns the names of every invalid field so the
/// caller can report them all at once.
///
/// # Errors
///
/// Returns the list of invalid field names.
pub fn validate_credentials(username: &str, password: &str) -> Result<(), Vec<&'static str>> {
    let mut invalid = Vec::new();

    let username = username.trim();
    if username.len() < MIN_USERNAME_LEN
        || username.len() > MAX_USERNAME_LEN
        || !username.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        invalid.push("username");
    }

    if password.len() < MIN_PASSWORD_LEN {
        invalid.push("password");
    }

    if invalid.is_empty() { Ok(()) } else { Err(invalid) }
}
