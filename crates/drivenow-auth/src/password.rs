//! Password hashing.
//!
//! Passwords are stored as Argon2id PHC strings with a random salt per hash.
//! Verification is constant-time inside the `argon2` crate.
//!
//! # Example
//!
//! ```
//! use drivenow_auth::password::{hash_password, verify_password};
//!
//! let hash = hash_password("correct horse").unwrap();
//! assert!(hash.starts_with("$argon2id$"));
//! assert!(verify_password("correct horse", &hash).unwrap());
//! assert!(!verify_password("battery staple", &hash).unwrap());
//! ```

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hash a password for storage using Argon2id with default parameters.
///
/// # Errors
///
/// Returns `argon2::password_hash::Error` if hashing fails (rare).
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Hash with explicit memory (KiB) and iteration costs.
///
/// Verification reads the parameters back from the PHC string, so hashes
/// made here verify with [`verify_password`] like any other.
///
/// # Errors
///
/// Returns an error if the parameters are out of range or hashing fails.
pub fn hash_password_with_cost(
    password: &str,
    memory_kib: u32,
    iterations: u32,
) -> Result<String, argon2::password_hash::Error> {
    let params = Params::new(memory_kib, iterations, 1, None)?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash.
///
/// Returns `Ok(false)` on mismatch.
///
/// # Errors
///
/// Returns an error if `hash` is not a valid PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
    Ok(result.is_ok())
}
