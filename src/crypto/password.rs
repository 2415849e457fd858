/// Credential hashing with bcrypt.
///
/// The stored form is the bcrypt hash string wrapped in base64. Lookup
/// failure and hash mismatch both collapse to `Unauthorized` so the
/// caller cannot tell an unknown login from a wrong password.
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::{Result, VaultError};

/// Hash a password for storage. Cost is bcrypt's default (12).
pub fn hash(password: &str) -> Result<String> {
    let hashed = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| VaultError::Encryption(e.to_string()))?;
    Ok(BASE64.encode(hashed.as_bytes()))
}

/// Verify a password against the stored base64-wrapped bcrypt hash.
///
/// The comparison inside `bcrypt::verify` is constant-time; every
/// failure path returns the same `Unauthorized`.
pub fn verify(password: &str, encoded_hash: &str) -> Result<()> {
    let decoded = BASE64
        .decode(encoded_hash)
        .map_err(|_| VaultError::Unauthorized)?;
    let hashed = std::str::from_utf8(&decoded).map_err(|_| VaultError::Unauthorized)?;

    match bcrypt::verify(password, hashed) {
        Ok(true) => Ok(()),
        _ => Err(VaultError::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verify_roundtrip() {
        let stored = hash("s3cret").unwrap();
        assert!(verify("s3cret", &stored).is_ok());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let stored = hash("s3cret").unwrap();
        assert!(matches!(
            verify("wrong", &stored),
            Err(VaultError::Unauthorized)
        ));
    }

    #[test]
    fn test_garbage_stored_hash_rejected() {
        assert!(matches!(
            verify("s3cret", "not base64 at all!"),
            Err(VaultError::Unauthorized)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let h1 = hash("same password").unwrap();
        let h2 = hash("same password").unwrap();
        assert_ne!(h1, h2);
    }
}
