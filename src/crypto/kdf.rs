/// PBKDF2 key derivation for password-based payload encryption.
///
/// Parameters: HMAC-SHA256 PRF, 4,096 iterations, 32-byte output.
/// These are fixed and MUST match between encrypt and decrypt.
/// Each payload carries its own random 8-byte salt, so each payload
/// is encrypted under its own derived key.
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

use crate::crypto::sensitive::DerivedKey;

const KDF_ITERATIONS: u32 = 4096;
pub const SALT_LEN: usize = 8;

/// Generate a random per-payload salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a 32-byte key from a password and salt.
pub fn derive_key(password: &[u8], salt: &[u8]) -> DerivedKey {
    let mut output = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password, salt, KDF_ITERATIONS, &mut output);
    DerivedKey::new(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_deterministic() {
        let salt = [0x42u8; SALT_LEN];
        let k1 = derive_key(b"my password", &salt);
        let k2 = derive_key(b"my password", &salt);
        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_password() {
        let salt = [0x42u8; SALT_LEN];
        let k1 = derive_key(b"password1", &salt);
        let k2 = derive_key(b"password2", &salt);
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_salt() {
        let k1 = derive_key(b"password", &[0x01; SALT_LEN]);
        let k2 = derive_key(b"password", &[0x02; SALT_LEN]);
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_generate_salt_unique() {
        let s1 = generate_salt();
        let s2 = generate_salt();
        assert_ne!(s1, s2);
    }
}
