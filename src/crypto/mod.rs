/// Cryptographic primitives for the vault.
///
/// Every payload is encrypted under a key derived from the owner's
/// password and a per-payload salt:
/// - Pieces use AES-256-GCM (authenticated, in-memory).
/// - Blobs use AES-256-CTR (streaming, confidentiality only).
/// - Credentials are hashed with bcrypt and stored base64-wrapped.
pub mod cipher;
pub mod kdf;
pub mod password;
pub mod sensitive;
