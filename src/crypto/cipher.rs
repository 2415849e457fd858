/// The two cipher modes used by the vault, keyed per resource kind.
///
/// Pieces are sealed with AES-256-GCM: 12-byte random nonce, empty AAD,
/// 16-byte tag appended to the ciphertext. Opening validates the tag and
/// returns nothing on failure.
///
/// Blobs are streamed through AES-256-CTR with a random block-size IV.
/// CTR encrypts without buffering the whole payload but provides
/// confidentiality only; the file carries no authenticator.
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use aes::Aes256;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::Aes256Gcm;
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::RngCore;
use tokio::io::{AsyncRead, ReadBuf};

use crate::crypto::sensitive::DerivedKey;
use crate::error::{Result, VaultError};

pub const NONCE_LEN: usize = 12;
pub const IV_LEN: usize = 16;
pub const TAG_LEN: usize = 16;

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// Generate a random 12-byte nonce for AES-256-GCM.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Generate a random 16-byte IV for AES-256-CTR.
pub fn generate_iv() -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    rand::rngs::OsRng.fill_bytes(&mut iv);
    iv
}

/// Seal plaintext with AES-256-GCM. Returns `ciphertext || tag`.
pub fn seal(key: &DerivedKey, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Encryption(e.to_string()))?;

    cipher
        .encrypt(aes_gcm::Nonce::from_slice(nonce), plaintext)
        .map_err(|e| VaultError::Encryption(e.to_string()))
}

/// Open AES-256-GCM ciphertext. Tag validation failure yields
/// `VaultError::Decryption` and no plaintext bytes.
pub fn open(key: &DerivedKey, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if nonce.len() != NONCE_LEN {
        return Err(VaultError::Decryption(format!(
            "bad nonce length: {} bytes",
            nonce.len()
        )));
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Decryption(e.to_string()))?;

    cipher
        .decrypt(aes_gcm::Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| VaultError::Decryption("authentication tag mismatch".into()))
}

/// Stateful AES-256-CTR keystream applied to byte chunks in sequence.
///
/// Encryption and decryption are the same operation; chunk boundaries do
/// not affect the output as long as chunks are applied in stream order.
pub struct CtrStream(Aes256Ctr);

impl CtrStream {
    pub fn new(key: &DerivedKey, iv: &[u8]) -> Result<Self> {
        let cipher = Aes256Ctr::new_from_slices(key.as_bytes(), iv)
            .map_err(|e| VaultError::Encryption(e.to_string()))?;
        Ok(Self(cipher))
    }

    pub fn apply(&mut self, buf: &mut [u8]) {
        self.0.apply_keystream(buf);
    }
}

/// Lazily decrypting reader over a CTR-encrypted source.
///
/// Bytes are decrypted as the inner reader produces them; nothing is
/// buffered beyond the caller's read buffer.
pub struct DecryptingReader<R> {
    inner: R,
    cipher: CtrStream,
}

impl<R> DecryptingReader<R> {
    pub fn new(inner: R, cipher: CtrStream) -> Self {
        Self { inner, cipher }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for DecryptingReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let me = &mut *self;
        match Pin::new(&mut me.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                me.cipher.apply(&mut buf.filled_mut()[before..]);
                Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf;
    use tokio::io::AsyncReadExt;

    fn test_key() -> DerivedKey {
        kdf::derive_key(b"correct horse", &[0x24; kdf::SALT_LEN])
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let key = test_key();
        let nonce = generate_nonce();
        let plaintext = b"piece of secret data";

        let ciphertext = seal(&key, &nonce, plaintext).unwrap();
        assert_eq!(ciphertext.len(), plaintext.len() + TAG_LEN);

        let opened = open(&key, &nonce, &ciphertext).unwrap();
        assert_eq!(&opened, plaintext);
    }

    #[test]
    fn test_open_wrong_key_fails() {
        let key = test_key();
        let wrong = kdf::derive_key(b"battery staple", &[0x24; kdf::SALT_LEN]);
        let nonce = generate_nonce();

        let ciphertext = seal(&key, &nonce, b"secret").unwrap();
        assert!(open(&wrong, &nonce, &ciphertext).is_err());
    }

    #[test]
    fn test_open_tampered_ciphertext_fails() {
        let key = test_key();
        let nonce = generate_nonce();

        let mut ciphertext = seal(&key, &nonce, b"secret").unwrap();
        ciphertext[0] ^= 0xFF;
        assert!(open(&key, &nonce, &ciphertext).is_err());
    }

    #[test]
    fn test_open_bad_nonce_length_fails() {
        let key = test_key();
        let nonce = generate_nonce();

        let ciphertext = seal(&key, &nonce, b"secret").unwrap();
        assert!(open(&key, &nonce[..8], &ciphertext).is_err());
    }

    #[test]
    fn test_seal_empty_plaintext() {
        let key = test_key();
        let nonce = generate_nonce();

        let ciphertext = seal(&key, &nonce, b"").unwrap();
        assert_eq!(ciphertext.len(), TAG_LEN);
        assert!(open(&key, &nonce, &ciphertext).unwrap().is_empty());
    }

    #[test]
    fn test_plaintext_with_trailing_nuls_survives() {
        let key = test_key();
        let nonce = generate_nonce();
        let plaintext = b"binary data\x00\x00\x00";

        let ciphertext = seal(&key, &nonce, plaintext).unwrap();
        assert_eq!(open(&key, &nonce, &ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn test_ctr_chunked_matches_whole() {
        let key = test_key();
        let iv = generate_iv();
        let plaintext = vec![0xABu8; 100_000];

        let mut whole = plaintext.clone();
        CtrStream::new(&key, &iv).unwrap().apply(&mut whole);

        // Uneven chunk sizes must produce the identical stream.
        let mut chunked = plaintext.clone();
        let mut stream = CtrStream::new(&key, &iv).unwrap();
        for chunk in chunked.chunks_mut(7919) {
            stream.apply(chunk);
        }

        assert_eq!(whole, chunked);
    }

    #[test]
    fn test_ctr_roundtrip() {
        let key = test_key();
        let iv = generate_iv();
        let plaintext = b"streamed blob contents".to_vec();

        let mut buf = plaintext.clone();
        CtrStream::new(&key, &iv).unwrap().apply(&mut buf);
        assert_ne!(buf, plaintext);

        CtrStream::new(&key, &iv).unwrap().apply(&mut buf);
        assert_eq!(buf, plaintext);
    }

    #[test]
    fn test_ctr_bad_iv_length_fails() {
        let key = test_key();
        assert!(CtrStream::new(&key, &[0u8; 8]).is_err());
    }

    #[tokio::test]
    async fn test_decrypting_reader_roundtrip() {
        let key = test_key();
        let iv = generate_iv();
        let plaintext = vec![0x5Au8; 64 * 1024 + 3];

        let mut encrypted = plaintext.clone();
        CtrStream::new(&key, &iv).unwrap().apply(&mut encrypted);

        let mut reader = DecryptingReader::new(
            std::io::Cursor::new(encrypted),
            CtrStream::new(&key, &iv).unwrap(),
        );
        let mut decrypted = Vec::new();
        reader.read_to_end(&mut decrypted).await.unwrap();

        assert_eq!(decrypted, plaintext);
    }
}
