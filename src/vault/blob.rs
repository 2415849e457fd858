/// Blob payload store: opaque payloads streamed to encrypted files.
///
/// Uploads are CTR-encrypted chunk by chunk into a UUID-named file under
/// the blobs directory; the database rows are only written after the
/// file is durably closed. Downloads return a reader that decrypts
/// lazily, so a blob is never materialised in memory.
use std::path::PathBuf;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::crypto::cipher::{self, CtrStream, DecryptingReader};
use crate::crypto::kdf;
use crate::error::{Result, VaultError};
use crate::state::models::ResourceKind;
use crate::state::repository;

use super::{Credentials, Vault};

/// A decrypting download. The caller owns the reader and must drive it
/// to completion or drop it; the underlying file closes with it.
pub struct BlobDownload {
    pub meta: String,
    pub content: DecryptingReader<File>,
}

/// Unlinks a partially written blob file on drop unless defused.
/// One guard covers stream errors, database failures after the file is
/// written, and mid-upload cancellation alike.
struct PartialFileGuard {
    location: Option<PathBuf>,
}

impl PartialFileGuard {
    fn new(location: PathBuf) -> Self {
        Self {
            location: Some(location),
        }
    }

    fn defuse(mut self) {
        self.location = None;
    }
}

impl Drop for PartialFileGuard {
    fn drop(&mut self) {
        if let Some(location) = self.location.take() {
            if let Err(e) = std::fs::remove_file(&location) {
                tracing::warn!(location = %location.display(), error = %e, "failed to remove partial blob file");
            }
        }
    }
}

impl Vault {
    /// Stream-encrypt a blob to disk and record it in the catalog.
    ///
    /// Any failure after the file is created, including cancellation of
    /// the request, removes the partial file before the error surfaces.
    pub async fn store_blob<S>(&self, meta: &str, mut content: S, creds: &Credentials) -> Result<i64>
    where
        S: Stream<Item = std::io::Result<Bytes>> + Unpin,
    {
        self.verify_password(creds).await?;

        let salt = kdf::generate_salt();
        let key = kdf::derive_key(creds.password.as_bytes(), &salt);
        let iv = cipher::generate_iv();

        let location = self.blobs_dir().join(Uuid::new_v4().to_string());
        let mut file = File::create(&location).await?;
        let guard = PartialFileGuard::new(location.clone());
        let mut stream = CtrStream::new(&key, &iv)?;

        while let Some(chunk) = content.next().await {
            let mut buf = chunk?.to_vec();
            stream.apply(&mut buf);
            file.write_all(&buf).await?;
        }
        file.sync_all().await?;
        drop(file);

        let mut tx = self.db().pool().begin().await?;
        let bid =
            repository::insert_blob(&mut *tx, &location.to_string_lossy(), &salt, &iv).await?;
        let rid = repository::insert_resource(
            &mut *tx,
            ResourceKind::Blob,
            &creds.login,
            meta,
            bid,
        )
        .await?;
        tx.commit().await?;
        guard.defuse();

        tracing::debug!(rid, owner = %creds.login, "blob stored");
        Ok(rid)
    }

    /// Open a stored blob for lazy decryption.
    pub async fn restore_blob(&self, rid: i64, creds: &Credentials) -> Result<BlobDownload> {
        self.verify_password(creds).await?;

        let resource = repository::select_owned_resource(self.db().pool(), rid, &creds.login)
            .await?
            .ok_or(VaultError::ResourceNotFound)?;
        let row = repository::select_blob(self.db().pool(), resource.payload_ref)
            .await?
            .ok_or(VaultError::ResourceNotFound)?;

        let key = kdf::derive_key(creds.password.as_bytes(), &row.salt);
        let file = File::open(&row.location).await?;
        let reader = DecryptingReader::new(file, CtrStream::new(&key, &row.iv)?);

        Ok(BlobDownload {
            meta: resource.meta,
            content: reader,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_partial_file_guard_removes_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial");
        std::fs::write(&path, b"half-written").unwrap();

        drop(PartialFileGuard::new(path.clone()));
        assert!(!path.exists());
    }

    #[test]
    fn test_partial_file_guard_defused_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("complete");
        std::fs::write(&path, b"fully written").unwrap();

        PartialFileGuard::new(path.clone()).defuse();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_file_encrypt_then_lazy_decrypt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        let key = kdf::derive_key(b"s3cret", &[0x11; kdf::SALT_LEN]);
        let iv = cipher::generate_iv();
        let plaintext = vec![0xC3u8; 256 * 1024 + 17];

        let mut file = File::create(&path).await.unwrap();
        let mut stream = CtrStream::new(&key, &iv).unwrap();
        for chunk in plaintext.chunks(8192) {
            let mut buf = chunk.to_vec();
            stream.apply(&mut buf);
            file.write_all(&buf).await.unwrap();
        }
        file.sync_all().await.unwrap();
        drop(file);

        let file = File::open(&path).await.unwrap();
        let mut reader = DecryptingReader::new(file, CtrStream::new(&key, &iv).unwrap());
        let mut decrypted = Vec::new();
        reader.read_to_end(&mut decrypted).await.unwrap();

        assert_eq!(decrypted, plaintext);
    }
}
