/// Piece payload store: small structured payloads sealed in memory.
use crate::crypto::{cipher, kdf};
use crate::error::{Result, VaultError};
use crate::state::models::ResourceKind;
use crate::state::repository;

use super::{Credentials, Vault};

/// A small payload with its user-chosen label.
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub meta: String,
    pub content: Vec<u8>,
}

impl Vault {
    /// Encrypt and store a piece. The payload row and the catalog row
    /// are inserted in one transaction; the returned rid is the only
    /// handle the caller ever sees.
    pub async fn store_piece(&self, piece: Piece, creds: &Credentials) -> Result<i64> {
        self.verify_password(creds).await?;

        let salt = kdf::generate_salt();
        let nonce = cipher::generate_nonce();
        let key = kdf::derive_key(creds.password.as_bytes(), &salt);
        let ciphertext = cipher::seal(&key, &nonce, &piece.content)?;

        let mut tx = self.db().pool().begin().await?;
        let pid = repository::insert_piece(&mut *tx, &ciphertext, &salt, &nonce).await?;
        let rid = repository::insert_resource(
            &mut *tx,
            ResourceKind::Piece,
            &creds.login,
            &piece.meta,
            pid,
        )
        .await?;
        tx.commit().await?;

        tracing::debug!(rid, owner = %creds.login, "piece stored");
        Ok(rid)
    }

    /// Decrypt and return a stored piece. A tag failure surfaces as a
    /// decryption error; the content comes back byte-for-byte,
    /// trailing NULs included.
    pub async fn restore_piece(&self, rid: i64, creds: &Credentials) -> Result<Piece> {
        self.verify_password(creds).await?;

        let resource = repository::select_owned_piece(self.db().pool(), rid, &creds.login)
            .await?
            .ok_or(VaultError::ResourceNotFound)?;
        let row = repository::select_piece(self.db().pool(), resource.payload_ref)
            .await?
            .ok_or(VaultError::ResourceNotFound)?;

        let key = kdf::derive_key(creds.password.as_bytes(), &row.salt);
        let content = cipher::open(&key, &row.nonce, &row.ciphertext)?;

        Ok(Piece {
            meta: resource.meta,
            content,
        })
    }
}
