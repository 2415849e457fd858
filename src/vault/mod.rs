/// Vault façade: the single entry point for owned, encrypted resources.
///
/// Every operation is keyed by the authenticated login; Store and
/// Restore additionally require the account password, which never
/// outlives the request. Writes that touch the catalog and a payload
/// table do so inside one transaction, so a committed resource always
/// references exactly one live payload row.
pub mod blob;
pub mod piece;

use std::path::PathBuf;

use crate::crypto::password;
use crate::error::{Result, VaultError};
use crate::state::models::{ResourceEntry, ResourceKind};
use crate::state::{repository, Database};

/// Login and password presented with a request.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

pub struct Vault {
    db: Database,
    blobs_dir: PathBuf,
}

impl Vault {
    pub fn new(db: Database, blobs_dir: PathBuf) -> Self {
        Self { db, blobs_dir }
    }

    pub(crate) fn db(&self) -> &Database {
        &self.db
    }

    pub(crate) fn blobs_dir(&self) -> &PathBuf {
        &self.blobs_dir
    }

    /// Create a new identity. Duplicate logins yield `Conflict`.
    pub async fn register(&self, creds: &Credentials) -> Result<()> {
        if creds.login.is_empty() || creds.password.is_empty() {
            return Err(VaultError::BadInput("empty login or password".into()));
        }

        let hashed = password::hash(&creds.password)?;
        repository::create_identity(self.db.pool(), &creds.login, &hashed).await?;

        tracing::info!(login = %creds.login, "identity registered");
        Ok(())
    }

    /// Check the password against the stored hash. An unknown login and
    /// a wrong password are indistinguishable to the caller.
    pub async fn verify_password(&self, creds: &Credentials) -> Result<()> {
        let identity = repository::get_identity(self.db.pool(), &creds.login)
            .await?
            .ok_or(VaultError::Unauthorized)?;

        password::verify(&creds.password, &identity.passw)
    }

    /// List every resource owned by a login. Reveals labels only, so a
    /// valid session suffices; the password is not required.
    pub async fn list(&self, login: &str) -> Result<Vec<ResourceEntry>> {
        repository::list_by_owner(self.db.pool(), login).await
    }

    /// Delete a resource, its payload row, and (for blobs) the on-disk
    /// file, all in one transaction. If the file unlink fails the
    /// transaction rolls back, keeping the no-orphan-rows invariant.
    pub async fn delete(&self, rid: i64, login: &str) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;

        let (kind, payload_ref) = repository::delete_resource(&mut *tx, rid, login)
            .await?
            .ok_or(VaultError::ResourceNotFound)?;

        match kind {
            ResourceKind::Piece => {
                repository::delete_piece(&mut *tx, payload_ref).await?;
            }
            ResourceKind::Blob => {
                let location = repository::delete_blob(&mut *tx, payload_ref)
                    .await?
                    .ok_or(VaultError::ResourceNotFound)?;
                tokio::fs::remove_file(&location).await?;
            }
        }

        tx.commit().await?;

        tracing::debug!(rid, owner = %login, "resource deleted");
        Ok(())
    }
}
