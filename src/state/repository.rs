/// Repository layer: typed database queries for the vault.
///
/// All queries use sqlx runtime-checked queries (not compile-time
/// checked) to avoid requiring a live database during development
/// builds. Every function takes an executor so callers can compose the
/// two-table write paths into a single transaction.
///
/// `SELECT ... FROM resources WHERE id = $1 AND owner = $2` is the sole
/// authorization point for payload access: payload ids only ever come
/// from a row selected that way, never from the outside.
use sqlx::PgExecutor;

use super::models::*;
use crate::error::{Result, VaultError};

// ── Identities ──

pub async fn create_identity(
    ex: impl PgExecutor<'_>,
    login: &str,
    passw: &str,
) -> Result<()> {
    sqlx::query("INSERT INTO identities (login, passw) VALUES ($1, $2)")
        .bind(login)
        .bind(passw)
        .execute(ex)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => VaultError::Conflict,
            other => VaultError::Database(other),
        })?;

    Ok(())
}

pub async fn get_identity(ex: impl PgExecutor<'_>, login: &str) -> Result<Option<Identity>> {
    sqlx::query_as::<_, Identity>("SELECT login, passw FROM identities WHERE login = $1")
        .bind(login)
        .fetch_optional(ex)
        .await
        .map_err(VaultError::Database)
}

// ── Payload rows ──

pub async fn insert_piece(
    ex: impl PgExecutor<'_>,
    ciphertext: &[u8],
    salt: &[u8],
    nonce: &[u8],
) -> Result<i32> {
    sqlx::query_scalar::<_, i32>(
        "INSERT INTO pieces (ciphertext, salt, nonce) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(ciphertext)
    .bind(salt)
    .bind(nonce)
    .fetch_one(ex)
    .await
    .map_err(VaultError::Database)
}

pub async fn insert_blob(
    ex: impl PgExecutor<'_>,
    location: &str,
    salt: &[u8],
    iv: &[u8],
) -> Result<i32> {
    sqlx::query_scalar::<_, i32>(
        "INSERT INTO blobs (location, salt, iv) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(location)
    .bind(salt)
    .bind(iv)
    .fetch_one(ex)
    .await
    .map_err(VaultError::Database)
}

pub async fn select_piece(ex: impl PgExecutor<'_>, id: i32) -> Result<Option<PieceRow>> {
    sqlx::query_as::<_, PieceRow>("SELECT ciphertext, salt, nonce FROM pieces WHERE id = $1")
        .bind(id)
        .fetch_optional(ex)
        .await
        .map_err(VaultError::Database)
}

pub async fn select_blob(ex: impl PgExecutor<'_>, id: i32) -> Result<Option<BlobRow>> {
    sqlx::query_as::<_, BlobRow>("SELECT location, salt, iv FROM blobs WHERE id = $1")
        .bind(id)
        .fetch_optional(ex)
        .await
        .map_err(VaultError::Database)
}

pub async fn delete_piece(ex: impl PgExecutor<'_>, id: i32) -> Result<()> {
    sqlx::query("DELETE FROM pieces WHERE id = $1")
        .bind(id)
        .execute(ex)
        .await?;

    Ok(())
}

pub async fn delete_blob(ex: impl PgExecutor<'_>, id: i32) -> Result<Option<String>> {
    sqlx::query_scalar::<_, String>("DELETE FROM blobs WHERE id = $1 RETURNING location")
        .bind(id)
        .fetch_optional(ex)
        .await
        .map_err(VaultError::Database)
}

// ── Catalog ──

pub async fn insert_resource(
    ex: impl PgExecutor<'_>,
    kind: ResourceKind,
    owner: &str,
    meta: &str,
    payload_ref: i32,
) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO resources (kind, owner, meta, payload_ref) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(kind)
    .bind(owner)
    .bind(meta)
    .bind(payload_ref)
    .fetch_one(ex)
    .await
    .map_err(VaultError::Database)
}

pub async fn select_owned_piece(
    ex: impl PgExecutor<'_>,
    rid: i64,
    owner: &str,
) -> Result<Option<OwnedResource>> {
    sqlx::query_as::<_, OwnedResource>(
        "SELECT meta, payload_ref FROM resources WHERE id = $1 AND owner = $2 AND kind = $3",
    )
    .bind(rid)
    .bind(owner)
    .bind(ResourceKind::Piece)
    .fetch_optional(ex)
    .await
    .map_err(VaultError::Database)
}

pub async fn select_owned_resource(
    ex: impl PgExecutor<'_>,
    rid: i64,
    owner: &str,
) -> Result<Option<OwnedResource>> {
    sqlx::query_as::<_, OwnedResource>(
        "SELECT meta, payload_ref FROM resources WHERE id = $1 AND owner = $2",
    )
    .bind(rid)
    .bind(owner)
    .fetch_optional(ex)
    .await
    .map_err(VaultError::Database)
}

pub async fn delete_resource(
    ex: impl PgExecutor<'_>,
    rid: i64,
    owner: &str,
) -> Result<Option<(ResourceKind, i32)>> {
    sqlx::query_as::<_, (ResourceKind, i32)>(
        "DELETE FROM resources WHERE id = $1 AND owner = $2 RETURNING kind, payload_ref",
    )
    .bind(rid)
    .bind(owner)
    .fetch_optional(ex)
    .await
    .map_err(VaultError::Database)
}

pub async fn list_by_owner(ex: impl PgExecutor<'_>, owner: &str) -> Result<Vec<ResourceEntry>> {
    sqlx::query_as::<_, ResourceEntry>(
        "SELECT id, kind, meta FROM resources WHERE owner = $1 ORDER BY id",
    )
    .bind(owner)
    .fetch_all(ex)
    .await
    .map_err(VaultError::Database)
}
