/// REST API routes for the vault.
///
/// Sessions travel in the Authorization header (raw token), the account
/// password in X-Password. Piece content is base64url (no padding) in
/// both directions; blob bodies are opaque bytes streamed end to end.
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL;
use base64::Engine;
use futures::StreamExt;
use serde::Serialize;
use tokio_util::io::ReaderStream;

use super::middleware::AuthUser;
use super::{fail, AppState, ErrorResponse};
use crate::error::VaultError;
use crate::vault::piece::Piece;
use crate::vault::Credentials;

type Rejection = (StatusCode, Json<ErrorResponse>);

/// Labels are opaque but bounded.
const MAX_META_LEN: usize = 4096;

fn password_header(headers: &HeaderMap) -> Result<String, Rejection> {
    headers
        .get("X-Password")
        .and_then(|v| v.to_str().ok())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .ok_or_else(|| fail(VaultError::Unauthorized))
}

fn check_meta(meta: &str) -> Result<(), Rejection> {
    if meta.len() > MAX_META_LEN {
        return Err(fail(VaultError::BadInput(format!(
            "meta exceeds {MAX_META_LEN} bytes"
        ))));
    }
    Ok(())
}

// ─── Health ──────────────────────────────────────────────

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

// ─── Auth ────────────────────────────────────────────────

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(super::auth::register))
        .route("/login", post(super::auth::login))
}

// ─── Catalog ─────────────────────────────────────────────

/// One entry of the owner's resource listing.
#[derive(Debug, Serialize)]
struct ResourceResponse {
    rid: i64,
    meta: String,
    #[serde(rename = "type")]
    kind: i32,
}

/// GET /vault — list every resource owned by the session's login.
async fn list_resources(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ResourceResponse>>, Rejection> {
    let resources = state.vault.list(&user.login).await.map_err(fail)?;

    let response = resources
        .into_iter()
        .map(|r| ResourceResponse {
            rid: r.id,
            meta: r.meta,
            kind: r.kind as i32,
        })
        .collect();

    Ok(Json(response))
}

/// DELETE /vault/{rid}
async fn delete_resource(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(rid): Path<i64>,
) -> Result<StatusCode, Rejection> {
    state.vault.delete(rid, &user.login).await.map_err(fail)?;

    Ok(StatusCode::OK)
}

pub fn vault_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/vault", get(list_resources))
        .route("/vault/{rid}", delete(delete_resource))
        .route("/vault/piece", put(store_piece))
        .route("/vault/piece/{rid}", get(restore_piece))
}

// ─── Pieces ──────────────────────────────────────────────

/// rid of a freshly stored resource.
#[derive(Debug, Serialize)]
struct RidResponse {
    rid: i64,
}

/// A restored piece on the wire.
#[derive(Debug, Serialize)]
struct PieceResponse {
    meta: String,
    content: String,
}

/// PUT /vault/piece — body `{meta, content}` with base64url content.
async fn store_piece(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<RidResponse>), Rejection> {
    let password = password_header(&headers)?;

    let meta = body
        .get("meta")
        .and_then(|v| v.as_str())
        .ok_or_else(|| fail(VaultError::BadInput("missing meta".into())))?;
    check_meta(meta)?;

    let encoded = body
        .get("content")
        .and_then(|v| v.as_str())
        .ok_or_else(|| fail(VaultError::BadInput("missing content".into())))?;
    let content = BASE64URL
        .decode(encoded)
        .map_err(|e| fail(VaultError::BadInput(format!("content is not valid base64: {e}"))))?;

    let creds = Credentials {
        login: user.login,
        password,
    };
    let piece = Piece {
        meta: meta.to_string(),
        content,
    };

    let rid = state.vault.store_piece(piece, &creds).await.map_err(fail)?;

    Ok((StatusCode::CREATED, Json(RidResponse { rid })))
}

/// GET /vault/piece/{rid}
async fn restore_piece(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(rid): Path<i64>,
) -> Result<Json<PieceResponse>, Rejection> {
    let password = password_header(&headers)?;

    let creds = Credentials {
        login: user.login,
        password,
    };

    let piece = state.vault.restore_piece(rid, &creds).await.map_err(fail)?;

    Ok(Json(PieceResponse {
        meta: piece.meta,
        content: BASE64URL.encode(&piece.content),
    }))
}

// ─── Blobs ───────────────────────────────────────────────

/// PUT /vault/blob — raw body, label in X-Meta.
async fn store_blob(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Body,
) -> Result<(StatusCode, Json<RidResponse>), Rejection> {
    let password = password_header(&headers)?;

    let meta = headers
        .get("X-Meta")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    check_meta(&meta)?;

    let creds = Credentials {
        login: user.login,
        password,
    };
    let stream = body
        .into_data_stream()
        .map(|chunk| chunk.map_err(std::io::Error::other));

    let rid = state
        .vault
        .store_blob(&meta, stream, &creds)
        .await
        .map_err(fail)?;

    Ok((StatusCode::CREATED, Json(RidResponse { rid })))
}

/// GET /vault/blob/{rid} — streams the decrypted blob back, label in
/// the X-Meta response header.
async fn restore_blob(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(rid): Path<i64>,
) -> Result<Response, Rejection> {
    let password = password_header(&headers)?;

    let creds = Credentials {
        login: user.login,
        password,
    };

    let download = state.vault.restore_blob(rid, &creds).await.map_err(fail)?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_DISPOSITION, "attachment")
        .header("X-Meta", download.meta)
        .body(Body::from_stream(ReaderStream::new(download.content)))
        .map_err(|e| fail(VaultError::BadInput(e.to_string())))
}

pub fn blob_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/vault/blob", put(store_blob))
        .route("/vault/blob/{rid}", get(restore_blob))
        .layer(DefaultBodyLimit::disable())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_header_present() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Password", "s3cret".parse().unwrap());
        assert_eq!(password_header(&headers).unwrap(), "s3cret");
    }

    #[test]
    fn test_password_header_missing_is_unauthorized() {
        let (status, _) = password_header(&HeaderMap::new()).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_password_header_empty_is_unauthorized() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Password", "".parse().unwrap());
        assert!(password_header(&headers).is_err());
    }

    #[test]
    fn test_check_meta_bounds() {
        assert!(check_meta("gmail").is_ok());
        assert!(check_meta(&"x".repeat(MAX_META_LEN)).is_ok());
        assert!(check_meta(&"x".repeat(MAX_META_LEN + 1)).is_err());
    }

    #[test]
    fn test_resource_response_wire_shape() {
        let json = serde_json::to_value(ResourceResponse {
            rid: 1,
            meta: "gmail".into(),
            kind: 1,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"rid": 1, "meta": "gmail", "type": 1}));
    }
}
