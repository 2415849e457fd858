/// HTTP surface of the vault.
///
/// The server is a thin routing layer over the vault façade: it parses
/// the wire formats, extracts the session token and password headers,
/// and maps errors onto HTTP statuses. All crypto and transactional
/// logic lives below the façade.
pub mod auth;
pub mod middleware;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::error::{Result, VaultError};
use crate::session::SessionKeys;
use crate::vault::Vault;

/// Shared application state available to all handlers.
pub struct AppState {
    /// The vault façade.
    pub vault: Vault,
    /// Session token mint and verifier.
    pub sessions: SessionKeys,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map a vault error onto its HTTP status. The body carries only the
/// canonical status text; details stay in the server log. Unauthorized
/// and decryption failures share one status so the caller cannot tell
/// an unknown login, a wrong password, and a corrupt payload apart.
pub(crate) fn fail(err: VaultError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        VaultError::BadInput(_) => StatusCode::BAD_REQUEST,
        VaultError::Unauthorized | VaultError::Decryption(_) => StatusCode::UNAUTHORIZED,
        VaultError::ResourceNotFound => StatusCode::NOT_FOUND,
        VaultError::Conflict => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "request failed");
    } else {
        tracing::debug!(error = %err, status = %status, "request rejected");
    }

    (
        status,
        Json(ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("error")
                .to_string(),
        }),
    )
}

/// Build the Axum application with all routes and middleware.
///
/// Blob endpoints stream bodies of arbitrary size, so the request
/// deadline covers every route except those.
pub fn build_app(state: AppState, timeout: Duration) -> Router {
    let timed = Router::new()
        .merge(routes::health_routes())
        .merge(routes::auth_routes())
        .merge(routes::vault_routes())
        .layer(TimeoutLayer::new(timeout));

    Router::new()
        .merge(timed)
        .merge(routes::blob_routes())
        .with_state(Arc::new(state))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Start the API server. Runs until ctrl-c.
pub async fn serve(state: AppState, addr: &str, timeout: Duration) -> Result<()> {
    let app = build_app(state, timeout);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("keepsake listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::warn!("shutdown by signal");
        })
        .await?;

    Ok(())
}
