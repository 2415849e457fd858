/// Session token extraction for authenticated routes.
///
/// The Authorization header carries the raw token (no scheme prefix).
/// After verification the authenticated login is available to handlers
/// via Axum's extractor pattern.
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::Json;

use super::{fail, AppState, ErrorResponse};
use crate::error::VaultError;

/// Authenticated login extracted from a verified session token.
///
/// Use this as an extractor in route handlers to require a session:
/// ```ignore
/// async fn handler(user: AuthUser) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub login: String,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| fail(VaultError::Unauthorized))?;

        let login = state.sessions.identify(token).map_err(fail)?;

        Ok(AuthUser { login })
    }
}
