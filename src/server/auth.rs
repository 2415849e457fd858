/// Registration and login handlers.
///
/// Both take a JSON body `{username, password}`. A successful login
/// answers with the session token in the Authorization response header;
/// the server keeps no record of issued tokens.
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderName, StatusCode};
use axum::Json;

use super::{fail, AppState, ErrorResponse};
use crate::error::VaultError;
use crate::vault::Credentials;

type Rejection = (StatusCode, Json<ErrorResponse>);

/// Pull `{username, password}` out of a JSON body. Anything missing or
/// non-string is a 400.
fn parse_creds(body: &serde_json::Value) -> Result<Credentials, Rejection> {
    let username = body
        .get("username")
        .and_then(|v| v.as_str())
        .ok_or_else(|| fail(VaultError::BadInput("missing username".into())))?;
    let password = body
        .get("password")
        .and_then(|v| v.as_str())
        .ok_or_else(|| fail(VaultError::BadInput("missing password".into())))?;

    Ok(Credentials {
        login: username.to_string(),
        password: password.to_string(),
    })
}

/// POST /register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<StatusCode, Rejection> {
    let creds = parse_creds(&body)?;

    state.vault.register(&creds).await.map_err(fail)?;

    Ok(StatusCode::OK)
}

/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, [(HeaderName, String); 1]), Rejection> {
    let creds = parse_creds(&body)?;

    state.vault.verify_password(&creds).await.map_err(fail)?;
    let token = state.sessions.issue(&creds.login).map_err(fail)?;

    tracing::info!(login = %creds.login, "login succeeded");
    Ok((StatusCode::OK, [(header::AUTHORIZATION, token)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_creds_ok() {
        let body = serde_json::json!({"username": "alice", "password": "s3cret"});
        let creds = parse_creds(&body).unwrap();
        assert_eq!(creds.login, "alice");
        assert_eq!(creds.password, "s3cret");
    }

    #[test]
    fn test_parse_creds_missing_field() {
        let body = serde_json::json!({"username": "alice"});
        let (status, _) = parse_creds(&body).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_creds_non_string_field() {
        let body = serde_json::json!({"username": "alice", "password": 42});
        let (status, _) = parse_creds(&body).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
