/// Signed session tokens carrying the authenticated login.
///
/// Tokens are HMAC-SHA256 JWTs with claims `{sub: login, exp}`. The
/// verifier accepts HS256 only, so a token re-signed under another
/// algorithm (the classic algorithm-confusion attack) is rejected
/// before its signature is ever checked. Tokens are not stored
/// server-side; expiry is the only revocation.
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

/// Claims carried inside a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated login.
    pub sub: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

/// Token mint and verifier. The server secret lives only in memory.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifespan: Duration,
}

impl SessionKeys {
    pub fn new(secret: &[u8], lifespan: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            lifespan,
        }
    }

    /// Mint a token for a login, expiring `lifespan` from now.
    pub fn issue(&self, login: &str) -> Result<String> {
        let claims = Claims {
            sub: login.to_string(),
            exp: Utc::now().timestamp() + self.lifespan.as_secs() as i64,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| VaultError::Token(e.to_string()))
    }

    /// Verify a token and extract the login it was minted for.
    ///
    /// Bad signature, wrong algorithm, malformed token, and expiry all
    /// collapse to `Unauthorized`.
    pub fn identify(&self, token: &str) -> Result<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| VaultError::Unauthorized)?;

        Ok(data.claims.sub)
    }
}
