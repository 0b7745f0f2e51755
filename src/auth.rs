//! Bearer-token authentication for the HTTP transport.
//!
//! Verbatim query execution is exposed to whoever can reach the endpoint, so
//! the HTTP transport can require one of a configured set of tokens.
//! Comparison is constant-time.

use crate::error::{DbError, DbResult};
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

/// Accepted bearer tokens. Empty means authentication is off.
#[derive(Clone, Default)]
pub struct AuthConfig {
    tokens: HashSet<String>,
}

impl AuthConfig {
    /// Build from configured tokens; blank entries are a configuration error.
    pub fn from_tokens<I, S>(tokens: I) -> DbResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut accepted = HashSet::new();
        for token in tokens {
            let trimmed = token.as_ref().trim();
            if trimmed.is_empty() {
                return Err(DbError::validation("Empty token value in MCP_AUTH_TOKENS"));
            }
            accepted.insert(trimmed.to_string());
        }
        Ok(Self { tokens: accepted })
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        !self.tokens.is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Check `provided` against every accepted token without short-circuiting.
    pub fn verify(&self, provided: &str) -> bool {
        self.tokens.iter().fold(false, |found, expected| {
            found | constant_time_eq(provided.as_bytes(), expected.as_bytes())
        })
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

/// Reject requests without a valid `Authorization: Bearer <token>` header.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer_token(&request) {
        Ok(Some(token)) => token,
        Ok(None) => {
            warn!("Authentication failed: missing Authorization header");
            return unauthorized("Missing Bearer token in Authorization header");
        }
        Err(msg) => {
            warn!("Authentication failed: malformed Authorization header");
            return unauthorized(msg);
        }
    };

    if auth.verify(token) {
        debug!("Request authenticated");
        next.run(request).await
    } else {
        warn!(token_prefix = %mask_token(token), "Authentication failed: invalid token");
        unauthorized("Invalid Bearer token")
    }
}

fn extract_bearer_token(request: &Request<Body>) -> Result<Option<&str>, &'static str> {
    let Some(value) = request.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| "Authorization header contains invalid characters")?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or("Invalid Authorization header format. Expected 'Bearer <token>'")?;

    if token.is_empty() {
        return Err("Bearer token is empty");
    }
    Ok(Some(token))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

fn mask_token(token: &str) -> String {
    match token.char_indices().nth(3) {
        Some((idx, _)) => format!("{}***", &token[..idx]),
        None => "***".to_string(),
    }
}

fn unauthorized(message: &str) -> Response {
    #[derive(Serialize)]
    struct ErrorBody<'a> {
        error: &'a str,
    }

    let body = serde_json::to_string(&ErrorBody {
        error: &format!("Error: {}", message),
    })
    .unwrap_or_else(|_| r#"{"error":"Error: Authentication failed"}"#.to_string());

    (
        StatusCode::UNAUTHORIZED,
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::WWW_AUTHENTICATE, "Bearer"),
        ],
        body,
    )
        .into_response()
}
