//! Session tokens for the HTTP API.
//!
//! `POST /auth` trades the configured password for an opaque token. Tokens
//! live in memory and are valid until the server restarts. With no password
//! configured every request is let through.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::routes::AppState;

/// Issued tokens → issue time.
#[derive(Default)]
pub struct SessionStore {
    tokens: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn issue(&self) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        self.tokens.write().await.insert(token.clone(), Utc::now());
        debug!("Session token issued");
        token
    }

    pub async fn is_valid(&self, token: &str) -> bool {
        self.tokens.read().await.contains_key(token)
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }
}

/// Compare without short-circuiting on the first differing byte.
pub fn password_matches(configured: &SecretString, given: &str) -> bool {
    let expected = configured.expose_secret().as_bytes();
    let given = given.as_bytes();
    expected.len() == given.len()
        && expected
            .iter()
            .zip(given)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Gate for state-changing routes.
pub async fn require_session(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if state.password.is_none() {
        return next.run(req).await;
    }
    let authorized = match bearer_token(&req) {
        Some(token) => state.sessions.is_valid(token).await,
        None => false,
    };
    if authorized {
        next.run(req).await
    } else {
        warn!(path = %req.uri().path(), "Rejected unauthenticated request");
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Not authenticated"})),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_matches() {
        let secret = SecretString::new("hunter2".into());
        assert!(password_matches(&secret, "hunter2"));
        assert!(!password_matches(&secret, "hunter3"));
        assert!(!password_matches(&secret, "hunter22"));
        assert!(!password_matches(&secret, ""));
    }

    #[tokio::test]
    async fn test_session_store() {
        let store = SessionStore::new();
        let token = store.issue().await;
        assert!(store.is_valid(&token).await);
        assert!(!store.is_valid("made-up").await);
        store.issue().await;
        assert_eq!(store.len().await, 2);
    }
}
