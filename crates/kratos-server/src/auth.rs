use std::collections::HashMap;
use std::sync::Mutex;

use axum::{
    extract::{Request, State},
    http::header::{AUTHORIZATION, COOKIE},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use sha2::Sha256;

use crate::{error::ApiError, state::AppState};

pub const SESSION_COOKIE: &str = "admin_session";

/// Derive a comparison digest with PBKDF2-HMAC-SHA256, salted with
/// the login name. Only digests are kept or compared, never the
/// password itself.
fn credential_digest(username: &str, password: &str) -> String {
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        username.as_bytes(),
        10_000,
        &mut key,
    );
    hex::encode(key)
}

/// The single admin login, configured through the environment.
pub struct AdminCredentials {
    username: String,
    digest: String,
}

impl AdminCredentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            digest: credential_digest(username, password),
        }
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        username == self.username && credential_digest(username, password) == self.digest
    }
}

struct Session {
    username: String,
    issued_at: DateTime<Utc>,
}

/// Opaque server-side session tokens with a bounded lifetime. The
/// token is 32 random bytes, hex encoded; nothing about it can be
/// forged or decoded client-side.
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(ttl_hours: i64) -> Self {
        Self {
            ttl: Duration::hours(ttl_hours),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn issue(&self, username: &str) -> String {
        let token = hex::encode(rand::random::<[u8; 32]>());
        self.sessions.lock().unwrap().insert(
            token.clone(),
            Session {
                username: username.to_string(),
                issued_at: Utc::now(),
            },
        );
        token
    }

    /// Resolve a token to its username, dropping it when expired.
    pub fn validate(&self, token: &str) -> Option<String> {
        let mut sessions = self.sessions.lock().unwrap();
        let expired = match sessions.get(token) {
            Some(session) => Utc::now() - session.issued_at >= self.ttl,
            None => return None,
        };
        if expired {
            sessions.remove(token);
            return None;
        }
        sessions.get(token).map(|s| s.username.clone())
    }

    pub fn revoke(&self, token: &str) {
        self.sessions.lock().unwrap().remove(token);
    }
}

/// Pull the session token from a bearer header or the session
/// cookie.
pub fn extract_token(request: &Request) -> Option<String> {
    if let Some(auth) = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }
    let cookies = request.headers().get(COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|cookie| {
        cookie
            .trim()
            .strip_prefix(SESSION_COOKIE)?
            .strip_prefix('=')
            .map(|token| token.to_string())
    })
}

/// Middleware guarding everything behind the login.
pub async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authenticated = extract_token(&request)
        .and_then(|token| state.sessions.validate(&token))
        .is_some();
    if !authenticated {
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_verify() {
        let creds = AdminCredentials::new("admin", "opensesame");
        assert!(creds.verify("admin", "opensesame"));
        assert!(!creds.verify("admin", "wrong"));
        assert!(!creds.verify("other", "opensesame"));
    }

    #[test]
    fn test_session_issue_validate_revoke() {
        let store = SessionStore::new(24);
        let token = store.issue("admin");
        assert_eq!(token.len(), 64);
        assert_eq!(store.validate(&token).as_deref(), Some("admin"));

        store.revoke(&token);
        assert_eq!(store.validate(&token), None);
        assert_eq!(store.validate("forged"), None);
    }

    #[test]
    fn test_session_expiry() {
        // Zero lifetime: every token is already stale
        let store = SessionStore::new(0);
        let token = store.issue("admin");
        assert_eq!(store.validate(&token), None);
    }
}
