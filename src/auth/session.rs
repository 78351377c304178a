//! Signed session tokens and the cookies that carry them.
//!
//! Sessions are HS256 JWTs whose claims are a [`SessionPayload`].

use std::time::Duration;

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CredentialBundle, SessionUser};
use crate::config::SessionConfig;
use crate::error::AuthError;

pub const SESSION_COOKIE: &str = "session_token";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Everything the core needs from a request: who, and how to reach their mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub user: SessionUser,
    pub google: CredentialBundle,
    /// Expiry as a unix timestamp (seconds).
    pub exp: i64,
}

/// Issues and verifies session tokens.
pub struct SessionSigner {
    key: SecretString,
    ttl: Duration,
    secure_cookie: bool,
}

impl SessionSigner {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            key: config.secret_key.clone(),
            ttl: config.expire_after,
            secure_cookie: config.secure_cookie,
        }
    }

    /// Sign a fresh session for `user` that expires after the configured ttl.
    pub fn issue(&self, user: SessionUser, google: CredentialBundle) -> Result<String, AuthError> {
        let exp = Utc::now().timestamp() + self.ttl.as_secs() as i64;
        self.sign(&SessionPayload { user, google, exp })
    }

    pub fn sign(&self, payload: &SessionPayload) -> Result<String, AuthError> {
        let key = EncodingKey::from_secret(self.key.expose_secret().as_bytes());
        encode(&Header::new(Algorithm::HS256), payload, &key)
            .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    /// Returns the payload if the signature matches and it has not expired.
    pub fn verify(&self, token: &str) -> Option<SessionPayload> {
        let key = DecodingKey::from_secret(self.key.expose_secret().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        match decode::<SessionPayload>(token, &key, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!(error = %e, "Rejected session token");
                None
            }
        }
    }

    /// Resolve the session attached to a request.
    pub fn require(&self, headers: &HeaderMap) -> Result<SessionPayload, AuthError> {
        let token = cookie_value(headers, SESSION_COOKIE).ok_or(AuthError::Unauthenticated)?;
        self.verify(&token).ok_or(AuthError::InvalidSession)
    }

    /// `Set-Cookie` value carrying a session token.
    pub fn session_cookie(&self, token: &str) -> String {
        build_cookie(SESSION_COOKIE, token, self.ttl.as_secs(), self.secure_cookie)
    }

    /// Short-lived `Set-Cookie` value carrying the OAuth `state`.
    pub fn state_cookie(&self, state: &str) -> String {
        build_cookie(OAUTH_STATE_COOKIE, state, 600, self.secure_cookie)
    }
}

fn build_cookie(name: &str, value: &str, max_age: u64, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes a cookie.
pub fn expired_cookie(name: &str) -> String {
    format!("{name}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

/// Read a cookie from the request's `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
        .filter(|v| !v.is_empty())
}
