//! Identity and delegated mailbox credentials.
//!
//! The Google consent flow produces a verified [`SessionUser`] and a
//! [`CredentialBundle`]; both travel inside a signed session cookie and are
//! handed to the mailbox on every request. Nothing here is persisted.

pub mod google;
pub mod routes;
pub mod session;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use google::{GoogleOAuth, TokenGrant};
pub use session::{SessionPayload, SessionSigner};

/// Tokens and client registration needed to act on a user's mailbox.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialBundle {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// The signed-in user, as verified by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}
