//! Google OAuth: consent URL, code exchange, identity-token verification.

use std::time::Duration;

use chrono::Utc;
use oauth2::basic::{
    BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
    BasicTokenType,
};
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
    EndpointSet, ExtraTokenFields, RedirectUrl, Scope, StandardRevocableToken,
    StandardTokenResponse, TokenResponse, TokenUrl,
};
use reqwest::Client;
use reqwest::redirect::Policy;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CredentialBundle, SessionUser};
use crate::config::GoogleOAuthConfig;
use crate::error::AuthError;

pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_TOKENINFO_URI: &str = "https://oauth2.googleapis.com/tokeninfo";

const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Allowed clock skew when checking id-token expiry.
const CLOCK_SKEW_SECS: i64 = 60;

/// Google adds an OpenID `id_token` to the standard token response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdTokenField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl ExtraTokenFields for IdTokenField {}

/// Token endpoint response for an authorization-code or refresh grant.
pub type TokenGrant = StandardTokenResponse<IdTokenField, BasicTokenType>;

type OAuthClient<HasAuthUrl> = oauth2::Client<
    BasicErrorResponse,
    TokenGrant,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    HasAuthUrl,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Client that can only talk to the token endpoint (code and refresh grants).
pub type TokenClient = OAuthClient<EndpointNotSet>;

/// Build a token-endpoint client from a registration. Credentials go in the
/// form body, the way Google documents its token endpoint.
pub fn token_client(
    client_id: &str,
    client_secret: &str,
    token_uri: &str,
) -> Result<TokenClient, AuthError> {
    let token_url = TokenUrl::new(token_uri.to_string())
        .map_err(|e| AuthError::Encoding(format!("invalid token uri '{token_uri}': {e}")))?;

    Ok(oauth2::Client::new(ClientId::new(client_id.to_string()))
        .set_client_secret(ClientSecret::new(client_secret.to_string()))
        .set_token_uri(token_url)
        .set_auth_type(AuthType::RequestBody))
}

/// HTTP client for OAuth endpoints. Redirects are not followed.
pub fn oauth_http_client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Claims returned by the `tokeninfo` endpoint. Numbers arrive as strings.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    iss: String,
    aud: String,
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
    exp: String,
}

/// Google OAuth client.
pub struct GoogleOAuth {
    http: Client,
    config: GoogleOAuthConfig,
    token_uri: String,
    tokeninfo_uri: String,
}

impl GoogleOAuth {
    pub fn new(config: GoogleOAuthConfig) -> Self {
        Self::with_endpoints(config, GOOGLE_TOKEN_URI, GOOGLE_TOKENINFO_URI)
    }

    /// Create a client with custom token endpoints (for testing).
    pub fn with_endpoints(config: GoogleOAuthConfig, token_uri: &str, tokeninfo_uri: &str) -> Self {
        Self {
            http: oauth_http_client(),
            config,
            token_uri: token_uri.to_string(),
            tokeninfo_uri: tokeninfo_uri.to_string(),
        }
    }

    fn client(&self) -> Result<OAuthClient<EndpointSet>, AuthError> {
        let auth_url = AuthUrl::new(GOOGLE_AUTH_URI.to_string())
            .map_err(|e| AuthError::Encoding(e.to_string()))?;
        let redirect_url = RedirectUrl::new(self.config.redirect_uri.clone()).map_err(|e| {
            AuthError::Encoding(format!(
                "invalid redirect uri '{}': {e}",
                self.config.redirect_uri
            ))
        })?;

        Ok(token_client(
            &self.config.client_id,
            self.config.client_secret.expose_secret(),
            &self.token_uri,
        )?
        .set_auth_uri(auth_url)
        .set_redirect_uri(redirect_url))
    }

    /// Random value binding the consent redirect to this browser.
    pub fn new_state() -> String {
        CsrfToken::new_random().secret().clone()
    }

    /// Consent screen URL requesting offline access.
    pub fn authorization_url(&self, state: &str) -> Result<String, AuthError> {
        let client = self.client()?;
        let state = state.to_string();
        let (url, _) = client
            .authorize_url(move || CsrfToken::new(state))
            .add_scopes(self.config.scopes.iter().cloned().map(Scope::new))
            .add_extra_param("access_type", "offline")
            .add_extra_param("include_granted_scopes", "true")
            .add_extra_param("prompt", "consent")
            .url();
        Ok(url.into())
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, AuthError> {
        let client = self.client()?;
        client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| {
                warn!(error = %e, "Authorization code exchange rejected");
                AuthError::TokenExchange(e.to_string())
            })
    }

    /// Verify an id token with Google and return the user it identifies.
    pub async fn verify_id_token(&self, id_token: &str) -> Result<SessionUser, AuthError> {
        let resp = self
            .http
            .get(&self.tokeninfo_uri)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| AuthError::InvalidIdToken(format!("verification request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AuthError::InvalidIdToken(format!(
                "rejected by Google (HTTP {})",
                resp.status()
            )));
        }

        let info: TokenInfo = resp
            .json()
            .await
            .map_err(|e| AuthError::InvalidIdToken(format!("unreadable claims: {e}")))?;

        self.check_claims(info, Utc::now().timestamp())
    }

    fn check_claims(&self, info: TokenInfo, now: i64) -> Result<SessionUser, AuthError> {
        if !GOOGLE_ISSUERS.contains(&info.iss.as_str()) {
            return Err(AuthError::InvalidIdToken(format!(
                "wrong issuer '{}'",
                info.iss
            )));
        }
        if info.aud != self.config.client_id {
            return Err(AuthError::InvalidIdToken("audience mismatch".into()));
        }
        let exp: i64 = info
            .exp
            .parse()
            .map_err(|_| AuthError::InvalidIdToken("malformed expiry".into()))?;
        if exp + CLOCK_SKEW_SECS < now {
            return Err(AuthError::InvalidIdToken("token expired".into()));
        }

        debug!(sub = %info.sub, "Verified Google identity");
        Ok(SessionUser {
            id: info.sub,
            email: info.email.unwrap_or_default(),
            name: info.name,
            picture: info.picture,
        })
    }

    /// Credentials the mailbox client will use on the user's behalf.
    pub fn credential_bundle(&self, grant: &TokenGrant) -> CredentialBundle {
        let scopes = match grant.scopes() {
            Some(scopes) if !scopes.is_empty() => {
                scopes.iter().map(|scope| scope.to_string()).collect()
            }
            _ => self.config.scopes.clone(),
        };
        CredentialBundle {
            access_token: grant.access_token().secret().clone(),
            refresh_token: grant.refresh_token().map(|t| t.secret().clone()),
            token_uri: self.token_uri.clone(),
            client_id: self.config.client_id.clone(),
            client_secret: self.config.client_secret.expose_secret().to_string(),
            scopes,
        }
    }
}
