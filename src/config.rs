//! Configuration types.
//!
//! Everything is read once at startup into an [`AppConfig`] and passed by
//! reference to the components that need it.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{DEFAULT_MODEL, LlmConfig};
use crate::retry::RetryPolicy;

pub const DEFAULT_GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

pub const DEFAULT_OAUTH_SCOPES: &str = "openid \
     https://www.googleapis.com/auth/userinfo.email \
     https://www.googleapis.com/auth/userinfo.profile \
     https://www.googleapis.com/auth/gmail.modify \
     https://www.googleapis.com/auth/gmail.send";

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. Empty means "only the frontend".
    pub cors_origins: Vec<String>,
    /// Where the OAuth callback redirects once the session cookie is set.
    pub frontend_url: String,
}

/// Session cookie settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret_key: SecretString,
    pub expire_after: Duration,
    /// Mark the cookie `Secure` (set this behind HTTPS).
    pub secure_cookie: bool,
}

/// Google OAuth client registration.
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub gmail_api_base: String,
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub google: GoogleOAuthConfig,
    pub llm: LlmConfig,
    pub retry: RetryPolicy,
}

impl AppConfig {
    /// Build config from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let server = ServerConfig {
            host: vars.or("APP_HOST", "0.0.0.0"),
            port: vars.parsed("APP_PORT", 8080)?,
            cors_origins: vars.list("CORS_ORIGINS", ','),
            frontend_url: vars.required("FRONTEND_URL")?,
        };

        let expire_minutes: u64 = vars.parsed("ACCESS_TOKEN_EXPIRE_MINUTES", 60 * 24)?;
        let session = SessionConfig {
            secret_key: SecretString::from(vars.required("SESSION_SECRET_KEY")?),
            expire_after: Duration::from_secs(expire_minutes * 60),
            secure_cookie: vars.parsed("SESSION_COOKIE_SECURE", false)?,
        };

        let mut scopes: Vec<String> = vars.list("GOOGLE_OAUTH_SCOPES", ' ');
        if scopes.is_empty() {
            scopes = DEFAULT_OAUTH_SCOPES
                .split_whitespace()
                .map(str::to_string)
                .collect();
        }
        let google = GoogleOAuthConfig {
            client_id: vars.required("GOOGLE_CLIENT_ID")?,
            client_secret: SecretString::from(vars.required("GOOGLE_CLIENT_SECRET")?),
            redirect_uri: vars.required("GOOGLE_REDIRECT_URI")?,
            scopes,
            gmail_api_base: vars.or("GMAIL_API_BASE", DEFAULT_GMAIL_API_BASE),
        };

        let llm = LlmConfig {
            api_key: SecretString::from(vars.required("GEMINI_API_KEY")?),
            model: vars.or("MAIL_ASSIST_MODEL", DEFAULT_MODEL),
        };

        let retry = RetryPolicy {
            max_attempts: vars.parsed("RETRY_MAX_ATTEMPTS", 3)?,
            base_delay: Duration::from_millis(vars.parsed("RETRY_BASE_DELAY_MS", 1000)?),
            max_delay: Duration::from_millis(vars.parsed("RETRY_MAX_DELAY_MS", 10_000)?),
        };
        if retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "RETRY_MAX_ATTEMPTS".into(),
                message: "must be at least 1".into(),
            });
        }

        Ok(Self {
            server,
            session,
            google,
            llm,
            retry,
        })
    }

    /// Origins allowed to call the API with credentials.
    pub fn allowed_origins(&self) -> Vec<String> {
        if self.server.cors_origins.is_empty() {
            vec![self.server.frontend_url.trim_end_matches('/').to_string()]
        } else {
            self.server.cors_origins.clone()
        }
    }
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn list(&self, key: &str, sep: char) -> Vec<String> {
        self.get(key)
            .unwrap_or_default()
            .split(sep)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
