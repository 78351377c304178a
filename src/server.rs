//! HTTP surface: shared state, error responses and the router.

use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{error, warn};

use crate::auth::routes::auth_routes;
use crate::auth::{GoogleOAuth, SessionSigner};
use crate::chat::Dispatcher;
use crate::chat::routes::chat_routes;
use crate::config::AppConfig;
use crate::error::{AuthError, ChatError, LlmError, MailboxError};
use crate::mailbox::Mailbox;
use crate::mailbox::routes::mail_routes;
use crate::summarizer::Summarizer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionSigner>,
    pub oauth: Arc<GoogleOAuth>,
    pub mailbox: Arc<dyn Mailbox>,
    pub summarizer: Arc<dyn Summarizer>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        mailbox: Arc<dyn Mailbox>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        let sessions = Arc::new(SessionSigner::new(&config.session));
        let oauth = Arc::new(GoogleOAuth::new(config.google.clone()));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&mailbox),
            Arc::clone(&summarizer),
        ));
        Self {
            config: Arc::new(config),
            sessions,
            oauth,
            mailbox,
            summarizer,
            dispatcher,
        }
    }

    /// Replace the OAuth client (custom endpoints).
    pub fn with_oauth(mut self, oauth: GoogleOAuth) -> Self {
        self.oauth = Arc::new(oauth);
        self
    }
}

/// Build the full router: health, auth, chat and mail routes behind CORS.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins());

    Router::new()
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(chat_routes())
        .merge(mail_routes())
        .with_state(state)
        .layer(cors)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ── Errors ──────────────────────────────────────────────────────────────

/// Error returned by handlers. Renders as `{"detail": "..."}`.
///
/// Provider failures are logged in full and answered with a generic message;
/// mailbox contents and credentials never reach the response body.
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    Mailbox(MailboxError),
    Llm(LlmError),
    Chat(ChatError),
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Auth(e)
    }
}

impl From<MailboxError> for ApiError {
    fn from(e: MailboxError) -> Self {
        ApiError::Mailbox(e)
    }
}

impl From<LlmError> for ApiError {
    fn from(e: LlmError) -> Self {
        ApiError::Llm(e)
    }
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        ApiError::Chat(e)
    }
}

impl ApiError {
    fn status_and_detail(&self) -> (StatusCode, String) {
        match self {
            ApiError::Auth(e) => match e {
                AuthError::Unauthenticated | AuthError::InvalidSession => {
                    (StatusCode::UNAUTHORIZED, e.to_string())
                }
                AuthError::InvalidIdToken(_) => {
                    (StatusCode::BAD_REQUEST, "Invalid ID token from Google".into())
                }
                AuthError::StateMismatch => (StatusCode::BAD_REQUEST, e.to_string()),
                AuthError::TokenExchange(_) => (
                    StatusCode::BAD_REQUEST,
                    "Failed to exchange authorization code".into(),
                ),
                AuthError::Encoding(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create session".into(),
                ),
            },
            ApiError::Mailbox(e) => mailbox_status(e),
            ApiError::Llm(_) => (
                StatusCode::BAD_GATEWAY,
                "Text generation request failed".into(),
            ),
            ApiError::Chat(ChatError::Mailbox(MailboxError::AuthFailed)) => (
                StatusCode::UNAUTHORIZED,
                "Mail provider rejected the session credentials".into(),
            ),
            ApiError::Chat(_) => (
                StatusCode::BAD_GATEWAY,
                "Failed to process command".into(),
            ),
        }
    }
}

fn mailbox_status(e: &MailboxError) -> (StatusCode, String) {
    match e {
        MailboxError::NotFound { .. } => (StatusCode::NOT_FOUND, "Message not found".into()),
        MailboxError::AuthFailed => (
            StatusCode::UNAUTHORIZED,
            "Mail provider rejected the session credentials".into(),
        ),
        MailboxError::Compose(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        _ => (
            StatusCode::BAD_GATEWAY,
            "Mail provider request failed".into(),
        ),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();
        let cause: &dyn std::error::Error = match &self {
            ApiError::Auth(e) => e,
            ApiError::Mailbox(e) => e,
            ApiError::Llm(e) => e,
            ApiError::Chat(e) => e,
        };
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %cause, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %cause, "Request rejected");
        }
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}
