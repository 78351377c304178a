//! Error types for Mail Assist.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Session and identity errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Invalid token")]
    InvalidSession,

    #[error("Invalid ID token from Google: {0}")]
    InvalidIdToken(String),

    #[error("OAuth state mismatch")]
    StateMismatch,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Session encoding failed: {0}")]
    Encoding(String),
}

/// Mailbox provider errors.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("Message {id} not found")]
    NotFound { id: String },

    #[error("Transient provider failure: {reason}")]
    Transient { reason: String },

    #[error("Mailbox provider rejected the credentials")]
    AuthFailed,

    #[error("Mailbox request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Invalid response from mailbox provider: {reason}")]
    InvalidResponse { reason: String },

    #[error("Failed to build outgoing message: {0}")]
    Compose(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures while dispatching a chat command.
///
/// Out-of-range and ambiguous delete targets are not errors; the dispatcher
/// turns them into assistant messages.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("Summarizer error: {0}")]
    Summarizer(#[from] LlmError),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
