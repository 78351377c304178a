//! REST endpoint for chat commands.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::llm::provider::ChatMessage;
use crate::server::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ChatCommandRequest {
    pub message: String,
    /// Earlier turns. Accepted for client compatibility; each command stands alone.
    #[serde(default)]
    pub context: Option<Vec<ChatMessage>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub messages: Vec<ChatMessage>,
}

/// POST /chat/command
async fn command(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChatCommandRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let session = state.sessions.require(&headers)?;
    let request_id = Uuid::new_v4();
    let span = info_span!("chat_command", %request_id, user_id = %session.user.id);

    async move {
        info!(
            context_len = req.context.as_ref().map_or(0, Vec::len),
            "Handling chat command"
        );
        let messages = state.dispatcher.handle(&req.message, &session.google).await?;
        Ok::<_, ApiError>(Json(ChatResponse { messages }))
    }
    .instrument(span)
    .await
}

/// Build the chat routes.
pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/chat/command", post(command))
}
