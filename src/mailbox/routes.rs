//! REST endpoints over the signed-in user's mailbox.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::server::{ApiError, AppState};

const DEFAULT_LIST_SIZE: usize = 5;
const DEFAULT_CATEGORIZE_SIZE: usize = 10;
const MAX_RESULTS_CAP: usize = 50;

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default)]
    max_results: Option<usize>,
}

impl ListParams {
    fn clamped(&self, default: usize) -> usize {
        self.max_results.unwrap_or(default).clamp(1, MAX_RESULTS_CAP)
    }
}

#[derive(Debug, Deserialize)]
struct SendRequest {
    to: String,
    subject: String,
    body: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReplyDraftRequest {
    #[serde(default)]
    instruction: Option<String>,
}

/// GET /mail/messages
async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.sessions.require(&headers)?;
    let messages = state
        .mailbox
        .list_latest(&session.google, params.clamped(DEFAULT_LIST_SIZE))
        .await?;
    Ok(Json(serde_json::json!({ "messages": messages })))
}

/// POST /mail/send
async fn send(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.sessions.require(&headers)?;
    let id = state
        .mailbox
        .send_email(
            &session.google,
            &session.user.email,
            &req.to,
            &req.subject,
            &req.body,
        )
        .await?;
    info!(user_id = %session.user.id, message_id = %id, "Sent email");
    Ok(Json(serde_json::json!({ "id": id })))
}

/// POST /mail/messages/{id}/reply-draft
///
/// Drafts a reply with the summarizer. Nothing is sent.
async fn reply_draft(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Option<Json<ReplyDraftRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.sessions.require(&headers)?;
    let req = body.map(|Json(r)| r).unwrap_or_default();

    let message = state.mailbox.get_message(&session.google, &id).await?;
    let email = format!(
        "From: {}\nSubject: {}\n\n{}",
        message.sender, message.subject, message.body
    );
    let draft = state
        .summarizer
        .generate_reply(&email, req.instruction.as_deref())
        .await?;
    Ok(Json(serde_json::json!({ "id": id, "draft": draft })))
}

/// GET /mail/categories
async fn categories(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.sessions.require(&headers)?;
    let messages = state
        .mailbox
        .list_latest(&session.google, params.clamped(DEFAULT_CATEGORIZE_SIZE))
        .await?;
    let categories = if messages.is_empty() {
        Default::default()
    } else {
        state.summarizer.categorize(&messages).await?
    };
    Ok(Json(serde_json::json!({
        "messages": messages,
        "categories": categories,
    })))
}

/// Build the mail routes.
pub fn mail_routes() -> Router<AppState> {
    Router::new()
        .route("/mail/messages", get(list_messages))
        .route("/mail/messages/{id}/reply-draft", post(reply_draft))
        .route("/mail/send", post(send))
        .route("/mail/categories", get(categories))
}
