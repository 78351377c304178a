//! REST endpoints for the Google sign-in flow and the current session.

use axum::extract::{Query, State};
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, warn};

use super::GoogleOAuth;
use super::session::{OAUTH_STATE_COOKIE, SESSION_COOKIE, cookie_value, expired_cookie};
use crate::error::AuthError;
use crate::server::{ApiError, AppState};

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: String,
    #[serde(default)]
    state: Option<String>,
}

/// GET /auth/google/login
///
/// Returns the consent URL and pins the OAuth `state` in a cookie.
async fn google_login(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let oauth_state = GoogleOAuth::new_state();
    let auth_url = state.oauth.authorization_url(&oauth_state)?;
    Ok((
        AppendHeaders([(SET_COOKIE, state.sessions.state_cookie(&oauth_state))]),
        Json(serde_json::json!({ "auth_url": auth_url })),
    ))
}

/// GET /auth/google/callback
///
/// Exchanges the code, verifies the identity token, sets the session cookie
/// and redirects to the frontend.
async fn google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Result<impl IntoResponse, ApiError> {
    let expected = cookie_value(&headers, OAUTH_STATE_COOKIE);
    if expected.is_none() || expected != params.state {
        warn!("OAuth callback with missing or mismatched state");
        return Err(AuthError::StateMismatch.into());
    }

    let grant = state.oauth.exchange_code(&params.code).await?;
    let id_token = grant
        .extra_fields()
        .id_token
        .as_deref()
        .ok_or_else(|| AuthError::InvalidIdToken("no id_token in token response".into()))?;
    let user = state.oauth.verify_id_token(id_token).await?;
    let credentials = state.oauth.credential_bundle(&grant);

    info!(user_id = %user.id, "User signed in");
    let token = state.sessions.issue(user, credentials)?;

    Ok((
        StatusCode::FOUND,
        AppendHeaders([
            (LOCATION, state.config.server.frontend_url.clone()),
            (SET_COOKIE, state.sessions.session_cookie(&token)),
            (SET_COOKIE, expired_cookie(OAUTH_STATE_COOKIE)),
        ]),
    ))
}

/// POST /auth/logout
async fn logout() -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, expired_cookie(SESSION_COOKIE))]),
        Json(serde_json::json!({ "ok": true })),
    )
}

/// GET /auth/me
async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.sessions.require(&headers)?;
    Ok(Json(serde_json::json!({ "user": session.user })))
}

/// Build the auth routes.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/google/login", get(google_login))
        .route("/auth/google/callback", get(google_callback))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}
