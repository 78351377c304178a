//! HTTP contract of the assembled router, driven in-process with `oneshot`.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::extract::Query;
use axum::http::{Method, Request, StatusCode, header};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt;

use common::{StubMailbox, StubSummarizer, creds};
use mail_assist::auth::{GoogleOAuth, SessionUser};
use mail_assist::config::AppConfig;
use mail_assist::server::{AppState, build_router};

const FRONTEND: &str = "http://localhost:5173";

fn config() -> AppConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("FRONTEND_URL", FRONTEND),
        ("SESSION_SECRET_KEY", "integration-secret"),
        ("GOOGLE_CLIENT_ID", "client-123.apps.googleusercontent.com"),
        ("GOOGLE_CLIENT_SECRET", "shh"),
        ("GOOGLE_REDIRECT_URI", "http://localhost:8080/auth/google/callback"),
        ("GEMINI_API_KEY", "test-key"),
    ]);
    AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

fn user() -> SessionUser {
    SessionUser {
        id: "1234567890".into(),
        email: "alice@example.com".into(),
        name: Some("Alice".into()),
        picture: None,
    }
}

/// Router plus a valid `Cookie` header value for it.
fn app_with(mailbox: StubMailbox) -> (Router, String, Arc<StubMailbox>) {
    let mailbox = Arc::new(mailbox);
    let state = AppState::new(config(), mailbox.clone(), Arc::new(StubSummarizer::default()));
    let token = state.sessions.issue(user(), creds()).unwrap();
    (
        build_router(state),
        format!("session_token={token}"),
        mailbox,
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn chat_request(cookie: Option<&str>, message: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/chat/command")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(serde_json::json!({ "message": message }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let (app, _, _) = app_with(StubMailbox::default());
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn chat_requires_session() {
    let (app, _, mailbox) = app_with(StubMailbox::with_messages(3));

    let (status, body) = send(&app, chat_request(None, "show my last emails")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Not authenticated");

    let (status, body) = send(
        &app,
        chat_request(Some("session_token=forged.token"), "show my last emails"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid token");

    assert!(mailbox.list_calls().is_empty());
}

#[tokio::test]
async fn chat_command_returns_ordered_messages() {
    let (app, cookie, _) = app_with(StubMailbox::with_messages(2));

    let request = Request::post("/chat/command")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, &cookie)
        .body(Body::from(
            r#"{"message": "delete email 2", "context": [{"role": "assistant", "content": "hi"}]}"#,
        ))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "delete email 2");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(
        messages[2]["content"],
        "Deleted email 2:\nFrom: sender2@example.com\nSubject: Subject 2"
    );
}

#[tokio::test]
async fn chat_provider_failure_is_generic() {
    let (app, cookie, _) = app_with(StubMailbox {
        list_fails: true,
        ..Default::default()
    });

    let (status, body) = send(&app, chat_request(Some(&cookie), "digest")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["detail"], "Failed to process command");
}

#[tokio::test]
async fn me_returns_session_user() {
    let (app, cookie, _) = app_with(StubMailbox::default());
    let request = Request::get("/auth/me")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert!(body["user"].get("google").is_none());
}

#[tokio::test]
async fn logout_expires_cookie() {
    let (app, _, _) = app_with(StubMailbox::default());
    let request = Request::post("/auth/logout").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("session_token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn login_pins_state_cookie() {
    let (app, _, _) = app_with(StubMailbox::default());
    let request = Request::get("/auth/google/login").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .to_string();
    let state = cookie
        .strip_prefix("oauth_state=")
        .and_then(|rest| rest.split(';').next())
        .unwrap()
        .to_string();

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let auth_url = body["auth_url"].as_str().unwrap();
    assert!(auth_url.starts_with("https://accounts.google.com/"));
    assert!(auth_url.contains(&format!("state={state}")));
    assert!(auth_url.contains("client_id=client-123.apps.googleusercontent.com"));
}

#[tokio::test]
async fn callback_rejects_mismatched_state() {
    let (app, _, _) = app_with(StubMailbox::default());
    let request = Request::get("/auth/google/callback?code=abc&state=attacker")
        .header(header::COOKIE, "oauth_state=expected")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "OAuth state mismatch");
}

#[tokio::test]
async fn mail_messages_lists_normalized() {
    let (app, cookie, mailbox) = app_with(StubMailbox::with_messages(8));
    let request = Request::get("/mail/messages?max_results=3")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["threadId"], "thread-1");
    assert_eq!(mailbox.list_calls(), vec![3]);
}

#[tokio::test]
async fn reply_draft_for_unknown_message_is_404() {
    let (app, cookie, _) = app_with(StubMailbox::with_messages(1));
    let request = Request::post("/mail/messages/nope/reply-draft")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Message not found");
}

#[tokio::test]
async fn reply_draft_uses_summarizer() {
    let (app, cookie, _) = app_with(StubMailbox::with_messages(1));
    let request = Request::post("/mail/messages/id-1/reply-draft")
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"instruction": "Say yes."}"#))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["draft"], "draft");
}

#[tokio::test]
async fn cors_allows_frontend_with_credentials() {
    let (app, _, _) = app_with(StubMailbox::default());
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/chat/command")
        .header(header::ORIGIN, FRONTEND)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], FRONTEND);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

/// Mock Google token and tokeninfo endpoints; returns their URIs.
async fn start_google_mock() -> (String, String) {
    async fn token(Form(form): Form<HashMap<String, String>>) -> Json<Value> {
        assert_eq!(form["grant_type"], "authorization_code");
        assert_eq!(form["code"], "auth-code");
        Json(json!({
            "access_token": "ya29.access",
            "refresh_token": "1//refresh",
            "id_token": "header.claims.sig",
            "expires_in": 3599,
            "scope": "openid https://www.googleapis.com/auth/gmail.modify",
            "token_type": "Bearer"
        }))
    }

    async fn tokeninfo(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        assert_eq!(params["id_token"], "header.claims.sig");
        let exp = chrono::Utc::now().timestamp() + 3600;
        Json(json!({
            "iss": "https://accounts.google.com",
            "aud": "client-123.apps.googleusercontent.com",
            "sub": "1234567890",
            "email": "alice@example.com",
            "name": "Alice",
            "exp": exp.to_string()
        }))
    }

    let app = Router::new()
        .route("/token", post(token))
        .route("/tokeninfo", get(tokeninfo));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (
        format!("http://127.0.0.1:{port}/token"),
        format!("http://127.0.0.1:{port}/tokeninfo"),
    )
}

#[tokio::test]
async fn callback_signs_in_and_redirects() {
    let (token_uri, tokeninfo_uri) = start_google_mock().await;
    let config = config();
    let oauth = GoogleOAuth::with_endpoints(config.google.clone(), &token_uri, &tokeninfo_uri);
    let state = AppState::new(
        config,
        Arc::new(StubMailbox::default()),
        Arc::new(StubSummarizer::default()),
    )
    .with_oauth(oauth);
    let sessions = Arc::clone(&state.sessions);
    let app = build_router(state);

    let request = Request::get("/auth/google/callback?code=auth-code&state=s1")
        .header(header::COOKIE, "oauth_state=s1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], FRONTEND);

    let cookies: Vec<&str> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("oauth_state=;")));
    let session_cookie = cookies
        .iter()
        .find(|c| c.starts_with("session_token="))
        .unwrap();
    assert!(session_cookie.contains("HttpOnly"));

    let token = session_cookie
        .strip_prefix("session_token=")
        .and_then(|rest| rest.split(';').next())
        .unwrap();
    let payload = sessions.verify(token).unwrap();
    assert_eq!(payload.user.email, "alice@example.com");
    assert_eq!(payload.google.access_token, "ya29.access");
    assert_eq!(payload.google.refresh_token.as_deref(), Some("1//refresh"));
    assert_eq!(payload.google.token_uri, token_uri);
}
