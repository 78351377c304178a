//! Gmail REST client.
//!
//! Every operation runs under the configured [`RetryPolicy`]. A 401 from Gmail
//! triggers one access-token refresh (when the bundle carries a refresh
//! token); the fresh token is used for the rest of that operation only.

use std::time::Duration;

use async_trait::async_trait;
use oauth2::{RefreshToken, RequestTokenError, TokenResponse};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::normalize::{RawMessage, normalize};
use super::raw_email::build_raw_email;
use super::{Mailbox, NormalizedMessage};
use crate::auth::CredentialBundle;
use crate::auth::google::{oauth_http_client, token_client};
use crate::error::MailboxError;
use crate::retry::RetryPolicy;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

/// Gmail API client. Stateless: credentials arrive with each call.
pub struct GmailMailbox {
    client: Client,
    oauth_http: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl GmailMailbox {
    /// Create a client for the given `users/me` base URL.
    pub fn new(base_url: &str, retry: RetryPolicy) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            oauth_http: oauth_http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        }
    }

    /// Send a request with the current access token, refreshing it once on 401.
    async fn send_authorized<F>(
        &self,
        creds: &CredentialBundle,
        token: &mut String,
        id: Option<&str>,
        build: F,
    ) -> Result<Response, MailboxError>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let resp = build(token).send().await.map_err(transport_error)?;
        if resp.status() != StatusCode::UNAUTHORIZED || creds.refresh_token.is_none() {
            return check_status(resp, id).await;
        }

        debug!("Gmail rejected access token, refreshing");
        *token = self.refresh_access_token(creds).await?;
        let resp = build(token).send().await.map_err(transport_error)?;
        check_status(resp, id).await
    }

    async fn refresh_access_token(&self, creds: &CredentialBundle) -> Result<String, MailboxError> {
        let Some(refresh_token) = creds.refresh_token.clone() else {
            return Err(MailboxError::AuthFailed);
        };

        let client = token_client(&creds.client_id, &creds.client_secret, &creds.token_uri)
            .map_err(|e| MailboxError::RequestFailed {
                reason: e.to_string(),
            })?;
        let refresh_token = RefreshToken::new(refresh_token);
        let grant = client
            .exchange_refresh_token(&refresh_token)
            .request_async(&self.oauth_http)
            .await
            .map_err(|e| match e {
                RequestTokenError::ServerResponse(err) => {
                    warn!(error = %err, "Access token refresh rejected");
                    MailboxError::AuthFailed
                }
                RequestTokenError::Request(err) => MailboxError::Transient {
                    reason: format!("token refresh: {err}"),
                },
                other => MailboxError::InvalidResponse {
                    reason: format!("token refresh: {other}"),
                },
            })?;
        Ok(grant.access_token().secret().clone())
    }

    async fn list_once(
        &self,
        creds: &CredentialBundle,
        max_results: usize,
    ) -> Result<Vec<NormalizedMessage>, MailboxError> {
        let mut token = creds.access_token.clone();
        let url = format!("{}/messages", self.base_url);
        let max = max_results.to_string();

        let resp = self
            .send_authorized(creds, &mut token, None, |t| {
                self.client
                    .get(&url)
                    .bearer_auth(t)
                    .query(&[("maxResults", max.as_str())])
            })
            .await?;
        let list: MessageListResponse = decode_json(resp).await?;

        let mut messages = Vec::with_capacity(list.messages.len());
        for msg_ref in list.messages.iter().take(max_results) {
            messages.push(self.fetch(creds, &mut token, &msg_ref.id).await?);
        }

        debug!(count = messages.len(), "Listed latest messages");
        Ok(messages)
    }

    async fn get_once(
        &self,
        creds: &CredentialBundle,
        id: &str,
    ) -> Result<NormalizedMessage, MailboxError> {
        let mut token = creds.access_token.clone();
        self.fetch(creds, &mut token, id).await
    }

    async fn fetch(
        &self,
        creds: &CredentialBundle,
        token: &mut String,
        id: &str,
    ) -> Result<NormalizedMessage, MailboxError> {
        validate_id(id)?;
        let url = format!("{}/messages/{}", self.base_url, id);
        let resp = self
            .send_authorized(creds, token, Some(id), |t| {
                self.client
                    .get(&url)
                    .bearer_auth(t)
                    .query(&[("format", "full")])
            })
            .await?;
        let raw: RawMessage = decode_json(resp).await?;
        Ok(normalize(&raw))
    }

    async fn send_once(&self, creds: &CredentialBundle, raw: &str) -> Result<String, MailboxError> {
        let mut token = creds.access_token.clone();
        let url = format!("{}/messages/send", self.base_url);
        let body = serde_json::json!({ "raw": raw });
        let resp = self
            .send_authorized(creds, &mut token, None, |t| {
                self.client.post(&url).bearer_auth(t).json(&body)
            })
            .await?;
        let sent: SendResponse = decode_json(resp).await?;
        Ok(sent.id)
    }

    async fn delete_once(&self, creds: &CredentialBundle, id: &str) -> Result<(), MailboxError> {
        validate_id(id)?;
        let mut token = creds.access_token.clone();
        let url = format!("{}/messages/{}", self.base_url, id);
        self.send_authorized(creds, &mut token, Some(id), |t| {
            self.client.delete(&url).bearer_auth(t)
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Mailbox for GmailMailbox {
    async fn list_latest(
        &self,
        creds: &CredentialBundle,
        max_results: usize,
    ) -> Result<Vec<NormalizedMessage>, MailboxError> {
        self.retry
            .run("gmail.list_latest", move || self.list_once(creds, max_results))
            .await
    }

    async fn get_message(
        &self,
        creds: &CredentialBundle,
        id: &str,
    ) -> Result<NormalizedMessage, MailboxError> {
        self.retry
            .run("gmail.get_message", move || self.get_once(creds, id))
            .await
    }

    async fn send_email(
        &self,
        creds: &CredentialBundle,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, MailboxError> {
        let raw = build_raw_email(to, subject, body, from)?;
        let raw = raw.as_str();
        let id = self
            .retry
            .run("gmail.send_email", move || self.send_once(creds, raw))
            .await?;
        info!(message_id = %id, "Email sent");
        Ok(id)
    }

    async fn delete_by_id(&self, creds: &CredentialBundle, id: &str) -> Result<(), MailboxError> {
        self.retry
            .run("gmail.delete", move || self.delete_once(creds, id))
            .await?;
        info!(message_id = %id, "Email deleted");
        Ok(())
    }
}

/// Reject ids that would change the request path.
fn validate_id(id: &str) -> Result<(), MailboxError> {
    if id.is_empty() || id.contains(['/', '\\', '?', '#']) || id.contains("..") {
        return Err(MailboxError::RequestFailed {
            reason: format!("invalid message id {id:?}"),
        });
    }
    Ok(())
}

fn transport_error(e: reqwest::Error) -> MailboxError {
    MailboxError::Transient {
        reason: e.to_string(),
    }
}

async fn check_status(resp: Response, id: Option<&str>) -> Result<Response, MailboxError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::NOT_FOUND => MailboxError::NotFound {
            id: id.unwrap_or_default().to_string(),
        },
        StatusCode::UNAUTHORIZED => MailboxError::AuthFailed,
        StatusCode::TOO_MANY_REQUESTS => MailboxError::Transient {
            reason: format!("rate limited: {body}"),
        },
        s if s.is_server_error() => MailboxError::Transient {
            reason: format!("HTTP {s}: {body}"),
        },
        s => MailboxError::RequestFailed {
            reason: format!("HTTP {s}: {body}"),
        },
    })
}

async fn decode_json<T: for<'de> Deserialize<'de>>(resp: Response) -> Result<T, MailboxError> {
    resp.json().await.map_err(|e| MailboxError::InvalidResponse {
        reason: e.to_string(),
    })
}
