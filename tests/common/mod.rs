//! Stub collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use mail_assist::auth::CredentialBundle;
use mail_assist::error::{LlmError, MailboxError};
use mail_assist::mailbox::{Mailbox, NormalizedMessage};
use mail_assist::summarizer::{Categories, Summarizer};

/// In-memory mailbox that records every call.
#[derive(Default)]
pub struct StubMailbox {
    pub messages: Vec<NormalizedMessage>,
    pub list_calls: Mutex<Vec<usize>>,
    pub deleted: Mutex<Vec<String>>,
    pub delete_not_found: bool,
    pub list_fails: bool,
}

impl StubMailbox {
    pub fn with_messages(n: usize) -> Self {
        Self {
            messages: (1..=n).map(message).collect(),
            ..Default::default()
        }
    }

    pub fn list_calls(&self) -> Vec<usize> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailbox for StubMailbox {
    async fn list_latest(
        &self,
        _creds: &CredentialBundle,
        max_results: usize,
    ) -> Result<Vec<NormalizedMessage>, MailboxError> {
        self.list_calls.lock().unwrap().push(max_results);
        if self.list_fails {
            return Err(MailboxError::Transient {
                reason: "503".into(),
            });
        }
        Ok(self.messages.iter().take(max_results).cloned().collect())
    }

    async fn get_message(
        &self,
        _creds: &CredentialBundle,
        id: &str,
    ) -> Result<NormalizedMessage, MailboxError> {
        self.messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| MailboxError::NotFound { id: id.into() })
    }

    async fn send_email(
        &self,
        _creds: &CredentialBundle,
        _from: &str,
        _to: &str,
        _subject: &str,
        _body: &str,
    ) -> Result<String, MailboxError> {
        Ok("sent-1".into())
    }

    async fn delete_by_id(&self, _creds: &CredentialBundle, id: &str) -> Result<(), MailboxError> {
        if self.delete_not_found {
            return Err(MailboxError::NotFound { id: id.into() });
        }
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

/// Summarizer that echoes its input and counts calls.
#[derive(Default)]
pub struct StubSummarizer {
    pub summarized: Mutex<Vec<String>>,
    pub digests: Mutex<Vec<usize>>,
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, body: &str) -> Result<String, LlmError> {
        self.summarized.lock().unwrap().push(body.to_string());
        Ok(format!("summary of {body}"))
    }

    async fn generate_reply(
        &self,
        _email: &str,
        _instruction: Option<&str>,
    ) -> Result<String, LlmError> {
        Ok("draft".into())
    }

    async fn digest(&self, messages: &[NormalizedMessage]) -> Result<String, LlmError> {
        self.digests.lock().unwrap().push(messages.len());
        Ok(format!("digest of {} emails", messages.len()))
    }

    async fn categorize(&self, _messages: &[NormalizedMessage]) -> Result<Categories, LlmError> {
        Ok(BTreeMap::new())
    }
}

pub fn message(n: usize) -> NormalizedMessage {
    NormalizedMessage {
        id: format!("id-{n}"),
        thread_id: format!("thread-{n}"),
        subject: format!("Subject {n}"),
        sender: format!("sender{n}@example.com"),
        body: format!("body {n}"),
    }
}

pub fn creds() -> CredentialBundle {
    CredentialBundle {
        access_token: "access".into(),
        refresh_token: None,
        token_uri: "https://oauth2.googleapis.com/token".into(),
        client_id: "client".into(),
        client_secret: "secret".into(),
        scopes: vec![],
    }
}
