//! Command dispatcher: turns a classified utterance into mailbox and
//! summarizer calls and the assistant messages describing the outcome.
//!
//! Every reply starts with the echoed user message followed by at least one
//! assistant message. Empty windows, unparsable targets and out-of-range
//! indexes are answered conversationally; only collaborator failures surface
//! as errors.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::delete::DeleteCommand;
use super::intent::{Intent, classify};
use crate::auth::CredentialBundle;
use crate::error::{ChatError, MailboxError};
use crate::llm::provider::ChatMessage;
use crate::mailbox::{Mailbox, NormalizedMessage};
use crate::summarizer::Summarizer;

pub const LIST_PROGRESS: &str = "Fetching your latest emails...";
pub const LIST_EMPTY: &str = "You have no recent emails.";
pub const DELETE_CLARIFY: &str =
    "Please tell me which email to delete, e.g. 'delete email 2' or 'delete last email'.";
pub const DELETE_PROGRESS: &str = "Okay, checking your recent emails to delete the right one...";
pub const DELETE_EMPTY: &str = "I couldn't find any recent emails to delete.";
pub const REPLY_PLACEHOLDER: &str =
    "Reply feature placeholder – will generate replies based on recent email.";
pub const DIGEST_PROGRESS: &str = "Generating today's email digest...";
pub const DIGEST_EMPTY: &str = "There are no recent emails to digest.";
pub const SMALLTALK_HELP: &str = "I can help you with your emails. Try: 'show my last 5 emails' or 'give me today's email digest'.";

/// How many messages each intent fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchLimits {
    pub list: usize,
    pub delete_window: usize,
    pub digest: usize,
}

impl Default for DispatchLimits {
    fn default() -> Self {
        Self {
            list: 5,
            delete_window: 5,
            digest: 20,
        }
    }
}

pub struct Dispatcher {
    mailbox: Arc<dyn Mailbox>,
    summarizer: Arc<dyn Summarizer>,
    limits: DispatchLimits,
}

impl Dispatcher {
    pub fn new(mailbox: Arc<dyn Mailbox>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self::with_limits(mailbox, summarizer, DispatchLimits::default())
    }

    pub fn with_limits(
        mailbox: Arc<dyn Mailbox>,
        summarizer: Arc<dyn Summarizer>,
        limits: DispatchLimits,
    ) -> Self {
        Self {
            mailbox,
            summarizer,
            limits,
        }
    }

    /// Classify `utterance` and dispatch it.
    pub async fn handle(
        &self,
        utterance: &str,
        creds: &CredentialBundle,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let intent = classify(utterance);
        debug!(%intent, "Classified chat command");
        self.dispatch(intent, utterance, creds).await
    }

    /// Run one intent. Calls are made one at a time, in order.
    pub async fn dispatch(
        &self,
        intent: Intent,
        utterance: &str,
        creds: &CredentialBundle,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let mut out = vec![ChatMessage::user(utterance)];

        match intent {
            Intent::List => self.list(creds, &mut out).await?,
            Intent::Delete => self.delete(utterance, creds, &mut out).await?,
            Intent::Reply => out.push(ChatMessage::assistant(REPLY_PLACEHOLDER)),
            Intent::Digest => self.digest(creds, &mut out).await?,
            Intent::Smalltalk => out.push(ChatMessage::assistant(SMALLTALK_HELP)),
        }

        Ok(out)
    }

    async fn list(
        &self,
        creds: &CredentialBundle,
        out: &mut Vec<ChatMessage>,
    ) -> Result<(), ChatError> {
        out.push(ChatMessage::assistant(LIST_PROGRESS));
        let emails = self.mailbox.list_latest(creds, self.limits.list).await?;
        if emails.is_empty() {
            out.push(ChatMessage::assistant(LIST_EMPTY));
            return Ok(());
        }

        let mut lines = Vec::with_capacity(emails.len());
        for (i, email) in emails.iter().enumerate() {
            let summary = self.summarizer.summarize(&email.body).await?;
            lines.push(format!(
                "{}. From: {}\n   Subject: {}\n   Summary: {}",
                i + 1,
                email.sender,
                email.subject,
                summary
            ));
        }
        out.push(ChatMessage::assistant(lines.join("\n\n")));
        Ok(())
    }

    async fn delete(
        &self,
        utterance: &str,
        creds: &CredentialBundle,
        out: &mut Vec<ChatMessage>,
    ) -> Result<(), ChatError> {
        let Some(command) = DeleteCommand::parse(utterance) else {
            out.push(ChatMessage::assistant(DELETE_CLARIFY));
            return Ok(());
        };

        out.push(ChatMessage::assistant(DELETE_PROGRESS));
        let emails = self
            .mailbox
            .list_latest(creds, self.limits.delete_window)
            .await?;
        if emails.is_empty() {
            out.push(ChatMessage::assistant(DELETE_EMPTY));
            return Ok(());
        }

        let Some(pos) = command.resolve(emails.len()) else {
            let requested = command
                .requested_index()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "last".into());
            out.push(ChatMessage::assistant(format!(
                "I only fetched {} recent emails, so I can't delete email {}.",
                emails.len(),
                requested
            )));
            return Ok(());
        };

        let target = &emails[pos];
        match self.mailbox.delete_by_id(creds, &target.id).await {
            Ok(()) => {
                info!(position = pos + 1, "Deleted email via chat");
                out.push(ChatMessage::assistant(deleted_message(pos + 1, target)));
            }
            Err(MailboxError::NotFound { .. }) => {
                warn!(position = pos + 1, "Delete target vanished before deletion");
                out.push(ChatMessage::assistant(format!(
                    "Email {} no longer exists, so there was nothing to delete.",
                    pos + 1
                )));
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    async fn digest(
        &self,
        creds: &CredentialBundle,
        out: &mut Vec<ChatMessage>,
    ) -> Result<(), ChatError> {
        out.push(ChatMessage::assistant(DIGEST_PROGRESS));
        let emails = self.mailbox.list_latest(creds, self.limits.digest).await?;
        if emails.is_empty() {
            out.push(ChatMessage::assistant(DIGEST_EMPTY));
            return Ok(());
        }

        let digest = self.summarizer.digest(&emails).await?;
        out.push(ChatMessage::assistant(digest));
        Ok(())
    }
}

fn deleted_message(position: usize, target: &NormalizedMessage) -> String {
    format!(
        "Deleted email {}:\nFrom: {}\nSubject: {}",
        position, target.sender, target.subject
    )
}
