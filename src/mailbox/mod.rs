//! Mailbox access: the provider-neutral trait, the Gmail client behind it,
//! and the normalised message record everything else works with.

pub mod gmail;
pub mod normalize;
pub mod raw_email;
pub mod routes;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::CredentialBundle;
use crate::error::MailboxError;

pub use gmail::GmailMailbox;
pub use normalize::normalize;
pub use raw_email::build_raw_email;

/// Canonical representation of a provider message. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedMessage {
    pub id: String,
    #[serde(rename = "threadId")]
    pub thread_id: String,
    pub subject: String,
    pub sender: String,
    pub body: String,
}

/// Operations on a user's mailbox, keyed by provider message id.
///
/// Implementations apply the configured retry policy to every call.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Up to `max_results` messages, most recent first. Empty is not an error.
    async fn list_latest(
        &self,
        creds: &CredentialBundle,
        max_results: usize,
    ) -> Result<Vec<NormalizedMessage>, MailboxError>;

    /// Fetch one message.
    async fn get_message(
        &self,
        creds: &CredentialBundle,
        id: &str,
    ) -> Result<NormalizedMessage, MailboxError>;

    /// Send a plain-text message; returns the provider's message id.
    async fn send_email(
        &self,
        creds: &CredentialBundle,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, MailboxError>;

    /// Permanently delete a message.
    async fn delete_by_id(&self, creds: &CredentialBundle, id: &str) -> Result<(), MailboxError>;
}
