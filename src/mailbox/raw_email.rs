//! Outgoing messages in the provider's `raw` form (base64url RFC 5322).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use lettre::Message;
use lettre::message::Mailbox as Address;
use lettre::message::header::ContentType;

use crate::error::MailboxError;

/// Build a plain-text message and encode it for the provider's send call.
pub fn build_raw_email(
    to: &str,
    subject: &str,
    body: &str,
    from: &str,
) -> Result<String, MailboxError> {
    let from: Address = from
        .parse()
        .map_err(|e| MailboxError::Compose(format!("Invalid from address: {e}")))?;
    let to: Address = to
        .parse()
        .map_err(|e| MailboxError::Compose(format!("Invalid to address: {e}")))?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| MailboxError::Compose(format!("Failed to build email: {e}")))?;

    Ok(URL_SAFE.encode(message.formatted()))
}
