//! Provider message payloads and their conversion to [`NormalizedMessage`].

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::NormalizedMessage;

/// Base64url that accepts bodies with or without padding.
const BASE64URL_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A message as returned by `messages.get?format=full`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub payload: Option<MessagePart>,
}

/// One node of the MIME tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<MessageHeader>,
    #[serde(default)]
    pub body: Option<PartBody>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartBody {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub size: u64,
}

/// Case-insensitive header lookup. A repeated header resolves to its last value.
pub fn header_value<'a>(headers: &'a [MessageHeader], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .rev()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Convert a provider payload into the canonical record.
///
/// With sub-parts, the body is the first `text/plain` part in document order;
/// without, it is the top-level body. Missing data yields an empty body.
pub fn normalize(raw: &RawMessage) -> NormalizedMessage {
    let (subject, sender, body) = match &raw.payload {
        Some(payload) => {
            let data = if payload.parts.is_empty() {
                payload.body.as_ref().and_then(|b| b.data.as_deref())
            } else {
                first_plain_text(&payload.parts)
            };
            (
                header_value(&payload.headers, "subject").unwrap_or_default(),
                header_value(&payload.headers, "from").unwrap_or_default(),
                data.map(decode_body).unwrap_or_default(),
            )
        }
        None => ("", "", String::new()),
    };

    NormalizedMessage {
        id: raw.id.clone(),
        thread_id: raw.thread_id.clone(),
        subject: subject.to_string(),
        sender: sender.to_string(),
        body,
    }
}

fn first_plain_text(parts: &[MessagePart]) -> Option<&str> {
    parts.iter().find_map(|part| {
        if part.mime_type == "text/plain" {
            part.body.as_ref().and_then(|b| b.data.as_deref())
        } else {
            first_plain_text(&part.parts)
        }
    })
}

/// Decode a base64url body. Never fails: undecodable input gives an empty
/// string and invalid UTF-8 sequences are dropped.
pub fn decode_body(data: &str) -> String {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    match BASE64URL_LENIENT.decode(cleaned.as_bytes()) {
        Ok(bytes) => bytes.utf8_chunks().map(|chunk| chunk.valid()).collect(),
        Err(e) => {
            warn!(error = %e, "Undecodable message body");
            String::new()
        }
    }
}
