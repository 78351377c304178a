//! Prompt text for the summarizer's four request shapes.

use crate::mailbox::NormalizedMessage;

pub const DEFAULT_REPLY_INSTRUCTION: &str =
    "Write a well-structured professional reply to this email.";

pub fn summarize(content: &str) -> String {
    format!(
        "Summarize the following email in 2-3 short sentences, keeping it professional and concise.\n\
         Email:\n{content}"
    )
}

pub fn reply(email: &str, instruction: Option<&str>) -> String {
    let instruction = instruction
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_REPLY_INSTRUCTION);
    format!("{instruction}\n\nOriginal email:\n{email}\n\nReply:")
}

pub fn digest(messages: &[NormalizedMessage]) -> String {
    let blocks: Vec<String> = messages.iter().map(email_block).collect();
    format!(
        "Create a single daily digest summary for these emails. \
         Include key points and recommended actions:\n{}",
        blocks.join("\n\n")
    )
}

/// Emails are numbered from 1; the model answers with those numbers.
pub fn categorize(messages: &[NormalizedMessage]) -> String {
    let blocks: Vec<String> = messages
        .iter()
        .enumerate()
        .map(|(i, m)| format!("Email {}:\n{}", i + 1, email_block(m)))
        .collect();
    format!(
        "Categorize the following emails into groups such as Work, Personal, Promotions, Urgent, Others.\n\
         Respond in JSON format with categories as keys and lists of email numbers as values.\n\
         ONLY output the JSON object. No other text.\n{}",
        blocks.join("\n\n")
    )
}

fn email_block(m: &NormalizedMessage) -> String {
    format!("From: {}\nSubject: {}\nBody: {}", m.sender, m.subject, m.body)
}
