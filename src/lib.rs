//! Mail Assist: chat-driven mailbox assistant over Gmail and an LLM.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod mailbox;
pub mod retry;
pub mod server;
pub mod summarizer;
