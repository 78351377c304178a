//! Text generation for the summarizer.
//!
//! Gemini is reached through rig-core; [`RigAdapter`] bridges rig's
//! `CompletionModel` to [`LlmProvider`] so the rest of the crate never sees rig
//! types.

pub mod provider;
mod rig_adapter;

pub use provider::*;
pub use rig_adapter::RigAdapter;

use std::sync::Arc;

use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::error::LlmError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const PROVIDER: &str = "gemini";

/// Gemini credentials and model choice.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: secrecy::SecretString,
    pub model: String,
}

/// Build the Gemini-backed provider.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::gemini;

    let client: gemini::Client = gemini::Client::new(config.api_key.expose_secret()).map_err(|e| {
        LlmError::RequestFailed {
            provider: PROVIDER.to_string(),
            reason: format!("client setup failed: {e}"),
        }
    })?;

    tracing::info!(provider = PROVIDER, model = %config.model, "LLM provider ready");
    let model = client.completion_model(&config.model);
    Ok(Arc::new(RigAdapter::new(model, &config.model)))
}
