//! Summaries, reply drafts, digests and categorisation over an LLM.

pub mod prompts;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::mailbox::NormalizedMessage;
use crate::retry::RetryPolicy;

/// Category name to 1-based positions in the submitted batch.
pub type Categories = BTreeMap<String, Vec<usize>>;

/// Text-in, text-out drafting service.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// A 2-3 sentence summary of one email body.
    async fn summarize(&self, body: &str) -> Result<String, LlmError>;

    /// Draft a reply to `email`, optionally steered by `instruction`.
    async fn generate_reply(&self, email: &str, instruction: Option<&str>)
    -> Result<String, LlmError>;

    /// One combined summary for a batch.
    async fn digest(&self, messages: &[NormalizedMessage]) -> Result<String, LlmError>;

    /// Group a batch into categories.
    async fn categorize(&self, messages: &[NormalizedMessage]) -> Result<Categories, LlmError>;
}

/// [`Summarizer`] backed by an [`LlmProvider`].
pub struct LlmSummarizer {
    llm: Arc<dyn LlmProvider>,
    retry: RetryPolicy,
    temperature: f32,
}

impl LlmSummarizer {
    pub fn new(llm: Arc<dyn LlmProvider>, retry: RetryPolicy) -> Self {
        Self {
            llm,
            retry,
            temperature: 0.3,
        }
    }

    async fn complete(&self, operation: &str, prompt: String) -> Result<String, LlmError> {
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(self.temperature);
        let request = &request;

        debug!(operation, model = self.llm.model_name(), "Requesting completion");
        let response = self
            .retry
            .run(operation, move || self.llm.complete(request.clone()))
            .await?;
        Ok(response.content.trim().to_string())
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, body: &str) -> Result<String, LlmError> {
        self.complete("llm.summarize", prompts::summarize(body)).await
    }

    async fn generate_reply(
        &self,
        email: &str,
        instruction: Option<&str>,
    ) -> Result<String, LlmError> {
        self.complete("llm.generate_reply", prompts::reply(email, instruction))
            .await
    }

    async fn digest(&self, messages: &[NormalizedMessage]) -> Result<String, LlmError> {
        self.complete("llm.digest", prompts::digest(messages)).await
    }

    async fn categorize(&self, messages: &[NormalizedMessage]) -> Result<Categories, LlmError> {
        let text = self
            .complete("llm.categorize", prompts::categorize(messages))
            .await?;
        parse_categories(&text, messages.len())
    }
}

/// Parse the model's category map, dropping numbers outside `1..=count`.
///
/// Models wrap the object in prose or markdown fences, so the first `{` that
/// starts a well-formed map wins.
fn parse_categories(text: &str, count: usize) -> Result<Categories, LlmError> {
    let mut categories = text
        .match_indices('{')
        .find_map(|(start, _)| {
            serde_json::Deserializer::from_str(&text[start..])
                .into_iter::<Categories>()
                .next()?
                .ok()
        })
        .ok_or_else(|| {
            error!(text, "No category object in LLM response");
            LlmError::InvalidResponse {
                provider: "summarizer".into(),
                reason: "categories are not a JSON object of number lists".into(),
            }
        })?;

    for numbers in categories.values_mut() {
        numbers.retain(|n| (1..=count).contains(n));
    }
    Ok(categories)
}
