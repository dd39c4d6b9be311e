//! Final answer generation using the chat model.

use std::sync::Arc;
use std::time::Duration;

use crate::llm::{ChatClientTrait, ChatMessage};
use crate::retry::retry_with_delay;

/// Sentinel returned when every generation attempt failed.
///
/// This is a deliberate fallback value rather than an error: callers must
/// compare against this constant before presenting the answer.
pub const GENERATION_FAILURE: &str = "Failed to generate answer after multiple retries.";

const DEFAULT_MAX_RETRIES: usize = 3;
const DEFAULT_DELAY: Duration = Duration::from_secs(65);

/// Builder for constructing `AnswerGenerator` instances.
#[derive(Default)]
pub struct AnswerGeneratorBuilder {
    client: Option<Arc<dyn ChatClientTrait>>,
    max_retries: Option<usize>,
    delay: Option<Duration>,
}

impl AnswerGeneratorBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chat client to use.
    pub fn client(mut self, client: Arc<dyn ChatClientTrait>) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the retry budget (default 3 attempts).
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Sets the fixed delay between attempts (default 65 seconds, sized to
    /// outlast free-tier rate-limit windows).
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Builds the `AnswerGenerator`.
    ///
    /// # Panics
    ///
    /// Panics if `client()` was not called.
    #[must_use]
    pub fn build(self) -> AnswerGenerator {
        AnswerGenerator {
            client: self.client.expect("client must be set via client() method"),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            delay: self.delay.unwrap_or(DEFAULT_DELAY),
        }
    }
}

/// Generates the final answer from the assembled prompts.
pub struct AnswerGenerator {
    client: Arc<dyn ChatClientTrait>,
    max_retries: usize,
    delay: Duration,
}

impl AnswerGenerator {
    /// Requests an answer from the generation model.
    ///
    /// Provider failures are retried with a fixed delay. Once the budget is
    /// spent the [`GENERATION_FAILURE`] sentinel is returned instead of an
    /// error.
    pub fn generate(
        &self,
        user_prompt: &str,
        system_prompt: &str,
        generation_model: &str,
    ) -> String {
        let messages = [
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_prompt),
        ];

        match retry_with_delay(self.max_retries, self.delay, || {
            self.client.chat(generation_model, &messages)
        }) {
            Ok(answer) => answer,
            Err(error) => {
                tracing::error!(
                    model = generation_model,
                    error = %error,
                    "answer generation failed after all retries"
                );
                GENERATION_FAILURE.to_string()
            }
        }
    }
}
