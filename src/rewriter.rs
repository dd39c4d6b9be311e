//! Query rewriting using the chat model.
//!
//! One user query is expanded into several phrasings so the similarity
//! search covers more of the corpus. The original query always comes first;
//! each non-empty response line adds one alternative.

use std::sync::Arc;
use std::time::Duration;

use crate::llm::{ChatClientTrait, ChatMessage, LlmError};
use crate::retry::retry_with_delay;

/// Prompt template for query rewriting.
const REWRITER_PROMPT: &str = r#"
You are a query rewriter that rewrites a query to be more easily understood by a search engine or a question-answering system in Pusat Penerimaan Mahasiswa Baru UPN "Veteran" Jawa Timur.
Given a query, rewrite it to be clearer and more specific.
Here are some guidelines for rewriting queries:

1. Remove unnecessary words or phrases.
2. Use more specific terms.
3. Rephrase the query in a more natural way.
4. Ensure the query is grammatically correct.
5. Response with 3 alternative query without your comment and without numbering in Indonesian language

Example:
Original Query:
Apakah ada ekstra teater di upn?

Rewritten Query:
Apakah UPN "Veteran" Jawa Timur memiliki Unit Kegiatan Mahasiswa (UKM) teater?
Informasi tentang kegiatan teater di UPN "Veteran" Jawa Timur.
Adakah kelompok teater mahasiswa di UPN "Veteran" Jawa Timur?
"#;

const DEFAULT_MAX_RETRIES: usize = 5;
const DEFAULT_DELAY: Duration = Duration::from_secs(10);

/// Builder for constructing `QueryRewriter` instances.
#[derive(Default)]
pub struct QueryRewriterBuilder {
    client: Option<Arc<dyn ChatClientTrait>>,
    model: Option<String>,
    max_retries: Option<usize>,
    delay: Option<Duration>,
}

impl QueryRewriterBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chat client to use.
    pub fn client(mut self, client: Arc<dyn ChatClientTrait>) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the rewriter model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the retry budget (default 5 attempts).
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Sets the fixed delay between attempts (default 10 seconds).
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Builds the `QueryRewriter`.
    ///
    /// # Panics
    ///
    /// Panics if `client()` or `model()` was not called.
    #[must_use]
    pub fn build(self) -> QueryRewriter {
        QueryRewriter {
            client: self.client.expect("client must be set via client() method"),
            model: self.model.expect("model must be set via model() method"),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            delay: self.delay.unwrap_or(DEFAULT_DELAY),
        }
    }
}

/// Expands one user query into multiple phrasings via the chat model.
pub struct QueryRewriter {
    client: Arc<dyn ChatClientTrait>,
    model: String,
    max_retries: usize,
    delay: Duration,
}

impl QueryRewriter {
    /// Rewrites a query for retrieval.
    ///
    /// # Returns
    ///
    /// The original query followed by one entry per non-empty response
    /// line. Provider failures are retried with a fixed delay; once the
    /// budget is spent the last error is returned so the caller sees an
    /// explicit failure rather than an absent value.
    pub fn rewrite(&self, query: &str) -> Result<Vec<String>, LlmError> {
        let messages = [
            ChatMessage::system(REWRITER_PROMPT),
            ChatMessage::user(query),
        ];

        let response = retry_with_delay(self.max_retries, self.delay, || {
            self.client.chat(&self.model, &messages)
        })?;

        let mut rewritten = vec![query.to_string()];
        rewritten.extend(
            response
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from),
        );

        tracing::debug!(count = rewritten.len(), "rewrote query");
        Ok(rewritten)
    }
}
