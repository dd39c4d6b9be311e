//! The query-answering pipeline.
//!
//! `Chatbot` wires the stages together: rewrite the query, retrieve and
//! deduplicate matching chunks, assemble the language-specific prompts, and
//! generate the answer. It is UI-independent and used by the CLI `ask`
//! command.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::generator::{AnswerGenerator, AnswerGeneratorBuilder};
use crate::llm::ChatClientTrait;
use crate::models::RetrievedInformation;
use crate::prompt::{self, Language};
use crate::retriever::Retriever;
use crate::rewriter::{QueryRewriter, QueryRewriterBuilder};
use crate::store::VectorStore;

/// The outcome of one question-answering run.
#[derive(Debug)]
pub struct ChatbotAnswer {
    /// The generated answer, or the generation failure sentinel.
    pub answer: String,
    /// The original query plus the model's alternative phrasings.
    pub rewritten_queries: Vec<String>,
    /// Deduplicated retrieval result the answer was conditioned on.
    pub retrieved: RetrievedInformation,
}

/// Question-answering service over the admissions knowledge base.
pub struct Chatbot {
    store: VectorStore,
    rewriter: QueryRewriter,
    retriever: Retriever,
    generator: AnswerGenerator,
}

impl Chatbot {
    /// Creates a chatbot from explicit pipeline components.
    ///
    /// Useful for tests that need tight retry budgets or mock clients.
    pub fn new(
        store: VectorStore,
        rewriter: QueryRewriter,
        retriever: Retriever,
        generator: AnswerGenerator,
    ) -> Self {
        Self {
            store,
            rewriter,
            retriever,
            generator,
        }
    }

    /// Creates a chatbot with the default retry policies.
    ///
    /// The rewriter model and the retrieval count come from `config`; both
    /// pipeline stages share the one chat client.
    pub fn from_config(
        store: VectorStore,
        chat_client: Arc<dyn ChatClientTrait>,
        config: &Config,
    ) -> Self {
        let rewriter = QueryRewriterBuilder::new()
            .client(chat_client.clone())
            .model(&config.rewriter_model)
            .build();
        let retriever = Retriever::new(config.retrieval_results);
        let generator = AnswerGeneratorBuilder::new().client(chat_client).build();
        Self::new(store, rewriter, retriever, generator)
    }

    /// Answers a question against the knowledge base.
    ///
    /// # Arguments
    ///
    /// * `query` - the user's question
    /// * `language` - response language for the generation prompt
    /// * `generation_model` - chat model used for the final answer
    ///
    /// # Errors
    ///
    /// Fails when query rewriting exhausts its retries or the store query
    /// errors. Generation failures do not error; they surface as the
    /// [`crate::generator::GENERATION_FAILURE`] sentinel in the answer.
    pub fn answer(
        &self,
        query: &str,
        language: Language,
        generation_model: &str,
    ) -> Result<ChatbotAnswer> {
        let rewritten_queries = self
            .rewriter
            .rewrite(query)
            .context("Failed to rewrite query")?;

        let retrieved = self.retriever.search(&self.store, &rewritten_queries)?;
        if retrieved.is_empty() {
            tracing::warn!(query, "no documents retrieved");
        }

        let user_prompt = prompt::user_prompt(query, &retrieved);
        let system_prompt = prompt::system_prompt(language);
        let answer = self
            .generator
            .generate(&user_prompt, &system_prompt, generation_model);

        Ok(ChatbotAnswer {
            answer,
            rewritten_queries,
            retrieved,
        })
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &VectorStore {
        &self.store
    }
}
