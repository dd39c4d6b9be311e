//! End-to-end tests for the question-answering pipeline.
//!
//! The chat and embedding providers are mocked so the full flow
//! (ingest → rewrite → retrieve → assemble → generate) runs hermetically.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use ppmb::embedding::{EmbeddingError, EmbeddingFunction, InputType};
use ppmb::llm::{ChatClientTrait, ChatMessage, LlmError};
use ppmb::{
    AnswerGeneratorBuilder, Chatbot, Chunker, DocumentMetadata, GENERATION_FAILURE, Ingestor,
    Language, QueryRewriterBuilder, Retriever, VectorStore,
};

/// Embeds texts by keyword so "jalur mandiri" questions land on the
/// matching document.
struct KeywordEmbedding;

impl EmbeddingFunction for KeywordEmbedding {
    fn embed(
        &self,
        texts: &[String],
        _input_type: InputType,
    ) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                vec![
                    if lower.contains("mandiri") { 1.0 } else { 0.0 },
                    if lower.contains("snbp") { 1.0 } else { 0.0 },
                    1.0,
                ]
            })
            .collect())
    }
}

/// Chat client that rewrites queries, records the generation prompts, and
/// returns a canned answer.
struct RecordingChatClient {
    generation_calls: Mutex<Vec<(String, String)>>,
}

impl RecordingChatClient {
    fn new() -> Self {
        Self {
            generation_calls: Mutex::new(Vec::new()),
        }
    }
}

impl ChatClientTrait for RecordingChatClient {
    fn chat(
        &self,
        _model: &str,
        messages: &[ChatMessage],
    ) -> std::result::Result<String, LlmError> {
        let system = &messages[0].content;
        if system.contains("query rewriter") {
            return Ok(
                "Persyaratan pendaftaran jalur mandiri UPN\nInformasi seleksi jalur mandiri"
                    .to_string(),
            );
        }

        self.generation_calls
            .lock()
            .unwrap()
            .push((system.clone(), messages[1].content.clone()));
        Ok("Jawaban tentang persyaratan jalur mandiri.".to_string())
    }
}

/// Wires a chatbot with zero-delay retry policies around a store.
fn chatbot_over(store: VectorStore, client: Arc<dyn ChatClientTrait>) -> Chatbot {
    let rewriter = QueryRewriterBuilder::new()
        .client(client.clone())
        .model("rewriter-model")
        .max_retries(2)
        .delay(Duration::ZERO)
        .build();
    let generator = AnswerGeneratorBuilder::new()
        .client(client)
        .max_retries(3)
        .delay(Duration::ZERO)
        .build();
    Chatbot::new(store, rewriter, Retriever::new(3), generator)
}

#[test]
fn end_to_end_query_retrieves_matching_document_and_prompts_include_it() -> Result<()> {
    let client = Arc::new(RecordingChatClient::new());

    // Arrange: ingest one document through the real ingestion pipeline
    let store = VectorStore::in_memory(Box::new(KeywordEmbedding))?;
    let ingestor = Ingestor::new(store, Chunker::new(2000)?);
    ingestor.store_content(
        "# Jalur Mandiri\nSyarat pendaftaran jalur mandiri: ijazah, rapor, dan biaya pendaftaran.",
        &DocumentMetadata::new("Jalur Mandiri", "https://ppmb.example/jalur-mandiri"),
    )?;

    let chatbot = chatbot_over(ingestor.into_store(), client.clone());

    // Act
    let result = chatbot.answer("Apa syarat jalur mandiri?", Language::Indonesia, "gen-model")?;

    // Assert: retrieval found exactly the ingested chunk
    assert_eq!(result.retrieved.ids, vec!["Jalur Mandiri-0"]);
    assert_eq!(result.answer, "Jawaban tentang persyaratan jalur mandiri.");

    // Assert: rewritten queries start with the original
    assert_eq!(result.rewritten_queries[0], "Apa syarat jalur mandiri?");
    assert_eq!(result.rewritten_queries.len(), 3);

    // Assert: the generation prompt embeds the document text and metadata
    let calls = client.generation_calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (system, user) = &calls[0];
    assert!(user.contains("Syarat pendaftaran jalur mandiri"));
    assert!(user.contains("https://ppmb.example/jalur-mandiri"));
    assert!(user.contains("Original Query: Apa syarat jalur mandiri?"));
    assert!(system.contains("Respond in Indonesian (Bahasa Indonesia)"));

    Ok(())
}

#[test]
fn language_selection_switches_the_system_prompt() -> Result<()> {
    let client = Arc::new(RecordingChatClient::new());
    let store = VectorStore::in_memory(Box::new(KeywordEmbedding))?;
    let chatbot = chatbot_over(store, client.clone());

    chatbot.answer(
        "What is the independent pathway?",
        Language::English,
        "gen-model",
    )?;

    let calls = client.generation_calls.lock().unwrap();
    let (system, _) = &calls[0];
    assert!(system.contains("Respond in English"));
    assert!(system.contains("All responses must be in English."));

    Ok(())
}

#[test]
fn unknown_language_tag_falls_back_to_indonesian_prompt() -> Result<()> {
    let client = Arc::new(RecordingChatClient::new());
    let store = VectorStore::in_memory(Box::new(KeywordEmbedding))?;
    let chatbot = chatbot_over(store, client.clone());

    let language = Language::parse_or_default("Sundanese");
    chatbot.answer("Apa itu PPMB?", language, "gen-model")?;

    let calls = client.generation_calls.lock().unwrap();
    let (system, _) = &calls[0];
    assert!(system.contains("Respond in Indonesian (Bahasa Indonesia)"));

    Ok(())
}

#[test]
fn generation_failure_surfaces_as_the_sentinel_answer() -> Result<()> {
    /// Rewrites fine, but every generation attempt fails.
    struct GenerationFailingClient;

    impl ChatClientTrait for GenerationFailingClient {
        fn chat(
            &self,
            _model: &str,
            messages: &[ChatMessage],
        ) -> std::result::Result<String, LlmError> {
            if messages[0].content.contains("query rewriter") {
                Ok("Alternatif pertanyaan".to_string())
            } else {
                Err(LlmError::Http { status: 429 })
            }
        }
    }

    let store = VectorStore::in_memory(Box::new(KeywordEmbedding))?;
    let chatbot = chatbot_over(store, Arc::new(GenerationFailingClient));

    let result = chatbot.answer("Apa itu PPMB?", Language::Indonesia, "gen-model")?;

    assert_eq!(result.answer, GENERATION_FAILURE);

    Ok(())
}
