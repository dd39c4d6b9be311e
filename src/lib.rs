pub mod chatbot;
pub mod chunker;
pub mod config;
pub mod embedding;
pub mod generator;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod prompt;
pub mod retriever;
pub mod retry;
pub mod rewriter;
pub mod store;

pub use chatbot::{Chatbot, ChatbotAnswer};
pub use chunker::Chunker;
pub use config::{Config, ConfigError};
pub use embedding::{EmbeddingFunction, InputType, VoyageClient, VoyageClientBuilder};
pub use generator::{AnswerGenerator, AnswerGeneratorBuilder, GENERATION_FAILURE};
pub use ingest::Ingestor;
pub use llm::{ChatClient, ChatClientBuilder, ChatClientTrait, ChatMessage, ModelRegistry};
pub use models::{DocumentMetadata, RetrievedInformation, StoreQueryResult, StoredDocument};
pub use prompt::Language;
pub use retriever::Retriever;
pub use rewriter::{QueryRewriter, QueryRewriterBuilder};
pub use store::VectorStore;
