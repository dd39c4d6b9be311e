use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ppmb::{
    ChatClientBuilder, Chatbot, Chunker, Config, DocumentMetadata, GENERATION_FAILURE, Ingestor,
    Language, ModelRegistry, VectorStore, VoyageClientBuilder,
};

/// ppmb - question answering over the new student admissions knowledge base
#[derive(Parser)]
#[command(name = "ppmb")]
#[command(about = "RAG assistant for PPMB at UPN \"Veteran\" Jawa Timur")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Ask a question against the knowledge base
    Ask(AskCommand),
    /// Ingest a Markdown document into the knowledge base
    Ingest(IngestCommand),
    /// List stored document chunks
    List(ListCommand),
    /// Delete every chunk of a stored document
    Delete(DeleteCommand),
}

/// Ask a question
#[derive(Parser)]
struct AskCommand {
    /// The question to answer
    #[arg(value_name = "QUERY")]
    query: String,

    /// Response language (Indonesia, Suroboyoan, English)
    #[arg(short, long, default_value = "Indonesia")]
    language: String,

    /// Generation model override
    #[arg(short, long)]
    model: Option<String>,
}

/// Ingest a Markdown file
#[derive(Parser)]
struct IngestCommand {
    /// Path to the Markdown file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Document title (chunk ids derive from it)
    #[arg(long)]
    title: String,

    /// Source URL of the document
    #[arg(long)]
    source: String,
}

/// List stored chunks
#[derive(Parser)]
struct ListCommand {
    /// Maximum number of chunks to show
    #[arg(short, long)]
    limit: Option<usize>,
}

/// Delete a stored document by title, or single chunks by id
#[derive(Parser)]
struct DeleteCommand {
    /// Title of the document to delete
    #[arg(value_name = "TITLE", required_unless_present = "id", conflicts_with = "id")]
    title: Option<String>,

    /// Delete one chunk by its id instead
    #[arg(long)]
    id: Option<String>,
}

fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Ask(cmd) => handle_ask(cmd),
        Commands::Ingest(cmd) => handle_ingest(cmd),
        Commands::List(cmd) => handle_list(cmd),
        Commands::Delete(cmd) => handle_delete(cmd),
    };

    if let Err(e) = result {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e}");
        std::process::exit(exit_code);
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors include validation failures like empty queries and missing
/// configuration. Internal errors include store and provider failures.
fn is_user_error(error: &anyhow::Error) -> bool {
    let error_msg = error.to_string();
    error_msg.contains("cannot be empty")
        || error_msg.contains("is not provided or set in environment variables")
}

/// Handles the ask command by running the full question-answering pipeline.
fn handle_ask(cmd: &AskCommand) -> Result<()> {
    if cmd.query.trim().is_empty() {
        anyhow::bail!("Query cannot be empty");
    }

    let config = Config::from_env()?;
    let store = open_store(&config)?;
    let chat_client = ChatClientBuilder::new()
        .registry(ModelRegistry::default())
        .build()?;
    let chatbot = Chatbot::from_config(store, Arc::new(chat_client), &config);

    let language = Language::parse_or_default(&cmd.language);
    let generation_model = cmd.model.as_deref().unwrap_or(&config.generation_model);

    let result = chatbot.answer(&cmd.query, language, generation_model)?;
    if result.answer == GENERATION_FAILURE {
        anyhow::bail!("{GENERATION_FAILURE}");
    }

    println!("{}", result.answer);
    Ok(())
}

/// Handles the ingest command by chunking and storing one Markdown file.
fn handle_ingest(cmd: &IngestCommand) -> Result<()> {
    if cmd.title.trim().is_empty() {
        anyhow::bail!("Document title cannot be empty");
    }

    let content = fs::read_to_string(&cmd.file)
        .with_context(|| format!("Failed to read {}", cmd.file.display()))?;

    let config = Config::from_env()?;
    let store = open_store(&config)?;
    let chunker = Chunker::new(config.chunk_size)?;
    let ingestor = Ingestor::new(store, chunker);

    let metadata = DocumentMetadata::new(&cmd.title, &cmd.source);
    let stored = ingestor.store_content(&content, &metadata)?;

    println!("Successfully stored {} ({} chunks)", cmd.title, stored);
    Ok(())
}

/// Handles the list command by printing stored chunks.
fn handle_list(cmd: &ListCommand) -> Result<()> {
    let config = Config::from_env()?;
    let store = open_store(&config)?;

    let documents = store.get_documents(cmd.limit)?;
    if documents.is_empty() {
        println!("Knowledge base is empty");
        return Ok(());
    }

    for document in &documents {
        println!(
            "{}\t{}\t{}\t{}",
            document.id, document.metadata.title, document.metadata.source, document.updated_at
        );
    }
    println!("{} chunks", documents.len());
    Ok(())
}

/// Handles the delete command by removing a document's chunks.
fn handle_delete(cmd: &DeleteCommand) -> Result<()> {
    let config = Config::from_env()?;
    let store = open_store(&config)?;

    let (removed, target) = if let Some(id) = &cmd.id {
        (store.delete(std::slice::from_ref(id))?, id.as_str())
    } else {
        // clap guarantees the title is present when no id was given
        let title = cmd.title.as_deref().unwrap_or_default();
        (store.delete_by_title(title)?, title)
    };

    if removed == 0 {
        println!("No chunks stored for {target}");
    } else {
        println!("Deleted {removed} chunks of {target}");
    }
    Ok(())
}

/// Opens the vector store at the configured path with the Voyage embedder.
fn open_store(config: &Config) -> Result<VectorStore> {
    ensure_store_directory(&config.db_path)?;

    let embedder = VoyageClientBuilder::new()
        .model(&config.embedding_model)
        .build()?;

    VectorStore::open(&config.db_path, Box::new(embedder))
        .with_context(|| format!("Failed to open store at {}", config.db_path.display()))
}

/// Ensures the parent directory of the store file exists.
fn ensure_store_directory(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create store directory: {}", parent.display()))?;
    }
    Ok(())
}
