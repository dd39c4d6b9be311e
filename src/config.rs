//! Environment-sourced configuration.
//!
//! All runtime settings come from environment variables, typically loaded
//! from a `.env` file by the binary entry point. Required settings that are
//! absent fail immediately at startup rather than at first use.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is absent or empty.
    #[error("{0} is not provided or set in environment variables")]
    Missing(&'static str),

    /// A setting is present but cannot be parsed.
    #[error("{0} has an invalid value: {1}")]
    Invalid(&'static str, String),

    /// The platform data directory could not be determined.
    #[error("Failed to determine data directory")]
    NoDataDir,
}

/// Runtime configuration for the chatbot and the ingestion pipeline.
///
/// # Environment variables
///
/// * `EMBEDDING_MODEL` - embedding model name (required)
/// * `REWRITER_MODEL` - chat model used for query rewriting (required)
/// * `GENERATION_MODEL` - chat model used for answer generation (required)
/// * `RETRIEVAL_RESULTS` - neighbors requested per rewritten query (required)
/// * `CHUNK_SIZE` - token limit steering header-splitting depth (required)
/// * `PPMB_DB_PATH` - directory holding the vector store (optional; defaults
///   to `{data_dir}/ppmb`)
///
/// The store file is named after the embedding model, since vectors from
/// different models are not comparable and must not share a store.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub embedding_model: String,
    pub rewriter_model: String,
    pub generation_model: String,
    pub retrieval_results: usize,
    pub chunk_size: usize,
}

impl Config {
    /// Reads the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for absent required settings and
    /// `ConfigError::Invalid` for unparseable numeric ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        let embedding_model = require("EMBEDDING_MODEL")?;
        let rewriter_model = require("REWRITER_MODEL")?;
        let generation_model = require("GENERATION_MODEL")?;
        let retrieval_results = require_parsed::<usize>("RETRIEVAL_RESULTS")?;
        let chunk_size = require_parsed::<usize>("CHUNK_SIZE")?;

        let base_dir = match env::var("PPMB_DB_PATH") {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => dirs::data_dir().ok_or(ConfigError::NoDataDir)?.join("ppmb"),
        };
        let db_path = base_dir.join(format!("{embedding_model}.db"));

        Ok(Self {
            db_path,
            embedding_model,
            rewriter_model,
            generation_model,
            retrieval_results,
            chunk_size,
        })
    }
}

/// Reads a required environment variable, treating empty values as absent.
fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Reads and parses a required environment variable.
fn require_parsed<T: FromStr>(name: &'static str) -> Result<T, ConfigError> {
    let raw = require(name)?;
    raw.parse::<T>()
        .map_err(|_| ConfigError::Invalid(name, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn set_required_vars() {
        unsafe {
            std::env::set_var("EMBEDDING_MODEL", "voyage-3-large");
            std::env::set_var("REWRITER_MODEL", "openrouter/deepseek/deepseek-chat-v3-0324:free");
            std::env::set_var("GENERATION_MODEL", "openrouter/deepseek/deepseek-r1-0528:free");
            std::env::set_var("RETRIEVAL_RESULTS", "5");
            std::env::set_var("CHUNK_SIZE", "2000");
            std::env::set_var("PPMB_DB_PATH", "/tmp/ppmb-test");
        }
    }

    #[test]
    #[serial]
    fn from_env_reads_all_settings() {
        set_required_vars();

        let config = Config::from_env().unwrap();
        assert_eq!(config.embedding_model, "voyage-3-large");
        assert_eq!(config.retrieval_results, 5);
        assert_eq!(config.chunk_size, 2000);
        assert_eq!(
            config.db_path,
            PathBuf::from("/tmp/ppmb-test/voyage-3-large.db")
        );
    }

    #[test]
    #[serial]
    fn missing_required_setting_is_an_error() {
        set_required_vars();
        unsafe {
            std::env::remove_var("REWRITER_MODEL");
        }

        let result = Config::from_env();
        assert!(matches!(result, Err(ConfigError::Missing("REWRITER_MODEL"))));
    }

    #[test]
    #[serial]
    fn empty_setting_counts_as_missing() {
        set_required_vars();
        unsafe {
            std::env::set_var("EMBEDDING_MODEL", "   ");
        }

        let result = Config::from_env();
        assert!(matches!(result, Err(ConfigError::Missing("EMBEDDING_MODEL"))));
    }

    #[test]
    #[serial]
    fn unparseable_numeric_setting_is_invalid() {
        set_required_vars();
        unsafe {
            std::env::set_var("RETRIEVAL_RESULTS", "five");
        }

        let result = Config::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::Invalid("RETRIEVAL_RESULTS", _))
        ));
    }

    #[test]
    #[serial]
    fn db_path_is_scoped_by_embedding_model() {
        set_required_vars();
        unsafe {
            std::env::set_var("EMBEDDING_MODEL", "voyage-3-lite");
        }

        let config = Config::from_env().unwrap();
        assert!(config.db_path.ends_with("voyage-3-lite.db"));
    }
}
