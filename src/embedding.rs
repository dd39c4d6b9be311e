//! Voyage AI embedding client.
//!
//! The vector store embeds text implicitly through the [`EmbeddingFunction`]
//! trait on both the upsert and the query path. The production
//! implementation calls the hosted Voyage AI embeddings API; tests inject
//! deterministic implementations.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when calling the embeddings API.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// Provider API-specific errors
    #[error("Embedding API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// API key absent from both the builder and the environment
    #[error("{0} is not provided or set in environment variables")]
    MissingApiKey(&'static str),

    /// No embedding model configured
    #[error("EMBEDDING_MODEL is not provided or set in environment variables")]
    MissingModel,
}

/// Whether texts are embedded as stored documents or as search queries.
///
/// Voyage models embed the two asymmetrically for better retrieval quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    Document,
    Query,
}

impl InputType {
    /// Wire value for the `input_type` request field.
    pub fn as_str(self) -> &'static str {
        match self {
            InputType::Document => "document",
            InputType::Query => "query",
        }
    }
}

/// Trait for turning text into vectors.
///
/// Implemented by the hosted Voyage AI client and by deterministic mocks in
/// tests. One call embeds a batch; the output is aligned with the input.
pub trait EmbeddingFunction: Send + Sync {
    /// Embeds a batch of texts.
    ///
    /// # Returns
    ///
    /// One vector per input text, in input order.
    fn embed(&self, texts: &[String], input_type: InputType)
    -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Builder for constructing `VoyageClient` instances.
///
/// # Examples
///
/// ```no_run
/// use ppmb::embedding::VoyageClientBuilder;
///
/// let client = VoyageClientBuilder::new()
///     .model("voyage-3-large")
///     .api_key("pa-...")
///     .build()
///     .expect("Failed to create client");
/// ```
#[derive(Debug, Default)]
pub struct VoyageClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
}

impl VoyageClientBuilder {
    /// Creates a new `VoyageClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL for the embeddings API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the API key used as a bearer token.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the embedding model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builds the `VoyageClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// Falls back to `VOYAGE_BASE_URL` (default
    /// `https://api.voyageai.com/v1`), `VOYAGE_API_KEY` (required), and
    /// `EMBEDDING_MODEL` (required) for values not set on the builder.
    pub fn build(self) -> Result<VoyageClient, EmbeddingError> {
        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            std::env::var("VOYAGE_BASE_URL")
                .unwrap_or_else(|_| "https://api.voyageai.com/v1".to_string())
        };

        let api_key = if let Some(key) = self.api_key {
            key
        } else {
            std::env::var("VOYAGE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
                .ok_or(EmbeddingError::MissingApiKey("VOYAGE_API_KEY"))?
        };

        let model = if let Some(model) = self.model {
            model
        } else {
            std::env::var("EMBEDDING_MODEL")
                .ok()
                .filter(|model| !model.trim().is_empty())
                .ok_or(EmbeddingError::MissingModel)?
        };

        reqwest::Url::parse(&base_url)
            .map_err(|e| EmbeddingError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(EmbeddingError::Network)?;

        Ok(VoyageClient {
            client,
            base_url,
            api_key,
            model,
        })
    }
}

/// Synchronous HTTP client for the Voyage AI embeddings API.
pub struct VoyageClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl VoyageClient {
    /// Returns the embedding model name configured for this client.
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl EmbeddingFunction for VoyageClient {
    fn embed(
        &self,
        texts: &[String],
        input_type: InputType,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let request_body = serde_json::json!({
            "model": self.model,
            "input": texts,
            "input_type": input_type.as_str(),
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout(e)
                } else {
                    EmbeddingError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::Http {
                status: status.as_u16(),
            });
        }

        let json: serde_json::Value = response.json().map_err(EmbeddingError::Network)?;

        let data = json
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or_else(|| EmbeddingError::Api {
                message: "Missing 'data' array in API response".to_string(),
            })?;

        if data.len() != texts.len() {
            return Err(EmbeddingError::Api {
                message: format!(
                    "Expected {} embeddings, API returned {}",
                    texts.len(),
                    data.len()
                ),
            });
        }

        data.iter()
            .map(|entry| {
                entry
                    .get("embedding")
                    .and_then(|e| e.as_array())
                    .map(|values| {
                        values
                            .iter()
                            .filter_map(|v| v.as_f64())
                            .map(|v| v as f32)
                            .collect::<Vec<f32>>()
                    })
                    .ok_or_else(|| EmbeddingError::Api {
                        message: "Missing 'embedding' field in API response entry".to_string(),
                    })
            })
            .collect()
    }
}
