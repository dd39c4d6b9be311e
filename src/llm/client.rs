/// OpenRouter chat completion client implementation.
///
/// This module provides `ChatClient` for making synchronous HTTP requests to
/// an OpenAI-compatible chat completions endpoint, along with error types and
/// builder patterns for configuration.
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use super::registry::ModelRegistry;

/// Errors that can occur when calling the chat completion API.
///
/// Retry loops treat every variant uniformly as a retryable provider
/// failure.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Provider API-specific errors
    #[error("Provider API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// API key absent from both the builder and the environment
    #[error("{0} is not provided or set in environment variables")]
    MissingApiKey(&'static str),
}

/// One role-tagged message in a chat completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Builder for constructing `ChatClient` instances.
///
/// # Examples
///
/// ```no_run
/// use ppmb::llm::ChatClientBuilder;
///
/// let client = ChatClientBuilder::new()
///     .api_key("sk-or-...")
///     .build()
///     .expect("Failed to create client");
/// ```
#[derive(Debug, Default)]
pub struct ChatClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    registry: Option<ModelRegistry>,
}

impl ChatClientBuilder {
    /// Creates a new `ChatClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL of the chat completions API.
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL (e.g., "https://openrouter.ai/api/v1")
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the API key used as a bearer token.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model metadata registry consulted for token limits.
    pub fn registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Builds the `ChatClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// If `base_url()` was not called, this method will check the
    /// `OPENROUTER_BASE_URL` environment variable, defaulting to
    /// `https://openrouter.ai/api/v1`. If `api_key()` was not called, the
    /// `OPENROUTER_API_KEY` environment variable is required.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiKey` when no key is available and
    /// `LlmError::InvalidUrl` when the base URL does not parse.
    pub fn build(self) -> Result<ChatClient, LlmError> {
        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            std::env::var("OPENROUTER_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string())
        };

        let api_key = if let Some(key) = self.api_key {
            key
        } else {
            std::env::var("OPENROUTER_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
                .ok_or(LlmError::MissingApiKey("OPENROUTER_API_KEY"))?
        };

        reqwest::Url::parse(&base_url)
            .map_err(|e| LlmError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(LlmError::Network)?;

        Ok(ChatClient {
            client,
            base_url,
            api_key,
            registry: self.registry.unwrap_or_default(),
        })
    }
}

/// Synchronous HTTP client for an OpenAI-compatible chat completions API.
///
/// The client handles request construction, bearer authentication, and
/// response parsing. It should be constructed using `ChatClientBuilder`.
pub struct ChatClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    registry: ModelRegistry,
}

/// Trait for chat completion operations.
///
/// This trait enables mocking in unit tests and provides a clean interface
/// for issuing one completion per call. Retry policy belongs to callers.
pub trait ChatClientTrait: Send + Sync {
    /// Requests one completion for the given messages.
    ///
    /// # Arguments
    ///
    /// * `model` - Provider-qualified model name
    /// * `messages` - Ordered list of role-tagged messages
    ///
    /// # Returns
    ///
    /// Returns the completion text, or an error if the request fails.
    fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

impl ChatClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the model metadata registry.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    fn chat_internal(&self, model: &str, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut request_body = serde_json::json!({
            "model": model,
            "messages": messages,
        });

        // Cap the completion length when the model is registered
        if let Some(info) = self.registry.get(model) {
            request_body["max_tokens"] = serde_json::json!(info.max_output_tokens);
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(e)
                } else {
                    LlmError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Http {
                status: status.as_u16(),
            });
        }

        let json: serde_json::Value = response.json().map_err(LlmError::Network)?;

        // Some providers return HTTP 200 with an error object in the body
        if let Some(message) = json
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return Err(LlmError::Api {
                message: message.to_string(),
            });
        }

        json.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| LlmError::Api {
                message: "Missing 'choices[0].message.content' in API response".to_string(),
            })
    }
}

impl ChatClientTrait for ChatClient {
    fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.chat_internal(model, messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::error::Error;

    #[test]
    fn http_error_variant_with_status_code() {
        let error = LlmError::Http { status: 429 };

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("HTTP error"));
        assert!(error_msg.contains("429"));
    }

    #[test]
    fn api_error_variant_for_provider_errors() {
        let error = LlmError::Api {
            message: "Rate limit exceeded".to_string(),
        };

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Provider API error"));
        assert!(error_msg.contains("Rate limit exceeded"));
    }

    #[test]
    fn serialization_error_variant_wraps_serde_errors() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error = LlmError::Serialization(json_error);

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Serialization error"));
        assert!(error.source().is_some());
    }

    #[test]
    fn chat_message_constructors_set_roles() {
        let system = ChatMessage::system("You are a query rewriter");
        assert_eq!(system.role, "system");

        let user = ChatMessage::user("Apa syarat jalur mandiri?");
        assert_eq!(user.role, "user");
        assert_eq!(user.content, "Apa syarat jalur mandiri?");
    }

    #[test]
    fn chat_messages_serialize_to_role_content_objects() {
        let messages = vec![
            ChatMessage::system("instructions"),
            ChatMessage::user("question"),
        ];

        let json = serde_json::to_value(&messages).unwrap();
        assert_eq!(json[0]["role"], "system");
        assert_eq!(json[1]["content"], "question");
    }

    #[test]
    #[serial]
    fn build_requires_an_api_key() {
        unsafe {
            std::env::remove_var("OPENROUTER_API_KEY");
        }

        let result = ChatClientBuilder::new().build();
        assert!(matches!(result, Err(LlmError::MissingApiKey(_))));
    }

    #[test]
    #[serial]
    fn build_uses_default_base_url() {
        unsafe {
            std::env::remove_var("OPENROUTER_BASE_URL");
        }

        let client = ChatClientBuilder::new().api_key("test-key").build().unwrap();
        assert_eq!(client.base_url(), "https://openrouter.ai/api/v1");
    }

    #[test]
    #[serial]
    fn build_reads_base_url_environment_variable_if_set() {
        unsafe {
            std::env::set_var("OPENROUTER_BASE_URL", "http://localhost:8080/v1");
        }

        let client = ChatClientBuilder::new().api_key("test-key").build().unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/v1");

        unsafe {
            std::env::remove_var("OPENROUTER_BASE_URL");
        }
    }

    #[test]
    #[serial]
    fn builder_base_url_takes_precedence_over_env_var() {
        unsafe {
            std::env::set_var("OPENROUTER_BASE_URL", "http://env-host/v1");
        }

        let client = ChatClientBuilder::new()
            .base_url("http://builder-host/v1")
            .api_key("test-key")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://builder-host/v1");

        unsafe {
            std::env::remove_var("OPENROUTER_BASE_URL");
        }
    }

    #[test]
    fn build_returns_error_if_invalid_url_provided() {
        let result = ChatClientBuilder::new()
            .base_url("not-a-valid-url")
            .api_key("test-key")
            .build();
        assert!(matches!(result, Err(LlmError::InvalidUrl(_))));
    }

    #[test]
    #[serial]
    fn build_carries_the_default_registry() {
        let client = ChatClientBuilder::new().api_key("test-key").build().unwrap();
        assert!(
            client
                .registry()
                .get("openrouter/deepseek/deepseek-r1-0528:free")
                .is_some()
        );
    }

    #[test]
    fn trait_can_be_implemented_by_mock_struct() {
        struct MockClient {
            response: String,
        }

        impl ChatClientTrait for MockClient {
            fn chat(&self, _model: &str, _messages: &[ChatMessage]) -> Result<String, LlmError> {
                Ok(self.response.clone())
            }
        }

        let mock = MockClient {
            response: "test response".to_string(),
        };
        let result = mock.chat("test-model", &[ChatMessage::user("test")]);
        assert_eq!(result.unwrap(), "test response");
    }

    #[test]
    fn response_content_extraction_follows_openai_shape() {
        let response_json = serde_json::json!({
            "choices": [
                {"message": {"role": "assistant", "content": "Generated text here"}}
            ]
        });

        let content = response_json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .unwrap();

        assert_eq!(content, "Generated text here");
    }
}
