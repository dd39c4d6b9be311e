/// OpenRouter chat completion client module.
///
/// This module provides a synchronous HTTP client for OpenAI-compatible
/// chat completion APIs, along with error handling, a model metadata
/// registry, and builder patterns for configuration.
mod client;
mod registry;

pub use client::{ChatClient, ChatClientBuilder, ChatClientTrait, ChatMessage, LlmError};
pub use registry::{ModelInfo, ModelRegistry};
