//! Model metadata registry.
//!
//! Metadata about the chat models in use (token limits, per-token costs)
//! is carried by an explicit registry value handed to the client
//! constructor rather than registered in process-global state.

use std::collections::HashMap;

/// Token limits and pricing for one chat model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub max_tokens: u32,
    pub max_input_tokens: u32,
    pub max_output_tokens: u32,
    pub input_cost_per_token: f64,
    pub output_cost_per_token: f64,
}

/// Registry of known chat models keyed by provider-qualified name.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: HashMap<String, ModelInfo>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub fn empty() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// Registers metadata for a model, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, info: ModelInfo) {
        self.models.insert(name.into(), info);
    }

    /// Looks up metadata for a model.
    pub fn get(&self, name: &str) -> Option<&ModelInfo> {
        self.models.get(name)
    }

    /// Returns the number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns true when no models are registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelRegistry {
    /// Registry pre-populated with the free OpenRouter DeepSeek models the
    /// assistant ships with.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(
            "openrouter/deepseek/deepseek-r1-0528:free",
            ModelInfo {
                max_tokens: 8192,
                max_input_tokens: 65336,
                max_output_tokens: 8192,
                input_cost_per_token: 5.5e-7,
                output_cost_per_token: 2.19e-6,
            },
        );
        registry.register(
            "openrouter/deepseek/deepseek-chat-v3-0324:free",
            ModelInfo {
                max_tokens: 8192,
                max_input_tokens: 65336,
                max_output_tokens: 8192,
                input_cost_per_token: 2.7e-7,
                output_cost_per_token: 1.1e-6,
            },
        );
        registry
    }
}
