//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use std::sync::Arc;

use crate::error::{ChatError, Result};
use crate::llm::{LlmClient, LlmProvider, MockLlmClient, OpenAiClient, OpenAiConfig};

/// Shown while the API key field is empty.
pub const MISSING_API_KEY_MESSAGE: &str = "Please add the OpenAI API key";

/// Creates an LLM client for the given provider.
///
/// The OpenAI provider requires a non-empty `api_key`; an empty one is a
/// `MissingInput` error.
pub fn create_client(
    provider: LlmProvider,
    api_key: &str,
    model: &str,
) -> Result<Arc<dyn LlmClient>> {
    match provider {
        LlmProvider::OpenAi => {
            let key = api_key.trim();
            if key.is_empty() {
                return Err(ChatError::missing_input(MISSING_API_KEY_MESSAGE));
            }
            Ok(Arc::new(OpenAiClient::new(OpenAiConfig::new(key, model))?))
        }
        LlmProvider::Mock => Ok(Arc::new(MockLlmClient::new())),
    }
}
