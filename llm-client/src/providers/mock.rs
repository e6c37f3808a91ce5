//! Mock LLM provider for testing
//!
//! Provides a configurable mock provider that can script one response per
//! call, simulate failures, and count how many requests were issued.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, LlmResponse};

/// A mock provider for testing pipeline behavior
pub struct MockProvider {
    /// Scripted responses, consumed front to back; when exhausted,
    /// `fallback_response` is returned
    responses: Mutex<VecDeque<String>>,
    /// Response returned once the script runs out
    fallback_response: String,
    /// Error to return on every call (overrides responses)
    fail_with: Mutex<Option<LlmError>>,
    /// Number of complete() calls so far
    call_count: AtomicUsize,
    /// Provider name for display
    name: &'static str,
}

impl MockProvider {
    /// Create a provider that always returns the same response
    pub fn always_succeeds(response: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback_response: response.to_string(),
            fail_with: Mutex::new(None),
            call_count: AtomicUsize::new(0),
            name: "mock",
        }
    }

    /// Create a provider that returns the given responses in order,
    /// then repeats the last one
    pub fn with_responses(responses: Vec<&str>) -> Self {
        let fallback = responses.last().map(|s| s.to_string()).unwrap_or_default();
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            fallback_response: fallback,
            fail_with: Mutex::new(None),
            call_count: AtomicUsize::new(0),
            name: "mock",
        }
    }

    /// Create a provider that always fails with the given error
    pub fn always_fails(error: LlmError) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback_response: String::new(),
            fail_with: Mutex::new(Some(error)),
            call_count: AtomicUsize::new(0),
            name: "mock",
        }
    }

    /// Get the number of times complete() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Set a custom provider name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(&self, _request: LlmRequest) -> Result<LlmResponse> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        {
            let error = self.fail_with.lock().unwrap();
            if let Some(err) = error.as_ref() {
                return Err(clone_error(err));
            }
        }

        let content = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback_response.clone());

        Ok(LlmResponse {
            content,
            model: "mock-model".to_string(),
            usage: None,
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

/// Clone an LlmError (needed because LlmError doesn't implement Clone)
fn clone_error(err: &LlmError) -> LlmError {
    match err {
        LlmError::MissingApiKey { provider, env_var } => LlmError::MissingApiKey {
            provider: provider.clone(),
            env_var: env_var.clone(),
        },
        LlmError::RateLimited { retry_after } => LlmError::RateLimited {
            retry_after: *retry_after,
        },
        LlmError::ServerOverloaded { message } => LlmError::ServerOverloaded {
            message: message.clone(),
        },
        LlmError::ApiError {
            message,
            status_code,
        } => LlmError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        LlmError::ConfigError(s) => LlmError::ConfigError(s.clone()),
        LlmError::InvalidPreset(s) => LlmError::InvalidPreset(s.clone()),
        // Io and Toml errors can't be cloned; degrade to a generic error
        LlmError::Io(_) => LlmError::ConfigError("IO error (mock)".to_string()),
        LlmError::TomlParse(_) => LlmError::ConfigError("TOML parse error (mock)".to_string()),
        LlmError::TomlSerialize(_) => {
            LlmError::ConfigError("TOML serialize error (mock)".to_string())
        }
    }
}
