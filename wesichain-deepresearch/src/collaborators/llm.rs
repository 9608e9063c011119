use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::LlmError;

/// One grounding triple the provider attaches to a span of generated text:
/// `(segment, url, label)` as named in spec §4.1.1.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundingChunk {
    pub segment_start: usize,
    pub segment_end: usize,
    pub url: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroundedResponse {
    pub text: String,
    pub grounding_metadata: Vec<GroundingChunk>,
}

/// The `LLM` collaborator contract (spec §4.1.1). Implementations own model
/// selection, auth, and wire format; the engine only ever sees this surface.
#[async_trait::async_trait]
pub trait Llm: Send + Sync {
    async fn generate_structured(&self, prompt: &str, schema: &Value) -> Result<Value, LlmError>;
    async fn generate_text(&self, prompt: &str) -> Result<String, LlmError>;
    async fn generate_with_search(&self, prompt: &str) -> Result<GroundedResponse, LlmError>;
}

/// Lets a boxed collaborator (as held by the engine and its builder) be
/// passed anywhere a generic `L: Llm` is expected, e.g. into [`RetryingLlm`].
#[async_trait::async_trait]
impl Llm for Arc<dyn Llm> {
    async fn generate_structured(&self, prompt: &str, schema: &Value) -> Result<Value, LlmError> {
        self.as_ref().generate_structured(prompt, schema).await
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, LlmError> {
        self.as_ref().generate_text(prompt).await
    }

    async fn generate_with_search(&self, prompt: &str) -> Result<GroundedResponse, LlmError> {
        self.as_ref().generate_with_search(prompt).await
    }
}

/// Wraps an `Llm` with the retry policy of §4.1.1: exponential backoff with
/// jitter on transient errors, capped attempts, hard per-call timeout.
/// Permanent errors propagate on the first attempt.
///
/// Grounded in [`wesichain_core::Retrying`]'s attempt-counting loop; extended
/// with the backoff delay and timeout the core wrapper does not apply.
pub struct RetryingLlm<L> {
    inner: L,
    attempt_limit: usize,
    call_timeout: Duration,
}

impl<L: Llm> RetryingLlm<L> {
    pub fn new(inner: L, attempt_limit: usize, call_timeout: Duration) -> Self {
        Self {
            inner,
            attempt_limit,
            call_timeout,
        }
    }

    async fn with_retry<T, F, Fut>(&self, mut call: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, LlmError>>,
    {
        let attempts = self.attempt_limit.max(1);
        let mut last_err = None;
        for attempt in 0..attempts {
            let outcome = tokio::time::timeout(self.call_timeout, call()).await;
            let result = match outcome {
                Ok(r) => r,
                Err(_) => Err(LlmError::Transient(format!(
                    "call timed out after {:?}",
                    self.call_timeout
                ))),
            };
            match result {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) => {
                    last_err = Some(err);
                    if attempt + 1 < attempts {
                        let delay = super::backoff::backoff_with_jitter(
                            attempt + 1,
                            Duration::from_millis(200),
                            Duration::from_secs(10),
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| LlmError::Transient("no attempts made".into())))
    }
}

#[async_trait::async_trait]
impl<L: Llm + Sync> Llm for RetryingLlm<L> {
    async fn generate_structured(&self, prompt: &str, schema: &Value) -> Result<Value, LlmError> {
        self.with_retry(|| self.inner.generate_structured(prompt, schema))
            .await
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, LlmError> {
        self.with_retry(|| self.inner.generate_text(prompt)).await
    }

    async fn generate_with_search(&self, prompt: &str) -> Result<GroundedResponse, LlmError> {
        self.with_retry(|| self.inner.generate_with_search(prompt))
            .await
    }
}
