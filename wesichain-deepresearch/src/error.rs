use thiserror::Error;

/// Errors raised by the `LLM` collaborator. Distinguishes errors the retry
/// layer should chase (`Transient`) from ones it should give up on immediately.
#[derive(Debug, Error, Clone)]
pub enum LlmError {
    #[error("transient LLM error: {0}")]
    Transient(String),
    #[error("permanent LLM error: {0}")]
    Permanent(String),
}

impl LlmError {
    pub fn is_transient(&self) -> bool {
        matches!(self, LlmError::Transient(_))
    }
}

#[derive(Debug, Error, Clone)]
pub enum SearchError {
    #[error("transient search error: {0}")]
    Transient(String),
    #[error("permanent search error: {0}")]
    Permanent(String),
}

impl SearchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SearchError::Transient(_))
    }
}

#[derive(Debug, Error, Clone)]
#[error("rate limit exceeded for provider '{provider}'")]
pub struct RateLimitError {
    pub provider: String,
}

#[derive(Debug, Error, Clone)]
pub enum TimeoutError {
    #[error("call to '{collaborator}' timed out after {elapsed_ms}ms")]
    Call {
        collaborator: String,
        elapsed_ms: u64,
    },
    #[error("node '{node}' timed out after {elapsed_ms}ms")]
    Node { node: String, elapsed_ms: u64 },
}

#[derive(Debug, Error, Clone)]
#[error("structured output failed schema conformance: {reason}")]
pub struct ValidationError {
    pub reason: String,
    pub raw_output: String,
}

/// Error a collaborator call can fail with before the retry layer classifies it.
#[derive(Debug, Error, Clone)]
pub enum CollaboratorError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CollaboratorError {
    /// Whether the retry policy in §4.1.1 should attempt another call.
    pub fn is_retryable(&self) -> bool {
        match self {
            CollaboratorError::Llm(e) => e.is_transient(),
            CollaboratorError::Search(e) => e.is_transient(),
            CollaboratorError::RateLimit(_) => true,
            CollaboratorError::Timeout(_) => true,
            CollaboratorError::Validation(_) => false,
        }
    }
}

/// The composite, user-visible error a run can fail with.
#[derive(Debug, Error, Clone)]
pub enum ResearchError {
    #[error("planning failed: {0}")]
    Planning(String),
    #[error("search failed: {0}")]
    Search(String),
    #[error("reflection failed: {0}")]
    Reflection(String),
    #[error("finalize failed: {0}")]
    Finalize(String),
    #[error("run timed out: {0}")]
    Timeout(String),
    #[error("run cancelled")]
    Cancelled,
}

impl ResearchError {
    pub fn kind(&self) -> &'static str {
        match self {
            ResearchError::Planning(_) => "planning",
            ResearchError::Search(_) => "search",
            ResearchError::Reflection(_) => "reflection",
            ResearchError::Finalize(_) => "finalize",
            ResearchError::Timeout(_) => "timeout",
            ResearchError::Cancelled => "cancelled",
        }
    }
}

impl From<CollaboratorError> for ResearchError {
    fn from(error: CollaboratorError) -> Self {
        match &error {
            CollaboratorError::Timeout(_) => ResearchError::Timeout(error.to_string()),
            _ => ResearchError::Search(error.to_string()),
        }
    }
}
