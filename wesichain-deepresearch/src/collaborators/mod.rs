mod backoff;
mod llm;
mod rate_limiter;
mod search;

pub use backoff::backoff_with_jitter;
pub use llm::{GroundedResponse, GroundingChunk, Llm, RetryingLlm};
pub use rate_limiter::RateLimiter;
pub use search::{RetryingSearchProvider, SearchCapability, SearchHit, SearchProvider};
