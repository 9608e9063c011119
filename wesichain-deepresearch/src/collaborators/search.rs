use std::sync::Arc;
use std::time::Duration;

use crate::error::SearchError;

#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// The optional `SearchProvider` collaborator (spec §4.1.2): used only when
/// the `LLM` cannot ground its own output.
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError>;
}

/// Lets a boxed provider be passed anywhere a generic `P: SearchProvider` is
/// expected, e.g. into [`RetryingSearchProvider`].
#[async_trait::async_trait]
impl SearchProvider for Arc<dyn SearchProvider> {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        self.as_ref().search(query).await
    }
}

/// Which half of the grounding contract `web_research` should use. Re-models
/// the source's subclassed search adapters (Google-grounded, DuckDuckGo,
/// Brave) as one capability with two tagged arms instead of an adapter
/// hierarchy (design note in spec §9).
#[derive(Clone)]
pub enum SearchCapability {
    /// The `LLM` natively grounds its responses; `web_research` calls
    /// `generate_with_search` directly.
    Grounded,
    /// `web_research` must call `search` explicitly, then summarize the hits
    /// itself via `generate_text`.
    Keyword(Arc<dyn SearchProvider>),
}

pub struct RetryingSearchProvider<P> {
    inner: P,
    attempt_limit: usize,
    call_timeout: Duration,
}

impl<P: SearchProvider> RetryingSearchProvider<P> {
    pub fn new(inner: P, attempt_limit: usize, call_timeout: Duration) -> Self {
        Self {
            inner,
            attempt_limit,
            call_timeout,
        }
    }
}

#[async_trait::async_trait]
impl<P: SearchProvider> SearchProvider for RetryingSearchProvider<P> {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let attempts = self.attempt_limit.max(1);
        let mut last_err = None;
        for attempt in 0..attempts {
            let outcome = tokio::time::timeout(self.call_timeout, self.inner.search(query)).await;
            let result = match outcome {
                Ok(r) => r,
                Err(_) => Err(SearchError::Transient(format!(
                    "search timed out after {:?}",
                    self.call_timeout
                ))),
            };
            match result {
                Ok(hits) => return Ok(hits),
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
        Err(last_err.unwrap_or_else(|| SearchError::Transient("no attempts made".into())))
    }
}
