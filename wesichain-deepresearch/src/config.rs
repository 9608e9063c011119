use std::time::Duration;

/// Options recognized by `invoke`/`stream`/`resume` (spec §6.1). All fields
/// have defaults; callers override only what they need.
#[derive(Clone, Debug)]
pub struct ResearchConfig {
    pub initial_search_query_count: u32,
    pub max_research_loops: u32,
    pub max_parallel: usize,
    pub attempt_limit: usize,
    pub call_timeout: Duration,
    pub node_timeout: Duration,
    pub reasoning_model: String,
    pub trust_proxy_headers: bool,
    /// Token-bucket rate and burst for the process-wide provider limiter
    /// (spec §4.1.3). Burst defaults to `max_parallel` so a full fan-out wave
    /// can dispatch without queuing on a cold bucket.
    pub requests_per_second: f64,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            initial_search_query_count: 3,
            max_research_loops: 3,
            max_parallel: 4,
            attempt_limit: 3,
            call_timeout: Duration::from_millis(60_000),
            node_timeout: Duration::from_millis(120_000),
            reasoning_model: "default".to_string(),
            trust_proxy_headers: false,
            requests_per_second: 4.0,
        }
    }
}

impl ResearchConfig {
    pub fn with_initial_search_query_count(mut self, n: u32) -> Self {
        self.initial_search_query_count = n;
        self
    }

    pub fn with_max_research_loops(mut self, n: u32) -> Self {
        self.max_research_loops = n;
        self
    }

    pub fn with_max_parallel(mut self, n: usize) -> Self {
        self.max_parallel = n;
        self
    }

    pub fn with_attempt_limit(mut self, n: usize) -> Self {
        self.attempt_limit = n;
        self
    }

    pub fn with_reasoning_model(mut self, model: impl Into<String>) -> Self {
        self.reasoning_model = model.into();
        self
    }

    pub fn with_requests_per_second(mut self, rate: f64) -> Self {
        self.requests_per_second = rate;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_node_timeout(mut self, timeout: Duration) -> Self {
        self.node_timeout = timeout;
        self
    }

    pub fn with_trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }
}
