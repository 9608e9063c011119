//! # wesichain-deepresearch
//!
//! Autonomous deep-research orchestration built on [`wesichain_graph`]'s state
//! schema and checkpointer: a durable, interruptible state machine that plans
//! sub-tasks, fans out parallel web searches, reflects on the evidence
//! gathered, optionally pauses for human plan approval, and synthesizes a
//! cited final answer.
//!
//! The engine is deliberately narrow: it drives seven cooperating steps
//! (`generate_query`, `planning_mode`, `planning_wait`, `web_research`,
//! `validate_web_results`, `reflection`, `finalize_answer`) over a single
//! [`OverallState`] record, leaving the generative model, the search backend,
//! and the checkpoint storage as pluggable collaborators.
//!
//! ```no_run
//! use std::sync::Arc;
//! use wesichain_deepresearch::{
//!     ConversationMessage, OverallState, ResearchConfig, ResearchEngine, SearchCapability,
//! };
//!
//! # async fn run(llm: Arc<dyn wesichain_deepresearch::Llm>) {
//! let engine = ResearchEngine::builder()
//!     .with_llm(llm)
//!     .with_search_capability(SearchCapability::Grounded)
//!     .with_config(ResearchConfig::default().with_initial_search_query_count(2))
//!     .build();
//!
//! let mut state = OverallState::new(2, 3, "default");
//! state.messages.push(ConversationMessage::user("m1", "Who scored most goals in Euro 2024?"));
//!
//! let outcome = engine.invoke("thread-1", state).await.unwrap();
//! # let _ = outcome;
//! # }
//! ```

mod citation;
mod collaborators;
mod config;
mod driver;
mod error;
mod keywords;
mod nodes;
mod routers;
mod state;

pub use citation::{insert_citations, ShortUrlAssigner};
pub use collaborators::{
    backoff_with_jitter, GroundedResponse, GroundingChunk, Llm, RateLimiter, RetryingLlm,
    RetryingSearchProvider, SearchCapability, SearchHit, SearchProvider,
};
pub use config::ResearchConfig;
pub use driver::{ResearchEngine, ResearchEngineBuilder, RunOutcome, StreamEvent};
pub use error::{
    CollaboratorError, LlmError, RateLimitError, ResearchError, SearchError, TimeoutError,
    ValidationError,
};
pub use keywords::{extract_keywords, validate_web_results};
pub use nodes::{InterruptReason, NodeOutcome, PlanningCommand, ReflectionVerdict, WebResearchDispatch};
pub use routers::{evaluate_research, fanout_router, planning_router, PlanningRoute, ResearchRoute};
pub use state::{
    ConversationMessage, OverallState, OverallStateDelta, PlanStep, PlanStepStatus, PlanningStatus,
    SourceRecord, WebResearchResult,
};
