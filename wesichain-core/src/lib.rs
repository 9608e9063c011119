mod agent_event;
mod binding;
mod callbacks;
mod chain;
mod document;
mod embedding;
mod error;
mod fallbacks;
mod llm;
mod metadata_filter;
mod output_parsers;
pub mod persistence;
mod react;
pub mod registry;
mod retrieval_state;
mod retry;
pub mod runnable;
mod runnable_parallel;
pub mod serde;
mod tool;
mod value;
mod vector_store;
pub mod state;
pub mod checkpoint;

pub use agent_event::AgentEvent;
pub use binding::{Bindable, RunnableBinding};
pub use callbacks::{
    ensure_object, CallbackHandler, CallbackManager, LlmInput, LlmResult, RunConfig, RunContext,
    RunType, TokenUsage, ToTraceInput, ToTraceOutput, TracedRunnable,
};
pub use chain::{Chain, RunnableExt, RuntimeChain};
pub use document::Document;
pub use embedding::{embed_batch_ref_dyn, embed_batch_strs_dyn, Embedding};
pub use error::{EmbeddingError, StoreError, WesichainError};
pub use fallbacks::RunnableWithFallbacks;
pub use llm::{
    LlmRequest, LlmResponse, Message, Role, ToolCall, ToolCallingLlm, ToolCallingLlmExt, ToolSpec,
};
pub use metadata_filter::MetadataFilter;
pub use output_parsers::{
    BaseOutputParser, JsonOutputParser, StrOutputParser, StructuredOutputParser,
};
pub use persistence::{load_runnable, reconstruct, save_runnable};
pub use react::{HasFinalOutput, HasUserInput, ReActStep, ScratchpadState};
pub use registry::RunnableRegistry;
pub use retrieval_state::{HasMetadataFilter, HasQuery, HasRetrievedDocs};
pub use retry::Retrying;
pub use runnable::{Runnable, StreamEvent};
pub use runnable_parallel::RunnableParallel;
pub use serde::SerializableRunnable;
pub use tool::{Tool, ToolError};
pub use value::{IntoValue, TryFromValue, Value};
pub use vector_store::{delete_ref_dyn, delete_strs_dyn, SearchResult, VectorStore};
