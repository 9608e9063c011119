use std::time::Duration;

use thiserror::Error;
use wesichain_core::WesichainError;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("checkpoint failed: {0}")]
    Checkpoint(String),
    #[error("max steps exceeded: reached {reached}, limit {max}")]
    MaxStepsExceeded { max: usize, reached: usize },
    #[error("max visits exceeded for node '{node}': limit {max}")]
    MaxVisitsExceeded { node: String, max: u32 },
    #[error("max loop iterations exceeded for node '{node}' on path {path_id}: limit {max}")]
    MaxLoopIterationsExceeded {
        node: String,
        max: u32,
        path_id: u64,
    },
    #[error("cycle detected: node '{node}' repeated in recent window")]
    CycleDetected { node: String, recent: Vec<String> },
    #[error("node '{node}' timed out after {elapsed:?}")]
    Timeout { node: String, elapsed: Duration },
    #[error("execution interrupted")]
    Interrupted,
    #[error("missing entry node: {node}")]
    MissingNode { node: String },
    #[error("invalid edge: no such node '{node}'")]
    InvalidEdge { node: String },
    #[error("node '{node}' failed: {source}")]
    NodeFailed {
        node: String,
        #[source]
        source: Box<WesichainError>,
    },
    #[error("tool call failed for '{0}': {1}")]
    ToolCallFailed(String, String),
    #[error("invalid tool call response: {0}")]
    InvalidToolCallResponse(String),
    #[error("duplicate tool name: {0}")]
    DuplicateToolName(String),
    #[error("scheduler error: {0}")]
    System(String),
}

impl From<WesichainError> for GraphError {
    fn from(error: WesichainError) -> Self {
        GraphError::Checkpoint(error.to_string())
    }
}
