mod checkpoint;
mod config;
mod error;
mod file_checkpointer;
mod graph;
mod interrupt;
mod observer;
mod program;
mod react_agent;
mod reducer;
mod retriever_node;
mod state;
mod stream;
mod tool_node;

pub use checkpoint::{
    Checkpoint, CheckpointMetadata, Checkpointer, HistoryCheckpointer, InMemoryCheckpointer,
};
pub use config::{ExecutionConfig, ExecutionOptions};
pub use error::GraphError;
pub use file_checkpointer::{CheckpointRecord, FileCheckpointer};
pub use graph::{ExecutableGraph, GraphBuilder};
pub use interrupt::GraphInterrupt;
pub use observer::Observer;
pub use program::{EdgeKind, GraphProgram, NodeData};
pub use react_agent::{ReActAgentNode, ToolFailurePolicy};
pub use reducer::{AddCounter, AppendVec, MergeMap, Override};
pub use retriever_node::RetrieverNode;
pub use state::{GraphState, StateSchema, StateUpdate};
pub use stream::GraphEvent;
pub use tool_node::{HasToolCalls, ToolNode};

pub const START: &str = "__start";
pub const END: &str = "__end";
