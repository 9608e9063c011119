use crate::{GraphError, StateSchema, StateUpdate};

#[derive(Debug)]
pub enum GraphEvent<S: StateSchema> {
    NodeEnter { node: String, timestamp: u64 },
    NodeFinished {
        node: String,
        output: String,
        timestamp: u64,
    },
    NodeExit { node: String, timestamp: u64 },
    CheckpointSaved { node: String, timestamp: u64 },
    StateUpdate(StateUpdate<S>),
    Error(GraphError),
}
