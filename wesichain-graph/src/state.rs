use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A state record that can be threaded through a graph run.
///
/// `Update` is usually `Self`: most states are just merged with a partial
/// copy of themselves. Graphs that want a narrower delta type (e.g. only the
/// fields a particular node is allowed to touch) can set `Update` to
/// something else and implement `apply` accordingly.
pub trait StateSchema: Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static {
    type Update: Clone + Serialize + DeserializeOwned + Send + Sync + 'static;

    fn apply(current: &Self, update: Self::Update) -> Self;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(bound = "S: StateSchema")]
pub struct GraphState<S: StateSchema> {
    pub data: S,
}

impl<S: StateSchema> GraphState<S> {
    pub fn new(data: S) -> Self {
        Self { data }
    }

    pub fn apply_update(self, update: StateUpdate<S>) -> Self {
        Self {
            data: S::apply(&self.data, update.data),
        }
    }

    pub fn apply(self, update: StateUpdate<S>) -> Self {
        self.apply_update(update)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(bound = "S: StateSchema")]
pub struct StateUpdate<S: StateSchema> {
    pub data: S::Update,
}

impl<S: StateSchema> StateUpdate<S> {
    pub fn new(data: S::Update) -> Self {
        Self { data }
    }
}
