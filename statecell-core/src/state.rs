//! The state tree held by a store
//!
//! State is immutable between dispatches. Reducers hand back either a new
//! value or the very same [`State`] they received, and change detection relies
//! on that reference identity ([`State::ptr_eq`]).

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Composite state keyed by slice name, in reducer order
pub type Slices = IndexMap<String, State>;

/// A node of the state tree.
///
/// `Leaf` holds arbitrary JSON data. `Tree` is the composite produced by a
/// combined reducer, one entry per slice. Cloning is cheap and keeps identity.
#[derive(Clone)]
pub enum State {
    Leaf(Arc<Value>),
    Tree(Arc<Slices>),
}

impl State {
    /// Wrap a JSON value
    pub fn leaf(value: impl Into<Value>) -> Self {
        State::Leaf(Arc::new(value.into()))
    }

    /// Build a composite from slices
    pub fn tree(slices: Slices) -> Self {
        State::Tree(Arc::new(slices))
    }

    /// `null` is a valid concrete state, distinct from undefined (`None`)
    pub fn null() -> Self {
        State::leaf(Value::Null)
    }

    /// Reference identity: both handles point at the same allocation.
    pub fn ptr_eq(a: &State, b: &State) -> bool {
        match (a, b) {
            (State::Leaf(a), State::Leaf(b)) => Arc::ptr_eq(a, b),
            (State::Tree(a), State::Tree(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The JSON value behind a leaf
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            State::Leaf(value) => Some(value),
            State::Tree(_) => None,
        }
    }

    /// Whether this node is a structural record, either a composite or a
    /// leaf holding a JSON object.
    pub fn is_record(&self) -> bool {
        match self {
            State::Leaf(value) => value.is_object(),
            State::Tree(_) => true,
        }
    }

    /// Read one slice.
    ///
    /// For a JSON object leaf the field is copied into a fresh leaf; for a
    /// composite the stored slice is returned with its identity intact.
    pub fn get(&self, key: &str) -> Option<State> {
        match self {
            State::Tree(slices) => slices.get(key).cloned(),
            State::Leaf(value) => value.get(key).cloned().map(State::leaf),
        }
    }

    /// Keys of a record, empty for anything else
    pub fn keys(&self) -> Vec<String> {
        match self {
            State::Tree(slices) => slices.keys().cloned().collect(),
            State::Leaf(value) => value
                .as_object()
                .map(|map| map.keys().cloned().collect())
                .unwrap_or_default(),
        }
    }

    /// Number of keys in a record
    pub fn len(&self) -> usize {
        match self {
            State::Tree(slices) => slices.len(),
            State::Leaf(value) => value.as_object().map(Map::len).unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the whole subtree as plain JSON
    pub fn to_json(&self) -> Value {
        match self {
            State::Leaf(value) => (**value).clone(),
            State::Tree(slices) => Value::Object(
                slices
                    .iter()
                    .map(|(key, slice)| (key.clone(), slice.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for State {
    fn from(value: Value) -> Self {
        State::Leaf(Arc::new(value))
    }
}

impl From<Slices> for State {
    fn from(slices: Slices) -> Self {
        State::tree(slices)
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        State::ptr_eq(self, other) || self.to_json() == other.to_json()
    }
}

impl PartialEq<Value> for State {
    fn eq(&self, other: &Value) -> bool {
        match self {
            State::Leaf(value) => **value == *other,
            State::Tree(_) => self.to_json() == *other,
        }
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Leaf(value) => write!(f, "Leaf({value})"),
            State::Tree(slices) => f.debug_map().entries(slices.iter()).finish(),
        }
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            State::Leaf(value) => value.serialize(serializer),
            State::Tree(slices) => serializer.collect_map(slices.iter()),
        }
    }
}
