//! Merging independent slice reducers into one
//!
//! The combined reducer owns a composite state whose keys are exactly the
//! registered reducer keys. Each slice reducer only ever sees its own slice,
//! and all of them see the same action, in registration order.
//!
//! # Example
//! ```
//! use serde_json::{json, Value};
//! use statecell_core::{combine_reducers, create_store, Reducer};
//!
//! let count = Reducer::leaf(|state: Option<&Value>, action: &Value| {
//!     let n = state.and_then(Value::as_i64).unwrap_or(0);
//!     let next = if action["type"] == "increment" { n + 1 } else { n };
//!     Some(json!(next))
//! });
//! let log = Reducer::leaf(|state: Option<&Value>, action: &Value| {
//!     let mut entries = state.cloned().unwrap_or_else(|| json!([]));
//!     if action["type"] == "increment" {
//!         entries.as_array_mut()?.push(json!("+1"));
//!     }
//!     Some(entries)
//! });
//!
//! let store = create_store(combine_reducers([("count", count), ("log", log)]), None, None).unwrap();
//! store.dispatch(json!({"type": "increment"})).unwrap();
//! assert_eq!(
//!     store.get_state().unwrap().unwrap(),
//!     json!({"count": 1, "log": ["+1"]})
//! );
//! ```

use std::cell::RefCell;
use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::action::describe_type;
use crate::config::Mode;
use crate::control::ControlActions;
use crate::diagnostics::{tracing_sink, Warning, WarningSink};
use crate::error::{Result, StoreError};
use crate::reducer::Reducer;
use crate::shape::kind_of;
use crate::state::{Slices, State};

/// Combine named slice reducers using the default configuration.
pub fn combine_reducers<K, I>(reducers: I) -> Reducer
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Reducer)>,
{
    reducers
        .into_iter()
        .fold(CombineReducers::new(), |builder, (key, reducer)| {
            builder.reducer(key, reducer)
        })
        .build()
}

/// Configurable reducer combination.
///
/// Entries registered with [`CombineReducers::missing`] stand for keys whose
/// reducer is undefined: they are left out of the state and reported as a
/// warning in development mode.
pub struct CombineReducers {
    entries: Vec<(String, Option<Reducer>)>,
    control: Option<ControlActions>,
    mode: Mode,
    sink: WarningSink,
}

impl Default for CombineReducers {
    fn default() -> Self {
        Self::new()
    }
}

impl CombineReducers {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            control: None,
            mode: Mode::current(),
            sink: tracing_sink(),
        }
    }

    /// Register the reducer for one slice
    pub fn reducer(self, key: impl Into<String>, reducer: Reducer) -> Self {
        self.entry(key, Some(reducer))
    }

    /// Register a key that has no reducer
    pub fn missing(self, key: impl Into<String>) -> Self {
        self.entry(key, None)
    }

    pub fn entry(mut self, key: impl Into<String>, reducer: Option<Reducer>) -> Self {
        self.entries.push((key.into(), reducer));
        self
    }

    /// Control action types; must match the store's
    pub fn control_actions(mut self, control: ControlActions) -> Self {
        self.control = Some(control);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Where development warnings go (defaults to `tracing`)
    pub fn on_warning(mut self, sink: WarningSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn build(self) -> Reducer {
        let Self {
            entries,
            control,
            mode,
            sink,
        } = self;
        let control = control.unwrap_or_else(|| ControlActions::global().clone());

        let mut reducers: IndexMap<String, Reducer> = IndexMap::with_capacity(entries.len());
        for (key, reducer) in entries {
            match reducer {
                Some(reducer) => {
                    reducers.insert(key, reducer);
                }
                None => {
                    // The last write for a key wins, even when it is undefined
                    reducers.shift_remove(&key);
                    if mode.is_development() {
                        sink(&Warning::MissingReducer { key });
                    }
                }
            }
        }

        // Reported on first use so building never fails
        let shape_error = assert_reducer_shape(&reducers, &control).err();
        if let Some(err) = &shape_error {
            tracing::debug!(error = %err, "Deferring reducer shape error");
        }

        let combination = Combination {
            keys: reducers.keys().cloned().collect(),
            reducers,
            mode,
            sink,
            shape_error,
            unexpected_key_cache: RefCell::new(HashSet::new()),
        };
        Reducer::new(move |state, action| combination.reduce(state, action))
    }
}

struct Combination {
    reducers: IndexMap<String, Reducer>,
    keys: Vec<String>,
    mode: Mode,
    sink: WarningSink,
    shape_error: Option<StoreError>,
    unexpected_key_cache: RefCell<HashSet<String>>,
}

impl Combination {
    fn reduce(&self, state: Option<State>, action: &Value) -> Result<Option<State>> {
        if let Some(err) = &self.shape_error {
            return Err(err.clone());
        }

        if self.mode.is_development() {
            if let Some(warning) = self.unexpected_state_shape(state.as_ref(), action) {
                (self.sink)(&warning);
            }
        }

        let mut has_changed = false;
        let mut next = Slices::with_capacity(self.reducers.len());
        for (key, reducer) in &self.reducers {
            let previous = state.as_ref().and_then(|state| state.get(key));
            let next_for_key =
                reducer
                    .reduce(previous.clone(), action)?
                    .ok_or_else(|| StoreError::State {
                        key: key.clone(),
                        action_type: describe_type(action),
                    })?;
            has_changed = has_changed
                || !previous
                    .as_ref()
                    .is_some_and(|previous| State::ptr_eq(previous, &next_for_key));
            next.insert(key.clone(), next_for_key);
        }
        let previous_len = state.as_ref().map_or(0, State::len);
        has_changed = has_changed || self.reducers.len() != previous_len;

        Ok(Some(match state {
            Some(state) if !has_changed => state,
            None if !has_changed => State::tree(Slices::new()),
            _ => State::tree(next),
        }))
    }

    fn unexpected_state_shape(&self, state: Option<&State>, action: &Value) -> Option<Warning> {
        let argument = if ControlActions::is_init(action) {
            "preloaded state argument passed to create_store"
        } else {
            "previous state received by the reducer"
        };

        if self.keys.is_empty() {
            return Some(Warning::EmptyReducerMap);
        }

        // Undefined state defaults to an empty record
        let state = state?;
        if !state.is_record() {
            let kind = state.as_value().map_or("object", kind_of);
            return Some(Warning::UnexpectedStateType {
                argument,
                kind,
                expected_keys: self.keys.clone(),
            });
        }

        let mut cache = self.unexpected_key_cache.borrow_mut();
        let unexpected: Vec<String> = state
            .keys()
            .into_iter()
            .filter(|key| !self.reducers.contains_key(key) && !cache.contains(key))
            .collect();
        cache.extend(unexpected.iter().cloned());

        // Slice shape drift is expected right after a reducer swap
        if ControlActions::is_replace(action) || unexpected.is_empty() {
            return None;
        }
        Some(Warning::UnexpectedKeys {
            argument,
            keys: unexpected,
            expected_keys: self.keys.clone(),
        })
    }
}

fn assert_reducer_shape(reducers: &IndexMap<String, Reducer>, control: &ControlActions) -> Result<()> {
    for (key, reducer) in reducers {
        let initial = reducer.reduce(None, &control.init_action())?;
        if initial.is_none() {
            return Err(StoreError::Shape {
                key: key.clone(),
                message: "returned undefined during initialization. If the state passed to the \
                          reducer is undefined, you must explicitly return the initial state. \
                          The initial state may not be undefined. If you don't want to set a \
                          value for this reducer, you can use null instead of undefined."
                    .to_string(),
            });
        }

        let probe = json!({ "type": control.probe_unknown_action() });
        if reducer.reduce(None, &probe)?.is_none() {
            return Err(StoreError::Shape {
                key: key.clone(),
                message: format!(
                    "returned undefined when probed with a random type. Don't try to handle \
                     '{}' or other actions in the \"@@statecell/*\" namespace. They are \
                     considered private. Instead, you must return the current state for any \
                     unknown actions, unless it is undefined, in which case you must return \
                     the initial state, regardless of the action type. The initial state may \
                     not be undefined, but can be null.",
                    control.init()
                ),
            });
        }
    }
    Ok(())
}
