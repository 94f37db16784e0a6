//! Reducers: pure `(state, action) -> next state` functions

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::state::State;

type ReduceFn = dyn Fn(Option<State>, &Value) -> Result<Option<State>>;

/// A state transition function.
///
/// The incoming state is `None` (undefined) only on the very first call for a
/// slice; the reducer must then produce a concrete initial value. For actions
/// it does not recognize it must hand back the state it was given. Returning
/// `Ok(None)` means "undefined", which a combined reducer rejects.
///
/// # Example
/// ```
/// use serde_json::{json, Value};
/// use statecell_core::Reducer;
///
/// let counter = Reducer::leaf(|state: Option<&Value>, action: &Value| {
///     let count = state.and_then(Value::as_i64).unwrap_or(0);
///     match action["type"].as_str() {
///         Some("increment") => Some(json!(count + 1)),
///         _ => Some(json!(count)),
///     }
/// });
/// let next = counter.reduce(None, &json!({"type": "increment"})).unwrap();
/// assert_eq!(next.unwrap(), json!(1));
/// ```
#[derive(Clone)]
pub struct Reducer(Rc<ReduceFn>);

impl Reducer {
    /// Wrap a fallible reducer. Errors propagate out of `dispatch`.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<State>, &Value) -> Result<Option<State>> + 'static,
    {
        Reducer(Rc::new(f))
    }

    /// Wrap a reducer that cannot fail
    pub fn infallible<F>(f: F) -> Self
    where
        F: Fn(Option<State>, &Value) -> Option<State> + 'static,
    {
        Reducer::new(move |state, action| Ok(f(state, action)))
    }

    /// Reducer over plain JSON data.
    ///
    /// When the returned value equals the incoming one the original `State`
    /// is passed through untouched, so no-op actions keep reference identity.
    pub fn leaf<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>, &Value) -> Option<Value> + 'static,
    {
        Reducer::new(move |state, action| {
            let current = state.as_ref().map(State::to_json);
            let next = f(current.as_ref(), action);
            Ok(match (state, next) {
                (Some(prev), Some(next)) if current.as_ref() == Some(&next) => Some(prev),
                (_, next) => next.map(|value| State::Leaf(Arc::new(value))),
            })
        })
    }

    /// Run the reducer once
    pub fn reduce(&self, state: Option<State>, action: &Value) -> Result<Option<State>> {
        (self.0)(state, action)
    }

    /// Identity of the underlying function
    pub fn ptr_eq(a: &Reducer, b: &Reducer) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reducer").finish_non_exhaustive()
    }
}
