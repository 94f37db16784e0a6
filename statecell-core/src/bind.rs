//! Action creators that dispatch on call

use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::Result;
use crate::store::Dispatch;

/// Builds an action record from its arguments
pub type ActionCreator = Rc<dyn Fn(Value) -> Value>;

/// An action creator whose result goes straight into `dispatch`
pub type BoundActionCreator = Rc<dyn Fn(Value) -> Result<Value>>;

/// Wrap `creator` so that calling it dispatches the action it builds and
/// returns whatever dispatch returned.
///
/// # Example
/// ```
/// use std::rc::Rc;
/// use serde_json::{json, Value};
/// use statecell_core::{bind_action_creator, create_store, ActionCreator, Reducer};
///
/// let store = create_store(Reducer::infallible(|state, _| state), None, None).unwrap();
/// let add: ActionCreator = Rc::new(|text: Value| json!({"type": "todos/add", "text": text}));
/// let add = bind_action_creator(add, store.dispatcher());
///
/// let dispatched = add(json!("milk")).unwrap();
/// assert_eq!(dispatched["text"], "milk");
/// ```
pub fn bind_action_creator(creator: ActionCreator, dispatch: Dispatch) -> BoundActionCreator {
    Rc::new(move |args: Value| dispatch(creator(args)))
}

/// Bind every creator in `creators`, keeping keys and order
pub fn bind_action_creators(
    creators: IndexMap<String, ActionCreator>,
    dispatch: Dispatch,
) -> IndexMap<String, BoundActionCreator> {
    creators
        .into_iter()
        .map(|(key, creator)| {
            let bound = bind_action_creator(creator, Rc::clone(&dispatch));
            (key, bound)
        })
        .collect()
}
