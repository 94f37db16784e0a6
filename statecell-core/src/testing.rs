//! Test utilities for statecell stores
//!
//! - [`counter_reducer`]: a small numeric reducer fixture
//! - [`ListenerProbe`]: counts listener calls and optionally records states
//! - [`RecordingMiddleware`]: captures every action passing through dispatch
//! - [`WarningCollector`]: a warning sink that keeps warnings for inspection
//! - Assertion macros over recorded action types
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use statecell_core::testing::{counter_reducer, ListenerProbe, RecordingMiddleware};
//! use statecell_core::{action, apply_middleware, assert_dispatched, create_store, Middleware};
//!
//! let recorder = Rc::new(RecordingMiddleware::new());
//! let store = create_store(
//!     counter_reducer(),
//!     None,
//!     Some(apply_middleware(vec![recorder.clone() as Rc<dyn Middleware>])),
//! )
//! .unwrap();
//! let probe = ListenerProbe::watching(&store);
//! store.subscribe(probe.listener()).unwrap();
//!
//! store.dispatch(action("increment")).unwrap();
//!
//! assert_dispatched!(recorder, "increment");
//! assert_eq!(probe.count(), 1);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::{json, Value};

use crate::action::describe_type;
use crate::diagnostics::{Warning, WarningSink};
use crate::error::Result;
use crate::middleware::{Middleware, MiddlewareApi};
use crate::reducer::Reducer;
use crate::store::{Dispatch, Store, WeakStore};

/// Numeric reducer starting at `0`.
///
/// Handles `increment`, `decrement` and `add` (reading `amount`); anything
/// else leaves the state untouched.
pub fn counter_reducer() -> Reducer {
    Reducer::leaf(|state, action| {
        let count = state.and_then(Value::as_i64).unwrap_or(0);
        let next = match action["type"].as_str() {
            Some("increment") => count + 1,
            Some("decrement") => count - 1,
            Some("add") => count + action["amount"].as_i64().unwrap_or(0),
            _ => count,
        };
        Some(json!(next))
    })
}

/// Counts listener invocations.
///
/// Clones share their counters, so a clone can be moved into the store while
/// the test keeps the original.
#[derive(Clone, Default)]
pub struct ListenerProbe {
    calls: Rc<Cell<usize>>,
    states: Rc<RefCell<Vec<Option<Value>>>>,
    store: Option<WeakStore>,
}

impl ListenerProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe that also records the store's state on every call
    pub fn watching(store: &Store) -> Self {
        Self {
            store: Some(store.downgrade()),
            ..Self::default()
        }
    }

    /// A listener to pass to [`Store::subscribe`]
    pub fn listener(&self) -> impl Fn() + 'static {
        let probe = self.clone();
        move || {
            probe.calls.set(probe.calls.get() + 1);
            let Some(store) = probe.store.as_ref().and_then(WeakStore::upgrade) else {
                return;
            };
            if let Ok(state) = store.get_state() {
                probe
                    .states
                    .borrow_mut()
                    .push(state.as_ref().map(|s| s.to_json()));
            }
        }
    }

    /// How many times any listener from this probe ran
    pub fn count(&self) -> usize {
        self.calls.get()
    }

    /// Recorded states, oldest first. Empty unless built with
    /// [`ListenerProbe::watching`].
    pub fn states(&self) -> Vec<Option<Value>> {
        self.states.borrow().clone()
    }
}

/// Middleware recording every action that reaches it, then passing it on.
#[derive(Debug, Default)]
pub struct RecordingMiddleware {
    actions: RefCell<Vec<Value>>,
}

impl RecordingMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded actions in dispatch order
    pub fn actions(&self) -> Vec<Value> {
        self.actions.borrow().clone()
    }

    /// Recorded action types in dispatch order
    pub fn types(&self) -> Vec<String> {
        self.actions
            .borrow()
            .iter()
            .filter_map(describe_type)
            .collect()
    }

    /// Take the recorded actions, leaving the recorder empty
    pub fn drain(&self) -> Vec<Value> {
        std::mem::take(&mut *self.actions.borrow_mut())
    }
}

impl Middleware for RecordingMiddleware {
    fn handle(&self, _api: &MiddlewareApi, action: Value, next: &Dispatch) -> Result<Value> {
        self.actions.borrow_mut().push(action.clone());
        next(action)
    }
}

/// Warning sink that stores what it receives.
#[derive(Clone, Default)]
pub struct WarningCollector {
    warnings: Rc<RefCell<Vec<Warning>>>,
}

impl WarningCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink feeding this collector
    pub fn sink(&self) -> WarningSink {
        let warnings = Rc::clone(&self.warnings);
        Rc::new(move |warning: &Warning| warnings.borrow_mut().push(warning.clone()))
    }

    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.warnings.borrow_mut().clear();
    }
}

/// Assert that an action of the given type went through a recorder.
///
/// # Example
///
/// ```ignore
/// assert_dispatched!(recorder, "todos/add");
/// ```
#[macro_export]
macro_rules! assert_dispatched {
    ($recorder:expr, $ty:expr) => {{
        let types = $recorder.types();
        assert!(
            types.iter().any(|t| t == $ty),
            "Expected action `{}` to be dispatched, but got: {:?}",
            $ty,
            types
        );
    }};
}

/// Assert that NO action of the given type went through a recorder.
#[macro_export]
macro_rules! assert_not_dispatched {
    ($recorder:expr, $ty:expr) => {{
        let types = $recorder.types();
        assert!(
            !types.iter().any(|t| t == $ty),
            "Expected action `{}` NOT to be dispatched, but got: {:?}",
            $ty,
            types
        );
    }};
}

/// Count how many recorded actions have the given type.
#[macro_export]
macro_rules! count_dispatched {
    ($recorder:expr, $ty:expr) => {
        $recorder.types().iter().filter(|t| *t == $ty).count()
    };
}
