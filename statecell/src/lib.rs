//! statecell: a predictable state container for Rust
//!
//! Like Redux, but typed where it helps. All state lives in one store and
//! changes only by dispatching actions through reducers; listeners hear about
//! every change synchronously.
//!
//! # Example
//! ```
//! use serde::Serialize;
//! use serde_json::{json, Value};
//! use statecell::prelude::*;
//!
//! #[derive(Action, Serialize)]
//! #[serde(tag = "type")]
//! #[action(prefix = "counter", rename_all = "snake_case")]
//! enum CounterAction {
//!     Increment,
//!     AddAmount { amount: i64 },
//! }
//!
//! let counter = Reducer::leaf(|state: Option<&Value>, action: &Value| {
//!     let count = state.and_then(Value::as_i64).unwrap_or(0);
//!     match action["type"].as_str() {
//!         Some("counter/increment") => Some(json!(count + 1)),
//!         Some("counter/add_amount") => Some(json!(count + action["amount"].as_i64()?)),
//!         _ => Some(json!(count)),
//!     }
//! });
//!
//! let store = create_store(counter, None, None).unwrap();
//! store.dispatch_action(&CounterAction::Increment).unwrap();
//! store.dispatch_action(&CounterAction::AddAmount { amount: 10 }).unwrap();
//! assert_eq!(store.get_state().unwrap().unwrap(), json!(11));
//! ```

// Re-export everything from core
pub use statecell_core::*;

// Re-export derive macros
pub use statecell_macros::Action;

/// Prelude for convenient imports
pub mod prelude {
    // Traits and derive
    pub use statecell_core::{Action, Middleware, Observer};
    pub use statecell_macros::Action;

    // Store
    pub use statecell_core::{
        action, create_store, Dispatch, Reducer, State, Store, StoreBuilder, StoreError,
        Subscription,
    };

    // Composition
    pub use statecell_core::{
        apply_middleware, bind_action_creator, bind_action_creators, combine_reducers, compose,
        middleware_fn, ActionCreator, CombineReducers, MiddlewareApi,
    };
}
