//! Core engine for statecell
//!
//! This crate provides a predictable, single-threaded state container in the
//! Redux tradition: one state cell, changed only by dispatching actions
//! through a reducer, with synchronous change notification.
//!
//! # Core Concepts
//!
//! - **Action**: a JSON record with a `type` field describing a change request
//! - **Reducer**: a pure `(state, action) -> state` function
//! - **Store**: holds the state, runs the reducer, notifies listeners
//! - **combine_reducers**: splits state into named slices, one reducer each
//! - **Middleware**: intercepts dispatch, installed with `apply_middleware`
//!
//! # Basic Example
//!
//! ```
//! use serde_json::{json, Value};
//! use statecell_core::prelude::*;
//!
//! let todos = Reducer::leaf(|state: Option<&Value>, action: &Value| {
//!     let mut todos = state.cloned().unwrap_or_else(|| json!([]));
//!     if action["type"] == "todos/add" {
//!         todos.as_array_mut()?.push(action["text"].clone());
//!     }
//!     Some(todos)
//! });
//! let filter = Reducer::leaf(|state: Option<&Value>, action: &Value| {
//!     if action["type"] == "filter/set" {
//!         return Some(action["filter"].clone());
//!     }
//!     Some(state.cloned().unwrap_or_else(|| json!("all")))
//! });
//!
//! let store = create_store(
//!     combine_reducers([("todos", todos), ("filter", filter)]),
//!     None,
//!     None,
//! )
//! .unwrap();
//! store.dispatch(json!({"type": "todos/add", "text": "milk"})).unwrap();
//!
//! let state = store.get_state().unwrap().unwrap();
//! assert_eq!(state, json!({"todos": ["milk"], "filter": "all"}));
//! ```
//!
//! # Typed actions
//!
//! Enums deriving `serde::Serialize` with `#[serde(tag = "type")]` and
//! implementing [`Action`] can be dispatched with [`Store::dispatch_action`].
//! The `statecell` facade crate provides `#[derive(Action)]`.

pub mod action;
pub mod bind;
pub mod combine;
pub mod compose;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod middleware;
pub mod observable;
pub mod reducer;
pub mod shape;
pub mod state;
pub mod store;
pub mod testing;

// Actions
pub use action::{action, action_with_payload, Action};

// Errors and configuration
pub use config::Mode;
pub use control::ControlActions;
pub use diagnostics::{Warning, WarningSink};
pub use error::{Result, StoreError};

// State and reducers
pub use combine::{combine_reducers, CombineReducers};
pub use reducer::Reducer;
pub use state::{Slices, State};

// Store exports
pub use store::{
    create_store, Dispatch, Enhancer, Listener, Store, StoreBuilder, StoreCreator, Subscription,
    WeakStore,
};

// Middleware
pub use compose::compose;
pub use middleware::{
    apply_middleware, middleware_fn, ActionLoggerConfig, LoggingMiddleware, Middleware,
    MiddlewareApi,
};

// Observable
pub use observable::{Observer, StateObservable};

// Binder
pub use bind::{bind_action_creator, bind_action_creators, ActionCreator, BoundActionCreator};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{action, Action};
    pub use crate::bind::{bind_action_creator, bind_action_creators, ActionCreator};
    pub use crate::combine::{combine_reducers, CombineReducers};
    pub use crate::compose::compose;
    pub use crate::error::{Result, StoreError};
    pub use crate::middleware::{apply_middleware, middleware_fn, Middleware, MiddlewareApi};
    pub use crate::observable::Observer;
    pub use crate::reducer::Reducer;
    pub use crate::state::State;
    pub use crate::store::{create_store, Dispatch, Store, StoreBuilder, Subscription};
}
