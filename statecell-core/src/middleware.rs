//! Middleware: composable interception of dispatch
//!
//! [`apply_middleware`] builds an [`Enhancer`] that threads every dispatched
//! action through an ordered chain of middleware before it reaches the
//! store's own dispatch. For `[a, b, c]`, `a` runs first and decides whether
//! and when to call `next` (which runs `b`, and so on down to the store).
//!
//! # Example
//! ```
//! use serde_json::json;
//! use statecell_core::{apply_middleware, create_store, middleware_fn, Reducer};
//!
//! // Drop every action whose type starts with "debug/"
//! let filter = middleware_fn(|_api, action, next| {
//!     if action["type"].as_str().is_some_and(|ty| ty.starts_with("debug/")) {
//!         return Ok(action);
//!     }
//!     next(action)
//! });
//!
//! let store = create_store(
//!     Reducer::infallible(|state, _| state),
//!     None,
//!     Some(apply_middleware(vec![filter])),
//! )
//! .unwrap();
//! store.dispatch(json!({"type": "debug/ping"})).unwrap();
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::Instant;

use serde_json::Value;

use crate::action::describe_type;
use crate::compose::{compose, Unary};
use crate::error::{Result, StoreError};
use crate::reducer::Reducer;
use crate::state::State;
use crate::store::{Dispatch, Enhancer, Store, StoreCreator};

/// What a middleware can reach of the store it wraps.
///
/// `dispatch` always enters the fully composed pipeline, not the next stage.
#[derive(Clone)]
pub struct MiddlewareApi {
    store: Store,
    dispatch: Weak<RefCell<Dispatch>>,
}

impl MiddlewareApi {
    /// State of the underlying store
    pub fn get_state(&self) -> Result<Option<State>> {
        self.store.get_state()
    }

    /// Dispatch from the top of the middleware chain
    pub fn dispatch(&self, action: Value) -> Result<Value> {
        let slot = self
            .dispatch
            .upgrade()
            .ok_or_else(|| StoreError::configuration("The store behind this middleware is gone."))?;
        let dispatch = slot.borrow().clone();
        dispatch(action)
    }
}

/// A dispatch-intercepting stage.
///
/// `setup` runs once while the pipeline is assembled; dispatching from it
/// fails. `handle` receives every action and the next stage of the chain; it
/// may call `next` zero, one or many times.
pub trait Middleware {
    fn setup(&self, _api: &MiddlewareApi) -> Result<()> {
        Ok(())
    }

    fn handle(&self, api: &MiddlewareApi, action: Value, next: &Dispatch) -> Result<Value>;
}

impl<F> Middleware for F
where
    F: Fn(&MiddlewareApi, Value, &Dispatch) -> Result<Value>,
{
    fn handle(&self, api: &MiddlewareApi, action: Value, next: &Dispatch) -> Result<Value> {
        self(api, action, next)
    }
}

/// Box a closure as middleware
pub fn middleware_fn<F>(f: F) -> Rc<dyn Middleware>
where
    F: Fn(&MiddlewareApi, Value, &Dispatch) -> Result<Value> + 'static,
{
    Rc::new(f)
}

/// Build an enhancer running every dispatch through `middlewares`, first
/// element outermost.
pub fn apply_middleware(middlewares: Vec<Rc<dyn Middleware>>) -> Enhancer {
    Rc::new(move |create: StoreCreator| {
        let middlewares = middlewares.clone();
        Rc::new(move |reducer: Reducer, preloaded_state: Option<State>| -> Result<Store> {
            let store = create(reducer, preloaded_state)?;

            let placeholder: Dispatch = Rc::new(|_: Value| {
                Err(StoreError::configuration(
                    "Dispatching while constructing your middleware is not allowed. \
                     Other middleware would not be applied to this dispatch.",
                ))
            });
            let slot = Rc::new(RefCell::new(placeholder));
            let api = MiddlewareApi {
                store: store.clone(),
                dispatch: Rc::downgrade(&slot),
            };

            let mut layers: Vec<Unary<Dispatch>> = Vec::with_capacity(middlewares.len());
            for middleware in &middlewares {
                middleware.setup(&api)?;
                let middleware = Rc::clone(middleware);
                let api = api.clone();
                layers.push(Rc::new(move |next: Dispatch| -> Dispatch {
                    let middleware = Rc::clone(&middleware);
                    let api = api.clone();
                    Rc::new(move |action: Value| middleware.handle(&api, action, &next))
                }));
            }

            let composed = compose(layers)(store.dispatcher());
            *slot.borrow_mut() = composed;
            tracing::debug!(middlewares = middlewares.len(), "Middleware applied");

            let dispatch: Dispatch = Rc::new(move |action: Value| {
                let dispatch = slot.borrow().clone();
                dispatch(action)
            });
            Ok(store.with_dispatch(dispatch))
        }) as StoreCreator
    })
}

// ============================================================================
// Logging middleware
// ============================================================================

/// Glob filter for which action types get logged.
///
/// Patterns support:
/// - `*` matches any sequence of characters
/// - `?` matches any single character
/// - Literal text matches exactly
///
/// # Examples
///
/// - `todos/*` matches todos/add, todos/toggle, etc.
/// - `*/failed` matches fetch/failed, save/failed, etc.
/// - `tick` matches only tick
#[derive(Debug, Clone, Default)]
pub struct ActionLoggerConfig {
    /// If non-empty, only log actions matching these patterns
    pub include_patterns: Vec<String>,
    /// Exclude actions matching these patterns (applied after include)
    pub exclude_patterns: Vec<String>,
}

impl ActionLoggerConfig {
    /// Create a new config from comma-separated pattern strings
    ///
    /// # Example
    /// ```
    /// use statecell_core::middleware::ActionLoggerConfig;
    ///
    /// let config = ActionLoggerConfig::new(Some("todos/*,filter/set"), Some("todos/tick"));
    /// assert!(config.should_log("todos/add"));
    /// assert!(config.should_log("filter/set"));
    /// assert!(!config.should_log("todos/tick"));
    /// assert!(!config.should_log("user/login"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        Self {
            include_patterns: include.map(split_patterns).unwrap_or_default(),
            exclude_patterns: exclude.map(split_patterns).unwrap_or_default(),
        }
    }

    /// Create a config with specific pattern vectors
    pub fn with_patterns(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self {
            include_patterns: include,
            exclude_patterns: exclude,
        }
    }

    /// Check if an action type should be logged based on include/exclude patterns
    pub fn should_log(&self, action_type: &str) -> bool {
        if !self.include_patterns.is_empty()
            && !self
                .include_patterns
                .iter()
                .any(|p| glob_match(p, action_type))
        {
            return false;
        }

        !self
            .exclude_patterns
            .iter()
            .any(|p| glob_match(p, action_type))
    }
}

fn split_patterns(patterns: &str) -> Vec<String> {
    patterns
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// An entry in the action log
#[derive(Debug, Clone)]
pub struct ActionLogEntry {
    /// The dispatched action's type
    pub action_type: String,
    /// Timestamp when the action entered the middleware
    pub timestamp: Instant,
    /// Sequence number for ordering
    pub sequence: u64,
    /// Whether the state reference changed (set once `next` returned)
    pub state_changed: Option<bool>,
}

impl ActionLogEntry {
    fn new(action_type: String, sequence: u64) -> Self {
        Self {
            action_type,
            timestamp: Instant::now(),
            sequence,
            state_changed: None,
        }
    }

    /// Time since this action was logged
    pub fn elapsed(&self) -> std::time::Duration {
        self.timestamp.elapsed()
    }
}

/// In-memory ring buffer of recently dispatched actions
#[derive(Debug, Clone)]
pub struct ActionLog {
    entries: VecDeque<ActionLogEntry>,
    capacity: usize,
    next_sequence: u64,
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ActionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_sequence: 0,
        }
    }

    fn push(&mut self, action_type: String) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(ActionLogEntry::new(action_type, sequence));
        sequence
    }

    fn mark(&mut self, sequence: u64, changed: bool) {
        if let Some(entry) = self.entries.iter_mut().rev().find(|e| e.sequence == sequence) {
            entry.state_changed = Some(changed);
        }
    }

    /// Get all entries (oldest first)
    pub fn entries(&self) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter()
    }

    /// Get the most recent N entries (newest first)
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter().rev().take(count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Middleware that logs actions through `tracing`, optionally keeping an
/// in-memory [`ActionLog`].
#[derive(Debug, Default)]
pub struct LoggingMiddleware {
    config: ActionLoggerConfig,
    log: Option<RefCell<ActionLog>>,
    inactive: bool,
}

impl LoggingMiddleware {
    /// Log every action via tracing, no storage
    pub fn new(config: ActionLoggerConfig) -> Self {
        Self {
            config,
            log: None,
            inactive: false,
        }
    }

    /// Also keep the most recent `capacity` entries in memory
    pub fn with_log(config: ActionLoggerConfig, capacity: usize) -> Self {
        Self {
            log: Some(RefCell::new(ActionLog::new(capacity))),
            ..Self::new(config)
        }
    }

    /// When inactive, actions pass straight through.
    pub fn active(mut self, active: bool) -> Self {
        self.inactive = !active;
        self
    }

    pub fn is_active(&self) -> bool {
        !self.inactive
    }

    /// Snapshot of the in-memory log, if storage is enabled
    pub fn log(&self) -> Option<ActionLog> {
        self.log.as_ref().map(|log| log.borrow().clone())
    }

    pub fn config(&self) -> &ActionLoggerConfig {
        &self.config
    }
}

impl Middleware for LoggingMiddleware {
    fn handle(&self, api: &MiddlewareApi, action: Value, next: &Dispatch) -> Result<Value> {
        let action_type = describe_type(&action).unwrap_or_default();
        if self.inactive || !self.config.should_log(&action_type) {
            return next(action);
        }

        tracing::debug!(action = %action_type, "Dispatching action");
        let sequence = self
            .log
            .as_ref()
            .map(|log| log.borrow_mut().push(action_type.clone()));
        let before = api.get_state().ok().flatten();

        let result = next(action)?;

        let after = api.get_state().ok().flatten();
        let state_changed = match (&before, &after) {
            (Some(before), Some(after)) => !State::ptr_eq(before, after),
            (None, None) => false,
            _ => true,
        };
        tracing::debug!(
            action = %action_type,
            state_changed = state_changed,
            "Action processed"
        );
        if let (Some(log), Some(sequence)) = (&self.log, sequence) {
            log.borrow_mut().mark(sequence, state_changed);
        }
        Ok(result)
    }
}

/// Simple glob pattern matching supporting `*` and `?`.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < text.len() {
        match pattern.get(pi) {
            Some('*') => {
                star = Some((pi, ti));
                pi += 1;
            }
            Some(&c) if c == '?' || c == text[ti] => {
                pi += 1;
                ti += 1;
            }
            _ => match star {
                Some((star_pi, star_ti)) => {
                    pi = star_pi + 1;
                    ti = star_ti + 1;
                    star = Some((star_pi, star_ti + 1));
                }
                None => return false,
            },
        }
    }

    pattern[pi..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::action;
    use crate::store::create_store;
    use crate::testing::{counter_reducer, RecordingMiddleware};
    use serde_json::json;
    use std::cell::Cell;

    fn tagging(tag: &'static str, order: &Rc<RefCell<Vec<&'static str>>>) -> Rc<dyn Middleware> {
        let order = Rc::clone(order);
        middleware_fn(move |_api, action, next| {
            order.borrow_mut().push(tag);
            next(action)
        })
    }

    fn store_with(middlewares: Vec<Rc<dyn Middleware>>) -> Store {
        create_store(counter_reducer(), None, Some(apply_middleware(middlewares))).unwrap()
    }

    fn count(store: &Store) -> i64 {
        store.get_state().unwrap().unwrap().to_json().as_i64().unwrap()
    }

    #[test]
    fn test_outer_to_inner_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let store = store_with(vec![tagging("mw1", &order), tagging("mw2", &order)]);

        store.dispatch(action("increment")).unwrap();
        assert_eq!(*order.borrow(), vec!["mw1", "mw2"]);
        assert_eq!(count(&store), 1);
    }

    #[test]
    fn test_short_circuit_skips_reducer() {
        let swallow = middleware_fn(|_api, _action, _next| Ok(json!("swallowed")));
        let store = store_with(vec![swallow]);

        let result = store.dispatch(action("increment")).unwrap();
        assert_eq!(result, json!("swallowed"));
        assert_eq!(count(&store), 0);
    }

    #[test]
    fn test_next_called_twice() {
        let twice = middleware_fn(|_api, action: Value, next| {
            next(action.clone())?;
            next(action)
        });
        let store = store_with(vec![twice]);
        store.dispatch(action("increment")).unwrap();
        assert_eq!(count(&store), 2);
    }

    #[test]
    fn test_api_dispatch_goes_through_whole_chain() {
        let recorder = Rc::new(RecordingMiddleware::new());
        let expand = middleware_fn(|api, action, next| {
            if action["type"] == "increment_twice" {
                api.dispatch(json!({"type": "increment"}))?;
                return api.dispatch(json!({"type": "increment"}));
            }
            next(action)
        });
        let store = store_with(vec![recorder.clone() as Rc<dyn Middleware>, expand]);

        store.dispatch(action("increment_twice")).unwrap();
        assert_eq!(count(&store), 2);
        assert_eq!(
            recorder.types(),
            vec!["increment_twice", "increment", "increment"]
        );
    }

    #[test]
    fn test_api_get_state_sees_underlying_state() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let spy = {
            let seen = Rc::clone(&seen);
            middleware_fn(move |api, action, next| {
                let result = next(action)?;
                seen.borrow_mut().push(api.get_state()?.unwrap().to_json());
                Ok(result)
            })
        };
        let store = store_with(vec![spy]);
        store.dispatch(action("increment")).unwrap();
        store.dispatch(action("increment")).unwrap();
        assert_eq!(*seen.borrow(), vec![json!(1), json!(2)]);
    }

    struct EagerDispatch;

    impl Middleware for EagerDispatch {
        fn setup(&self, api: &MiddlewareApi) -> Result<()> {
            api.dispatch(json!({"type": "too_early"}))?;
            Ok(())
        }

        fn handle(&self, _api: &MiddlewareApi, action: Value, next: &Dispatch) -> Result<Value> {
            next(action)
        }
    }

    #[test]
    fn test_dispatch_during_setup_fails() {
        let result = create_store(
            counter_reducer(),
            None,
            Some(apply_middleware(vec![Rc::new(EagerDispatch) as Rc<dyn Middleware>])),
        );
        let err = result.unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("constructing your middleware"));
    }

    #[test]
    fn test_setup_runs_once_per_store() {
        struct CountSetup(Rc<Cell<u32>>);
        impl Middleware for CountSetup {
            fn setup(&self, _api: &MiddlewareApi) -> Result<()> {
                self.0.set(self.0.get() + 1);
                Ok(())
            }
            fn handle(&self, _api: &MiddlewareApi, action: Value, next: &Dispatch) -> Result<Value> {
                next(action)
            }
        }

        let setups = Rc::new(Cell::new(0));
        let enhancer = apply_middleware(vec![
            Rc::new(CountSetup(Rc::clone(&setups))) as Rc<dyn Middleware>,
        ]);
        let _a = create_store(counter_reducer(), None, Some(Rc::clone(&enhancer))).unwrap();
        let _b = create_store(counter_reducer(), None, Some(enhancer)).unwrap();
        assert_eq!(setups.get(), 2);
    }

    #[test]
    fn test_subscribe_and_replace_pass_through() {
        let recorder = Rc::new(RecordingMiddleware::new());
        let store = store_with(vec![recorder.clone() as Rc<dyn Middleware>]);
        let calls = Rc::new(Cell::new(0));
        {
            let calls = Rc::clone(&calls);
            store.subscribe(move || calls.set(calls.get() + 1)).unwrap();
        }

        store.dispatch(action("increment")).unwrap();
        store.replace_reducer(counter_reducer()).unwrap();

        assert_eq!(calls.get(), 2);
        // REPLACE bypasses middleware
        assert_eq!(recorder.types(), vec!["increment"]);
        assert_eq!(count(&store), 1);
    }

    #[test]
    fn test_enhancers_compose() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let outer = apply_middleware(vec![tagging("outer", &order)]);
        let inner = apply_middleware(vec![tagging("inner", &order)]);
        let store = create_store(counter_reducer(), None, Some(compose(vec![outer, inner]))).unwrap();

        store.dispatch(action("increment")).unwrap();
        assert_eq!(*order.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn test_invalid_action_rejected_at_store() {
        let store = store_with(vec![]);
        assert!(store.dispatch(json!(42)).unwrap_err().is_configuration());
    }

    #[test]
    fn test_logging_middleware_records_changes() {
        let logger = Rc::new(LoggingMiddleware::with_log(
            ActionLoggerConfig::new(None, Some("noop*")),
            10,
        ));
        let store = store_with(vec![logger.clone() as Rc<dyn Middleware>]);

        store.dispatch(action("increment")).unwrap();
        store.dispatch(action("unknown")).unwrap();
        store.dispatch(action("noop/ping")).unwrap();

        let log = logger.log().unwrap();
        let entries: Vec<_> = log.entries().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action_type, "increment");
        assert_eq!(entries[0].state_changed, Some(true));
        assert_eq!(entries[1].action_type, "unknown");
        assert_eq!(entries[1].state_changed, Some(false));
        let newest = entries[1].elapsed();
        assert!(entries[0].elapsed() >= newest);
        assert!(!logger.config().should_log("noop/ping"));
    }

    #[test]
    fn test_logging_middleware_inactive() {
        let logger = Rc::new(LoggingMiddleware::with_log(ActionLoggerConfig::default(), 10).active(false));
        let store = store_with(vec![logger.clone() as Rc<dyn Middleware>]);
        store.dispatch(action("increment")).unwrap();
        assert!(!logger.is_active());
        assert!(logger.log().unwrap().is_empty());
        assert_eq!(count(&store), 1);
    }

    #[test]
    fn test_action_log_capacity() {
        let mut log = ActionLog::new(3);
        for _ in 0..4 {
            log.push("a".into());
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.entries().next().unwrap().sequence, 1);
        let recent: Vec<_> = log.recent(2).map(|e| e.sequence).collect();
        assert_eq!(recent, vec![3, 2]);
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("tick", "tick"));
        assert!(!glob_match("tick", "ticks"));
        assert!(glob_match("todos/*", "todos/add"));
        assert!(glob_match("todos/*", "todos/"));
        assert!(!glob_match("todos/*", "user/todos/add"));
        assert!(glob_match("*/failed", "fetch/failed"));
        assert!(glob_match("*add*", "todos/add_many"));
        assert!(glob_match("tick?", "ticks"));
        assert!(!glob_match("tick?", "tick"));
        assert!(glob_match("a*b*c", "aXXbYYc"));
        assert!(!glob_match("a*b*c", "aXXbYY"));
    }

    #[test]
    fn test_logger_config_include_and_exclude() {
        let config = ActionLoggerConfig::new(Some("fetch/*"), Some("fetch/progress"));
        assert!(config.should_log("fetch/started"));
        assert!(!config.should_log("fetch/progress"));
        assert!(!config.should_log("todos/add"));
        assert!(ActionLoggerConfig::default().should_log("anything"));
    }

    #[test]
    fn test_logger_config_with_patterns() {
        let config = ActionLoggerConfig::with_patterns(
            vec!["todos/*".into(), "filter/set".into()],
            vec!["*/toggle".into()],
        );
        assert!(config.should_log("todos/add"));
        assert!(config.should_log("filter/set"));
        assert!(!config.should_log("todos/toggle"));
        assert!(!config.should_log("filter/reset"));

        let logger = LoggingMiddleware::new(config);
        assert!(logger.config().should_log("todos/remove"));
        assert!(logger.log().is_none());
    }
}
