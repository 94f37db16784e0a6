//! Centralized state store with reducer pattern
//!
//! A [`Store`] owns one state cell, the active reducer and the listener list.
//! State only changes through [`Store::dispatch`]; observers learn about
//! changes through [`Store::subscribe`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::action::{self, describe_type, Action};
use crate::control::ControlActions;
use crate::error::{Result, StoreError};
use crate::observable::StateObservable;
use crate::reducer::Reducer;
use crate::state::State;

/// A change callback registered with [`Store::subscribe`]
pub type Listener = Rc<dyn Fn()>;

/// The dispatch function exposed by a store (possibly wrapped by middleware)
pub type Dispatch = Rc<dyn Fn(Value) -> Result<Value>>;

/// A function producing a store from a reducer and optional preloaded state
pub type StoreCreator = Rc<dyn Fn(Reducer, Option<State>) -> Result<Store>>;

/// A higher-order function wrapping the store constructor
pub type Enhancer = Rc<dyn Fn(StoreCreator) -> StoreCreator>;

/// Identity of one listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type ListenerList = Vec<(ListenerId, Listener)>;

/// Committed snapshot plus mutable draft of registered listeners.
///
/// `next` is only ever mutated through `Rc::make_mut`, so a draft that is
/// still shared with a snapshot (or with a dispatch in flight) is copied
/// before the first change and the iterated list never changes size.
struct ListenerSet {
    current: Option<Rc<ListenerList>>,
    next: Rc<ListenerList>,
    next_id: u64,
}

impl ListenerSet {
    fn new() -> Self {
        let next = Rc::new(Vec::new());
        Self {
            current: Some(Rc::clone(&next)),
            next,
            next_id: 0,
        }
    }

    fn add(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        Rc::make_mut(&mut self.next).push((id, listener));
        id
    }

    fn remove(&mut self, id: ListenerId) {
        Rc::make_mut(&mut self.next).retain(|(entry, _)| *entry != id);
        // Force the next dispatch to resnapshot from the draft
        self.current = None;
    }

    fn snapshot(&mut self) -> Rc<ListenerList> {
        Rc::clone(self.current.insert(Rc::clone(&self.next)))
    }

    fn len(&self) -> usize {
        self.next.len()
    }
}

/// Clears the dispatching flag however the reducer call ends.
struct DispatchGuard<'a>(&'a Cell<bool>);

impl<'a> DispatchGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub(crate) struct StoreCore {
    reducer: RefCell<Reducer>,
    state: RefCell<Option<State>>,
    listeners: RefCell<ListenerSet>,
    is_dispatching: Cell<bool>,
    control: ControlActions,
}

impl StoreCore {
    pub(crate) fn get_state(&self) -> Result<Option<State>> {
        if self.is_dispatching.get() {
            return Err(StoreError::invariant(
                "You may not call store.get_state() while the reducer is executing. \
                 The reducer has already received the state as an argument. \
                 Pass it down from the top reducer instead of reading it from the store.",
            ));
        }
        Ok(self.state.borrow().clone())
    }

    fn subscribe(&self, listener: Listener) -> Result<ListenerId> {
        if self.is_dispatching.get() {
            return Err(StoreError::invariant(
                "You may not call store.subscribe() while the reducer is executing. \
                 If you would like to be notified after the store has been updated, \
                 subscribe from a listener and invoke store.get_state() in the callback \
                 to access the latest state.",
            ));
        }
        let id = self.listeners.borrow_mut().add(listener);
        tracing::debug!(listener = id.0, "Listener subscribed");
        Ok(id)
    }

    fn unsubscribe(&self, id: ListenerId) -> Result<()> {
        if self.is_dispatching.get() {
            return Err(StoreError::invariant(
                "You may not unsubscribe from a store listener while the reducer is executing.",
            ));
        }
        self.listeners.borrow_mut().remove(id);
        tracing::debug!(listener = id.0, "Listener unsubscribed");
        Ok(())
    }

    fn dispatch(&self, action: Value) -> Result<Value> {
        action::validate(&action)?;
        if self.is_dispatching.get() {
            return Err(StoreError::invariant("Reducers may not dispatch actions."));
        }

        let next_state = {
            let _guard = DispatchGuard::enter(&self.is_dispatching);
            let reducer = self.reducer.borrow().clone();
            let previous = self.state.borrow().clone();
            reducer.reduce(previous, &action)?
        };
        *self.state.borrow_mut() = next_state;

        let listeners = self.listeners.borrow_mut().snapshot();
        let action_type = describe_type(&action).unwrap_or_default();
        tracing::trace!(
            action = %action_type,
            listeners = listeners.len(),
            "Action dispatched"
        );
        for (_, listener) in listeners.iter() {
            listener();
        }

        Ok(action)
    }

    fn replace_reducer(&self, next: Reducer) -> Result<()> {
        if self.is_dispatching.get() {
            return Err(StoreError::invariant(
                "You may not replace the reducer while the reducer is executing.",
            ));
        }
        *self.reducer.borrow_mut() = next;
        tracing::debug!(action = self.control.replace(), "Reducer replaced");
        self.dispatch(self.control.replace_action()).map(|_| ())
    }
}

/// Handle returned by [`Store::subscribe`].
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it. Clones share the same
/// registration.
#[derive(Clone)]
pub struct Subscription {
    core: Weak<StoreCore>,
    id: ListenerId,
    active: Rc<Cell<bool>>,
}

impl Subscription {
    /// Remove the listener. Calling this more than once is a no-op.
    ///
    /// Fails with [`StoreError::InvariantViolation`] while a reducer runs.
    pub fn unsubscribe(&self) -> Result<()> {
        if !self.active.get() {
            return Ok(());
        }
        let Some(core) = self.core.upgrade() else {
            self.active.set(false);
            return Ok(());
        };
        if core.is_dispatching.get() {
            return Err(StoreError::invariant(
                "You may not unsubscribe from a store listener while the reducer is executing.",
            ));
        }
        self.active.set(false);
        core.unsubscribe(self.id)
    }

    /// Whether the listener is still registered
    pub fn is_active(&self) -> bool {
        self.active.get() && self.core.strong_count() > 0
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Centralized state store with Redux-like reducer pattern
///
/// The store holds the application state and provides a single point
/// for state mutations through the `dispatch` method. Cloning a store hands
/// out another handle to the same state cell.
///
/// # Example
/// ```
/// use serde_json::{json, Value};
/// use statecell_core::{create_store, Reducer};
///
/// let reducer = Reducer::leaf(|state: Option<&Value>, action: &Value| {
///     let count = state.and_then(Value::as_i64).unwrap_or(0);
///     match action["type"].as_str() {
///         Some("increment") => Some(json!(count + 1)),
///         _ => Some(json!(count)),
///     }
/// });
///
/// let store = create_store(reducer, None, None).unwrap();
/// store.dispatch(json!({"type": "increment"})).unwrap();
/// assert_eq!(store.get_state().unwrap().unwrap(), json!(1));
/// ```
#[derive(Clone)]
pub struct Store {
    pub(crate) core: Rc<StoreCore>,
    dispatch: Dispatch,
}

impl Store {
    fn create(reducer: Reducer, preloaded_state: Option<State>, control: ControlActions) -> Result<Self> {
        let core = Rc::new(StoreCore {
            reducer: RefCell::new(reducer),
            state: RefCell::new(preloaded_state),
            listeners: RefCell::new(ListenerSet::new()),
            is_dispatching: Cell::new(false),
            control,
        });
        let dispatch: Dispatch = {
            let core = Rc::clone(&core);
            Rc::new(move |action: Value| core.dispatch(action))
        };

        tracing::debug!(init = core.control.init(), "Creating store");
        core.dispatch(core.control.init_action())?;

        Ok(Self { core, dispatch })
    }

    /// Dispatch an action through the store's dispatch function.
    ///
    /// Returns whatever the outermost middleware returns; without middleware
    /// that is the action itself.
    pub fn dispatch(&self, action: Value) -> Result<Value> {
        (self.dispatch)(action)
    }

    /// Convert a typed action into a record and dispatch it
    pub fn dispatch_action<A: Action>(&self, action: &A) -> Result<Value> {
        self.dispatch(action.to_record()?)
    }

    /// The current state. `None` until a reducer produced a value.
    pub fn get_state(&self) -> Result<Option<State>> {
        self.core.get_state()
    }

    /// Register a change listener.
    ///
    /// Listeners run synchronously after every dispatch, in registration
    /// order. A listener added while listeners are being notified first runs
    /// on the next dispatch.
    pub fn subscribe<F>(&self, listener: F) -> Result<Subscription>
    where
        F: Fn() + 'static,
    {
        self.subscribe_listener(Rc::new(listener))
    }

    /// Register an already shared listener. The same `Rc` may be registered
    /// several times; each registration unsubscribes independently.
    pub fn subscribe_listener(&self, listener: Listener) -> Result<Subscription> {
        let id = self.core.subscribe(listener)?;
        Ok(Subscription {
            core: Rc::downgrade(&self.core),
            id,
            active: Rc::new(Cell::new(true)),
        })
    }

    /// Swap the reducer and dispatch the `REPLACE` control action so every
    /// slice can initialize.
    pub fn replace_reducer(&self, next: Reducer) -> Result<()> {
        self.core.replace_reducer(next)
    }

    /// Observable view of the state
    pub fn observable(&self) -> StateObservable {
        StateObservable::new(self.clone())
    }

    /// A shareable handle to this store's dispatch function
    pub fn dispatcher(&self) -> Dispatch {
        Rc::clone(&self.dispatch)
    }

    /// The same store with `dispatch` replaced. Used by enhancers.
    pub fn with_dispatch(self, dispatch: Dispatch) -> Self {
        Self {
            core: self.core,
            dispatch,
        }
    }

    /// Control action types this store dispatches
    pub fn control_actions(&self) -> &ControlActions {
        &self.core.control
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.core.listeners.borrow().len()
    }

    /// Non-owning handle, for listeners that need to reach their own store
    pub fn downgrade(&self) -> WeakStore {
        WeakStore {
            core: Rc::downgrade(&self.core),
            dispatch: Rc::downgrade(&self.dispatch),
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.core.state.borrow())
            .field("listeners", &self.listener_count())
            .field("is_dispatching", &self.core.is_dispatching.get())
            .finish()
    }
}

/// A [`Store`] handle that does not keep the store alive
#[derive(Clone)]
pub struct WeakStore {
    core: Weak<StoreCore>,
    dispatch: Weak<dyn Fn(Value) -> Result<Value>>,
}

impl WeakStore {
    pub fn upgrade(&self) -> Option<Store> {
        Some(Store {
            core: self.core.upgrade()?,
            dispatch: self.dispatch.upgrade()?,
        })
    }
}

/// Builder for [`Store`]s
///
/// # Example
/// ```
/// use serde_json::json;
/// use statecell_core::{Reducer, State, StoreBuilder};
///
/// let store = StoreBuilder::new(Reducer::infallible(|state, _| state))
///     .preloaded_state(State::from(json!({"ready": true})))
///     .build()
///     .unwrap();
/// assert_eq!(store.get_state().unwrap().unwrap(), json!({"ready": true}));
/// ```
pub struct StoreBuilder {
    reducer: Reducer,
    preloaded_state: Option<State>,
    enhancers: Vec<Enhancer>,
    control: Option<ControlActions>,
}

impl StoreBuilder {
    pub fn new(reducer: Reducer) -> Self {
        Self {
            reducer,
            preloaded_state: None,
            enhancers: Vec::new(),
            control: None,
        }
    }

    /// Initial state, e.g. hydrated from a previous session
    pub fn preloaded_state(mut self, state: State) -> Self {
        self.preloaded_state = Some(state);
        self
    }

    /// Store enhancer. Only one is accepted; stack several with
    /// [`compose`](crate::compose::compose).
    pub fn enhancer(mut self, enhancer: Enhancer) -> Self {
        self.enhancers.push(enhancer);
        self
    }

    /// Control action types to use instead of the process-wide ones
    pub fn control_actions(mut self, control: ControlActions) -> Self {
        self.control = Some(control);
        self
    }

    pub fn build(mut self) -> Result<Store> {
        if self.enhancers.len() > 1 {
            return Err(StoreError::configuration(
                "It looks like you are passing several store enhancers to create_store(). \
                 This is not supported. Instead, compose them together to a single enhancer.",
            ));
        }
        let control = self
            .control
            .unwrap_or_else(|| ControlActions::global().clone());
        let create = base_creator(control);
        match self.enhancers.pop() {
            Some(enhancer) => enhancer(create)(self.reducer, self.preloaded_state),
            None => create(self.reducer, self.preloaded_state),
        }
    }
}

/// The unenhanced store constructor
pub fn base_creator(control: ControlActions) -> StoreCreator {
    Rc::new(move |reducer: Reducer, preloaded_state: Option<State>| {
        Store::create(reducer, preloaded_state, control.clone())
    })
}

/// Create a store.
///
/// With an enhancer, construction is delegated entirely:
/// `enhancer(base_creator)(reducer, preloaded_state)`.
pub fn create_store(
    reducer: Reducer,
    preloaded_state: Option<State>,
    enhancer: Option<Enhancer>,
) -> Result<Store> {
    let mut builder = StoreBuilder::new(reducer);
    if let Some(state) = preloaded_state {
        builder = builder.preloaded_state(state);
    }
    if let Some(enhancer) = enhancer {
        builder = builder.enhancer(enhancer);
    }
    builder.build()
}
