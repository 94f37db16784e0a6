//! Observable adapter over a store's state

use std::rc::Rc;

use crate::error::Result;
use crate::state::State;
use crate::store::{Store, Subscription};

/// Receives state snapshots from a [`StateObservable`]
pub trait Observer {
    fn next(&self, _state: Option<&State>) {}
}

impl<F> Observer for F
where
    F: Fn(Option<&State>),
{
    fn next(&self, state: Option<&State>) {
        self(state)
    }
}

/// Push-based view of a store: observers get the current state right away
/// and again after every dispatch.
///
/// # Example
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use serde_json::{json, Value};
/// use statecell_core::{create_store, Reducer, State};
///
/// let store = create_store(
///     Reducer::leaf(|state: Option<&Value>, _| Some(state.cloned().unwrap_or(json!(0)))),
///     None,
///     None,
/// )
/// .unwrap();
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&seen);
/// let sub = store
///     .observable()
///     .subscribe(move |state: Option<&State>| sink.borrow_mut().push(state.map(State::to_json)))
///     .unwrap();
/// store.dispatch(json!({"type": "noop"})).unwrap();
/// sub.unsubscribe().unwrap();
/// assert_eq!(*seen.borrow(), vec![Some(json!(0)), Some(json!(0))]);
/// ```
#[derive(Clone, Debug)]
pub struct StateObservable {
    store: Store,
}

impl StateObservable {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Emit the current state to `observer`, then once per dispatch until
    /// the returned subscription is cancelled.
    pub fn subscribe<O>(&self, observer: O) -> Result<Subscription>
    where
        O: Observer + 'static,
    {
        let observer = Rc::new(observer);
        observer.next(self.store.get_state()?.as_ref());

        let core = Rc::downgrade(&self.store.core);
        self.store.subscribe(move || {
            let Some(core) = core.upgrade() else {
                return;
            };
            if let Ok(state) = core.get_state() {
                observer.next(state.as_ref());
            }
        })
    }

    /// Adapt the store into an async stream of states.
    ///
    /// The stream yields the current state first. Cancelling the returned
    /// subscription ends the stream once buffered items are drained.
    #[cfg(feature = "stream")]
    pub fn into_stream(
        self,
    ) -> Result<(
        Subscription,
        tokio_stream::wrappers::UnboundedReceiverStream<Option<State>>,
    )> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let subscription = self.subscribe(move |state: Option<&State>| {
            let _ = tx.send(state.cloned());
        })?;
        Ok((
            subscription,
            tokio_stream::wrappers::UnboundedReceiverStream::new(rx),
        ))
    }
}

impl From<Store> for StateObservable {
    fn from(store: Store) -> Self {
        Self::new(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::action;
    use crate::store::create_store;
    use crate::testing::counter_reducer;
    use serde_json::{json, Value};
    use std::cell::RefCell;

    fn collect() -> (Rc<RefCell<Vec<Value>>>, impl Fn(Option<&State>)) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let observer = move |state: Option<&State>| {
            let value = state.map(State::to_json).unwrap_or(Value::Null);
            sink.borrow_mut().push(value);
        };
        (seen, observer)
    }

    #[test]
    fn test_emits_current_state_immediately() {
        let store = create_store(counter_reducer(), Some(State::leaf(5)), None).unwrap();
        let (seen, observer) = collect();
        let _sub = store.observable().subscribe(observer).unwrap();
        assert_eq!(*seen.borrow(), vec![json!(5)]);
    }

    #[test]
    fn test_emits_after_each_dispatch_until_unsubscribed() {
        let store = create_store(counter_reducer(), None, None).unwrap();
        let (seen, observer) = collect();
        let sub = store.observable().subscribe(observer).unwrap();

        store.dispatch(action("increment")).unwrap();
        store.dispatch(action("increment")).unwrap();
        sub.unsubscribe().unwrap();
        store.dispatch(action("increment")).unwrap();

        assert_eq!(*seen.borrow(), vec![json!(0), json!(1), json!(2)]);
    }

    #[test]
    fn test_default_observer_ignores_values() {
        struct Silent;
        impl Observer for Silent {}

        let store = create_store(counter_reducer(), None, None).unwrap();
        let sub = store.observable().subscribe(Silent).unwrap();
        store.dispatch(action("increment")).unwrap();
        assert!(sub.is_active());
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn test_observable_does_not_keep_store_alive() {
        let store = create_store(counter_reducer(), None, None).unwrap();
        let weak = store.downgrade();
        let (_seen, observer) = collect();
        let sub = store.observable().subscribe(observer).unwrap();
        drop(store);
        assert!(weak.upgrade().is_none());
        assert!(!sub.is_active());
    }
}
