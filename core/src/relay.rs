//! Observable values for binding external state into widget properties.
//!
//! A [`Value`] is the single writer; [`Relay`]s are read-only projections of it. Changes are
//! broadcast through a [`ReactiveCenter`], keyed by the value's identifier, to subscribers in
//! registration order. Subscriptions end when their [`Subscription`] handle is dropped.

use crate::creator::Creator;
use crate::widget::Widget;
use core::any::Any;
use core::fmt;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Identifies a value in a reactive center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelayId(Uuid);

impl fmt::Display for RelayId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Listener = Arc<dyn Fn(&dyn Any) + Send + Sync>;

#[derive(Default)]
struct CenterState {
    channels: HashMap<RelayId, Vec<(u64, Listener)>>,
    next_key: u64,
}

/// Routes value changes to subscribers.
#[derive(Clone, Default)]
pub struct ReactiveCenter(Arc<Mutex<CenterState>>);

static SHARED: Lazy<ReactiveCenter> = Lazy::new(ReactiveCenter::default);

impl ReactiveCenter {
    pub fn new() -> ReactiveCenter {
        ReactiveCenter::default()
    }

    /// The process-wide center used by [`Value::new`].
    pub fn shared() -> ReactiveCenter {
        SHARED.clone()
    }

    pub fn is_registered(&self, id: RelayId) -> bool {
        self.0.lock().channels.contains_key(&id)
    }

    pub fn subscriber_count(&self, id: RelayId) -> usize {
        self.0.lock().channels.get(&id).map_or(0, Vec::len)
    }

    fn register(&self, id: RelayId) {
        self.0.lock().channels.insert(id, Vec::new());
    }

    fn unregister(&self, id: RelayId) {
        let listeners = self.0.lock().channels.remove(&id);
        drop(listeners);
    }

    /// # Panics
    /// - if `id` is not registered
    fn subscribe(&self, id: RelayId, listener: Listener) -> u64 {
        let mut state = self.0.lock();
        let key = state.next_key;
        state.next_key += 1;
        match state.channels.get_mut(&id) {
            Some(listeners) => listeners.push((key, listener)),
            None => panic!("ReactiveCenter::subscribe: {} is not registered", id),
        }
        key
    }

    fn unsubscribe(&self, id: RelayId, key: u64) {
        let removed = {
            let mut state = self.0.lock();
            state.channels.get_mut(&id).and_then(|listeners| {
                let position = listeners.iter().position(|(k, _)| *k == key)?;
                Some(listeners.remove(position))
            })
        };
        drop(removed);
    }

    /// # Panics
    /// - if `id` is not registered
    fn post(&self, id: RelayId, value: &dyn Any) {
        let listeners: Vec<Listener> = match self.0.lock().channels.get(&id) {
            Some(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            None => panic!("ReactiveCenter::post: {} is not registered", id),
        };
        for listener in listeners {
            listener(value);
        }
    }
}

/// A mutable, observable cell.
///
/// Dropping the value unregisters it; relays created from it must not be subscribed afterwards.
pub struct Value<T> {
    id: RelayId,
    center: ReactiveCenter,
    current: Arc<Mutex<T>>,
}

impl<T> Value<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a value registered with the shared center.
    pub fn new(value: T) -> Value<T> {
        Value::with_center(&ReactiveCenter::shared(), value)
    }

    pub fn with_center(center: &ReactiveCenter, value: T) -> Value<T> {
        let id = RelayId(Uuid::new_v4());
        center.register(id);
        Value {
            id,
            center: center.clone(),
            current: Arc::new(Mutex::new(value)),
        }
    }

    pub fn id(&self) -> RelayId {
        self.id
    }

    pub fn get(&self) -> T {
        self.current.lock().clone()
    }

    /// Stores a new value and notifies subscribers.
    pub fn set(&self, value: T) {
        *self.current.lock() = value.clone();
        self.center.post(self.id, &value);
    }

    /// Modifies the value in place and notifies subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let value = {
            let mut current = self.current.lock();
            f(&mut current);
            current.clone()
        };
        self.center.post(self.id, &value);
    }

    /// A read-only projection of this value.
    pub fn relay(&self) -> Relay<T> {
        let current: Weak<Mutex<T>> = Arc::downgrade(&self.current);
        Relay {
            id: self.id,
            center: self.center.clone(),
            project: Arc::new(|value: &dyn Any| value.downcast_ref::<T>().cloned()),
            current: Arc::new(move || current.upgrade().map(|value| value.lock().clone())),
        }
    }
}

impl<T> Drop for Value<T> {
    fn drop(&mut self) {
        self.center.unregister(self.id);
    }
}

impl<T: fmt::Debug> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Value")
            .field("id", &self.id)
            .field("current", &*self.current.lock())
            .finish()
    }
}

/// A read-only, possibly mapped, view of a [`Value`].
pub struct Relay<T> {
    id: RelayId,
    center: ReactiveCenter,
    project: Arc<dyn Fn(&dyn Any) -> Option<T> + Send + Sync>,
    current: Arc<dyn Fn() -> Option<T> + Send + Sync>,
}

impl<T> Clone for Relay<T> {
    fn clone(&self) -> Self {
        Relay {
            id: self.id,
            center: self.center.clone(),
            project: Arc::clone(&self.project),
            current: Arc::clone(&self.current),
        }
    }
}

impl<T> Relay<T>
where
    T: Send + 'static,
{
    pub fn id(&self) -> RelayId {
        self.id
    }

    /// The current value.
    ///
    /// # Panics
    /// - if the underlying value was dropped
    pub fn get(&self) -> T {
        self.assert_registered("get");
        match (self.current)() {
            Some(value) => value,
            None => panic!("Relay::get: {} is not registered", self.id),
        }
    }

    /// Calls `handler` with every future value.
    ///
    /// # Panics
    /// - if the underlying value was dropped
    pub fn next<F>(&self, handler: F) -> Subscription
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let project = Arc::clone(&self.project);
        let key = self.center.subscribe(
            self.id,
            Arc::new(move |value: &dyn Any| {
                if let Some(value) = project(value) {
                    handler(value);
                }
            }),
        );
        Subscription {
            center: self.center.clone(),
            id: self.id,
            key,
        }
    }

    /// Calls `handler` with the current value right away, then with every future value.
    ///
    /// # Panics
    /// - if the underlying value was dropped
    pub fn sync<F>(&self, handler: F) -> Subscription
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        handler(self.get());
        self.next(move |value| handler(value))
    }

    /// Projects every value through `f`.
    pub fn map<U, F>(&self, f: F) -> Relay<U>
    where
        F: Fn(T) -> U + Send + Sync + 'static,
        U: Send + 'static,
    {
        let f = Arc::new(f);
        let (project, current) = (Arc::clone(&self.project), Arc::clone(&self.current));
        let g = Arc::clone(&f);
        Relay {
            id: self.id,
            center: self.center.clone(),
            project: Arc::new(move |value: &dyn Any| project(value).map(|value| f(value))),
            current: Arc::new(move || current().map(|value| g(value))),
        }
    }

    fn assert_registered(&self, operation: &str) {
        if !self.center.is_registered(self.id) {
            panic!("Relay::{}: {} is not registered", operation, self.id);
        }
    }
}

/// Keeps a subscription alive; unsubscribes on drop.
#[must_use = "dropping a subscription unsubscribes it"]
pub struct Subscription {
    center: ReactiveCenter,
    id: RelayId,
    key: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.center.unsubscribe(self.id, self.key);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("key", &self.key)
            .finish()
    }
}

impl Creator {
    /// Applies the relay's current value and every change to the widget.
    ///
    /// The subscription starts when the widget is about to be attached. It ends with the widget,
    /// or when a replacement pass hands the widget to a different creator.
    pub fn bind<T, F>(self, relay: Relay<T>, apply: F) -> Self
    where
        T: Send + 'static,
        F: Fn(&Widget, T) + Send + Sync + 'static,
    {
        let owner = self.id();
        self.on_not_rendered(move |widget| {
            let weak = widget.downgrade();
            let subscription = relay.sync(move |value| {
                if let Some(widget) = weak.upgrade() {
                    apply(&widget, value);
                }
            });
            widget.retain_for(owner, subscription);
        })
    }
}
