//! In-process publish/subscribe channel
//!
//! Delivery is synchronous and at most once per `next` call, to the
//! subscribers registered at that moment. Nothing is buffered or replayed.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Inner<T> {
    next_id: u64,
    subscribers: Vec<(u64, Callback<T>)>,
    closed: bool,
}

pub struct Broadcaster<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Broadcaster<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_id: 0,
                subscribers: Vec::new(),
                closed: false,
            })),
        }
    }

    /// Registers `callback`. The returned handle unsubscribes when dropped or
    /// when [`Subscription::unsubscribe`] is called. Subscribing to a closed
    /// broadcaster yields an inert handle.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
        T: 'static,
    {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Subscription::inert();
        }

        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(callback)));

        let weak: Weak<Mutex<Inner<T>>> = Arc::downgrade(&self.inner);
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.lock().subscribers.retain(|(sid, _)| *sid != id);
                }
            })),
        }
    }

    /// Delivers `value` to current subscribers. Callbacks run without the
    /// lock held, so they may subscribe or unsubscribe.
    pub fn next(&self, value: &T) {
        let callbacks: Vec<Callback<T>> = {
            let inner = self.inner.lock();
            if inner.closed {
                return;
            }
            inner.subscribers.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };

        for callback in callbacks {
            callback(value);
        }
    }

    /// Tears the channel down; later `next` calls and unsubscribes are no-ops
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.subscribers.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}

impl<T> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`Broadcaster::subscribe`]
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn inert() -> Self {
        Self { detach: None }
    }

    pub fn unsubscribe(mut self) {
        self.detach_now();
    }

    fn detach_now(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}
