//! # Event Bus
//!
//! Synchronous, single-threaded pub/sub channel.
//!
//! Every [`Node`](crate::Node), [`Props`](crate::Props),
//! [`NodeChildren`](crate::NodeChildren) and [`Document`](crate::Document)
//! owns its own bus; nothing is shared between instances.
//!
//! ## Contract
//!
//! - `emit` runs every listener to completion before returning
//! - the listener list is snapshotted before iterating, so a listener that
//!   unsubscribes itself (or another listener) mid-emission neither skips a
//!   pending call nor causes a double invocation
//! - listeners may subscribe/unsubscribe re-entrantly

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Listener<E> = Rc<dyn Fn(&E)>;

struct BusInner<E> {
    next_id: u64,
    listeners: Vec<(u64, Listener<E>)>,
}

/// Per-instance event channel
pub struct EventBus<E> {
    name: &'static str,
    inner: Rc<RefCell<BusInner<E>>>,
}

impl<E: 'static> EventBus<E> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Rc::new(RefCell::new(BusInner {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Register a listener; the returned handle removes it again
    pub fn on(&self, listener: impl Fn(&E) + 'static) -> Unsubscribe {
        self.on_rc(Rc::new(listener))
    }

    pub(crate) fn on_rc(&self, listener: Listener<E>) -> Unsubscribe {
        let id = {
            let mut inner = self.inner.borrow_mut();
            inner.next_id += 1;
            let id = inner.next_id;
            inner.listeners.push((id, listener));
            id
        };

        let weak: Weak<RefCell<BusInner<E>>> = Rc::downgrade(&self.inner);
        Unsubscribe::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().listeners.retain(|(slot, _)| *slot != id);
            }
        })
    }

    /// Deliver `event` to every listener registered at the time of the call
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        tracing::trace!(bus = self.name, listeners = snapshot.len(), "emit");

        for listener in snapshot {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().listeners.clear();
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Clones share the same listener list
impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("name", &self.name)
            .field("listeners", &self.inner.borrow().listeners.len())
            .finish()
    }
}

/// Handle returned by every subscription
///
/// Dropping the handle keeps the listener registered; call
/// [`Unsubscribe::unsubscribe`] to remove it.
pub struct Unsubscribe {
    hook: Option<Box<dyn FnOnce()>>,
}

impl Unsubscribe {
    pub(crate) fn new(hook: impl FnOnce() + 'static) -> Self {
        Self {
            hook: Some(Box::new(hook)),
        }
    }

    /// A handle that removes nothing
    pub fn noop() -> Self {
        Self { hook: None }
    }

    /// Combine several handles into one
    pub fn all(handles: Vec<Unsubscribe>) -> Self {
        Self::new(move || {
            for handle in handles {
                handle.unsubscribe();
            }
        })
    }

    pub fn unsubscribe(mut self) {
        if let Some(hook) = self.hook.take() {
            hook();
        }
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("armed", &self.hook.is_some())
            .finish()
    }
}
