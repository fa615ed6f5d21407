#![forbid(unsafe_code)]

//! Synchronous fan-out of [`Event`]s to UI observers.
//!
//! # Design
//!
//! [`NotificationHub`] is a cloneable handle onto one shared observer list
//! (`Rc<RefCell<..>>`). Observers are held weakly; the strong reference lives
//! in the [`Subscription`] returned by [`NotificationHub::subscribe`], so
//! dropping the guard unsubscribes.
//!
//! # Invariants
//!
//! 1. Observers are called in registration order.
//! 2. Every observer live at publish time sees the event before `publish`
//!    returns.
//! 3. No internal borrow is held while an observer runs, so an observer may
//!    subscribe, or publish further events, re-entrantly.
//!
//! # Failure Modes
//!
//! - **Subscriber leak**: guards stored indefinitely keep their observers
//!   alive. Dead weak entries are pruned lazily during `publish()`.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::event::Event;

type ObserverRc = Rc<dyn Fn(&Event)>;
type ObserverWeak = Weak<dyn Fn(&Event)>;

#[derive(Default)]
struct HubInner {
    observers: Vec<ObserverWeak>,
    published: u64,
}

/// Shared observer list. Clones publish to the same observers.
#[derive(Clone, Default)]
pub struct NotificationHub {
    inner: Rc<RefCell<HubInner>>,
}

impl fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("NotificationHub")
            .field("observers", &inner.observers.len())
            .field("published", &inner.published)
            .finish()
    }
}

impl NotificationHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `observer`. It stays registered while the returned guard lives.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, observer: impl Fn(&Event) + 'static) -> Subscription {
        let strong: ObserverRc = Rc::new(observer);
        self.inner
            .borrow_mut()
            .observers
            .push(Rc::downgrade(&strong));
        Subscription { _guard: strong }
    }

    /// Deliver `event` to every live observer before returning.
    pub fn publish(&self, event: &Event) {
        let live: Vec<ObserverRc> = {
            let mut inner = self.inner.borrow_mut();
            inner.published += 1;
            inner.observers.retain(|w| w.strong_count() > 0);
            inner.observers.iter().filter_map(Weak::upgrade).collect()
        };
        for observer in live {
            observer(event);
        }
    }

    /// Number of observers whose guard is still alive.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner
            .borrow()
            .observers
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Total events published through this hub.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.inner.borrow().published
    }
}

/// RAII guard for one observer registration.
pub struct Subscription {
    _guard: ObserverRc,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
