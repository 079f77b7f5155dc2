//! Viewport-wide gesture subscriptions.
//!
//! Gestures that are not bound to a scene primitive (the double-click reset)
//! are broadcast through a [`GestureHub`]. Each listener owns a
//! [`GestureSubscription`]; dropping it unregisters the listener, so nothing
//! outlives the viewport that subscribed.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::mpsc::{self, Receiver, Sender};

/// Global pointer gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Double-click anywhere on the viewport.
    DoubleClick,
}

#[derive(Debug, Default)]
struct Listeners {
    next_id: u64,
    senders: Vec<(u64, Sender<Gesture>)>,
}

/// Broadcasts gestures to every live subscription.
#[derive(Debug, Clone, Default)]
pub struct GestureHub {
    listeners: Rc<RefCell<Listeners>>,
}

impl GestureHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> GestureSubscription {
        let (tx, rx) = mpsc::channel();
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.senders.push((id, tx));
        log::trace!("Gesture listener {} subscribed", id);
        GestureSubscription {
            id,
            events: rx,
            hub: Rc::downgrade(&self.listeners),
        }
    }

    /// Delivers `gesture` to all listeners. Returns how many received it.
    pub fn dispatch(&self, gesture: Gesture) -> usize {
        self.listeners
            .borrow()
            .senders
            .iter()
            .filter(|(_, tx)| tx.send(gesture).is_ok())
            .count()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().senders.len()
    }
}

/// Scoped registration with a [`GestureHub`].
#[derive(Debug)]
pub struct GestureSubscription {
    id: u64,
    events: Receiver<Gesture>,
    hub: Weak<RefCell<Listeners>>,
}

impl GestureSubscription {
    /// Drains gestures received since the last poll without blocking.
    pub fn poll(&self) -> Vec<Gesture> {
        let mut gestures = Vec::new();
        while let Ok(g) = self.events.try_recv() {
            gestures.push(g);
        }
        gestures
    }
}

impl Drop for GestureSubscription {
    fn drop(&mut self) {
        // Hub may already be gone.
        if let Some(hub) = self.hub.upgrade() {
            hub.borrow_mut().senders.retain(|(id, _)| *id != self.id);
            log::trace!("Gesture listener {} unsubscribed", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_reaches_subscribers() {
        let hub = GestureHub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();
        assert_eq!(hub.dispatch(Gesture::DoubleClick), 2);
        assert_eq!(a.poll(), vec![Gesture::DoubleClick]);
        assert_eq!(b.poll(), vec![Gesture::DoubleClick]);
        assert!(a.poll().is_empty());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let hub = GestureHub::new();
        let sub = hub.subscribe();
        assert_eq!(hub.listener_count(), 1);
        drop(sub);
        assert_eq!(hub.listener_count(), 0);
        assert_eq!(hub.dispatch(Gesture::DoubleClick), 0);
    }

    #[test]
    fn test_subscription_outliving_hub() {
        let hub = GestureHub::new();
        let sub = hub.subscribe();
        drop(hub);
        assert!(sub.poll().is_empty());
        drop(sub);
    }
}
