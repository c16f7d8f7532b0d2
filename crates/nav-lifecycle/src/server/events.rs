// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Event emitters - typed listener registries for collaborator events
//
// Listeners are synchronous and must return quickly. Emission iterates a snapshot of
// the registry, so a listener may release its own (or another) subscription while
// an event is being delivered without deadlocking.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

type ListenerRegistry<T> = Vec<(u64, Listener<T>)>;

/// A registry of listeners for one event category.
pub struct EventEmitter<T> {
    listeners: Arc<Mutex<ListenerRegistry<T>>>,
    next_id: AtomicU64,
}

impl<T: 'static> EventEmitter<T> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers a listener. It stays registered until the returned
    /// [`Subscription`] is released or dropped.
    pub fn on<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, Arc::new(listener)));

        let registry: Weak<Mutex<ListenerRegistry<T>>> = Arc::downgrade(&self.listeners);
        Subscription {
            release: Some(Box::new(move || {
                // Emitter already gone: nothing left to unregister from
                let Some(registry) = registry.upgrade() else {
                    return false;
                };
                let mut listeners = registry.lock();
                let before = listeners.len();
                listeners.retain(|(listener_id, _)| *listener_id != id);
                listeners.len() != before
            })),
        }
    }

    /// Calls every listener registered at the time of the call.
    pub fn emit(&self, event: &T) {
        let listeners: Vec<Listener<T>> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(event);
        }
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl<T: 'static> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventEmitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

/// Ownership of one registered listener.
///
/// Releasing is idempotent; dropping an unreleased subscription releases it.
#[must_use = "dropping a Subscription immediately unregisters its listener"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() -> bool + Send>>,
}

impl Subscription {
    /// Unregisters the listener.
    ///
    /// Returns true if this call removed it, false if it had already been released
    /// or the emitter no longer exists.
    pub fn release(&mut self) -> bool {
        match self.release.take() {
            Some(release) => release(),
            None => false,
        }
    }

    /// Returns true while the listener is still registered through this handle.
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_emit_reaches_all_listeners() {
        let emitter = EventEmitter::<u32>::new();
        let total = Arc::new(AtomicUsize::new(0));

        let t1 = Arc::clone(&total);
        let _a = emitter.on(move |n| {
            t1.fetch_add(*n as usize, Ordering::SeqCst);
        });
        let t2 = Arc::clone(&total);
        let _b = emitter.on(move |n| {
            t2.fetch_add(*n as usize, Ordering::SeqCst);
        });

        emitter.emit(&5);
        assert_eq!(total.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_release_is_idempotent() {
        let emitter = EventEmitter::<()>::new();
        let mut sub = emitter.on(|_| {});
        assert_eq!(emitter.listener_count(), 1);

        assert!(sub.release());
        assert!(!sub.release());
        assert!(!sub.is_active());
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn test_drop_releases() {
        let emitter = EventEmitter::<()>::new();
        {
            let _sub = emitter.on(|_| {});
            assert_eq!(emitter.listener_count(), 1);
        }
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn test_release_only_removes_own_listener() {
        let emitter = EventEmitter::<()>::new();
        let _keep = emitter.on(|_| {});
        let mut gone = emitter.on(|_| {});
        gone.release();
        assert_eq!(emitter.listener_count(), 1);
    }

    #[test]
    fn test_listener_can_release_during_emit() {
        let emitter = Arc::new(EventEmitter::<()>::new());
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let slot_in_listener = Arc::clone(&slot);
        let sub = emitter.on(move |_| {
            if let Some(mut own) = slot_in_listener.lock().take() {
                own.release();
            }
        });
        *slot.lock() = Some(sub);

        emitter.emit(&());
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn test_release_after_emitter_dropped() {
        let emitter = EventEmitter::<()>::new();
        let mut sub = emitter.on(|_| {});
        drop(emitter);
        assert!(!sub.release());
    }
}
