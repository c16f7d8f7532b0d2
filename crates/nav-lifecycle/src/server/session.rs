// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Session - the protocol session to one page target
//
// Only the part of the session the navigation machinery depends on lives here:
// the signal that the transport is gone.

use crate::server::events::{EventEmitter, Subscription};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct Session {
    disconnected: AtomicBool,
    on_disconnected: EventEmitter<()>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the session as disconnected and notifies listeners.
    ///
    /// Only the first call notifies.
    pub fn disconnect(&self) {
        if self.disconnected.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!("Session disconnected");
        self.on_disconnected.emit(&());
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    /// Registers a listener for the transport going away.
    pub fn on_disconnected<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&()) + Send + Sync + 'static,
    {
        self.on_disconnected.on(listener)
    }

    pub fn disconnected_listener_count(&self) -> usize {
        self.on_disconnected.listener_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_disconnect_notifies_once() {
        let session = Session::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let _sub = session.on_disconnected(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        session.disconnect();
        session.disconnect();

        assert!(session.is_disconnected());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
