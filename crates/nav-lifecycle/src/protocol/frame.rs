// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Frame - a node of the page's frame tree
//
// Every page has a main frame, and frames can have child frames (iframes).
// The FrameManager owns mutation of the tree as protocol events arrive; everything
// else only reads it.

use crate::protocol::lifecycle::LifecycleEvent;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};

/// Frame represents a frame within a page.
///
/// `Frame` is a cheap handle: clones share the same underlying frame, and two handles
/// compare equal only if they refer to the same frame object. A frame that was
/// detached and later re-attached under the same id is a *different* frame.
///
/// The state a [`LifecycleWatcher`](crate::LifecycleWatcher) reads is:
/// - the loader id, which identifies the document currently loaded,
/// - the lifecycle events seen since that loader id was assigned,
/// - the ordered list of child frames.
#[derive(Clone)]
pub struct Frame {
    inner: Arc<FrameInner>,
}

struct FrameInner {
    id: RwLock<Arc<str>>,
    parent: Option<Weak<FrameInner>>,
    state: RwLock<FrameState>,
}

#[derive(Default)]
struct FrameState {
    url: String,
    loader_id: String,
    lifecycle_events: HashSet<String>,
    children: Vec<Frame>,
    detached: bool,
}

impl Frame {
    /// Creates a frame. Attaching it to `parent`'s child list is the caller's job.
    pub(crate) fn new(id: impl Into<Arc<str>>, parent: Option<&Frame>) -> Self {
        Self {
            inner: Arc::new(FrameInner {
                id: RwLock::new(id.into()),
                parent: parent.map(|p| Arc::downgrade(&p.inner)),
                state: RwLock::new(FrameState {
                    url: "about:blank".to_string(),
                    ..FrameState::default()
                }),
            }),
        }
    }

    /// Returns the protocol id of the frame.
    ///
    /// The main frame keeps its identity across cross-process navigations, which
    /// assign it a new id.
    pub fn id(&self) -> Arc<str> {
        Arc::clone(&self.inner.id.read())
    }

    /// Returns the last committed URL. Frames start at "about:blank".
    pub fn url(&self) -> String {
        self.inner.state.read().url.clone()
    }

    /// Returns the identifier of the document currently loaded in this frame.
    ///
    /// Empty until the browser reports the first document.
    pub fn loader_id(&self) -> String {
        self.inner.state.read().loader_id.clone()
    }

    /// Returns a snapshot of the lifecycle event names seen for the current document.
    pub fn lifecycle_events(&self) -> HashSet<String> {
        self.inner.state.read().lifecycle_events.clone()
    }

    /// Returns true if `event` was reported for the current document.
    pub fn has_lifecycle_event(&self, event: LifecycleEvent) -> bool {
        self.inner
            .state
            .read()
            .lifecycle_events
            .contains(event.as_str())
    }

    /// Returns a snapshot of the child frames, in attach order.
    pub fn child_frames(&self) -> Vec<Frame> {
        self.inner.state.read().children.clone()
    }

    /// Returns the parent frame, or `None` for the main frame.
    pub fn parent_frame(&self) -> Option<Frame> {
        self.inner
            .parent
            .as_ref()
            .and_then(|p| p.upgrade())
            .map(|inner| Frame { inner })
    }

    /// Returns true once the frame has been removed from the tree.
    pub fn is_detached(&self) -> bool {
        self.inner.state.read().detached
    }

    pub(crate) fn set_id(&self, id: impl Into<Arc<str>>) {
        *self.inner.id.write() = id.into();
    }

    pub(crate) fn set_url(&self, url: impl Into<String>) {
        self.inner.state.write().url = url.into();
    }

    /// A new document replaces the old one: the accumulated events belong to the
    /// previous loader and are discarded.
    pub(crate) fn set_loader_id(&self, loader_id: impl Into<String>) {
        let mut state = self.inner.state.write();
        state.loader_id = loader_id.into();
        state.lifecycle_events.clear();
    }

    pub(crate) fn add_lifecycle_event(&self, name: impl Into<String>) {
        self.inner.state.write().lifecycle_events.insert(name.into());
    }

    pub(crate) fn add_child(&self, child: Frame) {
        self.inner.state.write().children.push(child);
    }

    pub(crate) fn remove_child(&self, child: &Frame) {
        self.inner.state.write().children.retain(|c| c != child);
    }

    pub(crate) fn mark_detached(&self) {
        self.inner.state.write().detached = true;
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Frame {}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Frame")
            .field("id", &*self.inner.id.read())
            .field("loader_id", &state.loader_id)
            .field("url", &state.url)
            .field("children", &state.children.len())
            .finish()
    }
}
