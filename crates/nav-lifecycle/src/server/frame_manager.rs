// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// FrameManager - owns the frame tree of one page
//
// Applies `Page.*` protocol events to the tree and notifies listeners. Mirrors the
// object registry of a protocol connection: frames are registered by id when
// attached, re-parented implicitly by navigation, and unregistered (with all their
// descendants) when detached.

use crate::api::NavigationOptions;
use crate::error::{Error, Result};
use crate::lifecycle_watcher::LifecycleWatcher;
use crate::protocol::frame::Frame;
use crate::protocol::lifecycle::{DocumentNavigation, LifecycleEvent};
use crate::protocol::response::Response;
use crate::server::events::{EventEmitter, Subscription};
use crate::server::network_manager::NetworkManager;
use crate::server::session::Session;
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

type FrameRegistry = HashMap<Arc<str>, Frame>;

/// Frame tree of one page, plus the collaborators navigation depends on.
///
/// Listeners registered through the `on_*` methods receive the frame the event is
/// about. They run synchronously on the thread that applied the protocol event.
pub struct FrameManager {
    session: Arc<Session>,
    network_manager: Arc<NetworkManager>,
    frames: Mutex<FrameRegistry>,
    main_frame: RwLock<Option<Frame>>,
    navigation_interest: RwLock<DocumentNavigation>,
    on_frame_attached: EventEmitter<Frame>,
    on_frame_navigated: EventEmitter<Frame>,
    on_frame_navigated_within_document: EventEmitter<Frame>,
    on_frame_detached: EventEmitter<Frame>,
    on_lifecycle_event: EventEmitter<Frame>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrameAttached {
    frame_id: String,
    parent_frame_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrameNavigated {
    frame: FramePayload,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FramePayload {
    id: String,
    parent_id: Option<String>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    url_fragment: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LifecycleEventParams {
    frame_id: String,
    loader_id: String,
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrameScoped {
    frame_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NavigatedWithinDocument {
    frame_id: String,
    url: String,
}

impl FrameManager {
    /// Creates an empty manager with its own session and network manager.
    pub fn new() -> Arc<Self> {
        Self::with_collaborators(Arc::new(Session::new()), Arc::new(NetworkManager::new()))
    }

    /// Creates an empty manager sharing an existing session and network manager.
    pub fn with_collaborators(
        session: Arc<Session>,
        network_manager: Arc<NetworkManager>,
    ) -> Arc<Self> {
        Arc::new(Self {
            session,
            network_manager,
            frames: Mutex::new(HashMap::new()),
            main_frame: RwLock::new(None),
            navigation_interest: RwLock::new(DocumentNavigation::default()),
            on_frame_attached: EventEmitter::new(),
            on_frame_navigated: EventEmitter::new(),
            on_frame_navigated_within_document: EventEmitter::new(),
            on_frame_detached: EventEmitter::new(),
            on_lifecycle_event: EventEmitter::new(),
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn network_manager(&self) -> &Arc<NetworkManager> {
        &self.network_manager
    }

    /// Returns the main frame, once the browser reported it.
    pub fn main_frame(&self) -> Option<Frame> {
        self.main_frame.read().clone()
    }

    /// Returns the attached frame with `frame_id`.
    pub fn frame(&self, frame_id: &str) -> Option<Frame> {
        self.frames.lock().get(frame_id).cloned()
    }

    /// Returns every attached frame, in no particular order.
    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().values().cloned().collect()
    }

    /// Which navigations watchers report as success.
    pub fn navigation_interest(&self) -> DocumentNavigation {
        *self.navigation_interest.read()
    }

    pub fn set_navigation_interest(&self, interest: DocumentNavigation) {
        *self.navigation_interest.write() = interest;
    }

    pub fn on_frame_attached<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Frame) + Send + Sync + 'static,
    {
        self.on_frame_attached.on(listener)
    }

    pub fn on_frame_navigated<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Frame) + Send + Sync + 'static,
    {
        self.on_frame_navigated.on(listener)
    }

    pub fn on_frame_navigated_within_document<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Frame) + Send + Sync + 'static,
    {
        self.on_frame_navigated_within_document.on(listener)
    }

    pub fn on_frame_detached<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Frame) + Send + Sync + 'static,
    {
        self.on_frame_detached.on(listener)
    }

    /// Registers a listener for lifecycle events on any frame of the tree.
    pub fn on_lifecycle_event<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Frame) + Send + Sync + 'static,
    {
        self.on_lifecycle_event.on(listener)
    }

    /// Number of listeners on the five sources a [`LifecycleWatcher`] subscribes to.
    pub fn navigation_listener_count(&self) -> usize {
        self.session.disconnected_listener_count()
            + self.on_lifecycle_event.listener_count()
            + self.on_frame_navigated_within_document.listener_count()
            + self.on_frame_detached.listener_count()
            + self.network_manager.request_listener_count()
    }

    /// Waits for `frame` to navigate, returning the navigation response.
    ///
    /// Start the navigation after calling this (or concurrently with it), not before:
    /// the watcher only sees events that arrive after it was created.
    ///
    /// # Errors
    ///
    /// Same as [`LifecycleWatcher::new`] and [`LifecycleWatcher::wait`].
    pub async fn wait_for_navigation(
        self: &Arc<Self>,
        frame: &Frame,
        options: Option<NavigationOptions>,
    ) -> Result<Option<Response>> {
        let options = options.unwrap_or_default();
        let wait_until: Vec<&'static str> = options
            .effective_wait_until()
            .iter()
            .map(|w| w.as_str())
            .collect();

        let watcher =
            LifecycleWatcher::new(self, frame, wait_until, options.effective_timeout())?;
        watcher.wait().await?;
        Ok(watcher.navigation_response())
    }

    /// Applies a `Page.*` protocol event to the tree.
    ///
    /// Events for frames the manager does not know are ignored.
    pub fn on_event(&self, method: &str, params: Value) -> Result<()> {
        match method {
            "Page.frameAttached" => {
                let event: FrameAttached = parse(method, params)?;
                self.on_frame_attached_event(&event.frame_id, &event.parent_frame_id);
            }
            "Page.frameNavigated" => {
                let event: FrameNavigated = parse(method, params)?;
                self.on_frame_navigated_event(event.frame);
            }
            "Page.lifecycleEvent" => {
                let event: LifecycleEventParams = parse(method, params)?;
                self.on_lifecycle(&event.frame_id, &event.loader_id, &event.name);
            }
            "Page.frameStoppedLoading" => {
                let event: FrameScoped = parse(method, params)?;
                self.on_frame_stopped_loading(&event.frame_id);
            }
            "Page.navigatedWithinDocument" => {
                let event: NavigatedWithinDocument = parse(method, params)?;
                self.on_navigated_within_document(&event.frame_id, event.url);
            }
            "Page.frameDetached" => {
                let event: FrameScoped = parse(method, params)?;
                match self.frame(&event.frame_id) {
                    Some(frame) => self.remove_frames_recursively(&frame),
                    None => tracing::warn!("Detach of unknown frame: {}", event.frame_id),
                }
            }
            _ => tracing::debug!("Ignoring page event: {}", method),
        }
        Ok(())
    }

    fn on_frame_attached_event(&self, frame_id: &str, parent_frame_id: &str) {
        if self.frame(frame_id).is_some() {
            return;
        }
        let Some(parent) = self.frame(parent_frame_id) else {
            tracing::debug!(
                "Frame {} attached to unknown parent {}",
                frame_id,
                parent_frame_id
            );
            return;
        };

        let frame = Frame::new(frame_id, Some(&parent));
        parent.add_child(frame.clone());
        self.frames.lock().insert(frame.id(), frame.clone());
        self.on_frame_attached.emit(&frame);
    }

    fn on_frame_navigated_event(&self, payload: FramePayload) {
        let is_main_frame = payload.parent_id.is_none();
        let frame = if is_main_frame {
            self.main_frame()
        } else {
            self.frame(&payload.id)
        };

        let frame = match frame {
            Some(frame) => frame,
            None if is_main_frame => {
                let frame = Frame::new(payload.id.as_str(), None);
                *self.main_frame.write() = Some(frame.clone());
                frame
            }
            None => {
                tracing::debug!("Navigation of unknown frame: {}", payload.id);
                return;
            }
        };

        // The new document starts with no children
        for child in frame.child_frames() {
            self.remove_frames_recursively(&child);
        }

        // Cross-process navigation gives the main frame a new id
        if is_main_frame && *frame.id() != *payload.id {
            let mut frames = self.frames.lock();
            frames.remove(&frame.id());
            frame.set_id(payload.id.as_str());
        }
        self.frames.lock().insert(frame.id(), frame.clone());

        let url = match payload.url_fragment {
            Some(fragment) => format!("{}{}", payload.url, fragment),
            None => payload.url,
        };
        frame.set_url(url);
        self.on_frame_navigated.emit(&frame);
    }

    fn on_lifecycle(&self, frame_id: &str, loader_id: &str, name: &str) {
        let Some(frame) = self.frame(frame_id) else {
            tracing::debug!("Lifecycle event {} for unknown frame {}", name, frame_id);
            return;
        };
        if name == "init" {
            frame.set_loader_id(loader_id);
        }
        frame.add_lifecycle_event(name);
        self.on_lifecycle_event.emit(&frame);
    }

    fn on_frame_stopped_loading(&self, frame_id: &str) {
        let Some(frame) = self.frame(frame_id) else {
            return;
        };
        frame.add_lifecycle_event(LifecycleEvent::DomContentLoaded.as_str());
        frame.add_lifecycle_event(LifecycleEvent::Load.as_str());
        self.on_lifecycle_event.emit(&frame);
    }

    fn on_navigated_within_document(&self, frame_id: &str, url: String) {
        let Some(frame) = self.frame(frame_id) else {
            return;
        };
        frame.set_url(url);
        self.on_frame_navigated_within_document.emit(&frame);
        self.on_frame_navigated.emit(&frame);
    }

    /// Detaches `frame` and its subtree, deepest frames first.
    ///
    /// Each frame leaves its parent's child list before its detach is emitted, so
    /// listeners never see a detached frame in the tree.
    fn remove_frames_recursively(&self, frame: &Frame) {
        for child in frame.child_frames() {
            self.remove_frames_recursively(&child);
        }

        frame.mark_detached();
        if let Some(parent) = frame.parent_frame() {
            parent.remove_child(frame);
        }
        {
            let mut frames = self.frames.lock();
            if frames.get(&frame.id()) == Some(frame) {
                frames.remove(&frame.id());
            }
        }
        {
            let mut main_frame = self.main_frame.write();
            if main_frame.as_ref() == Some(frame) {
                *main_frame = None;
            }
        }

        tracing::debug!("Frame detached: {}", frame.id());
        self.on_frame_detached.emit(frame);
    }
}

impl std::fmt::Debug for FrameManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameManager")
            .field("main_frame", &self.main_frame())
            .field("frames", &self.frames.lock().len())
            .field("navigation_interest", &self.navigation_interest())
            .finish()
    }
}

fn parse<T: serde::de::DeserializeOwned>(method: &str, params: Value) -> Result<T> {
    serde_json::from_value(params)
        .map_err(|e| Error::ProtocolError(format!("Malformed {} params: {}", method, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn manager_with_main() -> Arc<FrameManager> {
        let manager = FrameManager::new();
        manager
            .on_event(
                "Page.frameNavigated",
                json!({ "frame": { "id": "main", "loaderId": "L0", "url": "about:blank" } }),
            )
            .unwrap();
        manager
    }

    fn attach(manager: &FrameManager, id: &str, parent: &str) {
        manager
            .on_event(
                "Page.frameAttached",
                json!({ "frameId": id, "parentFrameId": parent }),
            )
            .unwrap();
    }

    #[test]
    fn test_main_frame_created_on_first_navigation() {
        let manager = manager_with_main();
        let main = manager.main_frame().unwrap();
        assert_eq!(&*main.id(), "main");
        assert_eq!(main.url(), "about:blank");
        assert_eq!(manager.frame("main"), Some(main));
    }

    #[test]
    fn test_lifecycle_init_resets_events() {
        let manager = manager_with_main();
        let main = manager.main_frame().unwrap();

        for (loader, name) in [("L1", "init"), ("L1", "DOMContentLoaded"), ("L1", "load")] {
            manager
                .on_event(
                    "Page.lifecycleEvent",
                    json!({ "frameId": "main", "loaderId": loader, "name": name }),
                )
                .unwrap();
        }
        assert_eq!(main.loader_id(), "L1");
        assert!(main.has_lifecycle_event(LifecycleEvent::Load));

        manager
            .on_event(
                "Page.lifecycleEvent",
                json!({ "frameId": "main", "loaderId": "L2", "name": "init" }),
            )
            .unwrap();
        assert_eq!(main.loader_id(), "L2");
        assert!(!main.has_lifecycle_event(LifecycleEvent::Load));
        assert!(main.lifecycle_events().contains("init"));
    }

    #[test]
    fn test_frame_stopped_loading_marks_load() {
        let manager = manager_with_main();
        manager
            .on_event("Page.frameStoppedLoading", json!({ "frameId": "main" }))
            .unwrap();
        let main = manager.main_frame().unwrap();
        assert!(main.has_lifecycle_event(LifecycleEvent::DomContentLoaded));
        assert!(main.has_lifecycle_event(LifecycleEvent::Load));
    }

    #[test]
    fn test_detach_removes_subtree_deepest_first() {
        let manager = manager_with_main();
        attach(&manager, "child", "main");
        attach(&manager, "grandchild", "child");

        let order = Arc::new(Mutex::new(Vec::new()));
        let o = Arc::clone(&order);
        let _sub = manager.on_frame_detached(move |frame| {
            // Already out of the parent's child list
            if let Some(parent) = frame.parent_frame() {
                assert!(!parent.child_frames().contains(frame));
            }
            o.lock().push(frame.id().to_string());
        });

        manager
            .on_event("Page.frameDetached", json!({ "frameId": "child" }))
            .unwrap();

        assert_eq!(*order.lock(), vec!["grandchild", "child"]);
        assert!(manager.frame("child").is_none());
        assert!(manager.main_frame().unwrap().child_frames().is_empty());
    }

    #[test]
    fn test_navigation_drops_children() {
        let manager = manager_with_main();
        attach(&manager, "child", "main");
        let child = manager.frame("child").unwrap();

        manager
            .on_event(
                "Page.frameNavigated",
                json!({ "frame": { "id": "main", "loaderId": "L1", "url": "https://example.com/" } }),
            )
            .unwrap();

        assert!(child.is_detached());
        assert_eq!(manager.main_frame().unwrap().url(), "https://example.com/");
    }

    #[test]
    fn test_cross_process_navigation_keeps_main_frame() {
        let manager = manager_with_main();
        let main = manager.main_frame().unwrap();

        manager
            .on_event(
                "Page.frameNavigated",
                json!({ "frame": { "id": "main-2", "loaderId": "L1", "url": "https://example.com/" } }),
            )
            .unwrap();

        assert_eq!(manager.main_frame(), Some(main.clone()));
        assert_eq!(&*main.id(), "main-2");
        assert!(manager.frame("main").is_none());
        assert_eq!(manager.frame("main-2"), Some(main));
    }

    #[test]
    fn test_navigated_within_document_emits() {
        let manager = manager_with_main();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let _sub = manager.on_frame_navigated_within_document(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        manager
            .on_event(
                "Page.navigatedWithinDocument",
                json!({ "frameId": "main", "url": "about:blank#top" }),
            )
            .unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(manager.main_frame().unwrap().url(), "about:blank#top");
    }

    #[test]
    fn test_malformed_params() {
        let manager = FrameManager::new();
        let err = manager
            .on_event("Page.lifecycleEvent", json!({ "frameId": "main" }))
            .unwrap_err();
        assert!(matches!(err, Error::ProtocolError(_)));
    }

    #[test]
    fn test_unknown_frames_are_ignored() {
        let manager = FrameManager::new();
        manager
            .on_event("Page.frameDetached", json!({ "frameId": "nope" }))
            .unwrap();
        attach(&manager, "orphan", "nope");
        assert!(manager.frames().is_empty());
    }
}
