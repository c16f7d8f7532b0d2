// Shared harness for navigation integration tests
//
// Drives a FrameManager with the same protocol events a browser would send, so
// tests read like a page load: attach frames, report lifecycle milestones,
// navigate, detach.

#![allow(dead_code)] // Not every test binary uses every helper

use nav_lifecycle::server::connection::{Connection, Event};
use nav_lifecycle::{Frame, FrameManager};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

pub const MAIN: &str = "main";

pub struct TestPage {
    pub manager: Arc<FrameManager>,
    connection: Connection,
}

impl TestPage {
    /// A page whose main frame finished loading its first document (loader "L0").
    pub fn loaded() -> Self {
        init_tracing();
        let manager = FrameManager::new();
        let page = Self {
            connection: Connection::new(Arc::clone(&manager)),
            manager,
        };
        page.send(
            "Page.frameNavigated",
            json!({ "frame": { "id": MAIN, "loaderId": "L0", "url": "about:blank" } }),
        );
        page.new_document(MAIN, "L0");
        page.milestones(MAIN, "L0", &["DOMContentLoaded", "load", "networkAlmostIdle", "networkIdle"]);
        page
    }

    pub fn send(&self, method: &str, params: Value) {
        self.connection
            .dispatch(Event {
                method: method.to_string(),
                params,
                session_id: None,
            })
            .unwrap_or_else(|e| panic!("{method} failed: {e}"));
    }

    pub fn main_frame(&self) -> Frame {
        self.manager.main_frame().expect("main frame")
    }

    pub fn frame(&self, id: &str) -> Frame {
        self.manager.frame(id).expect("frame attached")
    }

    pub fn attach(&self, id: &str, parent: &str) {
        self.send(
            "Page.frameAttached",
            json!({ "frameId": id, "parentFrameId": parent }),
        );
    }

    pub fn detach(&self, id: &str) {
        self.send("Page.frameDetached", json!({ "frameId": id }));
    }

    /// Starts a new document in `frame_id`: assigns the loader, clears milestones.
    pub fn new_document(&self, frame_id: &str, loader_id: &str) {
        self.milestone(frame_id, loader_id, "init");
    }

    pub fn milestone(&self, frame_id: &str, loader_id: &str, name: &str) {
        self.send(
            "Page.lifecycleEvent",
            json!({ "frameId": frame_id, "loaderId": loader_id, "name": name }),
        );
    }

    pub fn milestones(&self, frame_id: &str, loader_id: &str, names: &[&str]) {
        for name in names {
            self.milestone(frame_id, loader_id, name);
        }
    }

    pub fn navigate_within_document(&self, frame_id: &str, url: &str) {
        self.send(
            "Page.navigatedWithinDocument",
            json!({ "frameId": frame_id, "url": url }),
        );
    }

    /// Reports the document request for `loader_id` and its response.
    pub fn navigation_request(&self, frame_id: &str, loader_id: &str, url: &str, status: u16) {
        self.send(
            "Network.requestWillBeSent",
            json!({
                "requestId": loader_id,
                "loaderId": loader_id,
                "frameId": frame_id,
                "type": "Document",
                "request": { "url": url, "method": "GET" }
            }),
        );
        self.send(
            "Network.responseReceived",
            json!({
                "requestId": loader_id,
                "response": { "url": url, "status": status, "statusText": "OK", "headers": {} }
            }),
        );
    }

    pub fn disconnect(&self) {
        self.send("Inspector.detached", json!({ "reason": "target_closed" }));
    }
}

/// Routes watcher logs to the test output. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Gives spawned watcher tasks a chance to drain their inbox.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
