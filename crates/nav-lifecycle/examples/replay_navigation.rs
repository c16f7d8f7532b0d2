// Replays a recorded page load through the connection loop and waits for it
//
// The event log below is what a browser reports for a page with one iframe.
// Run with `RUST_LOG=nav_lifecycle=debug` to watch the watcher resolve.

use nav_lifecycle::server::connection::Connection;
use nav_lifecycle::{FrameManager, NavigationOptions, WaitUntil};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

fn recorded_load() -> Vec<Value> {
    let event = |method: &str, params: Value| json!({ "method": method, "params": params });
    vec![
        event(
            "Network.requestWillBeSent",
            json!({
                "requestId": "L1", "loaderId": "L1", "frameId": "main", "type": "Document",
                "request": { "url": "https://example.com/", "method": "GET" }
            }),
        ),
        event(
            "Network.responseReceived",
            json!({
                "requestId": "L1",
                "response": {
                    "url": "https://example.com/", "status": 200, "statusText": "OK",
                    "headers": { "content-type": "text/html" }
                }
            }),
        ),
        event(
            "Page.frameNavigated",
            json!({ "frame": { "id": "main", "loaderId": "L1", "url": "https://example.com/" } }),
        ),
        event(
            "Page.lifecycleEvent",
            json!({ "frameId": "main", "loaderId": "L1", "name": "init" }),
        ),
        event(
            "Page.frameAttached",
            json!({ "frameId": "widget", "parentFrameId": "main" }),
        ),
        event(
            "Page.lifecycleEvent",
            json!({ "frameId": "widget", "loaderId": "W1", "name": "init" }),
        ),
        event(
            "Page.lifecycleEvent",
            json!({ "frameId": "main", "loaderId": "L1", "name": "DOMContentLoaded" }),
        ),
        event(
            "Page.lifecycleEvent",
            json!({ "frameId": "main", "loaderId": "L1", "name": "load" }),
        ),
        // The page is not loaded until the iframe is
        event("Page.frameStoppedLoading", json!({ "frameId": "widget" })),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let manager = FrameManager::new();
    let connection = Connection::new(Arc::clone(&manager));
    let (message_tx, message_rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move { connection.run(message_rx).await });

    // The initial about:blank document
    message_tx.send(json!({
        "method": "Page.frameNavigated",
        "params": { "frame": { "id": "main", "loaderId": "L0", "url": "about:blank" } }
    }))?;
    message_tx.send(json!({
        "method": "Page.lifecycleEvent",
        "params": { "frameId": "main", "loaderId": "L0", "name": "init" }
    }))?;
    while manager.main_frame().is_none_or(|frame| frame.loader_id() != "L0") {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    let frame = manager
        .main_frame()
        .ok_or_else(|| anyhow::anyhow!("main frame was not reported"))?;

    let navigation = {
        let manager = Arc::clone(&manager);
        let frame = frame.clone();
        tokio::spawn(async move {
            let options = NavigationOptions::new()
                .timeout(Duration::from_secs(5))
                .wait_until(WaitUntil::Load);
            manager.wait_for_navigation(&frame, Some(options)).await
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    println!("Replaying page load...");
    for message in recorded_load() {
        message_tx.send(message)?;
    }

    let response = navigation.await??;
    println!("Navigated to {}", frame.url());
    match response {
        Some(response) => println!("Response: {} {}", response.status(), response.status_text()),
        None => println!("No navigation response"),
    }

    Ok(())
}
