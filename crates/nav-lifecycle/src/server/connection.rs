// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Connection - routes raw protocol events to the page's managers
//
// The transport hands over parsed JSON messages on an unbounded channel. The loop
// dispatches each event in arrival order; when the channel closes the transport is
// gone and the session is marked disconnected.

use crate::error::{Error, Result};
use crate::server::frame_manager::FrameManager;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Protocol event message received from the browser
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Event connection for one page target
pub struct Connection {
    frame_manager: Arc<FrameManager>,
}

impl Connection {
    pub fn new(frame_manager: Arc<FrameManager>) -> Self {
        Self { frame_manager }
    }

    pub fn frame_manager(&self) -> &Arc<FrameManager> {
        &self.frame_manager
    }

    /// Runs the message loop until the transport closes the channel.
    ///
    /// Messages that fail to parse or dispatch are logged and skipped.
    pub async fn run(&self, mut message_rx: mpsc::UnboundedReceiver<Value>) {
        while let Some(message_value) = message_rx.recv().await {
            match serde_json::from_value::<Event>(message_value) {
                Ok(event) => {
                    if let Err(e) = self.dispatch(event) {
                        tracing::warn!("Error dispatching event: {}", e);
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to parse message: {}", e);
                }
            }
        }

        tracing::debug!("Message loop ended (transport closed)");
        self.frame_manager.session().disconnect();
    }

    /// Dispatches one event to the manager that owns its domain.
    pub fn dispatch(&self, event: Event) -> Result<()> {
        tracing::debug!("Dispatching event: {}", event.method);
        let domain = event.method.split('.').next().unwrap_or_default();
        match domain {
            "Page" => self.frame_manager.on_event(&event.method, event.params),
            "Network" => self
                .frame_manager
                .network_manager()
                .on_event(&event.method, event.params),
            "Inspector" if event.method == "Inspector.detached" => {
                self.frame_manager.session().disconnect();
                Ok(())
            }
            "" => Err(Error::ProtocolError("Event without method".to_string())),
            _ => {
                tracing::debug!("Ignoring event: {}", event.method);
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("frame_manager", &self.frame_manager)
            .finish()
    }
}
