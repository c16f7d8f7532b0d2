// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Request - a network request observed by the NetworkManager
//
// Navigation creates a Request which later receives a Response (or fails).

use crate::error::{Error, Result};
use crate::protocol::response::Response;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Request represents an HTTP request issued by a frame.
///
/// Clones share the response slot, so a handle captured before the response
/// arrived still observes it.
#[derive(Clone)]
pub struct Request {
    request_id: Arc<str>,
    loader_id: Arc<str>,
    frame_id: Option<Arc<str>>,
    url: String,
    method: String,
    resource_type: String,
    outcome: Arc<Mutex<RequestOutcome>>,
}

#[derive(Default)]
struct RequestOutcome {
    response: Option<Response>,
    failure: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestWillBeSent {
    request_id: String,
    #[serde(default)]
    loader_id: String,
    frame_id: Option<String>,
    #[serde(rename = "type", default)]
    resource_type: Option<String>,
    request: RequestPayload,
}

#[derive(Deserialize)]
struct RequestPayload {
    url: String,
    #[serde(default = "default_method")]
    method: String,
}

fn default_method() -> String {
    "GET".to_string()
}

impl Request {
    /// Creates a Request from `Network.requestWillBeSent` parameters.
    pub(crate) fn from_protocol(params: Value) -> Result<Self> {
        let event: RequestWillBeSent = serde_json::from_value(params)
            .map_err(|e| Error::ProtocolError(format!("Malformed requestWillBeSent: {}", e)))?;

        Ok(Self {
            request_id: Arc::from(event.request_id),
            loader_id: Arc::from(event.loader_id),
            frame_id: event.frame_id.map(Arc::from),
            url: event.request.url,
            method: event.request.method,
            resource_type: event.resource_type.unwrap_or_else(|| "Other".to_string()),
            outcome: Arc::new(Mutex::new(RequestOutcome::default())),
        })
    }

    /// Returns the protocol id of the request.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the id of the frame that issued the request, if any.
    pub fn frame_id(&self) -> Option<&str> {
        self.frame_id.as_deref()
    }

    /// Returns the URL of the request.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the HTTP method of the request (GET, POST, etc.).
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the resource type as reported by the browser ("Document", "Script", ...).
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Check if this request is driving a navigation of its frame.
    ///
    /// The browser reuses the request id as the loader id of the document the
    /// request will produce, so a document request whose ids agree is the one
    /// that navigates.
    pub fn is_navigation_request(&self) -> bool {
        self.request_id == self.loader_id && self.resource_type == "Document"
    }

    /// Returns the response, once received.
    pub fn response(&self) -> Option<Response> {
        self.outcome.lock().response.clone()
    }

    /// Returns the failure text if the request failed.
    pub fn failure(&self) -> Option<String> {
        self.outcome.lock().failure.clone()
    }

    pub(crate) fn set_response(&self, response: Response) {
        self.outcome.lock().response = Some(response);
    }

    pub(crate) fn set_failure(&self, error_text: impl Into<String>) {
        self.outcome.lock().failure = Some(error_text.into());
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("request_id", &self.request_id)
            .field("frame_id", &self.frame_id)
            .field("url", &self.url)
            .field("navigation", &self.is_navigation_request())
            .finish()
    }
}
