// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// NetworkManager - tracks in-flight requests from `Network.*` protocol events

use crate::error::{Error, Result};
use crate::protocol::request::Request;
use crate::protocol::response::Response;
use crate::server::events::{EventEmitter, Subscription};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct NetworkManager {
    requests: Mutex<HashMap<String, Request>>,
    on_request: EventEmitter<Request>,
}

impl NetworkManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for every new request.
    pub fn on_request<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Request) + Send + Sync + 'static,
    {
        self.on_request.on(listener)
    }

    pub fn request_listener_count(&self) -> usize {
        self.on_request.listener_count()
    }

    /// Returns the in-flight request with `request_id`, if any.
    pub fn request(&self, request_id: &str) -> Option<Request> {
        self.requests.lock().get(request_id).cloned()
    }

    /// Applies a `Network.*` protocol event.
    pub fn on_event(&self, method: &str, params: Value) -> Result<()> {
        match method {
            "Network.requestWillBeSent" => self.on_request_will_be_sent(params),
            "Network.responseReceived" => self.on_response_received(&params),
            "Network.loadingFailed" => self.on_loading_failed(&params),
            "Network.loadingFinished" => {
                let request_id = request_id(&params)?;
                self.requests.lock().remove(request_id);
                Ok(())
            }
            _ => {
                tracing::debug!("Ignoring network event: {}", method);
                Ok(())
            }
        }
    }

    fn on_request_will_be_sent(&self, params: Value) -> Result<()> {
        let request = Request::from_protocol(params)?;
        tracing::debug!(
            "Request {} {} (navigation: {})",
            request.method(),
            request.url(),
            request.is_navigation_request()
        );
        // A redirect reuses the request id; the newer request replaces the old one
        self.requests
            .lock()
            .insert(request.request_id().to_string(), request.clone());
        self.on_request.emit(&request);
        Ok(())
    }

    fn on_response_received(&self, params: &Value) -> Result<()> {
        let request_id = request_id(params)?;
        let Some(request) = self.request(request_id) else {
            tracing::debug!("Response for unknown request: {}", request_id);
            return Ok(());
        };
        let response = Response::from_protocol(&params["response"])
            .map_err(|e| e.context(format!("responseReceived for {}", request_id)))?;
        request.set_response(response);
        Ok(())
    }

    fn on_loading_failed(&self, params: &Value) -> Result<()> {
        let request_id = request_id(params)?;
        if let Some(request) = self.requests.lock().remove(request_id) {
            let error_text = params["errorText"].as_str().unwrap_or("net::ERR_FAILED");
            tracing::debug!("Request {} failed: {}", request.url(), error_text);
            request.set_failure(error_text);
        }
        Ok(())
    }
}

fn request_id(params: &Value) -> Result<&str> {
    params["requestId"]
        .as_str()
        .ok_or_else(|| Error::ProtocolError("Network event missing 'requestId'".to_string()))
}
