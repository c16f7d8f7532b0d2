// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Response - the HTTP response a navigation request resolved to

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;

/// Response from a navigation request
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// URL of the response
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// HTTP status text
    pub status_text: String,
    /// Whether the response was successful (status 200-299)
    pub ok: bool,
    /// Response headers
    pub headers: HashMap<String, String>,
}

impl Response {
    /// Builds a Response from the `response` object of `Network.responseReceived`.
    pub(crate) fn from_protocol(payload: &Value) -> Result<Self> {
        let url = payload["url"]
            .as_str()
            .ok_or_else(|| Error::ProtocolError("Response missing url".to_string()))?
            .to_string();

        // Some browsers report the status as a float
        let status = payload["status"]
            .as_u64()
            .or_else(|| {
                payload["status"]
                    .as_f64()
                    .filter(|s| s.fract() == 0.0 && *s >= 0.0 && *s <= u64::MAX as f64)
                    .map(|s| s as u64)
            })
            .ok_or_else(|| Error::ProtocolError("Response missing or invalid status".to_string()))?;
        let status = u16::try_from(status).map_err(|_| {
            Error::ProtocolError(format!("Response status out of range: {}", status))
        })?;

        // Headers arrive as a flat object; non-string values are dropped
        let headers = payload["headers"]
            .as_object()
            .map(|map| {
                map.iter()
                    .filter_map(|(name, value)| {
                        Some((name.to_string(), value.as_str()?.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            url,
            status,
            status_text: payload["statusText"].as_str().unwrap_or("").to_string(),
            ok: (200..300).contains(&status),
            headers,
        })
    }

    /// Returns the URL of the response
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the HTTP status text
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Returns whether the response was successful (status 200-299)
    pub fn ok(&self) -> bool {
        self.ok
    }

    /// Returns the response headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }
}
